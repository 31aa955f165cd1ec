//! ScienceBase tile query client
//!
//! Queries the USGS ScienceBase catalog for LiDAR point cloud (LAZ) tiles
//! that intersect a bounding box and parses the response into
//! [`TileRecord`](crate::tile::TileRecord) values.
//!
//! Each query is a fresh network call; nothing is cached. An empty result
//! set is not an error. Network and parse failures surface to the caller
//! without automatic retry.

mod http;
mod response;

pub use http::{HttpClient, ReqwestClient};
pub use response::{CatalogItem, DateEntry, ItemBoundingBox, Spatial, WebLink};

use tracing::debug;

use crate::aoi::BoundingBox;
use crate::tile::{self, TileRecord};

/// Search endpoint of the USGS ScienceBase catalog.
pub const SCIENCEBASE_SEARCH_URL: &str = "https://www.sciencebase.gov/catalog/items";

/// Parent id of the USGS Lidar Point Cloud collection on ScienceBase.
pub const LPC_PARENT_ID: &str = "4f70ab64e4b058caae3f8def";

/// Default cap on the number of items requested per query.
const DEFAULT_MAX_ITEMS: usize = 1000;

/// Errors that can occur while querying the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// The HTTP request itself failed (connection, timeout, body read).
    Http { url: String, reason: String },

    /// The server answered with a non-success status code.
    Status { url: String, status: u16 },

    /// The response body was not valid JSON.
    Parse(String),

    /// The response JSON had an unrecognized structure.
    UnexpectedResponse(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { url, reason } => {
                if url.is_empty() {
                    write!(f, "catalog request failed: {}", reason)
                } else {
                    write!(f, "catalog request to {} failed: {}", url, reason)
                }
            }
            Self::Status { url, status } => {
                write!(f, "catalog request to {} returned HTTP {}", url, status)
            }
            Self::Parse(reason) => write!(f, "failed to parse catalog response: {}", reason),
            Self::UnexpectedResponse(reason) => {
                write!(f, "unexpected catalog response: {}", reason)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Client for the ScienceBase search API.
///
/// Generic over [`HttpClient`] so tests can substitute a mock transport.
pub struct ScienceBaseClient<C: HttpClient> {
    http: C,
    base_url: String,
    max_items: usize,
}

impl<C: HttpClient> ScienceBaseClient<C> {
    /// Creates a client against the public ScienceBase endpoint.
    pub fn new(http: C) -> Self {
        Self {
            http,
            base_url: SCIENCEBASE_SEARCH_URL.to_string(),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    /// Overrides the search endpoint URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the maximum number of items requested per query.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    /// Queries the Lidar Point Cloud collection for LAZ tiles that
    /// intersect `bbox`.
    ///
    /// Returns the tiles deduplicated by URL and sorted by tile id.
    /// An AOI with no coverage yields `Ok(vec![])`.
    pub fn query_tiles(&self, bbox: &BoundingBox) -> Result<Vec<TileRecord>, CatalogError> {
        let filter = spatial_query_filter(&bbox.to_wkt_polygon());
        let query = [
            ("q", String::new()),
            ("format", "json".to_string()),
            ("parentId", LPC_PARENT_ID.to_string()),
            ("filter", filter),
            // Only ask for the fields we actually use.
            ("fields", "webLinks,spatial,dates".to_string()),
            ("max", self.max_items.to_string()),
        ];

        debug!(url = %self.base_url, max_items = self.max_items, "querying ScienceBase");
        let body = self.http.get(&self.base_url, &query)?;
        let items = response::parse_items(&body)?;
        debug!(items = items.len(), "catalog items received");

        // The spatial filter is coarse on the server side; keep only items
        // whose own bbox intersects the AOI. Items without a bbox are
        // dropped.
        let in_aoi: Vec<CatalogItem> = items
            .into_iter()
            .filter(|item| {
                item.bounding_box()
                    .map(|item_bbox| item_bbox.intersects(bbox))
                    .unwrap_or(false)
            })
            .collect();

        Ok(extract_tiles(&in_aoi))
    }
}

/// Builds the `spatialQuery` filter string in the ad-hoc format used by
/// ScienceBase: `spatialQuery={wkt:"POLYGON(...)",relation:intersects}`.
fn spatial_query_filter(wkt_polygon: &str) -> String {
    format!("spatialQuery={{wkt:\"{}\",relation:intersects}}", wkt_polygon)
}

/// Flattens catalog items into tile records.
///
/// Every `.laz` web link becomes one record; the tile id is the URL's
/// filename without the extension. The result is deduplicated by URL
/// (first occurrence wins) and sorted by tile id.
fn extract_tiles(items: &[CatalogItem]) -> Vec<TileRecord> {
    let mut tiles = Vec::new();

    for item in items {
        let bbox = item.bounding_box();
        let flight_date = flight_date_of(item);

        for link in &item.web_links {
            let Some(uri) = link.uri.as_deref() else {
                continue;
            };
            let Some(tile_id) = laz_tile_id(uri) else {
                continue;
            };

            tiles.push(TileRecord {
                tile_id,
                bbox,
                flight_date: flight_date.clone(),
                laz_url: uri.to_string(),
            });
        }
    }

    let mut tiles = tile::dedup_by_url(tiles);
    tile::sort_by_tile_id(&mut tiles);
    tiles
}

/// Derives a tile id from a `.laz` URL, or `None` if the URL is not a
/// LAZ download.
fn laz_tile_id(uri: &str) -> Option<String> {
    let file_name = uri.rsplit('/').next().unwrap_or(uri);
    if !file_name.to_ascii_lowercase().ends_with(".laz") {
        return None;
    }
    Some(file_name[..file_name.len() - 4].to_string())
}

/// Extracts an acquisition/flight date from an item's `dates` entries.
///
/// Prefers entries whose type or label mentions acquisition, ground, or
/// flight; falls back to any non-empty date string.
fn flight_date_of(item: &CatalogItem) -> Option<String> {
    const FLIGHT_WORDS: [&str; 3] = ["acquisition", "ground", "flight"];

    for entry in &item.dates {
        let label = non_empty(entry.date_type.as_deref())
            .or_else(|| non_empty(entry.kind.as_deref()))
            .or_else(|| non_empty(entry.label.as_deref()))
            .unwrap_or("")
            .to_ascii_lowercase();

        if let Some(ds) = non_empty(entry.date_string.as_deref()) {
            if FLIGHT_WORDS.iter().any(|w| label.contains(w)) {
                return Some(ds.to_string());
            }
        }
    }

    item.dates
        .iter()
        .find_map(|entry| non_empty(entry.date_string.as_deref()))
        .map(str::to_string)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
