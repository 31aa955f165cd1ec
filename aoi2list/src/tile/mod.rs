//! Tile metadata records and download-list output
//!
//! A [`TileRecord`] is the parsed, read-only view of one LAZ tile from the
//! catalog: id, bounding box, flight date, and direct download URL. This
//! module also provides the ordering/deduplication helpers used on query
//! results and the plain-text download list writer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::aoi::BoundingBox;

/// Metadata for a single LAZ tile.
///
/// Produced by parsing catalog query responses; read-only thereafter.
/// The `laz_url` always ends in `.laz` (case-insensitive).
#[derive(Debug, Clone, PartialEq)]
pub struct TileRecord {
    /// Tile identifier derived from the LAZ filename.
    pub tile_id: String,
    /// Bounding box of the tile, when the catalog item carried one.
    pub bbox: Option<BoundingBox>,
    /// Free-text acquisition date (e.g. "2018-03-15" or "2018"), if known.
    pub flight_date: Option<String>,
    /// Direct download URL for the LAZ file.
    pub laz_url: String,
}

impl TileRecord {
    /// Filename for this tile's LAZ file.
    pub fn file_name(&self) -> String {
        format!("{}.laz", self.tile_id)
    }

    /// Best-effort parse of the flight date.
    ///
    /// Accepts `YYYY-MM-DD`, `YYYY-MM` (first day of month), and `YYYY`
    /// (first day of year). Returns `None` for anything else.
    pub fn flight_date_parsed(&self) -> Option<NaiveDate> {
        let raw = self.flight_date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
            return Some(date);
        }
        raw.parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    }
}

/// Sorts tiles by tile id for stable, human-friendly output.
pub fn sort_by_tile_id(tiles: &mut [TileRecord]) {
    tiles.sort_by(|a, b| a.tile_id.cmp(&b.tile_id));
}

/// Removes tiles with duplicate URLs, preserving first occurrence.
pub fn dedup_by_url(tiles: Vec<TileRecord>) -> Vec<TileRecord> {
    let mut seen = std::collections::HashSet::new();
    tiles
        .into_iter()
        .filter(|t| seen.insert(t.laz_url.clone()))
        .collect()
}

/// Renders one tile as a display row: id, flight date, bbox summary.
pub fn format_tile_row(tile: &TileRecord) -> String {
    let date = tile.flight_date.as_deref().unwrap_or("unknown date");
    match &tile.bbox {
        Some(bbox) => format!(
            "{}  [{}]  lat {:.4}..{:.4}  lon {:.4}..{:.4}",
            tile.tile_id, date, bbox.min_lat, bbox.max_lat, bbox.min_lon, bbox.max_lon
        ),
        None => format!("{}  [{}]", tile.tile_id, date),
    }
}

/// Writes a plain-text download list, one LAZ URL per line.
///
/// Overwrites any existing file at `path`.
pub fn write_download_list(tiles: &[TileRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for tile in tiles {
        writeln!(writer, "{}", tile.laz_url)?;
    }
    writer.flush()
}
