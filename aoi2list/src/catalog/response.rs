//! ScienceBase search response parsing.
//!
//! The catalog normally answers with `{"items": [...]}` but has been
//! observed returning a bare item array; both shapes are accepted.
//! Individual items frequently omit fields, so everything is optional
//! and items without the data we need are skipped later rather than
//! failing the whole query.

use serde::Deserialize;

use super::CatalogError;
use crate::aoi::BoundingBox;

/// One item from a catalog search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Links attached to the item; LAZ downloads live here.
    #[serde(default)]
    pub web_links: Vec<WebLink>,

    /// Spatial metadata, including the item's bounding box.
    #[serde(default)]
    pub spatial: Option<Spatial>,

    /// Date entries; acquisition/flight dates are extracted from these.
    #[serde(default)]
    pub dates: Vec<DateEntry>,
}

impl CatalogItem {
    /// The item's bounding box in geographic coordinates, if present.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let bb = self.spatial.as_ref()?.bounding_box.as_ref()?;
        Some(BoundingBox {
            min_lat: bb.min_y?,
            max_lat: bb.max_y?,
            min_lon: bb.min_x?,
            max_lon: bb.max_x?,
        })
    }
}

/// A web link attached to a catalog item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLink {
    #[serde(default)]
    pub uri: Option<String>,
}

/// Spatial metadata for a catalog item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spatial {
    #[serde(default)]
    pub bounding_box: Option<ItemBoundingBox>,
}

/// Raw bounding box as ScienceBase reports it (x = lon, y = lat).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBoundingBox {
    #[serde(default)]
    pub min_x: Option<f64>,
    #[serde(default)]
    pub max_x: Option<f64>,
    #[serde(default)]
    pub min_y: Option<f64>,
    #[serde(default)]
    pub max_y: Option<f64>,
}

/// One entry in an item's `dates` array.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateEntry {
    #[serde(default)]
    pub date_type: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub date_string: Option<String>,
}

/// The two response shapes the search endpoint produces.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Object { items: Vec<CatalogItem> },
    List(Vec<CatalogItem>),
}

/// Parses a search response body into catalog items.
///
/// # Errors
///
/// * [`CatalogError::Parse`] when the body is not valid JSON.
/// * [`CatalogError::UnexpectedResponse`] when the JSON is neither an
///   object with an `items` array nor a bare array.
pub fn parse_items(body: &[u8]) -> Result<Vec<CatalogItem>, CatalogError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| CatalogError::Parse(e.to_string()))?;

    let response: SearchResponse = serde_json::from_value(value).map_err(|_| {
        CatalogError::UnexpectedResponse(
            "response is neither an object with an 'items' array nor an item array".to_string(),
        )
    })?;

    Ok(match response {
        SearchResponse::Object { items } => items,
        SearchResponse::List(items) => items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_response() {
        let body = br#"{
            "total": 1,
            "items": [
                {
                    "webLinks": [{"uri": "https://example.com/tile.laz"}],
                    "spatial": {
                        "boundingBox": {
                            "minX": -92.7, "maxX": -92.6,
                            "minY": 37.0, "maxY": 37.1
                        }
                    },
                    "dates": [{"dateType": "Acquisition", "dateString": "2018-03-15"}]
                }
            ]
        }"#;

        let items = parse_items(body).unwrap();
        assert_eq!(items.len(), 1);

        let bbox = items[0].bounding_box().unwrap();
        assert_eq!(bbox.min_lat, 37.0);
        assert_eq!(bbox.max_lat, 37.1);
        assert_eq!(bbox.min_lon, -92.7);
        assert_eq!(bbox.max_lon, -92.6);
        assert_eq!(
            items[0].web_links[0].uri.as_deref(),
            Some("https://example.com/tile.laz")
        );
    }

    #[test]
    fn test_parse_bare_array_response() {
        let body = br#"[{"webLinks": [], "dates": []}]"#;
        let items = parse_items(body).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].bounding_box().is_none());
    }

    #[test]
    fn test_parse_empty_items() {
        let body = br#"{"items": []}"#;
        let items = parse_items(body).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_items(b"not json at all");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_parse_unexpected_shape() {
        let result = parse_items(br#"{"error": "no items key here"}"#);
        assert!(matches!(result, Err(CatalogError::UnexpectedResponse(_))));
    }

    #[test]
    fn test_bounding_box_with_missing_corner() {
        let body = br#"{"items": [{
            "spatial": {"boundingBox": {"minX": -92.7, "maxX": -92.6, "minY": 37.0}}
        }]}"#;
        let items = parse_items(body).unwrap();
        assert!(items[0].bounding_box().is_none());
    }

    #[test]
    fn test_item_with_unknown_fields() {
        let body = br#"{"items": [{
            "id": "abc123",
            "title": "Lidar Point Cloud",
            "webLinks": [{"uri": "https://example.com/t.laz", "title": "LAZ"}]
        }]}"#;
        let items = parse_items(body).unwrap();
        assert_eq!(items.len(), 1);
    }
}
