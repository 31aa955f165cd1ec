//! AOI2List - USGS LiDAR tile discovery and download
//!
//! This library locates USGS LiDAR point-cloud (LAZ) tiles for an area of
//! interest and downloads the corresponding files:
//!
//! - [`aoi`] resolves a center point plus an area in square miles into a
//!   geographic bounding box.
//! - [`catalog`] queries the USGS ScienceBase catalog for LAZ tiles that
//!   intersect that bounding box.
//! - [`tile`] holds the tile metadata records and renders/writes download
//!   lists.
//! - [`downloader`] streams the selected LAZ files to disk on a background
//!   worker thread with progress reporting, retries, and cancellation.

pub mod aoi;
pub mod catalog;
pub mod downloader;
pub mod tile;

pub use aoi::{AreaOfInterest, BoundingBox};
pub use tile::TileRecord;
