//! Types and constants for AOI resolution.

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Approximate miles spanned by one degree of latitude.
pub const MILES_PER_DEGREE_LAT: f64 = 69.0;

/// Errors that can occur when resolving an area of interest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AoiError {
    /// The requested area is not a positive, finite number of square miles.
    #[error("area must be a positive number of square miles (got {0})")]
    InvalidArea(f64),

    /// The center latitude is outside [-90, 90].
    #[error("latitude {0} is outside the valid range [-90, 90]")]
    InvalidLatitude(f64),

    /// The center longitude is outside [-180, 180].
    #[error("longitude {0} is outside the valid range [-180, 180]")]
    InvalidLongitude(f64),

    /// Longitude scaling vanishes at the poles.
    #[error("longitude scaling is zero at latitude {0}; choose a point away from the poles")]
    PolarLatitude(f64),
}

/// A geographic bounding box in decimal degrees.
///
/// Invariant: `min_lat <= max_lat` and `min_lon <= max_lon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge in degrees.
    pub min_lat: f64,
    /// Northern edge in degrees.
    pub max_lat: f64,
    /// Western edge in degrees.
    pub min_lon: f64,
    /// Eastern edge in degrees.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Returns true if this box and `other` overlap.
    ///
    /// Touching edges count as an intersection, matching the catalog's
    /// `intersects` spatial relation.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_lon < other.min_lon
            || self.min_lon > other.max_lon
            || self.max_lat < other.min_lat
            || self.min_lat > other.max_lat)
    }

    /// Renders the box as a closed WKT POLYGON ring.
    ///
    /// ScienceBase expects coordinates in `lon lat` (x y) order.
    pub fn to_wkt_polygon(&self) -> String {
        let coords = [
            (self.min_lon, self.min_lat),
            (self.min_lon, self.max_lat),
            (self.max_lon, self.max_lat),
            (self.max_lon, self.min_lat),
            (self.min_lon, self.min_lat),
        ];
        let ring = coords
            .iter()
            .map(|(x, y)| format!("{} {}", x, y))
            .collect::<Vec<_>>()
            .join(",");
        format!("POLYGON(({}))", ring)
    }

    /// Width of the box in degrees of longitude.
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the box in degrees of latitude.
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}
