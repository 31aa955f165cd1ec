//! Area-of-interest resolution
//!
//! Converts a center point (latitude/longitude in decimal degrees) and a
//! square area in square miles into a geographic bounding box, using an
//! equirectangular approximation:
//!
//! - ~69 miles per degree of latitude
//! - ~69 * cos(latitude) miles per degree of longitude

mod types;

pub use types::{
    AoiError, BoundingBox, MAX_LAT, MAX_LON, MILES_PER_DEGREE_LAT, MIN_LAT, MIN_LON,
};

/// A square area of interest centered on a geographic point.
///
/// Validated on construction and immutable thereafter. The derived
/// bounding box always satisfies `min <= max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaOfInterest {
    center_lat: f64,
    center_lon: f64,
    square_miles: f64,
}

impl AreaOfInterest {
    /// Creates a new area of interest.
    ///
    /// # Arguments
    ///
    /// * `center_lat` - Center latitude in degrees (-90 to 90, positive north)
    /// * `center_lon` - Center longitude in degrees (-180 to 180, negative west)
    /// * `square_miles` - Size of the square AOI in square miles (> 0)
    ///
    /// # Errors
    ///
    /// Fails fast with an [`AoiError`] before any network activity if the
    /// area is non-positive, a coordinate is out of range, or the center
    /// sits at a pole where longitude scaling vanishes.
    pub fn new(center_lat: f64, center_lon: f64, square_miles: f64) -> Result<Self, AoiError> {
        if !(square_miles > 0.0) || !square_miles.is_finite() {
            return Err(AoiError::InvalidArea(square_miles));
        }
        if !(MIN_LAT..=MAX_LAT).contains(&center_lat) {
            return Err(AoiError::InvalidLatitude(center_lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&center_lon) {
            return Err(AoiError::InvalidLongitude(center_lon));
        }
        if miles_per_degree_lon(center_lat) <= f64::EPSILON {
            return Err(AoiError::PolarLatitude(center_lat));
        }

        Ok(Self {
            center_lat,
            center_lon,
            square_miles,
        })
    }

    /// Center latitude in degrees.
    pub fn center_lat(&self) -> f64 {
        self.center_lat
    }

    /// Center longitude in degrees.
    pub fn center_lon(&self) -> f64 {
        self.center_lon
    }

    /// Requested area in square miles.
    pub fn square_miles(&self) -> f64 {
        self.square_miles
    }

    /// Computes the bounding box of the square AOI.
    ///
    /// The square's side is `sqrt(square_miles)` miles; half of it is
    /// converted to degrees on each axis, with the longitude half-span
    /// corrected for meridian convergence at the center latitude.
    pub fn bounding_box(&self) -> BoundingBox {
        let half_side_miles = self.square_miles.sqrt() / 2.0;

        let dlat = half_side_miles / MILES_PER_DEGREE_LAT;
        let dlon = half_side_miles / miles_per_degree_lon(self.center_lat);

        BoundingBox {
            min_lat: self.center_lat - dlat,
            max_lat: self.center_lat + dlat,
            min_lon: self.center_lon - dlon,
            max_lon: self.center_lon + dlon,
        }
    }
}

/// Miles spanned by one degree of longitude at the given latitude.
#[inline]
fn miles_per_degree_lon(lat: f64) -> f64 {
    MILES_PER_DEGREE_LAT * lat.to_radians().cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missouri_example() {
        // 6 sq mi AOI near the Mark Twain National Forest.
        let aoi = AreaOfInterest::new(37.1, -92.6, 6.0).unwrap();
        let bbox = aoi.bounding_box();

        // Half side is sqrt(6)/2 ~= 1.2247 miles.
        let expected_dlat = 6.0_f64.sqrt() / 2.0 / 69.0;
        let expected_dlon = 6.0_f64.sqrt() / 2.0 / (69.0 * 37.1_f64.to_radians().cos());

        assert!((bbox.max_lat - 37.1 - expected_dlat).abs() < 1e-12);
        assert!((37.1 - bbox.min_lat - expected_dlat).abs() < 1e-12);
        assert!((bbox.max_lon - (-92.6) - expected_dlon).abs() < 1e-12);
        assert!((expected_dlat - 0.01775).abs() < 1e-4);
        assert!((expected_dlon - 0.02225).abs() < 1e-4);
    }

    #[test]
    fn test_zero_area_rejected() {
        let result = AreaOfInterest::new(37.1, -92.6, 0.0);
        assert_eq!(result.unwrap_err(), AoiError::InvalidArea(0.0));
    }

    #[test]
    fn test_negative_area_rejected() {
        let result = AreaOfInterest::new(37.1, -92.6, -4.0);
        assert!(matches!(result.unwrap_err(), AoiError::InvalidArea(_)));
    }

    #[test]
    fn test_nan_area_rejected() {
        let result = AreaOfInterest::new(37.1, -92.6, f64::NAN);
        assert!(matches!(result.unwrap_err(), AoiError::InvalidArea(_)));
    }

    #[test]
    fn test_infinite_area_rejected() {
        let result = AreaOfInterest::new(37.1, -92.6, f64::INFINITY);
        assert!(matches!(result.unwrap_err(), AoiError::InvalidArea(_)));
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let result = AreaOfInterest::new(90.5, 0.0, 1.0);
        assert!(matches!(result.unwrap_err(), AoiError::InvalidLatitude(_)));
    }

    #[test]
    fn test_out_of_range_longitude_rejected() {
        let result = AreaOfInterest::new(0.0, -180.5, 1.0);
        assert!(matches!(result.unwrap_err(), AoiError::InvalidLongitude(_)));
    }

    #[test]
    fn test_pole_rejected() {
        let result = AreaOfInterest::new(90.0, 0.0, 1.0);
        assert!(matches!(result.unwrap_err(), AoiError::PolarLatitude(_)));
    }

    proptest! {
        #[test]
        fn prop_bbox_is_ordered(
            lat in -85.0f64..85.0,
            lon in -179.0f64..179.0,
            sqmi in 0.01f64..10_000.0,
        ) {
            let aoi = AreaOfInterest::new(lat, lon, sqmi).unwrap();
            let bbox = aoi.bounding_box();
            prop_assert!(bbox.min_lat <= bbox.max_lat);
            prop_assert!(bbox.min_lon <= bbox.max_lon);
        }

        #[test]
        fn prop_bbox_area_matches_request(
            lat in -80.0f64..80.0,
            lon in -170.0f64..170.0,
            sqmi in 0.01f64..10_000.0,
        ) {
            let aoi = AreaOfInterest::new(lat, lon, sqmi).unwrap();
            let bbox = aoi.bounding_box();

            // Convert the box back to miles with the same approximation;
            // the area must round-trip within floating point error.
            let height_miles = bbox.lat_span() * MILES_PER_DEGREE_LAT;
            let width_miles =
                bbox.lon_span() * MILES_PER_DEGREE_LAT * lat.to_radians().cos();
            let area = height_miles * width_miles;

            prop_assert!((area - sqmi).abs() / sqmi < 1e-9);
        }

        #[test]
        fn prop_non_positive_area_rejected(
            lat in -85.0f64..85.0,
            lon in -179.0f64..179.0,
            sqmi in -10_000.0f64..=0.0,
        ) {
            let result = AreaOfInterest::new(lat, lon, sqmi);
            prop_assert!(matches!(result, Err(AoiError::InvalidArea(_))));
        }

        #[test]
        fn prop_bbox_centered_on_input(
            lat in -80.0f64..80.0,
            lon in -170.0f64..170.0,
            sqmi in 0.01f64..1_000.0,
        ) {
            let aoi = AreaOfInterest::new(lat, lon, sqmi).unwrap();
            let bbox = aoi.bounding_box();
            prop_assert!(((bbox.min_lat + bbox.max_lat) / 2.0 - lat).abs() < 1e-9);
            prop_assert!(((bbox.min_lon + bbox.max_lon) / 2.0 - lon).abs() < 1e-9);
        }
    }
}
