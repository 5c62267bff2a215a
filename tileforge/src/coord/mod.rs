//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates in the slippy map numbering scheme.

mod types;

pub use types::{
    BoundingBox, CoordError, GeoPoint, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM,
};

use std::f64::consts::PI;

/// Returns the number of tiles along one axis at the given zoom level.
#[inline]
pub fn tile_count(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Clamps a latitude to the Web Mercator range.
#[inline]
pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(MIN_LAT, MAX_LAT)
}

/// Clamps a longitude to the valid range.
#[inline]
pub fn clamp_longitude(lon: f64) -> f64 {
    lon.clamp(MIN_LON, MAX_LON)
}

/// Returns the tile containing the given geographic point.
///
/// # Arguments
///
/// * `point` - Geographic point, latitude within the Web Mercator range
/// * `zoom` - Zoom level (0 to 20)
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are invalid.
#[inline]
pub fn tile_containing(point: GeoPoint, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&point.lat) {
        return Err(CoordError::InvalidLatitude(point.lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&point.lon) {
        return Err(CoordError::InvalidLongitude(point.lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);

    // Longitude to tile X
    let x = ((point.lon + 180.0) / 360.0 * n) as u32;

    // Latitude to tile Y using the Web Mercator projection
    let lat_rad = point.lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32;

    // The east and south edges map exactly onto n; fold them into the last tile
    let last = tile_count(zoom) - 1;
    Ok(TileCoord {
        x: x.min(last),
        y: y.min(last),
        zoom,
    })
}

/// Returns the geographic point at the tile's northwest corner.
#[inline]
pub fn tile_origin(tile: TileCoord) -> GeoPoint {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    GeoPoint { lat, lon }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let result = tile_containing(GeoPoint::new(40.7128, -74.0060), 16);
        assert!(result.is_ok(), "Valid coordinates should not error");

        let tile = result.unwrap();
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = tile_containing(GeoPoint::new(90.0, 0.0), 10);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            CoordError::InvalidLatitude(_)
        ));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = tile_containing(GeoPoint::origin(), MAX_ZOOM + 1);
        assert!(matches!(result.unwrap_err(), CoordError::InvalidZoom(_)));
    }

    #[test]
    fn test_east_edge_folds_into_last_tile() {
        // Longitude 180 maps exactly onto tile index n, which is out of range
        let tile = tile_containing(GeoPoint::new(0.0, 180.0), 4).unwrap();
        assert_eq!(tile.x, tile_count(4) - 1);
    }

    #[test]
    fn test_tile_count() {
        assert_eq!(tile_count(0), 1);
        assert_eq!(tile_count(1), 2);
        assert_eq!(tile_count(10), 1024);
    }

    #[test]
    fn test_tile_origin_northwest_corner() {
        let tile = TileCoord::new(19295, 24640, 16);
        let origin = tile_origin(tile);

        // Should be close to NYC but not exact (northwest corner of tile)
        assert!(
            (origin.lat - 40.713).abs() < 0.01,
            "Latitude should be close to 40.713"
        );
        assert!(
            (origin.lon - (-74.007)).abs() < 0.01,
            "Longitude should be close to -74.007"
        );
    }

    #[test]
    fn test_roundtrip_conversion() {
        let original = GeoPoint::new(40.7128, -74.0060);
        let zoom = 16;

        let tile = tile_containing(original, zoom).unwrap();
        let converted = tile_origin(tile);

        // Northwest corner is within one tile of the original point
        assert!(
            (converted.lat - original.lat).abs() < 0.01,
            "Latitude should roundtrip within 0.01 degrees"
        );
        assert!(
            (converted.lon - original.lon).abs() < 0.01,
            "Longitude should roundtrip within 0.01 degrees"
        );
    }

    #[test]
    fn test_roundtrip_at_different_zooms() {
        let point = GeoPoint::new(51.5074, -0.1278); // London

        for zoom in [0, 5, 10, 15, 20] {
            let tile = tile_containing(point, zoom).unwrap();
            let converted = tile_origin(tile);

            // Tolerance is the size of one tile at this zoom level
            let tile_size_degrees = 360.0 / (2.0_f64.powi(zoom as i32));

            assert!(
                (converted.lat - point.lat).abs() < tile_size_degrees,
                "Zoom {}: lat diff {} exceeds tile size {}",
                zoom,
                (converted.lat - point.lat).abs(),
                tile_size_degrees
            );
            assert!(
                (converted.lon - point.lon).abs() < tile_size_degrees,
                "Zoom {}: lon diff {} exceeds tile size {}",
                zoom,
                (converted.lon - point.lon).abs(),
                tile_size_degrees
            );
        }
    }

    #[test]
    fn test_clamp_latitude() {
        assert_eq!(clamp_latitude(90.0), MAX_LAT);
        assert_eq!(clamp_latitude(-90.0), MIN_LAT);
        assert_eq!(clamp_latitude(45.0), 45.0);
    }

    #[test]
    fn test_bounding_box_contains() {
        let bounds = BoundingBox::new(-10.0, -20.0, 10.0, 20.0);

        assert!(bounds.contains(GeoPoint::origin()));
        assert!(bounds.contains(GeoPoint::new(10.0, 20.0)));
        assert!(!bounds.contains(GeoPoint::new(10.1, 0.0)));
        assert!(!bounds.contains(GeoPoint::new(0.0, -20.1)));
    }

    #[test]
    fn test_bounding_box_center() {
        let bounds = BoundingBox::new(10.0, 20.0, 30.0, 60.0);
        let center = bounds.center();

        assert_eq!(center.lat, 20.0);
        assert_eq!(center.lon, 40.0);
    }
}
