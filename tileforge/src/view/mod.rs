//! Shared view state.
//!
//! One [`ViewState`] is shared between the controlling layer, which writes
//! position and size on user interaction, and anything deriving work from
//! the current viewport. Reads never block each other and a write is never
//! observed half-applied.

use crate::coord::{self, GeoPoint, TileCoord};
use std::fmt;
use std::sync::RwLock;

/// A map position: center plus zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPosition {
    pub center: GeoPoint,
    pub zoom: u8,
}

impl MapPosition {
    pub fn new(center: GeoPoint, zoom: u8) -> Self {
        Self { center, zoom }
    }
}

impl fmt::Display for MapPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} z{}", self.center, self.zoom)
    }
}

/// Point-in-time copy of the full view state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSnapshot {
    pub center: GeoPoint,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    /// False until the view has been positioned for the first time.
    pub valid: bool,
}

struct ViewInner {
    center: GeoPoint,
    zoom: u8,
    width: u32,
    height: u32,
    valid: bool,
}

/// Current center, zoom and viewport size, shared across threads.
///
/// The view starts invalid; it becomes valid on the first
/// [`set_position`](Self::set_position) or [`set_center`](Self::set_center)
/// call. Until then [`visible_tiles`](Self::visible_tiles) derives nothing.
pub struct ViewState {
    inner: RwLock<ViewInner>,
    zoom_min: u8,
    zoom_max: u8,
    tile_size: u32,
}

impl ViewState {
    /// Create an invalid view with the given zoom limits and tile edge
    /// length in pixels. `zoom_max` is capped at the grid maximum.
    pub fn new(zoom_min: u8, zoom_max: u8, tile_size: u32) -> Self {
        let zoom_max = zoom_max.min(coord::MAX_ZOOM).max(zoom_min);
        Self {
            inner: RwLock::new(ViewInner {
                center: GeoPoint::origin(),
                zoom: zoom_min,
                width: 0,
                height: 0,
                valid: false,
            }),
            zoom_min,
            zoom_max,
            tile_size,
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let inner = self.inner.read().unwrap();
        ViewSnapshot {
            center: inner.center,
            zoom: inner.zoom,
            width: inner.width,
            height: inner.height,
            valid: inner.valid,
        }
    }

    pub fn position(&self) -> MapPosition {
        let inner = self.inner.read().unwrap();
        MapPosition::new(inner.center, inner.zoom)
    }

    /// Viewport size in pixels.
    pub fn size(&self) -> (u32, u32) {
        let inner = self.inner.read().unwrap();
        (inner.width, inner.height)
    }

    /// Whether the view has been positioned yet.
    pub fn is_valid(&self) -> bool {
        self.inner.read().unwrap().valid
    }

    /// The inclusive zoom range this view accepts.
    pub fn limit_zoom(&self) -> (u8, u8) {
        (self.zoom_min, self.zoom_max)
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Move the view to a new center and zoom, marking it valid.
    ///
    /// Coordinates are clamped to the grid's ranges, the zoom to this
    /// view's limits.
    pub fn set_position(&self, center: GeoPoint, zoom: u8) {
        let mut inner = self.inner.write().unwrap();
        inner.center = clamp_point(center);
        inner.zoom = zoom.clamp(self.zoom_min, self.zoom_max);
        inner.valid = true;
    }

    /// Move the center, keeping the current zoom.
    pub fn set_center(&self, center: GeoPoint) {
        let mut inner = self.inner.write().unwrap();
        inner.center = clamp_point(center);
        inner.valid = true;
    }

    /// Change the zoom level, clamped to this view's limits.
    pub fn set_zoom(&self, zoom: u8) {
        let mut inner = self.inner.write().unwrap();
        inner.zoom = zoom.clamp(self.zoom_min, self.zoom_max);
    }

    /// Step the zoom by `delta` levels.
    ///
    /// Returns false without changing anything when the target level lies
    /// outside this view's limits.
    pub fn zoom_by(&self, delta: i8) -> bool {
        let mut inner = self.inner.write().unwrap();
        let target = inner.zoom as i16 + delta as i16;
        if target < self.zoom_min as i16 || target > self.zoom_max as i16 {
            return false;
        }
        inner.zoom = target as u8;
        true
    }

    /// Record a new viewport size in pixels.
    pub fn set_size(&self, width: u32, height: u32) {
        let mut inner = self.inner.write().unwrap();
        inner.width = width;
        inner.height = height;
    }

    /// Derive the tiles covering the current viewport, center tile first.
    ///
    /// Returns the tile containing the center plus enough neighbours in
    /// each direction to cover half the viewport, clamped to the tile grid
    /// and ordered by distance from the center tile. An invalid or
    /// zero-sized view derives nothing.
    pub fn visible_tiles(&self) -> Vec<TileCoord> {
        let snapshot = self.snapshot();
        if !snapshot.valid || snapshot.width == 0 || snapshot.height == 0 {
            return Vec::new();
        }

        let Ok(center_tile) = coord::tile_containing(snapshot.center, snapshot.zoom) else {
            return Vec::new();
        };

        let dx = half_extent(snapshot.width, self.tile_size);
        let dy = half_extent(snapshot.height, self.tile_size);
        let last = i64::from(coord::tile_count(snapshot.zoom)) - 1;

        let cx = i64::from(center_tile.x);
        let cy = i64::from(center_tile.y);
        let x_min = (cx - dx).max(0);
        let x_max = (cx + dx).min(last);
        let y_min = (cy - dy).max(0);
        let y_max = (cy + dy).min(last);

        let mut tiles = Vec::with_capacity(((x_max - x_min + 1) * (y_max - y_min + 1)) as usize);
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                tiles.push(TileCoord::new(x as u32, y as u32, snapshot.zoom));
            }
        }
        tiles.sort_by_key(|tile| {
            let dx = i64::from(tile.x) - cx;
            let dy = i64::from(tile.y) - cy;
            dx * dx + dy * dy
        });
        tiles
    }
}

fn clamp_point(point: GeoPoint) -> GeoPoint {
    GeoPoint::new(
        coord::clamp_latitude(point.lat),
        coord::clamp_longitude(point.lon),
    )
}

/// Tiles needed on each side of the center to cover half the given pixel
/// span, rounding up.
fn half_extent(pixels: u32, tile_size: u32) -> i64 {
    let half = u64::from(pixels) / 2;
    let size = u64::from(tile_size.max(1));
    ((half + size - 1) / size) as i64
}
