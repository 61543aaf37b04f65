use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordTile {
    pub x: i32,
    pub y: i32,
}

impl CoordTile {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn chebyshev_distance(self, other: CoordTile) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Axis-aligned rectangle in tile space.
///
/// Covers the half-open range `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn single(tile: CoordTile) -> Self {
        Self::new(tile.x, tile.y, 1, 1)
    }

    pub fn origin(&self) -> CoordTile {
        CoordTile::new(self.x, self.y)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn with_origin(self, tile: CoordTile) -> Self {
        Self::new(tile.x, tile.y, self.width, self.height)
    }

    fn x_end(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    fn y_end(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Tiles covered by the rectangle, row by row.
    pub fn tiles(self) -> impl Iterator<Item = CoordTile> {
        let x_range = i64::from(self.x)..self.x_end();
        (i64::from(self.y)..self.y_end()).flat_map(move |y| {
            x_range.clone().filter_map(move |x| {
                Some(CoordTile::new(
                    i32::try_from(x).ok()?,
                    i32::try_from(y).ok()?,
                ))
            })
        })
    }
}

/// Edge-to-edge gap between two rectangles: horizontal gap plus vertical gap.
///
/// Overlapping or touching rectangles are at distance 0.
pub fn rect_distance(a: &TileRect, b: &TileRect) -> u32 {
    let gap_x = axis_gap(i64::from(a.x), a.x_end(), i64::from(b.x), b.x_end());
    let gap_y = axis_gap(i64::from(a.y), a.y_end(), i64::from(b.y), b.y_end());
    gap_x.saturating_add(gap_y)
}

fn axis_gap(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> u32 {
    let gap = a_start.max(b_start) - a_end.min(b_end);
    u32::try_from(gap.max(0)).unwrap_or(u32::MAX)
}
