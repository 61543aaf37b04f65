//! Ring-expansion search over tile coordinates.
//!
//! Rings grow from `first_ring` to `max_radius` inclusive. Ring `s` is the square
//! `[cx - s, cx + s] x [cy - s, cy + s]`, visited x-major (x outer, y inner).
//! The first ring is scanned in full; later rings only visit their border since
//! the interior was rejected by the previous ring. The first ring with any
//! match ends the search, so a closer match further out is never considered.

use crate::geometry::CoordTile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSearch {
    center: CoordTile,
    first_ring: u32,
    max_radius: u32,
}

impl RingSearch {
    pub fn new(center: CoordTile, first_ring: u32, max_radius: u32) -> Self {
        Self {
            center,
            first_ring,
            max_radius,
        }
    }

    /// First accepted tile in scan order.
    pub fn first_match<F>(&self, mut accept: F) -> Option<CoordTile>
    where
        F: FnMut(CoordTile) -> bool,
    {
        self.rings().find_map(|(size, full)| {
            ring_tiles(self.center, size, full).find(|tile| accept(*tile))
        })
    }

    /// Accepted tile with the smallest `distance` on the first ring that accepts
    /// anything. Ties keep the earliest tile in scan order.
    pub fn closest_match<F, D>(&self, mut accept: F, mut distance: D) -> Option<CoordTile>
    where
        F: FnMut(CoordTile) -> bool,
        D: FnMut(CoordTile) -> u32,
    {
        for (size, full) in self.rings() {
            let mut best: Option<(u32, CoordTile)> = None;
            for tile in ring_tiles(self.center, size, full) {
                if !accept(tile) {
                    continue;
                }
                let d = distance(tile);
                if best.map_or(true, |(best_distance, _)| d < best_distance) {
                    best = Some((d, tile));
                }
            }
            if let Some((_, tile)) = best {
                return Some(tile);
            }
        }
        None
    }

    fn rings(&self) -> impl Iterator<Item = (i32, bool)> {
        let first = self.first_ring;
        (first..=self.max_radius).map(move |size| {
            let size = i32::try_from(size).unwrap_or(i32::MAX);
            (size, size == i32::try_from(first).unwrap_or(i32::MAX))
        })
    }
}

fn ring_tiles(center: CoordTile, size: i32, full: bool) -> impl Iterator<Item = CoordTile> {
    let min_x = center.x.saturating_sub(size);
    let max_x = center.x.saturating_add(size);
    let min_y = center.y.saturating_sub(size);
    let max_y = center.y.saturating_add(size);
    (min_x..=max_x).flat_map(move |x| {
        let edge_column = full || x == min_x || x == max_x;
        (min_y..=max_y)
            .filter(move |&y| edge_column || y == min_y || y == max_y)
            .map(move |y| CoordTile::new(x, y))
    })
}
