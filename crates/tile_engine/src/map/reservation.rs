use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::TileRect;

/// Identifier of whatever claims a tile. `OwnerId::NONE` marks a free tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u32);

impl OwnerId {
    pub const NONE: OwnerId = OwnerId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// True when a tile held by `self` stops `ignored` from entering it.
    pub fn conflicts_with(self, ignored: OwnerId) -> bool {
        !self.is_none() && self != ignored
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("reservation at ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

/// Per-tile claims, independent of terrain blocking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationGrid {
    width: u32,
    height: u32,
    owners: Vec<OwnerId>,
}

impl ReservationGrid {
    pub fn new(width: u32, height: u32) -> Self {
        let mut grid = Self::default();
        grid.create(width, height);
        grid
    }

    /// Reallocates the grid; every previous claim is dropped.
    pub fn create(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.owners.clear();
        self.owners
            .resize(width as usize * height as usize, OwnerId::NONE);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<OwnerId> {
        self.index_of(x, y)
            .and_then(|index| self.owners.get(index).copied())
    }

    pub fn set(&mut self, x: i32, y: i32, owner: OwnerId) -> Result<(), ReservationError> {
        let index = self.checked_index(x, y)?;
        self.owners[index] = owner;
        Ok(())
    }

    /// Claims every tile of `rect`. Nothing is written when part of the rect
    /// lies outside the grid.
    pub fn reserve_area(&mut self, rect: TileRect, owner: OwnerId) -> Result<(), ReservationError> {
        let indices = self.rect_indices(rect)?;
        for index in indices {
            self.owners[index] = owner;
        }
        Ok(())
    }

    /// Frees the tiles of `rect` that are held by `owner`; tiles held by others
    /// are left alone. Returns the number of released tiles.
    pub fn release_area(
        &mut self,
        rect: TileRect,
        owner: OwnerId,
    ) -> Result<usize, ReservationError> {
        let indices = self.rect_indices(rect)?;
        let mut released = 0;
        for index in indices {
            if self.owners[index] == owner {
                self.owners[index] = OwnerId::NONE;
                released += 1;
            }
        }
        Ok(released)
    }

    pub fn release_owner(&mut self, owner: OwnerId) -> usize {
        if owner.is_none() {
            return 0;
        }
        let mut released = 0;
        for cell in self.owners.iter_mut().filter(|cell| **cell == owner) {
            *cell = OwnerId::NONE;
            released += 1;
        }
        released
    }

    pub fn reserved_count(&self) -> usize {
        self.owners.iter().filter(|owner| !owner.is_none()).count()
    }

    fn checked_index(&self, x: i32, y: i32) -> Result<usize, ReservationError> {
        self.index_of(x, y).ok_or(ReservationError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    fn rect_indices(&self, rect: TileRect) -> Result<Vec<usize>, ReservationError> {
        rect.tiles()
            .map(|tile| self.checked_index(tile.x, tile.y))
            .collect()
    }
}
