use thiserror::Error;

use crate::pathdata::{CategoryId, PathDataTable};

/// Terrain state of a single tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    category: Option<CategoryId>,
    blocking: bool,
}

impl Tile {
    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileMapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile ({x}, {y}) is outside the {width}x{height} map")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

/// Row-major terrain layer. Tile (0,0) is the top-left corner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::default(); width as usize * height as usize],
        }
    }

    pub fn from_categories(
        width: u32,
        height: u32,
        categories: Vec<Option<CategoryId>>,
    ) -> Result<Self, TileMapError> {
        let expected = width as usize * height as usize;
        let actual = categories.len();
        if expected != actual {
            return Err(TileMapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tiles: categories
                .into_iter()
                .map(|category| Tile {
                    category,
                    blocking: false,
                })
                .collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index_of(x, y).and_then(|index| self.tiles.get(index))
    }

    pub fn set_category(
        &mut self,
        x: i32,
        y: i32,
        category: Option<CategoryId>,
    ) -> Result<(), TileMapError> {
        let tile = self.tile_mut(x, y)?;
        tile.category = category;
        Ok(())
    }

    pub fn set_blocking(&mut self, x: i32, y: i32, blocking: bool) -> Result<(), TileMapError> {
        let tile = self.tile_mut(x, y)?;
        tile.blocking = blocking;
        Ok(())
    }

    /// Derives every blocking flag from the tile's category. Returns the number
    /// of blocking tiles.
    pub fn apply_path_data(&mut self, table: &PathDataTable) -> usize {
        let mut blocking_count = 0;
        for tile in &mut self.tiles {
            tile.blocking = tile
                .category
                .and_then(|category| table.path_data(category))
                .is_some_and(|data| data.blocking);
            if tile.blocking {
                blocking_count += 1;
            }
        }
        blocking_count
    }

    fn tile_mut(&mut self, x: i32, y: i32) -> Result<&mut Tile, TileMapError> {
        let (width, height) = (self.width, self.height);
        self.index_of(x, y)
            .and_then(|index| self.tiles.get_mut(index))
            .ok_or(TileMapError::OutOfBounds {
                x,
                y,
                width,
                height,
            })
    }
}
