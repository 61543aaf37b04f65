use tracing::{debug, info};

use crate::geometry::{rect_distance, CoordTile, TileRect};
use crate::pathdata::{CategoryId, PathDataTable};

use super::reservation::{OwnerId, ReservationError, ReservationGrid};
use super::search::RingSearch;
use super::tilemap::{Tile, TileMap, TileMapError};

const FREE_TILE_FIRST_RING: u32 = 0;
const CLOSEST_TILE_FIRST_RING: u32 = 1;

/// Terrain layer plus reservation layer, sized together.
///
/// Searches never fail on coordinates outside the map: those tiles simply do
/// not qualify.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyMap {
    tiles: TileMap,
    reservations: ReservationGrid,
}

impl StrategyMap {
    pub fn new(width: u32, height: u32) -> Self {
        let mut map = Self::default();
        map.create(width, height);
        map
    }

    pub fn from_tile_map(tiles: TileMap) -> Self {
        let reservations = ReservationGrid::new(tiles.width(), tiles.height());
        Self {
            tiles,
            reservations,
        }
    }

    /// Reallocates both layers. Terrain and reservations start empty.
    pub fn create(&mut self, width: u32, height: u32) {
        self.tiles = TileMap::new(width, height);
        self.reservations.create(width, height);
        info!(width, height, "strategy_map_created");
    }

    pub fn width(&self) -> u32 {
        self.tiles.width()
    }

    pub fn height(&self) -> u32 {
        self.tiles.height()
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tiles.tile(x, y)
    }

    pub fn tile_category(&self, x: i32, y: i32) -> Option<CategoryId> {
        self.tiles.tile(x, y).and_then(Tile::category)
    }

    pub fn set_tile_category(
        &mut self,
        x: i32,
        y: i32,
        category: CategoryId,
    ) -> Result<(), TileMapError> {
        self.tiles.set_category(x, y, Some(category))
    }

    pub fn set_tile_blocking(
        &mut self,
        x: i32,
        y: i32,
        blocking: bool,
    ) -> Result<(), TileMapError> {
        self.tiles.set_blocking(x, y, blocking)
    }

    /// Derives the blocking flag of every tile from its category path data.
    pub fn load_collisions(&mut self, table: &PathDataTable) {
        let blocking_tiles = self.tiles.apply_path_data(table);
        debug!(
            width = self.width(),
            height = self.height(),
            blocking_tiles,
            "collisions_loaded"
        );
    }

    pub fn reservations(&self) -> &ReservationGrid {
        &self.reservations
    }

    pub fn set_reservation(
        &mut self,
        x: i32,
        y: i32,
        owner: OwnerId,
    ) -> Result<(), ReservationError> {
        self.reservations.set(x, y, owner)
    }

    pub fn reservation(&self, x: i32, y: i32) -> Option<OwnerId> {
        self.reservations.get(x, y)
    }

    pub fn reserve_area(&mut self, rect: TileRect, owner: OwnerId) -> Result<(), ReservationError> {
        self.reservations.reserve_area(rect, owner)
    }

    pub fn release_area(
        &mut self,
        rect: TileRect,
        owner: OwnerId,
    ) -> Result<usize, ReservationError> {
        self.reservations.release_area(rect, owner)
    }

    pub fn release_owner(&mut self, owner: OwnerId) -> usize {
        self.reservations.release_owner(owner)
    }

    /// True when every tile of the rectangle is inside the map, not blocking,
    /// and either free or held by `ignore_owner`. An empty rectangle is never
    /// available.
    pub fn is_area_available(
        &self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        ignore_owner: OwnerId,
    ) -> bool {
        let rect = TileRect::new(x, y, width, height);
        if rect.is_empty() {
            return false;
        }
        rect.tiles()
            .all(|tile| self.is_tile_available(tile, ignore_owner))
    }

    fn is_tile_available(&self, tile: CoordTile, ignore_owner: OwnerId) -> bool {
        let (Some(terrain), Some(owner)) = (
            self.tiles.tile(tile.x, tile.y),
            self.reservations.get(tile.x, tile.y),
        ) else {
            return false;
        };
        !terrain.is_blocking() && !owner.conflicts_with(ignore_owner)
    }

    /// Path finder view of a tile. Tiles held by one of `ignored_owners` are
    /// always passable; otherwise terrain blocks, and so does any claim unless
    /// `ignore_reservations` is set.
    pub fn is_blocked(
        &self,
        x: i32,
        y: i32,
        ignored_owners: &[OwnerId],
        ignore_reservations: bool,
    ) -> bool {
        let (Some(terrain), Some(owner)) = (self.tiles.tile(x, y), self.reservations.get(x, y))
        else {
            return true;
        };
        if !owner.is_none() && ignored_owners.contains(&owner) {
            return false;
        }
        terrain.is_blocking() || (!ignore_reservations && !owner.is_none())
    }

    pub fn traversal_cost(&self, x: i32, y: i32, table: &PathDataTable) -> Option<f64> {
        self.tile_category(x, y)
            .and_then(|category| table.path_data(category))
            .map(|data| data.cost)
    }

    /// First free 1x1 tile around `(tile_x, tile_y)`, starting with the tile
    /// itself.
    pub fn free_tile_around(&self, tile_x: i32, tile_y: i32, radius: u32) -> Option<CoordTile> {
        let center = CoordTile::new(tile_x, tile_y);
        let search = RingSearch::new(
            center,
            FREE_TILE_FIRST_RING,
            self.search_radius(center, radius),
        );
        let found = search.first_match(|tile| self.is_tile_available(tile, OwnerId::NONE));
        if found.is_none() {
            debug!(x = tile_x, y = tile_y, radius, "free_tile_not_found");
        }
        found
    }

    /// Location near `source` where a footprint of the source size fits, chosen
    /// as the closest to `destination` on the first ring with any fit.
    pub fn closest_available_tile(
        &self,
        source: TileRect,
        radius: u32,
        destination: TileRect,
    ) -> Option<CoordTile> {
        let search = RingSearch::new(
            source.origin(),
            CLOSEST_TILE_FIRST_RING,
            self.search_radius(source.origin(), radius),
        );
        let found = search.closest_match(
            |tile| {
                self.is_area_available(
                    tile.x,
                    tile.y,
                    source.width,
                    source.height,
                    OwnerId::NONE,
                )
            },
            |tile| rect_distance(&source.with_origin(tile), &destination),
        );
        if found.is_none() {
            debug!(?source, ?destination, radius, "closest_available_tile_not_found");
        }
        found
    }

    /// Tile of the given category near `source`, chosen as the closest to
    /// `destination` on the first ring holding that category.
    pub fn closest_tile_by_collision(
        &self,
        source: TileRect,
        destination: TileRect,
        category: CategoryId,
        radius: u32,
    ) -> Option<CoordTile> {
        let search = RingSearch::new(
            source.origin(),
            CLOSEST_TILE_FIRST_RING,
            self.search_radius(source.origin(), radius),
        );
        let found = search.closest_match(
            |tile| self.tile_category(tile.x, tile.y) == Some(category),
            |tile| rect_distance(&TileRect::single(tile), &destination),
        );
        if found.is_none() {
            debug!(
                ?source,
                ?destination,
                category = category.0,
                radius,
                "closest_tile_by_collision_not_found"
            );
        }
        found
    }

    /// Clamps `radius` to the first ring whose square covers the whole map.
    /// Rings past it hold only off-map tiles, which never qualify.
    fn search_radius(&self, center: CoordTile, radius: u32) -> u32 {
        let (width, height) = (i64::from(self.width()), i64::from(self.height()));
        if width == 0 || height == 0 {
            return 0;
        }
        let (cx, cy) = (i64::from(center.x), i64::from(center.y));
        let covering = cx
            .abs()
            .max((cx - (width - 1)).abs())
            .max(cy.abs())
            .max((cy - (height - 1)).abs());
        u32::try_from(covering).map_or(radius, |covering| radius.min(covering))
    }
}
