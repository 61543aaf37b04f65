mod reservation;
mod search;
mod strategy;
mod tilemap;

pub use reservation::{OwnerId, ReservationError, ReservationGrid};
pub use search::RingSearch;
pub use strategy::StrategyMap;
pub use tilemap::{Tile, TileMap, TileMapError};
