use serde::{Deserialize, Serialize};
use tile_engine::{CoordTile, OwnerId, PathDataTable, StrategyMap, TileRect};

use crate::scenario::{resolve_category, ScenarioError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    AreaAvailable {
        rect: TileRect,
        #[serde(default)]
        ignore_owner: OwnerId,
    },
    FreeTileAround {
        x: i32,
        y: i32,
        radius: u32,
    },
    ClosestAvailable {
        source: TileRect,
        destination: TileRect,
        radius: u32,
    },
    ClosestByCollision {
        source: TileRect,
        destination: TileRect,
        category: String,
        radius: u32,
    },
    IsBlocked {
        x: i32,
        y: i32,
        #[serde(default)]
        ignored_owners: Vec<OwnerId>,
        #[serde(default)]
        ignore_reservations: bool,
    },
    TraversalCost {
        x: i32,
        y: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryAnswer {
    AreaAvailable { available: bool },
    FreeTileAround { tile: Option<CoordTile> },
    ClosestAvailable { tile: Option<CoordTile> },
    ClosestByCollision { tile: Option<CoordTile> },
    IsBlocked { blocked: bool },
    TraversalCost { cost: Option<f64> },
}

/// One line of probe output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeLine {
    pub query: usize,
    #[serde(flatten)]
    pub answer: QueryAnswer,
}

pub fn evaluate(
    query: &Query,
    map: &StrategyMap,
    table: &PathDataTable,
) -> Result<QueryAnswer, ScenarioError> {
    let answer = match query {
        Query::AreaAvailable { rect, ignore_owner } => QueryAnswer::AreaAvailable {
            available: map.is_area_available(
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                *ignore_owner,
            ),
        },
        Query::FreeTileAround { x, y, radius } => QueryAnswer::FreeTileAround {
            tile: map.free_tile_around(*x, *y, *radius),
        },
        Query::ClosestAvailable {
            source,
            destination,
            radius,
        } => QueryAnswer::ClosestAvailable {
            tile: map.closest_available_tile(*source, *radius, *destination),
        },
        Query::ClosestByCollision {
            source,
            destination,
            category,
            radius,
        } => {
            let category = resolve_category(table, category)?;
            QueryAnswer::ClosestByCollision {
                tile: map.closest_tile_by_collision(*source, *destination, category, *radius),
            }
        }
        Query::IsBlocked {
            x,
            y,
            ignored_owners,
            ignore_reservations,
        } => QueryAnswer::IsBlocked {
            blocked: map.is_blocked(*x, *y, ignored_owners, *ignore_reservations),
        },
        Query::TraversalCost { x, y } => QueryAnswer::TraversalCost {
            cost: map.traversal_cost(*x, *y, table),
        },
    };
    Ok(answer)
}
