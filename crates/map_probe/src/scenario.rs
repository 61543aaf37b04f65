use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use tile_engine::{
    CategoryId, OwnerId, PathDataTable, ReservationError, StrategyMap, TileMap, TileMapError,
    TileRect,
};

use crate::query::Query;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("parse scenario json: {0}")]
    Parse(String),
    #[error("scenario has {actual} rows, expected height {expected}")]
    RowCount { expected: u32, actual: usize },
    #[error("row {row} has {actual} tiles, expected width {expected}")]
    RowWidth {
        row: usize,
        expected: u32,
        actual: usize,
    },
    #[error("legend key '{key}' must be exactly one character")]
    LegendKey { key: String },
    #[error("tile '{symbol}' at ({x}, {y}) has no legend entry")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
    #[error("unknown terrain category '{name}'")]
    UnknownCategory { name: String },
    #[error("reservation {index} is invalid: {source}")]
    Reservation {
        index: usize,
        #[source]
        source: ReservationError,
    },
    #[error(transparent)]
    TileMap(#[from] TileMapError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioReservation {
    pub rect: TileRect,
    pub owner: OwnerId,
}

/// Map layout plus the queries to replay against it.
///
/// `rows` hold one legend symbol per tile, top row first. A legend entry of
/// `null` leaves the tile without a terrain category.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub width: u32,
    pub height: u32,
    pub rows: Vec<String>,
    pub legend: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub reservations: Vec<ScenarioReservation>,
    #[serde(default)]
    pub queries: Vec<Query>,
}

impl Scenario {
    pub fn from_json(raw: &str) -> Result<Self, ScenarioError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, Scenario>(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                ScenarioError::Parse(source.to_string())
            } else {
                ScenarioError::Parse(format!("at {path}: {source}"))
            }
        })
    }

    /// Builds the map, derives collisions from `table`, then applies reservations.
    pub fn build_map(&self, table: &PathDataTable) -> Result<StrategyMap, ScenarioError> {
        let legend = self.resolve_legend(table)?;

        if self.rows.len() != self.height as usize {
            return Err(ScenarioError::RowCount {
                expected: self.height,
                actual: self.rows.len(),
            });
        }

        let mut categories = Vec::with_capacity(self.width as usize * self.height as usize);
        for (y, row) in self.rows.iter().enumerate() {
            let symbols = row.chars().collect::<Vec<_>>();
            if symbols.len() != self.width as usize {
                return Err(ScenarioError::RowWidth {
                    row: y,
                    expected: self.width,
                    actual: symbols.len(),
                });
            }
            for (x, symbol) in symbols.into_iter().enumerate() {
                let category = legend
                    .get(&symbol)
                    .copied()
                    .ok_or(ScenarioError::UnknownSymbol { symbol, x, y })?;
                categories.push(category);
            }
        }

        let tiles = TileMap::from_categories(self.width, self.height, categories)?;
        let mut map = StrategyMap::from_tile_map(tiles);
        map.load_collisions(table);

        for (index, reservation) in self.reservations.iter().enumerate() {
            map.reserve_area(reservation.rect, reservation.owner)
                .map_err(|source| ScenarioError::Reservation { index, source })?;
        }

        Ok(map)
    }

    fn resolve_legend(
        &self,
        table: &PathDataTable,
    ) -> Result<BTreeMap<char, Option<CategoryId>>, ScenarioError> {
        let mut legend = BTreeMap::new();
        for (key, category) in &self.legend {
            let mut chars = key.chars();
            let (Some(symbol), None) = (chars.next(), chars.next()) else {
                return Err(ScenarioError::LegendKey { key: key.clone() });
            };
            let category = match category {
                Some(name) => Some(resolve_category(table, name)?),
                None => None,
            };
            legend.insert(symbol, category);
        }
        Ok(legend)
    }
}

pub(crate) fn resolve_category(
    table: &PathDataTable,
    name: &str,
) -> Result<CategoryId, ScenarioError> {
    table
        .category_id_by_name(name)
        .ok_or_else(|| ScenarioError::UnknownCategory {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tile_engine::parse_path_data;

    use super::*;

    fn table() -> PathDataTable {
        parse_path_data(
            Path::new("pathfinding.xml"),
            r#"<Pathfinding>
                <pathfindable category="ground" cost="1" block="false"/>
                <pathfindable category="water" cost="0" block="true"/>
            </Pathfinding>"#,
        )
        .expect("path data")
    }

    fn scenario(rows: &[&str]) -> Scenario {
        Scenario {
            width: rows.first().map_or(0, |row| row.chars().count() as u32),
            height: rows.len() as u32,
            rows: rows.iter().map(|row| row.to_string()).collect(),
            legend: BTreeMap::from([
                ("g".to_string(), Some("ground".to_string())),
                ("~".to_string(), Some("water".to_string())),
                (".".to_string(), None),
            ]),
            reservations: Vec::new(),
            queries: Vec::new(),
        }
    }

    #[test]
    fn builds_map_with_collisions_and_reservations() {
        let mut scenario = scenario(&["gg~", "g.g"]);
        scenario.reservations.push(ScenarioReservation {
            rect: TileRect::new(0, 1, 1, 1),
            owner: OwnerId(3),
        });
        let map = scenario.build_map(&table()).expect("map");
        assert_eq!((map.width(), map.height()), (3, 2));
        assert!(map.tile(2, 0).expect("tile").is_blocking());
        assert!(map.tile_category(1, 1).is_none());
        assert_eq!(map.reservation(0, 1), Some(OwnerId(3)));
        assert!(map.is_area_available(0, 0, 2, 1, OwnerId::NONE));
    }

    #[test]
    fn row_count_must_match_height() {
        let mut scenario = scenario(&["gg", "gg"]);
        scenario.height = 3;
        let err = scenario.build_map(&table()).expect_err("err");
        assert!(matches!(
            err,
            ScenarioError::RowCount {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn row_width_must_match_width() {
        let scenario = scenario(&["ggg", "gg"]);
        let err = scenario.build_map(&table()).expect_err("err");
        assert!(matches!(err, ScenarioError::RowWidth { row: 1, .. }));
    }

    #[test]
    fn unknown_symbol_reports_position() {
        let scenario = scenario(&["gg", "gx"]);
        let err = scenario.build_map(&table()).expect_err("err");
        assert!(matches!(
            err,
            ScenarioError::UnknownSymbol {
                symbol: 'x',
                x: 1,
                y: 1
            }
        ));
    }

    #[test]
    fn legend_category_must_exist() {
        let mut scenario = scenario(&["g"]);
        scenario
            .legend
            .insert("l".to_string(), Some("lava".to_string()));
        let err = scenario.build_map(&table()).expect_err("err");
        assert!(matches!(err, ScenarioError::UnknownCategory { ref name } if name == "lava"));
    }

    #[test]
    fn legend_keys_are_single_characters() {
        let mut scenario = scenario(&["g"]);
        scenario
            .legend
            .insert("gg".to_string(), Some("ground".to_string()));
        let err = scenario.build_map(&table()).expect_err("err");
        assert!(matches!(err, ScenarioError::LegendKey { .. }));
    }

    #[test]
    fn reservation_outside_map_errors() {
        let mut scenario = scenario(&["gg"]);
        scenario.reservations.push(ScenarioReservation {
            rect: TileRect::new(1, 0, 2, 1),
            owner: OwnerId(1),
        });
        let err = scenario.build_map(&table()).expect_err("err");
        assert!(matches!(err, ScenarioError::Reservation { index: 0, .. }));
    }

    #[test]
    fn parse_error_names_the_failing_path() {
        let err = Scenario::from_json(
            r#"{"width": 1, "height": 1, "rows": ["g"], "legend": {"g": "ground"},
                "reservations": [{"rect": {"x": 0, "y": 0, "width": 1, "height": 1}, "owner": "seven"}]}"#,
        )
        .expect_err("err");
        let message = err.to_string();
        assert!(message.contains("reservations[0].owner"), "{message}");
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let err = Scenario::from_json(
            r#"{"width": 1, "height": 1, "rows": ["g"], "legend": {}, "weather": "rain"}"#,
        )
        .expect_err("err");
        assert!(matches!(err, ScenarioError::Parse(_)));
    }
}
