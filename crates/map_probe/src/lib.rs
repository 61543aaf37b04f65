use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;
use tile_engine::{
    load_path_data, resolve_app_paths, AppPaths, PathDataError, PathDataTable, StartupError,
    StrategyMap,
};
use tracing::info;

pub mod query;
pub mod scenario;

pub use query::{evaluate, ProbeLine, Query, QueryAnswer};
pub use scenario::{Scenario, ScenarioError, ScenarioReservation};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Project root; resolved from the environment when absent.
    pub root: Option<PathBuf>,
    /// Path data XML; defaults to `data/pathfinding.xml` under the root.
    pub path_data: Option<PathBuf>,
    /// Scenario JSON. A relative path that does not exist is looked up in
    /// `data/scenarios/` under the root.
    pub scenario: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Help,
    Run(ProbeOptions),
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    PathData(#[from] PathDataError),
    #[error("failed to read scenario '{path}': {source}")]
    ReadScenario {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("scenario '{path}': {source}")]
    Scenario {
        path: PathBuf,
        #[source]
        source: ScenarioError,
    },
    #[error("query {index} failed: {source}")]
    Query {
        index: usize,
        #[source]
        source: ScenarioError,
    },
    #[error("failed to encode probe output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write probe output: {0}")]
    Write(#[from] io::Error),
}

/// Everything a query needs, built once per run and passed by reference.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub path_data: PathDataTable,
    pub map: StrategyMap,
    pub scenario: Scenario,
}

impl ProbeContext {
    pub fn load(options: &ProbeOptions) -> Result<Self, ProbeError> {
        let mut paths = options.root.clone().map(AppPaths::from_root);

        let path_data_file = match &options.path_data {
            Some(path) => path.clone(),
            None => app_paths(&mut paths)?.path_data_file.clone(),
        };
        let path_data = load_path_data(&path_data_file)?;

        let scenario_file = if options.scenario.is_absolute() || options.scenario.exists() {
            options.scenario.clone()
        } else {
            app_paths(&mut paths)?.scenarios_dir.join(&options.scenario)
        };
        let raw = fs::read_to_string(&scenario_file).map_err(|source| ProbeError::ReadScenario {
            path: scenario_file.clone(),
            source,
        })?;
        let scenario = Scenario::from_json(&raw).map_err(|source| ProbeError::Scenario {
            path: scenario_file.clone(),
            source,
        })?;
        let map = scenario
            .build_map(&path_data)
            .map_err(|source| ProbeError::Scenario {
                path: scenario_file.clone(),
                source,
            })?;
        info!(
            scenario = %scenario_file.display(),
            width = map.width(),
            height = map.height(),
            reserved_tiles = map.reservations().reserved_count(),
            query_count = scenario.queries.len(),
            "scenario_loaded"
        );

        Ok(Self {
            path_data,
            map,
            scenario,
        })
    }

    pub fn answer_all(&self) -> Result<Vec<ProbeLine>, ProbeError> {
        self.scenario
            .queries
            .iter()
            .enumerate()
            .map(|(index, query)| {
                evaluate(query, &self.map, &self.path_data)
                    .map(|answer| ProbeLine {
                        query: index,
                        answer,
                    })
                    .map_err(|source| ProbeError::Query { index, source })
            })
            .collect()
    }
}

/// Resolves the project layout on first use.
fn app_paths(paths: &mut Option<AppPaths>) -> Result<&AppPaths, StartupError> {
    let resolved = match paths.take() {
        Some(resolved) => resolved,
        None => resolve_app_paths()?,
    };
    Ok(paths.insert(resolved))
}

/// Loads the scenario and writes one JSON line per query. Returns the number
/// of answered queries.
pub fn run<W: Write>(options: &ProbeOptions, out: &mut W) -> Result<usize, ProbeError> {
    let context = ProbeContext::load(options)?;
    let lines = context.answer_all()?;
    for line in &lines {
        serde_json::to_writer(&mut *out, line)?;
        writeln!(out)?;
    }
    out.flush()?;
    info!(answered = lines.len(), "probe_finished");
    Ok(lines.len())
}

pub fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        return Ok(CliCommand::Help);
    }

    let mut root = None;
    let mut path_data = None;
    let mut scenario = None;
    let mut index = 0usize;
    while index < args.len() {
        let flag = args[index].as_str();
        let value = || {
            args.get(index + 1)
                .map(PathBuf::from)
                .ok_or_else(|| format!("missing value for {flag}"))
        };
        match flag {
            "--root" => root = Some(value()?),
            "--path-data" => path_data = Some(value()?),
            "--scenario" => scenario = Some(value()?),
            "-h" | "--help" => return Ok(CliCommand::Help),
            other => return Err(format!("unknown argument '{other}'\n\n{}", usage_text())),
        }
        index += 2;
    }

    let scenario = scenario.ok_or_else(|| format!("missing --scenario\n\n{}", usage_text()))?;
    Ok(CliCommand::Run(ProbeOptions {
        root,
        path_data,
        scenario,
    }))
}

pub fn usage_text() -> String {
    [
        "usage: map_probe --scenario <file.json> [--path-data <file.xml>] [--root <dir>]",
        "",
        "Replays the queries of a map scenario and prints one JSON line per answer.",
        "",
        "  --scenario   scenario JSON (relative names fall back to <root>/data/scenarios/)",
        "  --path-data  terrain path data XML (default <root>/data/pathfinding.xml)",
        "  --root       project root (default: $TILE_ENGINE_ROOT or detected from the binary)",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    const PATH_DATA_XML: &str = r#"<Pathfinding>
    <pathfindable category="ground" cost="1" block="false"/>
    <pathfindable category="tree" cost="3" block="true"/>
</Pathfinding>"#;

    const SCENARIO_JSON: &str = r#"{
        "width": 5,
        "height": 5,
        "rows": ["Tgggg", "ggggg", "ggggg", "ggggg", "ggggg"],
        "legend": {"g": "ground", "T": "tree"},
        "reservations": [{"rect": {"x": 2, "y": 2, "width": 1, "height": 1}, "owner": 7}],
        "queries": [
            {"kind": "area_available", "rect": {"x": 2, "y": 2, "width": 1, "height": 1}},
            {"kind": "area_available", "rect": {"x": 2, "y": 2, "width": 1, "height": 1}, "ignore_owner": 7},
            {"kind": "free_tile_around", "x": 0, "y": 0, "radius": 3},
            {"kind": "closest_by_collision",
             "source": {"x": 1, "y": 1, "width": 1, "height": 1},
             "destination": {"x": 1, "y": 1, "width": 1, "height": 1},
             "category": "tree", "radius": 2}
        ]
    }"#;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    fn write_project(root: &Path) {
        let data = root.join("data");
        fs::create_dir_all(data.join("scenarios")).expect("mkdir");
        fs::write(root.join("Cargo.toml"), "[workspace]\n").expect("cargo");
        fs::write(data.join("pathfinding.xml"), PATH_DATA_XML).expect("xml");
        fs::write(data.join("scenarios").join("open.json"), SCENARIO_JSON).expect("json");
    }

    #[test]
    fn parse_args_requires_scenario() {
        let err = parse_args(&args(&["--root", "/tmp"])).expect_err("err");
        assert!(err.contains("missing --scenario"));
    }

    #[test]
    fn parse_args_reads_all_flags() {
        let command = parse_args(&args(&[
            "--scenario",
            "open.json",
            "--path-data",
            "terrain.xml",
            "--root",
            "/srv/maps",
        ]))
        .expect("args");
        assert_eq!(
            command,
            CliCommand::Run(ProbeOptions {
                root: Some(PathBuf::from("/srv/maps")),
                path_data: Some(PathBuf::from("terrain.xml")),
                scenario: PathBuf::from("open.json"),
            })
        );
    }

    #[test]
    fn parse_args_rejects_unknown_and_dangling_flags() {
        assert!(parse_args(&args(&["--speed", "2"])).is_err());
        let err = parse_args(&args(&["--scenario"])).expect_err("err");
        assert!(err.contains("missing value for --scenario"));
        assert_eq!(parse_args(&args(&["--help"])), Ok(CliCommand::Help));
    }

    #[test]
    fn run_prints_one_line_per_query() {
        let temp = TempDir::new().expect("temp");
        write_project(temp.path());
        let options = ProbeOptions {
            root: Some(temp.path().to_path_buf()),
            path_data: None,
            scenario: PathBuf::from("open.json"),
        };
        let mut out = Vec::new();
        let answered = run(&options, &mut out).expect("run");
        assert_eq!(answered, 4);

        let text = String::from_utf8(out).expect("utf8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                r#"{"query":0,"kind":"area_available","available":false}"#,
                r#"{"query":1,"kind":"area_available","available":true}"#,
                r#"{"query":2,"kind":"free_tile_around","tile":{"x":0,"y":1}}"#,
                r#"{"query":3,"kind":"closest_by_collision","tile":{"x":0,"y":0}}"#,
            ]
        );
    }

    #[test]
    fn explicit_files_skip_root_resolution() {
        let temp = TempDir::new().expect("temp");
        let xml = temp.path().join("terrain.xml");
        let json = temp.path().join("scenario.json");
        fs::write(&xml, PATH_DATA_XML).expect("xml");
        fs::write(&json, SCENARIO_JSON).expect("json");
        let context = ProbeContext::load(&ProbeOptions {
            root: None,
            path_data: Some(xml),
            scenario: json,
        })
        .expect("context");
        assert_eq!(context.path_data.len(), 2);
        assert_eq!(context.answer_all().expect("answers").len(), 4);
    }

    #[test]
    fn missing_scenario_reports_path() {
        let temp = TempDir::new().expect("temp");
        write_project(temp.path());
        let options = ProbeOptions {
            root: Some(temp.path().to_path_buf()),
            path_data: None,
            scenario: PathBuf::from("absent.json"),
        };
        let err = run(&options, &mut Vec::new()).expect_err("err");
        assert!(matches!(err, ProbeError::ReadScenario { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn invalid_scenario_is_wrapped_with_its_path() {
        let temp = TempDir::new().expect("temp");
        write_project(temp.path());
        fs::write(
            temp.path().join("data").join("scenarios").join("bad.json"),
            r#"{"width": 2, "height": 1, "rows": ["g"], "legend": {"g": "ground"}}"#,
        )
        .expect("write");
        let options = ProbeOptions {
            root: Some(temp.path().to_path_buf()),
            path_data: None,
            scenario: PathBuf::from("bad.json"),
        };
        let err = run(&options, &mut Vec::new()).expect_err("err");
        assert!(matches!(
            err,
            ProbeError::Scenario {
                source: ScenarioError::RowWidth { .. },
                ..
            }
        ));
    }

    #[test]
    fn shipped_outpost_scenario_answers() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..");
        let options = ProbeOptions {
            root: Some(root),
            path_data: None,
            scenario: PathBuf::from("outpost.json"),
        };
        let mut out = Vec::new();
        assert_eq!(run(&options, &mut out).expect("run"), 11);

        let text = String::from_utf8(out).expect("utf8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], r#"{"query":0,"kind":"area_available","available":false}"#);
        assert_eq!(lines[1], r#"{"query":1,"kind":"area_available","available":true}"#);
        assert_eq!(
            lines[2],
            r#"{"query":2,"kind":"free_tile_around","tile":{"x":0,"y":2}}"#
        );
        assert_eq!(
            lines[5],
            r#"{"query":5,"kind":"closest_by_collision","tile":{"x":5,"y":4}}"#
        );
        assert_eq!(lines[7], r#"{"query":7,"kind":"is_blocked","blocked":true}"#);
        assert_eq!(lines[8], r#"{"query":8,"kind":"is_blocked","blocked":false}"#);
        assert_eq!(lines[9], r#"{"query":9,"kind":"traversal_cost","cost":0.5}"#);
        assert_eq!(lines[10], r#"{"query":10,"kind":"traversal_cost","cost":null}"#);
    }
}
