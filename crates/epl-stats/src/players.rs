// Player statistics table loading.
//
// Reads the FBref-derived per-player CSV. Headers and cells are trimmed.
// Every original column is kept verbatim in `raw` so the enriched export can
// reproduce the input; the typed fields feed the analysis stages.

use epl_core::table::{parse_age, parse_number, Cell, HeaderIndex, TableError};
use epl_core::{Metric, MetricValues};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::enrich::TeamFields;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One player-team row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub nation: String,
    /// Position label as written, e.g. `FW,MF`.
    pub position: String,
    /// First listed position, or the `Primary_Pos` column when present.
    pub primary_position: String,
    pub age: Option<f64>,
    pub stats: MetricValues,
    /// Team outcome fields; `None` until the join stage has run.
    pub outcome: Option<TeamFields>,
    /// Original cells, aligned with [`PlayerTable::headers`].
    pub raw: Vec<String>,
}

impl PlayerRecord {
    /// Build a record in code. Raw cells are left empty.
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        PlayerRecord {
            name: name.into(),
            team: team.into(),
            nation: String::new(),
            position: String::new(),
            primary_position: String::new(),
            age: None,
            stats: MetricValues::new(),
            outcome: None,
            raw: Vec::new(),
        }
    }

    pub fn with_stat(mut self, metric: Metric, value: f64) -> Self {
        self.stats.set(metric, Some(value));
        self
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_position(mut self, position: &str) -> Self {
        self.position = position.to_string();
        self.primary_position = primary_position_of(position);
        self
    }

    pub fn stat(&self, metric: Metric) -> Option<f64> {
        self.stats.get(metric)
    }
}

/// The loaded player table: normalized header row plus typed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTable {
    pub headers: Vec<String>,
    pub players: Vec<PlayerRecord>,
}

/// Counters describing how forgiving the load had to be.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    /// Non-empty cells in numeric columns that failed to parse.
    pub malformed_cells: usize,
    /// Metric columns absent from the header.
    pub missing_columns: Vec<Metric>,
    /// Rows dropped because the `Team` cell was blank.
    pub blank_team_rows: usize,
}

#[derive(Debug, Error)]
pub enum PlayerLoadError {
    #[error("player statistics file not found: {path}")]
    MissingInputFile { path: String },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("bad header in {path}: {source}")]
    Header { path: String, source: TableError },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First comma-separated token of a position label.
fn primary_position_of(label: &str) -> String {
    label
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Column positions resolved once per file.
struct Columns {
    player: usize,
    team: usize,
    nation: Option<usize>,
    pos: Option<usize>,
    primary_pos: Option<usize>,
    age: Option<usize>,
    metrics: Vec<(Metric, usize)>,
}

impl Columns {
    fn resolve(index: &HeaderIndex, report: &mut LoadReport) -> Result<Self, TableError> {
        let mut metrics = Vec::new();
        for metric in Metric::ALL {
            match index.position(metric.column()) {
                Some(pos) => metrics.push((metric, pos)),
                None => {
                    warn!("column `{}` not present; values treated as missing", metric);
                    report.missing_columns.push(metric);
                }
            }
        }
        Ok(Columns {
            player: index.require("Player")?,
            team: index.require("Team")?,
            nation: index.position("Nation"),
            pos: index.position("Pos"),
            primary_pos: index.position("Primary_Pos"),
            age: index.position("Age"),
            metrics,
        })
    }
}

fn cell<'a>(record: &'a csv::StringRecord, pos: Option<usize>) -> &'a str {
    pos.and_then(|p| record.get(p)).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Reader-based loader (enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<(PlayerTable, LoadReport), LoadFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);

    let index = HeaderIndex::new(reader.headers().map_err(LoadFailure::Csv)?.iter())
        .map_err(LoadFailure::Header)?;
    let mut report = LoadReport::default();
    let cols = Columns::resolve(&index, &mut report).map_err(LoadFailure::Header)?;

    let mut players = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(LoadFailure::Csv)?;
        let name = cell(&record, Some(cols.player)).to_string();
        let team = cell(&record, Some(cols.team));
        if team.is_empty() {
            debug!("row {}: `{}` has no team; skipped", row_no + 1, name);
            report.blank_team_rows += 1;
            continue;
        }

        let mut stats = MetricValues::new();
        for &(metric, pos) in &cols.metrics {
            let parsed = parse_number(cell(&record, Some(pos)));
            if parsed == Cell::Malformed {
                debug!(
                    "row {}: `{}` has malformed {} value {:?}",
                    row_no + 1,
                    name,
                    metric,
                    cell(&record, Some(pos))
                );
                report.malformed_cells += 1;
            }
            stats.set(metric, parsed.value());
        }

        let age = match parse_age(cell(&record, cols.age)) {
            Cell::Malformed => {
                report.malformed_cells += 1;
                None
            }
            other => other.value(),
        };

        let position = cell(&record, cols.pos).to_string();
        let primary_position = match cols.primary_pos {
            Some(p) if !cell(&record, Some(p)).is_empty() => cell(&record, Some(p)).to_string(),
            _ => primary_position_of(&position),
        };

        let mut raw: Vec<String> = record.iter().map(str::to_string).collect();
        raw.resize(index.len(), String::new());

        players.push(PlayerRecord {
            name,
            team: team.to_string(),
            nation: cell(&record, cols.nation).to_string(),
            position,
            primary_position,
            age,
            stats,
            outcome: None,
            raw,
        });
    }

    report.rows = players.len();
    if report.blank_team_rows > 0 {
        warn!(
            "{} rows with a blank team were dropped",
            report.blank_team_rows
        );
    }
    if report.malformed_cells > 0 {
        warn!(
            "{} malformed numeric cells across {} rows were treated as missing",
            report.malformed_cells, report.rows
        );
    }

    Ok((
        PlayerTable {
            headers: index.names().to_vec(),
            players,
        },
        report,
    ))
}

/// Path-free failure from the reader loader; the path is attached by the caller.
#[derive(Debug)]
enum LoadFailure {
    Csv(csv::Error),
    Header(TableError),
}

impl LoadFailure {
    fn with_path(self, path: &Path) -> PlayerLoadError {
        let path = path.display().to_string();
        match self {
            LoadFailure::Csv(source) => PlayerLoadError::Csv { path, source },
            LoadFailure::Header(source) => PlayerLoadError::Header { path, source },
        }
    }
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Load the player statistics CSV.
pub fn load_players(path: &Path) -> Result<(PlayerTable, LoadReport), PlayerLoadError> {
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PlayerLoadError::MissingInputFile {
                path: path.display().to_string(),
            }
        } else {
            PlayerLoadError::Io {
                path: path.display().to_string(),
                source: e,
            }
        }
    })?;
    let (table, report) = load_players_from_reader(file).map_err(|e| e.with_path(path))?;
    info!("loaded {} player rows from {}", report.rows, path.display());
    Ok((table, report))
}

/// Load player rows from any reader, e.g. an in-memory buffer.
pub fn load_players_from(rdr: impl Read) -> Result<(PlayerTable, LoadReport), PlayerLoadError> {
    load_players_from_reader(rdr).map_err(|e| e.with_path(Path::new("<reader>")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
