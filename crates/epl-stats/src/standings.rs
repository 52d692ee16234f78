// Team season outcomes (final league table), keyed by team display name.
//
// The table is immutable once built. The built-in 2023/24 table mirrors the
// names used in the FBref-derived player export; a standings CSV can replace it.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One team's final outcome for the season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamOutcome {
    pub wins: u32,
    pub matches: u32,
    pub points: u32,
    /// Final league position, 1 = champion.
    pub position: u32,
}

impl TeamOutcome {
    /// Wins as a percentage of matches played, in [0, 100].
    pub fn win_rate(&self) -> f64 {
        self.wins as f64 / self.matches as f64 * 100.0
    }
}

/// Immutable name-keyed lookup of team outcomes.
#[derive(Debug, Clone)]
pub struct Standings {
    teams: HashMap<String, TeamOutcome>,
}

#[derive(Debug, Error)]
pub enum StandingsError {
    #[error("standings file not found: {path}")]
    MissingInputFile { path: String },

    #[error("failed to read standings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in standings: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid standings entry for `{team}`: {message}")]
    Invalid { team: String, message: String },
}

// ---------------------------------------------------------------------------
// Built-in 2023/24 table
// ---------------------------------------------------------------------------

/// `(team, wins, matches, points, position)` for the 2023/24 Premier League.
const SEASON_2023_24: [(&str, u32, u32, u32, u32); 20] = [
    ("Manchester City", 28, 38, 91, 1),
    ("Arsenal", 28, 38, 89, 2),
    ("Liverpool", 24, 38, 82, 3),
    ("Aston Villa", 20, 38, 68, 4),
    ("Tottenham Hotspur", 20, 38, 66, 5),
    ("Chelsea", 18, 38, 63, 6),
    ("Newcastle United", 18, 38, 60, 7),
    ("Manchester United", 18, 38, 60, 8),
    ("West Ham United", 14, 38, 52, 9),
    ("Crystal Palace", 13, 38, 49, 10),
    ("Brighton", 12, 38, 48, 11),
    ("Bournemouth", 13, 38, 48, 12),
    ("Fulham", 13, 38, 47, 13),
    ("Wolverhampton", 13, 38, 46, 14),
    ("Everton", 13, 38, 40, 15),
    ("Brentford", 10, 38, 39, 16),
    ("Nottingham Forest", 9, 38, 32, 17),
    ("Luton Town", 6, 38, 26, 18),
    ("Burnley", 5, 38, 24, 19),
    ("Sheffield United", 3, 38, 16, 20),
];

// ---------------------------------------------------------------------------
// Construction and lookup
// ---------------------------------------------------------------------------

impl Standings {
    /// Build a validated table. Names are trimmed; each name and each
    /// position must be unique, matches must be positive, wins ≤ matches.
    pub fn new<I, S>(entries: I) -> Result<Self, StandingsError>
    where
        I: IntoIterator<Item = (S, TeamOutcome)>,
        S: Into<String>,
    {
        let mut teams = HashMap::new();
        let mut positions = HashSet::new();
        for (name, outcome) in entries {
            let name = name.into().trim().to_string();
            let invalid = |message: String| StandingsError::Invalid {
                team: name.clone(),
                message,
            };
            if name.is_empty() {
                return Err(invalid("team name is empty".into()));
            }
            if outcome.matches == 0 {
                return Err(invalid("matches must be greater than 0".into()));
            }
            if outcome.wins > outcome.matches {
                return Err(invalid(format!(
                    "wins ({}) exceed matches ({})",
                    outcome.wins, outcome.matches
                )));
            }
            if !positions.insert(outcome.position) {
                return Err(invalid(format!(
                    "position {} is already taken",
                    outcome.position
                )));
            }
            if teams.insert(name.clone(), outcome).is_some() {
                return Err(invalid("team listed more than once".into()));
            }
        }
        Ok(Standings { teams })
    }

    /// The 2023/24 Premier League final table.
    pub fn season_2023_24() -> Self {
        let teams = SEASON_2023_24
            .iter()
            .map(|&(name, wins, matches, points, position)| {
                (
                    name.to_string(),
                    TeamOutcome {
                        wins,
                        matches,
                        points,
                        position,
                    },
                )
            })
            .collect();
        Standings { teams }
    }

    /// Exact lookup after trimming surrounding whitespace from `team`.
    pub fn get(&self, team: &str) -> Option<&TeamOutcome> {
        self.teams.get(team.trim())
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Entries ordered by league position.
    pub fn by_position(&self) -> Vec<(&str, &TeamOutcome)> {
        let mut rows: Vec<(&str, &TeamOutcome)> =
            self.teams.iter().map(|(k, v)| (k.as_str(), v)).collect();
        rows.sort_by_key(|(_, o)| o.position);
        rows
    }
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawStanding {
    Team: String,
    Wins: u32,
    Matches: u32,
    Points: u32,
    Position: u32,
}

fn load_standings_from_reader<R: Read>(rdr: R) -> Result<Standings, StandingsError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let mut entries = Vec::new();
    for result in reader.deserialize::<RawStanding>() {
        let raw = result?;
        entries.push((
            raw.Team,
            TeamOutcome {
                wins: raw.Wins,
                matches: raw.Matches,
                points: raw.Points,
                position: raw.Position,
            },
        ));
    }
    Standings::new(entries)
}

/// Load a standings CSV with columns `Team,Wins,Matches,Points,Position`.
pub fn load_standings(path: &Path) -> Result<Standings, StandingsError> {
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StandingsError::MissingInputFile {
                path: path.display().to_string(),
            }
        } else {
            StandingsError::Io {
                path: path.display().to_string(),
                source: e,
            }
        }
    })?;
    let standings = load_standings_from_reader(file)?;
    info!("loaded {} team outcomes from {}", standings.len(), path.display());
    Ok(standings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
