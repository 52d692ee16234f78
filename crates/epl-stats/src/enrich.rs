// Join stage: attach each player's team outcome (win rate, position, points).
//
// Unmatched team names fall back to zeros and are flagged `matched = false`
// so reports can tell them apart from a genuine zero-win team.

use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::players::PlayerRecord;
use crate::standings::Standings;

/// Column names written by the enriched export.
pub const WIN_RATE_COLUMN: &str = "Team_Win_Rate";
pub const POSITION_COLUMN: &str = "Team_Position";
pub const POINTS_COLUMN: &str = "Team_Points";

/// Team-level fields copied onto every player of that team.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamFields {
    pub win_rate: f64,
    pub position: u32,
    pub points: u32,
    /// False when the team name had no standings entry and zeros were used.
    pub matched: bool,
}

impl TeamFields {
    /// Zero default for a team missing from the standings.
    pub const UNMATCHED: TeamFields = TeamFields {
        win_rate: 0.0,
        position: 0,
        points: 0,
        matched: false,
    };

    pub fn lookup(standings: &Standings, team: &str) -> TeamFields {
        match standings.get(team) {
            Some(o) => TeamFields {
                win_rate: o.win_rate(),
                position: o.position,
                points: o.points,
                matched: true,
            },
            None => TeamFields::UNMATCHED,
        }
    }
}

/// Team names in `players` with no standings entry, sorted.
pub fn unmatched_teams(players: &[PlayerRecord], standings: &Standings) -> BTreeSet<String> {
    players
        .iter()
        .filter(|p| standings.get(&p.team).is_none())
        .map(|p| p.team.trim().to_string())
        .collect()
}

/// Return a copy of `players` with team outcome fields attached.
///
/// Same length and order as the input. Re-running on already-enriched rows
/// overwrites the fields with identical values.
pub fn enrich(players: &[PlayerRecord], standings: &Standings) -> Vec<PlayerRecord> {
    let enriched: Vec<PlayerRecord> = players
        .iter()
        .map(|p| {
            let mut row = p.clone();
            row.team = p.team.trim().to_string();
            row.outcome = Some(TeamFields::lookup(standings, &row.team));
            row
        })
        .collect();

    let unmatched = unmatched_teams(players, standings);
    for team in &unmatched {
        let rows = enriched.iter().filter(|p| &p.team == team).count();
        warn!(
            "team `{}` not found in standings; {} player rows use zero win rate/position/points",
            team, rows
        );
    }
    info!(
        "enriched {} player rows ({} unmatched team names)",
        enriched.len(),
        unmatched.len()
    );
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::TeamOutcome;
    use epl_core::Metric;

    fn players() -> Vec<PlayerRecord> {
        vec![
            PlayerRecord::new("Martin Odegaard", "Arsenal").with_stat(Metric::GoalsPer90, 0.25),
            PlayerRecord::new("Phil Foden", " Manchester City ").with_stat(Metric::GoalsPer90, 0.55),
            PlayerRecord::new("Someone", "Ipswich Town"),
        ]
    }

    #[test]
    fn attaches_outcome_fields() {
        let out = enrich(&players(), &Standings::season_2023_24());
        assert_eq!(out.len(), 3);
        let arsenal = out[0].outcome.unwrap();
        assert!((arsenal.win_rate - 73.684_210_526).abs() < 1e-6);
        assert_eq!(arsenal.position, 2);
        assert_eq!(arsenal.points, 89);
        assert!(arsenal.matched);
    }

    #[test]
    fn preserves_order_and_other_fields() {
        let input = players();
        let out = enrich(&input, &Standings::season_2023_24());
        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Martin Odegaard", "Phil Foden", "Someone"]);
        assert_eq!(out[1].stat(Metric::GoalsPer90), Some(0.55));
    }

    #[test]
    fn untrimmed_team_name_matches_after_normalization() {
        let out = enrich(&players(), &Standings::season_2023_24());
        assert_eq!(out[1].team, "Manchester City");
        assert_eq!(out[1].outcome.unwrap().position, 1);
    }

    #[test]
    fn unmatched_team_gets_flagged_zero_default() {
        let out = enrich(&players(), &Standings::season_2023_24());
        assert_eq!(out[2].outcome, Some(TeamFields::UNMATCHED));
        assert!(!out[2].outcome.unwrap().matched);
    }

    #[test]
    fn genuine_zero_win_team_stays_matched() {
        let standings = Standings::new([(
            "Derby County",
            TeamOutcome {
                wins: 0,
                matches: 38,
                points: 11,
                position: 20,
            },
        )])
        .unwrap();
        let out = enrich(&[PlayerRecord::new("X", "Derby County")], &standings);
        let fields = out[0].outcome.unwrap();
        assert_eq!(fields.win_rate, 0.0);
        assert!(fields.matched);
    }

    #[test]
    fn enrichment_is_idempotent() {
        let standings = Standings::season_2023_24();
        let once = enrich(&players(), &standings);
        let twice = enrich(&once, &standings);
        assert_eq!(once, twice);
    }

    #[test]
    fn unmatched_names_listed_once() {
        let mut input = players();
        input.push(PlayerRecord::new("Another", "Ipswich Town "));
        let names = unmatched_teams(&input, &Standings::season_2023_24());
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["Ipswich Town"]);
    }
}
