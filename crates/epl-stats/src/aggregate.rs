// Aggregation stage: reduce enriched player rows to one row per team.
//
// Metrics reduce to the mean of the team's non-missing values. Outcome fields
// are constant per team and pass through from the first row; every later row
// is checked against it.

use epl_core::{Metric, MetricValues};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use crate::enrich::TeamFields;
use crate::players::PlayerRecord;

/// Per-team reduction of player rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamAggregate {
    pub team: String,
    pub player_count: usize,
    pub win_rate: f64,
    pub position: u32,
    pub points: u32,
    pub matched: bool,
    /// Mean per metric; `None` when no player on the team had a value.
    pub means: MetricValues,
}

impl TeamAggregate {
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.means.get(metric)
    }
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("player `{player}` ({team}) has no team outcome; run the join stage first")]
    NotEnriched { player: String, team: String },

    #[error("team `{team}` has conflicting outcome fields across its player rows")]
    InconsistentOutcome { team: String },
}

/// Running sums for one team.
struct Accumulator {
    team: String,
    outcome: TeamFields,
    rows: usize,
    sums: [f64; Metric::COUNT],
    counts: [usize; Metric::COUNT],
}

impl Accumulator {
    fn new(team: &str, outcome: TeamFields) -> Self {
        Accumulator {
            team: team.to_string(),
            outcome,
            rows: 0,
            sums: [0.0; Metric::COUNT],
            counts: [0; Metric::COUNT],
        }
    }

    fn add(&mut self, player: &PlayerRecord) {
        self.rows += 1;
        for (metric, value) in player.stats.iter() {
            if let Some(v) = value {
                self.sums[metric.index()] += v;
                self.counts[metric.index()] += 1;
            }
        }
    }

    fn finish(self) -> TeamAggregate {
        let mut means = MetricValues::new();
        for metric in Metric::ALL {
            let n = self.counts[metric.index()];
            if n > 0 {
                means.set(metric, Some(self.sums[metric.index()] / n as f64));
            }
        }
        TeamAggregate {
            team: self.team,
            player_count: self.rows,
            win_rate: self.outcome.win_rate,
            position: self.outcome.position,
            points: self.outcome.points,
            matched: self.outcome.matched,
            means,
        }
    }
}

/// Group enriched players by team name and reduce each group.
///
/// Groups come out in order of first appearance. The set of teams is exactly
/// the distinct team names present in `players`.
pub fn aggregate_by_team(players: &[PlayerRecord]) -> Result<Vec<TeamAggregate>, AggregateError> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Accumulator> = Vec::new();

    for player in players {
        let outcome = player.outcome.ok_or_else(|| AggregateError::NotEnriched {
            player: player.name.clone(),
            team: player.team.clone(),
        })?;
        let team = player.team.as_str();
        let slot = *slots.entry(team).or_insert_with(|| {
            groups.push(Accumulator::new(team, outcome));
            groups.len() - 1
        });
        let group = &mut groups[slot];
        if group.outcome != outcome {
            return Err(AggregateError::InconsistentOutcome {
                team: team.to_string(),
            });
        }
        group.add(player);
    }

    let teams: Vec<TeamAggregate> = groups.into_iter().map(Accumulator::finish).collect();
    info!("aggregated {} player rows into {} teams", players.len(), teams.len());
    Ok(teams)
}

/// Mean of the non-missing values of `metric` across `players`.
pub fn player_mean<'a, I>(players: I, metric: Metric) -> Option<f64>
where
    I: IntoIterator<Item = &'a PlayerRecord>,
{
    let (sum, n) = players
        .into_iter()
        .filter_map(|p| p.stat(metric))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
