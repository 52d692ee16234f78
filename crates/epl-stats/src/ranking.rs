// Ranking stage: top-k / bottom-k teams by win rate and per-metric group
// comparisons.
//
// Selection order for "top": win rate descending, then league position
// ascending, then team name. "Bottom" mirrors it: win rate ascending, then
// position descending, then team name.

use epl_core::config::ComparisonBasis;
use epl_core::Metric;
use std::cmp::Ordering;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::aggregate::{player_mean, TeamAggregate};
use crate::players::PlayerRecord;

#[derive(Debug, Error, PartialEq)]
pub enum RankingError {
    #[error("group size must be greater than 0")]
    EmptyGroup,

    #[error("no values for {metric} in the {group} group")]
    NoValues { metric: Metric, group: Group },

    #[error("percentage difference for {metric} is undefined: bottom mean is zero")]
    DivisionDegenerate { metric: Metric },
}

/// Which end of the table a group was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Top,
    Bottom,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Group::Top => "top",
            Group::Bottom => "bottom",
        })
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

fn top_order(a: &TeamAggregate, b: &TeamAggregate) -> Ordering {
    b.win_rate
        .total_cmp(&a.win_rate)
        .then(a.position.cmp(&b.position))
        .then_with(|| a.team.cmp(&b.team))
}

fn bottom_order(a: &TeamAggregate, b: &TeamAggregate) -> Ordering {
    a.win_rate
        .total_cmp(&b.win_rate)
        .then(b.position.cmp(&a.position))
        .then_with(|| a.team.cmp(&b.team))
}

fn select(
    teams: &[TeamAggregate],
    k: usize,
    order: fn(&TeamAggregate, &TeamAggregate) -> Ordering,
) -> Vec<&TeamAggregate> {
    let mut sorted: Vec<&TeamAggregate> = teams.iter().collect();
    sorted.sort_by(|a, b| order(a, b));
    sorted.truncate(k);
    sorted
}

/// The `k` teams with the highest win rate, best first. Returns every team
/// when fewer than `k` exist.
pub fn top_teams(teams: &[TeamAggregate], k: usize) -> Vec<&TeamAggregate> {
    select(teams, k, top_order)
}

/// The `k` teams with the lowest win rate, worst first.
pub fn bottom_teams(teams: &[TeamAggregate], k: usize) -> Vec<&TeamAggregate> {
    select(teams, k, bottom_order)
}

/// All teams ordered by league position; unmatched teams (position 0) last.
pub fn by_league_position(teams: &[TeamAggregate]) -> Vec<&TeamAggregate> {
    let mut sorted: Vec<&TeamAggregate> = teams.iter().collect();
    sorted.sort_by(|a, b| {
        (a.position == 0)
            .cmp(&(b.position == 0))
            .then(a.position.cmp(&b.position))
            .then_with(|| a.team.cmp(&b.team))
    });
    sorted
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Top-versus-bottom figures for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricComparison {
    pub metric: Metric,
    pub top_mean: f64,
    pub bottom_mean: f64,
    /// `top_mean - bottom_mean`
    pub difference: f64,
}

impl MetricComparison {
    /// Difference as a percentage of the bottom mean.
    pub fn percent_difference(&self) -> Result<f64, RankingError> {
        if self.bottom_mean == 0.0 {
            return Err(RankingError::DivisionDegenerate {
                metric: self.metric,
            });
        }
        Ok(self.difference / self.bottom_mean * 100.0)
    }
}

/// Group membership plus per-metric comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupComparison {
    pub basis: ComparisonBasis,
    pub top: Vec<String>,
    pub bottom: Vec<String>,
    pub metrics: Vec<MetricComparison>,
}

fn team_group_mean(
    group: &[&TeamAggregate],
    metric: Metric,
    which: Group,
) -> Result<f64, RankingError> {
    let values: Vec<f64> = group.iter().filter_map(|t| t.mean(metric)).collect();
    if values.is_empty() {
        return Err(RankingError::NoValues { metric, group: which });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

fn player_group_mean(
    group: &[&TeamAggregate],
    players: &[PlayerRecord],
    metric: Metric,
    which: Group,
) -> Result<f64, RankingError> {
    let names: HashSet<&str> = group.iter().map(|t| t.team.as_str()).collect();
    player_mean(players.iter().filter(|p| names.contains(p.team.trim())), metric)
        .ok_or(RankingError::NoValues { metric, group: which })
}

/// Compare the top and bottom `k` teams on each metric.
///
/// `players` is only consulted for [`ComparisonBasis::PlayerPool`].
pub fn compare_groups(
    teams: &[TeamAggregate],
    players: &[PlayerRecord],
    k: usize,
    metrics: &[Metric],
    basis: ComparisonBasis,
) -> Result<GroupComparison, RankingError> {
    if k == 0 {
        return Err(RankingError::EmptyGroup);
    }
    let top = top_teams(teams, k);
    let bottom = bottom_teams(teams, k);
    if top.is_empty() {
        return Err(RankingError::EmptyGroup);
    }

    let mut comparisons = Vec::with_capacity(metrics.len());
    for &metric in metrics {
        let (top_mean, bottom_mean) = match basis {
            ComparisonBasis::TeamMeans => (
                team_group_mean(&top, metric, Group::Top)?,
                team_group_mean(&bottom, metric, Group::Bottom)?,
            ),
            ComparisonBasis::PlayerPool => (
                player_group_mean(&top, players, metric, Group::Top)?,
                player_group_mean(&bottom, players, metric, Group::Bottom)?,
            ),
        };
        debug!("{}: top={:.3} bottom={:.3}", metric, top_mean, bottom_mean);
        comparisons.push(MetricComparison {
            metric,
            top_mean,
            bottom_mean,
            difference: top_mean - bottom_mean,
        });
    }

    Ok(GroupComparison {
        basis,
        top: top.iter().map(|t| t.team.clone()).collect(),
        bottom: bottom.iter().map(|t| t.team.clone()).collect(),
        metrics: comparisons,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
