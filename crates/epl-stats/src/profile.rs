// Percentile ranks of a player within their primary-position group.

use epl_core::Metric;
use thiserror::Error;

use crate::players::PlayerRecord;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("no player named `{name}`")]
    UnknownPlayer { name: String },
}

/// One axis of the position profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAxis {
    GoalsPer90,
    AssistsPer90,
    ExpectedGoalsPer90,
    ExpectedAssistsPer90,
    /// Progressive carries plus progressive passes.
    ProgressiveActions,
}

impl ProfileAxis {
    pub const ALL: [ProfileAxis; 5] = [
        ProfileAxis::GoalsPer90,
        ProfileAxis::AssistsPer90,
        ProfileAxis::ExpectedGoalsPer90,
        ProfileAxis::ExpectedAssistsPer90,
        ProfileAxis::ProgressiveActions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProfileAxis::GoalsPer90 => "Goals per 90",
            ProfileAxis::AssistsPer90 => "Assists per 90",
            ProfileAxis::ExpectedGoalsPer90 => "xG per 90",
            ProfileAxis::ExpectedAssistsPer90 => "xAG per 90",
            ProfileAxis::ProgressiveActions => "Progressive Actions",
        }
    }

    fn value(self, p: &PlayerRecord) -> Option<f64> {
        match self {
            ProfileAxis::GoalsPer90 => p.stat(Metric::GoalsPer90),
            ProfileAxis::AssistsPer90 => p.stat(Metric::AssistsPer90),
            ProfileAxis::ExpectedGoalsPer90 => p.stat(Metric::ExpectedGoalsPer90),
            ProfileAxis::ExpectedAssistsPer90 => p.stat(Metric::ExpectedAssistsPer90),
            ProfileAxis::ProgressiveActions => {
                Some(p.stat(Metric::ProgressiveCarries)? + p.stat(Metric::ProgressivePasses)?)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub player: String,
    pub team: String,
    pub primary_position: String,
    /// Players sharing the primary position, the player included.
    pub group_size: usize,
    pub ranks: Vec<(ProfileAxis, Option<f64>)>,
}

/// Percentage of `group` at or below `value`. Missing entries count as
/// "not at or below" but stay in the denominator.
pub fn percentile_rank(group: &[Option<f64>], value: f64) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    let at_or_below = group
        .iter()
        .filter(|v| v.is_some_and(|v| v <= value))
        .count();
    at_or_below as f64 / group.len() as f64 * 100.0
}

/// Build the percentile profile for the first player called `name`
/// (restricted to `team` when given).
pub fn position_profile(
    players: &[PlayerRecord],
    name: &str,
    team: Option<&str>,
) -> Result<PlayerProfile, ProfileError> {
    let name = name.trim();
    let target = players
        .iter()
        .find(|p| p.name == name && team.map_or(true, |t| p.team.trim() == t.trim()))
        .ok_or_else(|| ProfileError::UnknownPlayer {
            name: name.to_string(),
        })?;

    let group: Vec<&PlayerRecord> = players
        .iter()
        .filter(|p| p.primary_position == target.primary_position)
        .collect();

    let ranks = ProfileAxis::ALL
        .iter()
        .map(|&axis| {
            let values: Vec<Option<f64>> = group.iter().map(|p| axis.value(p)).collect();
            let rank = axis.value(target).map(|v| percentile_rank(&values, v));
            (axis, rank)
        })
        .collect();

    Ok(PlayerProfile {
        player: target.name.clone(),
        team: target.team.clone(),
        primary_position: target.primary_position.clone(),
        group_size: group.len(),
        ranks,
    })
}
