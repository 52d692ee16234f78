// Next-season extrapolation.
//
// Stateless formula: per-90 rate × 90s played × age factor. Younger players
// get a 10% bump, players over 30 a 5% decline. Counts round half-to-even.

use epl_core::table::round_to;
use epl_core::Metric;

use crate::players::PlayerRecord;

/// Share of this season's appearances assumed for next season.
const APPEARANCE_RETENTION: f64 = 0.95;

/// Age multiplier applied to every projected rate.
pub fn age_factor(age: Option<f64>) -> f64 {
    match age {
        Some(a) if a < 24.0 => 1.1,
        Some(a) if a > 30.0 => 0.95,
        _ => 1.0,
    }
}

/// Projected output for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonProjection {
    pub player: String,
    pub team: String,
    pub age: Option<f64>,
    pub age_factor: f64,
    pub matches: Option<u32>,
    pub goals: Option<i64>,
    pub assists: Option<i64>,
    pub expected_goals: Option<f64>,
    pub expected_assists: Option<f64>,
}

impl SeasonProjection {
    /// Projected goals + assists when both are known.
    pub fn goal_contributions(&self) -> Option<i64> {
        Some(self.goals? + self.assists?)
    }
}

fn extrapolate(player: &PlayerRecord, rate: Metric, factor: f64) -> Option<f64> {
    Some(player.stat(rate)? * player.stat(Metric::Nineties)? * factor)
}

/// Project one player's next season from this season's rates.
pub fn project_player(player: &PlayerRecord) -> SeasonProjection {
    let factor = age_factor(player.age);
    let count = |rate| extrapolate(player, rate, factor).map(|v| v.round_ties_even() as i64);
    SeasonProjection {
        player: player.name.clone(),
        team: player.team.clone(),
        age: player.age,
        age_factor: factor,
        matches: player
            .stat(Metric::MatchesPlayed)
            .map(|mp| (mp * APPEARANCE_RETENTION).floor() as u32),
        goals: count(Metric::GoalsPer90),
        assists: count(Metric::AssistsPer90),
        expected_goals: extrapolate(player, Metric::ExpectedGoalsPer90, factor)
            .map(|v| round_to(v, 2)),
        expected_assists: extrapolate(player, Metric::ExpectedAssistsPer90, factor)
            .map(|v| round_to(v, 2)),
    }
}

/// The `n` players with the highest projected goals + assists.
///
/// Players without a projected total sort last; ties keep input order.
pub fn top_projected(players: &[PlayerRecord], n: usize) -> Vec<SeasonProjection> {
    let mut projections: Vec<SeasonProjection> = players.iter().map(project_player).collect();
    projections.sort_by(|a, b| b.goal_contributions().cmp(&a.goal_contributions()));
    projections.truncate(n);
    projections
}
