// Catalogue of numeric player performance columns.
//
// Every metric maps to exactly one column of the player statistics CSV. The
// config file names metrics by that column name, so serde renames match the
// header text verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A numeric performance column carried on every player row.
///
/// Variant order is the declaration order used for stable tie-breaks when
/// metrics are ranked against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "MP")]
    MatchesPlayed,
    #[serde(rename = "Starts")]
    Starts,
    #[serde(rename = "90s")]
    Nineties,
    #[serde(rename = "Gls")]
    Goals,
    #[serde(rename = "Ast")]
    Assists,
    #[serde(rename = "G+A")]
    GoalsAssists,
    #[serde(rename = "Gls_90")]
    GoalsPer90,
    #[serde(rename = "Ast_90")]
    AssistsPer90,
    #[serde(rename = "Contributions_90")]
    ContributionsPer90,
    #[serde(rename = "xG")]
    ExpectedGoals,
    #[serde(rename = "xG_90")]
    ExpectedGoalsPer90,
    #[serde(rename = "Performance_vs_xG")]
    PerformanceVsXg,
    #[serde(rename = "xAG")]
    ExpectedAssists,
    #[serde(rename = "xAG_90")]
    ExpectedAssistsPer90,
    #[serde(rename = "Performance_vs_xAG")]
    PerformanceVsXag,
    #[serde(rename = "PrgC")]
    ProgressiveCarries,
    #[serde(rename = "PrgP")]
    ProgressivePasses,
    #[serde(rename = "CrdY")]
    YellowCards,
    #[serde(rename = "CrdR")]
    RedCards,
    #[serde(rename = "Minutes_per_Goal")]
    MinutesPerGoal,
    #[serde(rename = "Minutes_per_Assist")]
    MinutesPerAssist,
}

impl Metric {
    pub const COUNT: usize = 21;

    /// All metrics in declaration order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::MatchesPlayed,
        Metric::Starts,
        Metric::Nineties,
        Metric::Goals,
        Metric::Assists,
        Metric::GoalsAssists,
        Metric::GoalsPer90,
        Metric::AssistsPer90,
        Metric::ContributionsPer90,
        Metric::ExpectedGoals,
        Metric::ExpectedGoalsPer90,
        Metric::PerformanceVsXg,
        Metric::ExpectedAssists,
        Metric::ExpectedAssistsPer90,
        Metric::PerformanceVsXag,
        Metric::ProgressiveCarries,
        Metric::ProgressivePasses,
        Metric::YellowCards,
        Metric::RedCards,
        Metric::MinutesPerGoal,
        Metric::MinutesPerAssist,
    ];

    /// Metrics correlated against win rate when the config does not say otherwise.
    pub const DEFAULT_CORRELATED: [Metric; 9] = [
        Metric::GoalsPer90,
        Metric::AssistsPer90,
        Metric::ContributionsPer90,
        Metric::ExpectedGoalsPer90,
        Metric::ExpectedAssistsPer90,
        Metric::PerformanceVsXg,
        Metric::PerformanceVsXag,
        Metric::ProgressiveCarries,
        Metric::ProgressivePasses,
    ];

    /// Metrics compared between the top and bottom groups by default.
    pub const DEFAULT_COMPARED: [Metric; 4] = [
        Metric::GoalsPer90,
        Metric::AssistsPer90,
        Metric::ContributionsPer90,
        Metric::ProgressivePasses,
    ];

    /// Position of this metric in [`Metric::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column header used by the player statistics CSV.
    pub fn column(self) -> &'static str {
        match self {
            Metric::MatchesPlayed => "MP",
            Metric::Starts => "Starts",
            Metric::Nineties => "90s",
            Metric::Goals => "Gls",
            Metric::Assists => "Ast",
            Metric::GoalsAssists => "G+A",
            Metric::GoalsPer90 => "Gls_90",
            Metric::AssistsPer90 => "Ast_90",
            Metric::ContributionsPer90 => "Contributions_90",
            Metric::ExpectedGoals => "xG",
            Metric::ExpectedGoalsPer90 => "xG_90",
            Metric::PerformanceVsXg => "Performance_vs_xG",
            Metric::ExpectedAssists => "xAG",
            Metric::ExpectedAssistsPer90 => "xAG_90",
            Metric::PerformanceVsXag => "Performance_vs_xAG",
            Metric::ProgressiveCarries => "PrgC",
            Metric::ProgressivePasses => "PrgP",
            Metric::YellowCards => "CrdY",
            Metric::RedCards => "CrdR",
            Metric::MinutesPerGoal => "Minutes_per_Goal",
            Metric::MinutesPerAssist => "Minutes_per_Assist",
        }
    }

    /// Human-readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Metric::MatchesPlayed => "Matches Played",
            Metric::Starts => "Starts",
            Metric::Nineties => "90s Played",
            Metric::Goals => "Goals",
            Metric::Assists => "Assists",
            Metric::GoalsAssists => "Goals + Assists",
            Metric::GoalsPer90 => "Goals per 90",
            Metric::AssistsPer90 => "Assists per 90",
            Metric::ContributionsPer90 => "Goal Contributions per 90",
            Metric::ExpectedGoals => "Expected Goals",
            Metric::ExpectedGoalsPer90 => "Expected Goals per 90",
            Metric::PerformanceVsXg => "Performance vs xG",
            Metric::ExpectedAssists => "Expected Assists",
            Metric::ExpectedAssistsPer90 => "Expected Assists per 90",
            Metric::PerformanceVsXag => "Performance vs xAG",
            Metric::ProgressiveCarries => "Progressive Carries",
            Metric::ProgressivePasses => "Progressive Passes",
            Metric::YellowCards => "Yellow Cards",
            Metric::RedCards => "Red Cards",
            Metric::MinutesPerGoal => "Minutes per Goal",
            Metric::MinutesPerAssist => "Minutes per Assist",
        }
    }

    /// Look up a metric by its CSV column name (exact, after trimming).
    pub fn from_column(name: &str) -> Option<Metric> {
        let name = name.trim();
        Metric::ALL.into_iter().find(|m| m.column() == name)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Per-metric value storage
// ---------------------------------------------------------------------------

/// One optional value per [`Metric`]. `None` marks a missing or malformed cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricValues {
    values: [Option<f64>; Metric::COUNT],
}

impl MetricValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric.index()] = value;
    }

    /// Builder-style setter, handy for constructing rows in code.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }

    /// Iterate `(metric, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        Metric::ALL.iter().map(move |m| (*m, self.get(*m)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_index_order() {
        for (i, m) in Metric::ALL.iter().enumerate() {
            assert_eq!(m.index(), i, "{m} out of order");
        }
    }

    #[test]
    fn column_lookup_roundtrip() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_column(m.column()), Some(m));
        }
        assert_eq!(Metric::from_column("  PrgP "), Some(Metric::ProgressivePasses));
        assert_eq!(Metric::from_column("prgp"), None);
    }

    #[test]
    fn serde_uses_column_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            metrics: Vec<Metric>,
        }
        let parsed: Wrapper = toml::from_str(r#"metrics = ["Gls_90", "90s", "G+A"]"#).unwrap();
        assert_eq!(
            parsed.metrics,
            vec![Metric::GoalsPer90, Metric::Nineties, Metric::GoalsAssists]
        );
    }

    #[test]
    fn unknown_metric_name_rejected() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Wrapper {
            metrics: Vec<Metric>,
        }
        let parsed: Result<Wrapper, _> = toml::from_str(r#"metrics = ["Goals_90"]"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn metric_values_default_missing() {
        let v = MetricValues::new().with(Metric::GoalsPer90, 0.4);
        assert_eq!(v.get(Metric::GoalsPer90), Some(0.4));
        assert_eq!(v.get(Metric::AssistsPer90), None);
        assert_eq!(v.iter().filter(|(_, x)| x.is_some()).count(), 1);
    }
}
