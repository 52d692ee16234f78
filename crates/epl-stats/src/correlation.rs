// Correlation stage: Pearson r between a team-level metric and win rate,
// with a two-tailed p-value from Student's t distribution (n - 2 df).

use epl_core::Metric;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::aggregate::TeamAggregate;

/// Fewest paired observations for which r has a defined significance test.
pub const MIN_SAMPLES: usize = 3;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CorrelationError {
    #[error("need at least {MIN_SAMPLES} paired observations, got {n}")]
    InsufficientSamples { n: usize },

    #[error("series `{series}` has zero variance")]
    DegenerateInput { series: String },

    #[error("series lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("team `{team}` has no value for {metric}")]
    MissingValue { team: String, metric: Metric },

    #[error("t distribution unavailable: {0}")]
    Distribution(String),
}

impl CorrelationError {
    /// Short failure name for tabular output.
    pub fn kind(&self) -> &'static str {
        match self {
            CorrelationError::InsufficientSamples { .. } => "insufficient samples",
            CorrelationError::DegenerateInput { .. } => "degenerate input",
            CorrelationError::LengthMismatch { .. } => "length mismatch",
            CorrelationError::MissingValue { .. } => "missing value",
            CorrelationError::Distribution(_) => "distribution error",
        }
    }
}

/// Significance tier of a p-value. Thresholds are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    /// p < 0.001
    VeryHigh,
    /// p < 0.01
    High,
    /// p < 0.05
    Moderate,
    NotSignificant,
}

impl Significance {
    pub fn from_p_value(p: f64) -> Self {
        if p < 0.001 {
            Significance::VeryHigh
        } else if p < 0.01 {
            Significance::High
        } else if p < 0.05 {
            Significance::Moderate
        } else {
            Significance::NotSignificant
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Significance::VeryHigh => "***",
            Significance::High => "**",
            Significance::Moderate => "*",
            Significance::NotSignificant => "not significant",
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Pearson coefficient and two-tailed p-value for one pair of series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pearson {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Correlation of one metric against team win rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationResult {
    pub metric: Metric,
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
    pub significance: Significance,
}

// ---------------------------------------------------------------------------
// Core statistics
// ---------------------------------------------------------------------------

fn check_variance(values: &[f64], series: &str) -> Result<(), CorrelationError> {
    let first = values[0];
    if values.iter().all(|v| *v == first) {
        return Err(CorrelationError::DegenerateInput {
            series: series.to_string(),
        });
    }
    Ok(())
}

/// Two-tailed p-value for coefficient `r` over `n` pairs.
pub fn p_value_for_r(r: f64, n: usize) -> Result<f64, CorrelationError> {
    if n < MIN_SAMPLES {
        return Err(CorrelationError::InsufficientSamples { n });
    }
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }
    let df = (n - 2) as f64;
    let t_stat = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| CorrelationError::Distribution(e.to_string()))?;
    let p = 2.0 * (1.0 - dist.cdf(t_stat.abs()));
    Ok(p.clamp(0.0, 1.0))
}

/// Pearson product-moment correlation of `x` and `y`.
///
/// Fails on fewer than [`MIN_SAMPLES`] pairs or when either series is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Pearson, CorrelationError> {
    if x.len() != y.len() {
        return Err(CorrelationError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let n = x.len();
    if n < MIN_SAMPLES {
        return Err(CorrelationError::InsufficientSamples { n });
    }
    check_variance(x, "x")?;
    check_variance(y, "y")?;

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if !(denominator > 0.0 && denominator.is_finite()) {
        return Err(CorrelationError::DegenerateInput {
            series: if var_x > 0.0 { "y" } else { "x" }.to_string(),
        });
    }

    let r = (covariance / denominator).clamp(-1.0, 1.0);
    let p_value = p_value_for_r(r, n)?;
    Ok(Pearson { r, p_value, n })
}

// ---------------------------------------------------------------------------
// Team-level correlation
// ---------------------------------------------------------------------------

/// Correlate one aggregated metric with team win rate.
pub fn correlate_with_win_rate(
    teams: &[TeamAggregate],
    metric: Metric,
) -> Result<CorrelationResult, CorrelationError> {
    if teams.len() < MIN_SAMPLES {
        return Err(CorrelationError::InsufficientSamples { n: teams.len() });
    }
    let mut xs = Vec::with_capacity(teams.len());
    let mut ys = Vec::with_capacity(teams.len());
    for team in teams {
        let value = team.mean(metric).ok_or_else(|| CorrelationError::MissingValue {
            team: team.team.clone(),
            metric,
        })?;
        xs.push(value);
        ys.push(team.win_rate);
    }

    let result = pearson(&xs, &ys).map_err(|e| match e {
        CorrelationError::DegenerateInput { series } => CorrelationError::DegenerateInput {
            series: if series == "x" {
                metric.column().to_string()
            } else {
                "Team_Win_Rate".to_string()
            },
        },
        other => other,
    })?;
    debug!(
        "{}: r={:.4} p={:.4} over {} teams",
        metric, result.r, result.p_value, result.n
    );
    Ok(CorrelationResult {
        metric,
        r: result.r,
        p_value: result.p_value,
        n: result.n,
        significance: Significance::from_p_value(result.p_value),
    })
}

/// Correlate each metric in order; the first failure aborts.
pub fn correlate_all(
    teams: &[TeamAggregate],
    metrics: &[Metric],
) -> Result<Vec<CorrelationResult>, CorrelationError> {
    metrics
        .iter()
        .map(|m| correlate_with_win_rate(teams, *m))
        .collect()
}

/// Per-metric outcome of a batch; failed metrics keep their error.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationBatch {
    pub results: Vec<CorrelationResult>,
    pub failures: Vec<(Metric, CorrelationError)>,
}

/// Correlate each metric independently, recording failures per metric.
///
/// Too few teams fails the whole batch since no metric can be tested.
pub fn correlate_each(
    teams: &[TeamAggregate],
    metrics: &[Metric],
) -> Result<CorrelationBatch, CorrelationError> {
    if teams.len() < MIN_SAMPLES {
        return Err(CorrelationError::InsufficientSamples { n: teams.len() });
    }
    let mut batch = CorrelationBatch {
        results: Vec::with_capacity(metrics.len()),
        failures: Vec::new(),
    };
    for &metric in metrics {
        match correlate_with_win_rate(teams, metric) {
            Ok(result) => batch.results.push(result),
            Err(e) => {
                warn!("{} not correlated: {}", metric, e);
                batch.failures.push((metric, e));
            }
        }
    }
    Ok(batch)
}

/// Order by descending |r|. Ties keep their input order.
pub fn rank_by_strength(results: &[CorrelationResult]) -> Vec<CorrelationResult> {
    let mut ranked = results.to_vec();
    ranked.sort_by(|a, b| b.r.abs().total_cmp(&a.r.abs()));
    ranked
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use epl_core::MetricValues;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn team(name: &str, win_rate: f64, position: u32, metric: Metric, value: f64) -> TeamAggregate {
        TeamAggregate {
            team: name.to_string(),
            player_count: 1,
            win_rate,
            position,
            points: 0,
            matched: true,
            means: MetricValues::new().with(metric, value),
        }
    }

    #[test]
    fn perfect_positive_and_negative() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = pearson(&x, &[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert!(approx_eq(up.r, 1.0, 1e-12));
        assert!(up.p_value < 1e-9);
        let down = pearson(&x, &[10.0, 8.0, 6.0, 4.0, 2.0]).unwrap();
        assert!(approx_eq(down.r, -1.0, 1e-12));
    }

    #[test]
    fn self_correlation_is_one() {
        let x = [0.3, 0.1, 0.7, 0.45, 0.2, 0.9];
        let p = pearson(&x, &x).unwrap();
        assert!(approx_eq(p.r, 1.0, 1e-12));
    }

    #[test]
    fn correlation_is_symmetric() {
        let x = [1.0, 3.0, 2.0, 5.0, 4.0, 7.0];
        let y = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
        let xy = pearson(&x, &y).unwrap();
        let yx = pearson(&y, &x).unwrap();
        assert!(approx_eq(xy.r, yx.r, 1e-15));
        assert!(approx_eq(xy.p_value, yx.p_value, 1e-15));
    }

    #[test]
    fn known_coefficient() {
        // r = 0.8 exactly for this series
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 3.0, 2.0, 5.0, 4.0];
        let p = pearson(&x, &y).unwrap();
        assert!(approx_eq(p.r, 0.8, 1e-12));
        // t = 0.8 * sqrt(3 / 0.36) = 2.3094, df = 3 → p ≈ 0.1041
        assert!(approx_eq(p.p_value, 0.1041, 1e-3), "p = {}", p.p_value);
    }

    #[test]
    fn p_value_reference_points() {
        // r = 0.5, n = 30 → p ≈ 0.0049
        let p = p_value_for_r(0.5, 30).unwrap();
        assert!(p > 0.001 && p < 0.01, "p = {p}");
        // r = 0.2, n = 30 → p ≈ 0.289
        let p = p_value_for_r(0.2, 30).unwrap();
        assert!(p > 0.2 && p < 0.4, "p = {p}");
        assert!(approx_eq(p_value_for_r(0.0, 20).unwrap(), 1.0, 1e-12));
    }

    #[test]
    fn fewer_than_three_samples_fails() {
        assert_eq!(
            pearson(&[1.0, 2.0], &[3.0, 5.0]).unwrap_err(),
            CorrelationError::InsufficientSamples { n: 2 }
        );
        assert_eq!(
            p_value_for_r(0.5, 2).unwrap_err(),
            CorrelationError::InsufficientSamples { n: 2 }
        );
    }

    #[test]
    fn zero_variance_fails() {
        let err = pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, CorrelationError::DegenerateInput { series: "x".into() });
        let err = pearson(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap_err();
        assert_eq!(err, CorrelationError::DegenerateInput { series: "y".into() });
    }

    #[test]
    fn length_mismatch_fails() {
        let err = pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CorrelationError::LengthMismatch { left: 3, right: 2 }));
    }

    #[test]
    fn significance_tiers() {
        assert_eq!(Significance::from_p_value(0.0005).marker(), "***");
        assert_eq!(Significance::from_p_value(0.001).marker(), "**");
        assert_eq!(Significance::from_p_value(0.009).marker(), "**");
        assert_eq!(Significance::from_p_value(0.01).marker(), "*");
        assert_eq!(Significance::from_p_value(0.049).marker(), "*");
        assert_eq!(Significance::from_p_value(0.05).marker(), "not significant");
        assert_eq!(Significance::from_p_value(1.0).to_string(), "not significant");
    }

    #[test]
    fn team_correlation_with_win_rate() {
        let m = Metric::ProgressivePasses;
        let teams = vec![
            team("A", 70.0, 1, m, 900.0),
            team("B", 50.0, 2, m, 700.0),
            team("C", 30.0, 3, m, 500.0),
            team("D", 10.0, 4, m, 300.0),
        ];
        let result = correlate_with_win_rate(&teams, m).unwrap();
        assert!(approx_eq(result.r, 1.0, 1e-12));
        assert_eq!(result.n, 4);
        assert_eq!(result.significance, Significance::VeryHigh);
    }

    #[test]
    fn batch_keeps_going_past_failed_metric() {
        let teams = vec![
            team("A", 70.0, 1, Metric::GoalsPer90, 0.3),
            team("B", 50.0, 2, Metric::GoalsPer90, 0.3),
            team("C", 40.0, 3, Metric::GoalsPer90, 0.3),
        ]
        .into_iter()
        .zip([0.9, 0.5, 0.2])
        .map(|(mut t, v)| {
            t.means.set(Metric::AssistsPer90, Some(v));
            t
        })
        .collect::<Vec<_>>();
        let metrics = [Metric::GoalsPer90, Metric::AssistsPer90, Metric::ProgressivePasses];

        let batch = correlate_each(&teams, &metrics).unwrap();
        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.results[0].metric, Metric::AssistsPer90);
        assert_eq!(batch.failures.len(), 2);
        assert_eq!(batch.failures[0].0, Metric::GoalsPer90);
        assert_eq!(batch.failures[0].1.kind(), "degenerate input");
        assert_eq!(batch.failures[1].0, Metric::ProgressivePasses);
        assert_eq!(batch.failures[1].1.kind(), "missing value");

        assert!(correlate_all(&teams, &metrics).is_err());
    }

    #[test]
    fn batch_with_two_teams_fails_outright() {
        let m = Metric::GoalsPer90;
        let teams = vec![team("A", 70.0, 1, m, 0.3), team("B", 50.0, 2, m, 0.2)];
        assert_eq!(
            correlate_each(&teams, &[m]).unwrap_err(),
            CorrelationError::InsufficientSamples { n: 2 }
        );
    }

    #[test]
    fn two_teams_is_insufficient() {
        let m = Metric::GoalsPer90;
        let teams = vec![team("A", 70.0, 1, m, 0.3), team("B", 50.0, 2, m, 0.2)];
        assert_eq!(
            correlate_with_win_rate(&teams, m).unwrap_err(),
            CorrelationError::InsufficientSamples { n: 2 }
        );
    }

    #[test]
    fn constant_metric_names_the_column() {
        let m = Metric::GoalsPer90;
        let teams = vec![
            team("A", 70.0, 1, m, 0.3),
            team("B", 50.0, 2, m, 0.3),
            team("C", 40.0, 3, m, 0.3),
        ];
        assert_eq!(
            correlate_with_win_rate(&teams, m).unwrap_err(),
            CorrelationError::DegenerateInput {
                series: "Gls_90".into()
            }
        );
    }

    #[test]
    fn missing_team_value_reported() {
        let m = Metric::GoalsPer90;
        let mut teams = vec![
            team("A", 70.0, 1, m, 0.3),
            team("B", 50.0, 2, m, 0.2),
            team("C", 40.0, 3, m, 0.1),
        ];
        teams[1].means = MetricValues::new();
        assert_eq!(
            correlate_with_win_rate(&teams, m).unwrap_err(),
            CorrelationError::MissingValue {
                team: "B".into(),
                metric: m
            }
        );
    }

    #[test]
    fn ranking_by_absolute_r_is_stable() {
        let mk = |metric, r| CorrelationResult {
            metric,
            r,
            p_value: 0.5,
            n: 20,
            significance: Significance::NotSignificant,
        };
        let results = vec![
            mk(Metric::GoalsPer90, 0.4),
            mk(Metric::AssistsPer90, -0.8),
            mk(Metric::ProgressiveCarries, 0.8),
            mk(Metric::ProgressivePasses, 0.1),
        ];
        let ranked: Vec<Metric> = rank_by_strength(&results).iter().map(|c| c.metric).collect();
        assert_eq!(
            ranked,
            vec![
                Metric::AssistsPer90,
                Metric::ProgressiveCarries,
                Metric::GoalsPer90,
                Metric::ProgressivePasses
            ]
        );
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let x = [0.31, 0.52, 0.18, 0.77, 0.64, 0.29, 0.41];
        let y = [55.2, 63.1, 21.0, 73.7, 60.5, 34.2, 47.4];
        let a = pearson(&x, &y).unwrap();
        let b = pearson(&x, &y).unwrap();
        assert_eq!(a.r.to_bits(), b.r.to_bits());
        assert_eq!(a.p_value.to_bits(), b.p_value.to_bits());
    }
}
