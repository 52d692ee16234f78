// Tabular and JSON export of an analysis run.
//
// Every CSV writer takes a `csv::Writer` over any `io::Write` so tests can
// write into memory; `export_all` binds them to files under the configured
// output directory.

use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use epl_core::config::{ComparisonBasis, Config};
use epl_core::table::round_to;
use epl_core::Metric;
use epl_stats::aggregate::TeamAggregate;
use epl_stats::correlation::{CorrelationError, CorrelationResult};
use epl_stats::enrich::{TeamFields, POINTS_COLUMN, POSITION_COLUMN, WIN_RATE_COLUMN};
use epl_stats::players::PlayerRecord;
use epl_stats::projection::{top_projected, SeasonProjection};
use epl_stats::ranking::{by_league_position, GroupComparison};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::pipeline::AnalysisReport;

/// Decimal places for team summary and comparison values.
const SUMMARY_DECIMALS: i32 = 3;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error writing {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("failed to serialize report {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Cell formatting
// ---------------------------------------------------------------------------

fn rounded(value: f64) -> String {
    round_to(value, SUMMARY_DECIMALS).to_string()
}

fn optional(value: Option<f64>) -> String {
    value.map(rounded).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// CSV writers
// ---------------------------------------------------------------------------

/// Original columns plus the three team outcome columns. Existing outcome
/// columns are overwritten in place; absent ones are appended.
pub fn write_enriched_players<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    headers: &[String],
    players: &[PlayerRecord],
) -> csv::Result<()> {
    let mut out_headers = headers.to_vec();
    let mut slot = |name: &str| match out_headers.iter().position(|h| h == name) {
        Some(i) => i,
        None => {
            out_headers.push(name.to_string());
            out_headers.len() - 1
        }
    };
    let win_rate_col = slot(WIN_RATE_COLUMN);
    let position_col = slot(POSITION_COLUMN);
    let points_col = slot(POINTS_COLUMN);

    wtr.write_record(&out_headers)?;
    for player in players {
        let fields = player.outcome.unwrap_or(TeamFields::UNMATCHED);
        let mut row = player.raw.clone();
        row.resize(out_headers.len(), String::new());
        row[win_rate_col] = fields.win_rate.to_string();
        row[position_col] = fields.position.to_string();
        row[points_col] = fields.points.to_string();
        wtr.write_record(&row)?;
    }
    Ok(())
}

/// One row per team in league order, unmatched teams last.
pub fn write_team_summary<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    teams: &[TeamAggregate],
    metrics: &[Metric],
) -> csv::Result<()> {
    let mut header = vec![
        "Team".to_string(),
        "Players".to_string(),
        WIN_RATE_COLUMN.to_string(),
        POSITION_COLUMN.to_string(),
        POINTS_COLUMN.to_string(),
    ];
    header.extend(metrics.iter().map(|m| m.column().to_string()));
    wtr.write_record(&header)?;

    for team in by_league_position(teams) {
        let mut row = vec![
            team.team.clone(),
            team.player_count.to_string(),
            rounded(team.win_rate),
            team.position.to_string(),
            team.points.to_string(),
        ];
        row.extend(metrics.iter().map(|m| optional(team.mean(*m))));
        wtr.write_record(&row)?;
    }
    Ok(())
}

/// Correlations in the order given, ranked from 1. Failed metrics follow
/// unranked, with empty values and the failure kind as significance.
pub fn write_correlations<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    ranked: &[CorrelationResult],
    failures: &[(Metric, CorrelationError)],
) -> csv::Result<()> {
    wtr.write_record([
        "Rank",
        "Metric",
        "Label",
        "Correlation",
        "P_Value",
        "Significance",
    ])?;
    for (i, c) in ranked.iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            c.metric.column().to_string(),
            c.metric.label().to_string(),
            format!("{:.4}", c.r),
            format!("{:.6}", c.p_value),
            c.significance.to_string(),
        ])?;
    }
    for (metric, err) in failures {
        wtr.write_record([
            "",
            metric.column(),
            metric.label(),
            "",
            "",
            err.kind(),
        ])?;
    }
    Ok(())
}

pub fn write_comparison<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    comparison: &GroupComparison,
) -> csv::Result<()> {
    wtr.write_record([
        "Metric",
        "Top_Mean",
        "Bottom_Mean",
        "Difference",
        "Pct_Difference",
    ])?;
    for row in &comparison.metrics {
        let pct = match row.percent_difference() {
            Ok(p) => rounded(p),
            Err(e) => {
                warn!("{}", e);
                String::new()
            }
        };
        wtr.write_record([
            row.metric.column().to_string(),
            rounded(row.top_mean),
            rounded(row.bottom_mean),
            rounded(row.difference),
            pct,
        ])?;
    }
    Ok(())
}

pub fn write_projections<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    projections: &[SeasonProjection],
) -> csv::Result<()> {
    wtr.write_record([
        "Player",
        "Team",
        "Age",
        "Age_Factor",
        "Projected_Matches",
        "Projected_Goals",
        "Projected_Assists",
        "Projected_G+A",
        "Projected_xG",
        "Projected_xAG",
    ])?;
    let int = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_default();
    for p in projections {
        wtr.write_record([
            p.player.clone(),
            p.team.clone(),
            p.age.map(|a| a.to_string()).unwrap_or_default(),
            p.age_factor.to_string(),
            p.matches.map(|m| m.to_string()).unwrap_or_default(),
            int(p.goals),
            int(p.assists),
            int(p.goal_contributions()),
            p.expected_goals.map(|v| v.to_string()).unwrap_or_default(),
            p.expected_assists.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub player_rows: usize,
    pub team_count: usize,
    pub malformed_cells: usize,
    pub missing_columns: &'a [Metric],
    pub unmatched_teams: &'a BTreeSet<String>,
    pub correlations: Vec<CorrelationEntry>,
    pub correlation_failures: Vec<CorrelationFailureEntry>,
    pub groups: GroupEntry<'a>,
    pub comparisons: Vec<ComparisonEntry>,
}

#[derive(Debug, Serialize)]
pub struct CorrelationEntry {
    pub rank: usize,
    pub metric: Metric,
    pub label: &'static str,
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
    pub significance: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CorrelationFailureEntry {
    pub metric: Metric,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct GroupEntry<'a> {
    pub basis: ComparisonBasis,
    pub top: &'a [String],
    pub bottom: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct ComparisonEntry {
    pub metric: Metric,
    pub top_mean: f64,
    pub bottom_mean: f64,
    pub difference: f64,
    /// `None` when the bottom mean is zero.
    pub pct_difference: Option<f64>,
}

impl<'a> ReportDocument<'a> {
    pub fn new(report: &'a AnalysisReport, generated_at: DateTime<Utc>) -> Self {
        let correlations = report
            .ranked_correlations()
            .iter()
            .enumerate()
            .map(|(i, c)| CorrelationEntry {
                rank: i + 1,
                metric: c.metric,
                label: c.metric.label(),
                r: c.r,
                p_value: c.p_value,
                n: c.n,
                significance: c.significance.marker(),
            })
            .collect();
        let correlation_failures = report
            .correlation_failures
            .iter()
            .map(|(metric, err)| CorrelationFailureEntry {
                metric: *metric,
                kind: err.kind(),
                message: err.to_string(),
            })
            .collect();
        let comparisons = report
            .comparison
            .metrics
            .iter()
            .map(|m| ComparisonEntry {
                metric: m.metric,
                top_mean: m.top_mean,
                bottom_mean: m.bottom_mean,
                difference: m.difference,
                pct_difference: m.percent_difference().ok(),
            })
            .collect();
        ReportDocument {
            generated_at,
            player_rows: report.players.len(),
            team_count: report.teams.len(),
            malformed_cells: report.load.malformed_cells,
            missing_columns: &report.load.missing_columns,
            unmatched_teams: &report.unmatched,
            correlations,
            correlation_failures,
            groups: GroupEntry {
                basis: report.comparison.basis,
                top: &report.comparison.top,
                bottom: &report.comparison.bottom,
            },
            comparisons,
        }
    }
}

// ---------------------------------------------------------------------------
// File output
// ---------------------------------------------------------------------------

fn write_csv_file<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut csv::Writer<File>) -> csv::Result<()>,
{
    let csv_err = |source| ExportError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    write(&mut wtr).map_err(csv_err)?;
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| ExportError::Json {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Create the output directory if needed and return it.
pub fn prepare_output_dir(config: &Config) -> Result<PathBuf, ExportError> {
    let dir = config.resolve(&config.output.dir);
    std::fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    Ok(dir)
}

/// Write the projections table to its configured file.
pub fn export_projections(
    config: &Config,
    projections: &[SeasonProjection],
) -> Result<PathBuf, ExportError> {
    prepare_output_dir(config)?;
    let path = config.output_path(&config.output.projections);
    write_csv_file(&path, |w| write_projections(w, projections))?;
    info!("wrote {} projections to {}", projections.len(), path.display());
    Ok(path)
}

/// Write every analysis table, the JSON report and the top projections.
/// Returns the written paths.
pub fn export_all(config: &Config, report: &AnalysisReport) -> Result<Vec<PathBuf>, ExportError> {
    prepare_output_dir(config)?;
    let out = &config.output;
    let mut written = Vec::new();

    let path = config.output_path(&out.enriched_players);
    write_csv_file(&path, |w| write_enriched_players(w, &report.headers, &report.players))?;
    written.push(path);

    let path = config.output_path(&out.team_summary);
    write_csv_file(&path, |w| {
        write_team_summary(w, &report.teams, &config.analysis.metrics)
    })?;
    written.push(path);

    let path = config.output_path(&out.correlations);
    let ranked = report.ranked_correlations();
    write_csv_file(&path, |w| {
        write_correlations(w, &ranked, &report.correlation_failures)
    })?;
    written.push(path);

    let path = config.output_path(&out.comparison);
    write_csv_file(&path, |w| write_comparison(w, &report.comparison))?;
    written.push(path);

    let path = config.output_path(&out.report_json);
    write_json_file(&path, &ReportDocument::new(report, Utc::now()))?;
    written.push(path);

    let projections = top_projected(&report.players, config.projection.top_n);
    let path = config.output_path(&out.projections);
    write_csv_file(&path, |w| write_projections(w, &projections))?;
    written.push(path);

    for path in &written {
        info!("wrote {}", path.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use epl_core::MetricValues;
    use epl_stats::correlation::Significance;
    use epl_stats::ranking::MetricComparison;

    fn to_string(wtr: csv::Writer<Vec<u8>>) -> String {
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    fn aggregate(team: &str, win_rate: f64, position: u32, gls: Option<f64>) -> TeamAggregate {
        let mut means = MetricValues::new();
        means.set(Metric::GoalsPer90, gls);
        TeamAggregate {
            team: team.to_string(),
            player_count: 2,
            win_rate,
            position,
            points: position * 3,
            matched: position != 0,
            means,
        }
    }

    fn with_raw(mut p: PlayerRecord, raw: &[&str], fields: TeamFields) -> PlayerRecord {
        p.raw = raw.iter().map(|s| s.to_string()).collect();
        p.outcome = Some(fields);
        p
    }

    #[test]
    fn enriched_appends_outcome_columns() {
        let headers = vec!["Player".to_string(), "Team".to_string()];
        let fields = TeamFields {
            win_rate: 50.0,
            position: 4,
            points: 68,
            matched: true,
        };
        let players = vec![with_raw(
            PlayerRecord::new("a", "Aston Villa"),
            &["a", "Aston Villa"],
            fields,
        )];
        let mut wtr = csv::Writer::from_writer(vec![]);
        write_enriched_players(&mut wtr, &headers, &players).unwrap();
        assert_eq!(
            to_string(wtr),
            "Player,Team,Team_Win_Rate,Team_Position,Team_Points\na,Aston Villa,50,4,68\n"
        );
    }

    #[test]
    fn enriched_overwrites_existing_outcome_column() {
        let headers = vec![
            "Player".to_string(),
            "Team_Win_Rate".to_string(),
            "Team".to_string(),
        ];
        let players = vec![with_raw(
            PlayerRecord::new("a", "Nowhere"),
            &["a", "99", "Nowhere"],
            TeamFields::UNMATCHED,
        )];
        let mut wtr = csv::Writer::from_writer(vec![]);
        write_enriched_players(&mut wtr, &headers, &players).unwrap();
        assert_eq!(
            to_string(wtr),
            "Player,Team_Win_Rate,Team,Team_Position,Team_Points\na,0,Nowhere,0,0\n"
        );
    }

    #[test]
    fn team_summary_in_league_order_with_empty_missing() {
        let teams = vec![
            aggregate("Unknown FC", 0.0, 0, Some(0.1)),
            aggregate("Arsenal", 28.0 / 38.0 * 100.0, 2, Some(0.456_789)),
            aggregate("Manchester City", 28.0 / 38.0 * 100.0, 1, None),
        ];
        let mut wtr = csv::Writer::from_writer(vec![]);
        write_team_summary(&mut wtr, &teams, &[Metric::GoalsPer90]).unwrap();
        let text = to_string(wtr);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Team,Players,Team_Win_Rate,Team_Position,Team_Points,Gls_90"
        );
        assert_eq!(lines[1], "Manchester City,2,73.684,1,3,");
        assert_eq!(lines[2], "Arsenal,2,73.684,2,6,0.457");
        assert_eq!(lines[3], "Unknown FC,2,0,0,0,0.1");
    }

    #[test]
    fn correlations_ranked_from_one() {
        let rows = vec![CorrelationResult {
            metric: Metric::ProgressivePasses,
            r: 0.81234,
            p_value: 0.0000123,
            n: 20,
            significance: Significance::VeryHigh,
        }];
        let mut wtr = csv::Writer::from_writer(vec![]);
        write_correlations(&mut wtr, &rows, &[]).unwrap();
        let text = to_string(wtr);
        assert_eq!(
            text.lines().nth(1).unwrap(),
            "1,PrgP,Progressive Passes,0.8123,0.000012,***"
        );
    }

    #[test]
    fn failed_correlation_listed_unranked() {
        let rows = vec![CorrelationResult {
            metric: Metric::GoalsPer90,
            r: 0.5,
            p_value: 0.2,
            n: 5,
            significance: Significance::NotSignificant,
        }];
        let failures = vec![
            (
                Metric::RedCards,
                CorrelationError::DegenerateInput {
                    series: "CrdR".into(),
                },
            ),
            (
                Metric::ProgressivePasses,
                CorrelationError::MissingValue {
                    team: "Burnley".into(),
                    metric: Metric::ProgressivePasses,
                },
            ),
        ];
        let mut wtr = csv::Writer::from_writer(vec![]);
        write_correlations(&mut wtr, &rows, &failures).unwrap();
        let text = to_string(wtr);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("1,Gls_90,"));
        assert_eq!(lines[2], ",CrdR,Red Cards,,,degenerate input");
        assert_eq!(lines[3], ",PrgP,Progressive Passes,,,missing value");
    }

    #[test]
    fn undefined_percentage_is_empty_cell() {
        let comparison = GroupComparison {
            basis: ComparisonBasis::TeamMeans,
            top: vec!["A".into()],
            bottom: vec!["B".into()],
            metrics: vec![
                MetricComparison {
                    metric: Metric::GoalsPer90,
                    top_mean: 0.5,
                    bottom_mean: 0.0,
                    difference: 0.5,
                },
                MetricComparison {
                    metric: Metric::AssistsPer90,
                    top_mean: 0.3,
                    bottom_mean: 0.2,
                    difference: 0.3 - 0.2,
                },
            ],
        };
        let mut wtr = csv::Writer::from_writer(vec![]);
        write_comparison(&mut wtr, &comparison).unwrap();
        let text = to_string(wtr);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "Gls_90,0.5,0,0.5,");
        assert_eq!(lines[2], "Ast_90,0.3,0.2,0.1,50");
    }

    #[test]
    fn projections_leave_missing_fields_empty() {
        let proj = SeasonProjection {
            player: "x".into(),
            team: "Fulham".into(),
            age: None,
            age_factor: 1.0,
            matches: Some(30),
            goals: Some(5),
            assists: None,
            expected_goals: Some(4.25),
            expected_assists: None,
        };
        let mut wtr = csv::Writer::from_writer(vec![]);
        write_projections(&mut wtr, &[proj]).unwrap();
        let text = to_string(wtr);
        assert_eq!(text.lines().nth(1).unwrap(), "x,Fulham,,1,30,5,,,4.25,");
    }
}
