// Analysis pipeline: load → join → aggregate → correlate → rank.
//
// Each stage is a pure function from `epl-stats`; this module only wires them
// together and attaches stage context to failures.

use std::collections::BTreeSet;

use anyhow::Context;
use epl_core::config::{AnalysisConfig, Config};
use epl_core::Metric;
use epl_stats::aggregate::{aggregate_by_team, TeamAggregate};
use epl_stats::correlation::{
    correlate_each, rank_by_strength, CorrelationError, CorrelationResult,
};
use epl_stats::enrich::{enrich, unmatched_teams};
use epl_stats::players::{load_players, LoadReport, PlayerRecord, PlayerTable};
use epl_stats::ranking::{compare_groups, GroupComparison};
use epl_stats::standings::{load_standings, Standings};
use tracing::info;

/// Everything the exporters and the console summary need from one run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Normalized header row of the player file.
    pub headers: Vec<String>,
    /// Player rows with team outcome fields attached.
    pub players: Vec<PlayerRecord>,
    pub load: LoadReport,
    pub unmatched: BTreeSet<String>,
    pub teams: Vec<TeamAggregate>,
    /// Successful correlations, in configured order.
    pub correlations: Vec<CorrelationResult>,
    /// Configured metrics that could not be correlated.
    pub correlation_failures: Vec<(Metric, CorrelationError)>,
    pub comparison: GroupComparison,
}

impl AnalysisReport {
    /// Correlations ordered by descending |r|.
    pub fn ranked_correlations(&self) -> Vec<CorrelationResult> {
        rank_by_strength(&self.correlations)
    }
}

/// The standings CSV named in the config, or the built-in 2023/24 table.
pub fn load_configured_standings(config: &Config) -> anyhow::Result<Standings> {
    match config.standings_path() {
        Some(path) => {
            let standings = load_standings(&path)
                .with_context(|| format!("failed to load standings from {}", path.display()))?;
            Ok(standings)
        }
        None => {
            info!("using built-in 2023/24 standings");
            Ok(Standings::season_2023_24())
        }
    }
}

/// Run every stage over an already-loaded player table.
pub fn analyze_table(
    table: PlayerTable,
    load: LoadReport,
    standings: &Standings,
    analysis: &AnalysisConfig,
) -> anyhow::Result<AnalysisReport> {
    let unmatched = unmatched_teams(&table.players, standings);
    let players = enrich(&table.players, standings);

    let teams = aggregate_by_team(&players).context("failed to aggregate players by team")?;

    let batch =
        correlate_each(&teams, &analysis.metrics).context("failed to correlate metrics")?;
    info!(
        "correlated {} metrics over {} teams ({} failed)",
        batch.results.len(),
        teams.len(),
        batch.failures.len()
    );

    let comparison = compare_groups(
        &teams,
        &players,
        analysis.group_size,
        &analysis.comparison_metrics,
        analysis.comparison_basis,
    )
    .context("failed to compare top and bottom teams")?;
    info!(
        "top {}: {}; bottom {}: {}",
        comparison.top.len(),
        comparison.top.join(", "),
        comparison.bottom.len(),
        comparison.bottom.join(", ")
    );

    Ok(AnalysisReport {
        headers: table.headers,
        players,
        load,
        unmatched,
        teams,
        correlations: batch.results,
        correlation_failures: batch.failures,
        comparison,
    })
}

/// Load the configured inputs and run the full analysis.
pub fn run_analysis(config: &Config) -> anyhow::Result<AnalysisReport> {
    let standings = load_configured_standings(config)?;
    let path = config.players_path();
    let (table, load) = load_players(&path).context("failed to load player statistics")?;
    analyze_table(table, load, &standings, &config.analysis)
}
