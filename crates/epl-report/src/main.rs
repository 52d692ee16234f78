// EPL report entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Initialize tracing (log to file; stdout carries the report)
// 3. Load config, installing the default analysis.toml on first run
// 4. Run the requested subcommand

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use epl_core::config;
use epl_report::{export, pipeline, summary};
use epl_stats::players::load_players;
use epl_stats::profile::position_profile;
use epl_stats::projection::top_projected;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "epl-report", about = "Correlate EPL player metrics with team win rate")]
struct Cli {
    /// Directory holding config/, defaults/ and the data paths it names
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full analysis and write every output table
    Analyze,
    /// Percentile ranks of one player within their position group
    Profile {
        #[arg(long)]
        player: String,
        /// Disambiguate players sharing a name
        #[arg(long)]
        team: Option<String>,
    },
    /// Next-season projections for the top players by goals + assists
    Predict {
        /// Overrides `[projection] top_n`
        #[arg(long)]
        top: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_path = init_tracing(&cli.base_dir)?;
    info!(
        "epl-report starting: {:?} (log {})",
        cli.command,
        log_path.display()
    );

    let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;

    match cli.command {
        Command::Analyze => {
            let report = pipeline::run_analysis(&config)?;
            let written = export::export_all(&config, &report).context("failed to export results")?;
            print!("{}", summary::render_analysis(&report));
            println!();
            for path in written {
                println!("wrote {}", path.display());
            }
        }
        Command::Profile { player, team } => {
            let (table, _) = load_players(&config.players_path())
                .context("failed to load player statistics")?;
            let profile = position_profile(&table.players, &player, team.as_deref())?;
            print!("{}", summary::render_profile(&profile));
        }
        Command::Predict { top } => {
            let (table, _) = load_players(&config.players_path())
                .context("failed to load player statistics")?;
            let n = top.unwrap_or(config.projection.top_n);
            if n == 0 {
                anyhow::bail!("--top must be greater than 0");
            }
            let projections = top_projected(&table.players, n);
            let path = export::export_projections(&config, &projections)
                .context("failed to export projections")?;
            print!("{}", summary::render_projections(&projections));
            println!("\nwrote {}", path.display());
        }
    }

    info!("epl-report finished");
    Ok(())
}

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "epl_report=info,epl_stats=info,warn";

/// Route tracing to `logs/epl-report.log` under `base_dir`, appending across
/// runs. Returns the log file path.
fn init_tracing(base_dir: &Path) -> anyhow::Result<PathBuf> {
    use tracing_subscriber::EnvFilter;

    let log_path = base_dir.join("logs").join("epl-report.log");
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))?;

    Ok(log_path)
}
