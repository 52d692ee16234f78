// Configuration loading and parsing (config/analysis.toml).

use crate::metric::Metric;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the single config file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "analysis.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that relative paths in the file are resolved against.
    pub base_dir: PathBuf,
    pub data: DataPaths,
    pub output: OutputConfig,
    pub analysis: AnalysisConfig,
    pub projection: ProjectionConfig,
}

impl Config {
    /// Resolve a possibly-relative path against `base_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn players_path(&self) -> PathBuf {
        self.resolve(&self.data.players)
    }

    pub fn standings_path(&self) -> Option<PathBuf> {
        self.data.standings.as_deref().map(|p| self.resolve(p))
    }

    /// Full path of a file inside the configured output directory.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.resolve(&self.output.dir).join(file_name)
    }
}

// ---------------------------------------------------------------------------
// analysis.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire analysis.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AnalysisFile {
    data: DataPaths,
    output: OutputConfig,
    #[serde(default)]
    analysis: AnalysisConfig,
    #[serde(default)]
    projection: ProjectionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: PathBuf,
    /// Standings CSV. When omitted the built-in 2023/24 table is used.
    #[serde(default)]
    pub standings: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub enriched_players: String,
    pub team_summary: String,
    pub correlations: String,
    pub comparison: String,
    pub projections: String,
    pub report_json: String,
}

/// How top/bottom group means are formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonBasis {
    /// Mean of the selected teams' aggregated means.
    #[default]
    TeamMeans,
    /// Mean over every player row belonging to the selected teams.
    PlayerPool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub metrics: Vec<Metric>,
    pub comparison_metrics: Vec<Metric>,
    pub group_size: usize,
    pub comparison_basis: ComparisonBasis,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            metrics: Metric::DEFAULT_CORRELATED.to_vec(),
            comparison_metrics: Metric::DEFAULT_COMPARED.to_vec(),
            group_size: 5,
            comparison_basis: ComparisonBasis::TeamMeans,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub top_n: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig { top_n: 10 }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/analysis.toml` relative to
/// `base_dir`.
///
/// Does not touch `defaults/`; see `load_config` for first-run setup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&config_path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound {
                path: config_path.clone(),
            }
        } else {
            ConfigError::ReadError {
                path: config_path.clone(),
                source,
            }
        }
    })?;
    let file: AnalysisFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    let config = Config {
        base_dir: base_dir.to_path_buf(),
        data: file.data,
        output: file.output,
        analysis: file.analysis,
        projection: file.projection,
    };

    validate(&config)?;

    Ok(config)
}

/// Install `defaults/analysis.toml` as `config/analysis.toml` when the latter
/// is absent. Returns the installed path, or `None` when a config already
/// exists. An existing config is never overwritten.
pub fn install_default_config(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.is_file() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {CONFIG_FILE} under config/ or defaults/ in {}; \
                 run from the project root or pass --base-dir",
                base_dir.display()
            ),
        });
    }

    let copy_err = |what: &str, path: &Path, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {what} {}: {e}", path.display()),
    };
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| copy_err("create", dir, e))?;
    }
    let body = std::fs::read(&source).map_err(|e| copy_err("read", &source, e))?;
    // create_new so a config written concurrently is left alone
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, &body)
                .map_err(|e| copy_err("write", &target, e))?;
            tracing::info!("installed default config at {}", target.display());
            Ok(Some(target))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(copy_err("create", &target, e)),
    }
}

/// Install the default config if needed, then load it from `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    install_default_config(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let analysis = &config.analysis;

    if analysis.group_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "analysis.group_size".into(),
            message: "must be greater than 0".into(),
        });
    }

    let metric_lists: &[(&str, &[Metric])] = &[
        ("analysis.metrics", analysis.metrics.as_slice()),
        ("analysis.comparison_metrics", analysis.comparison_metrics.as_slice()),
    ];
    for (name, list) in metric_lists {
        if list.is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must name at least one metric".into(),
            });
        }
        let mut seen = HashSet::new();
        for m in list.iter() {
            if !seen.insert(*m) {
                return Err(ConfigError::ValidationError {
                    field: name.to_string(),
                    message: format!("metric `{m}` listed more than once"),
                });
            }
        }
    }

    if config.projection.top_n == 0 {
        return Err(ConfigError::ValidationError {
            field: "projection.top_n".into(),
            message: "must be greater than 0".into(),
        });
    }

    let file_names: &[(&str, &str)] = &[
        ("output.enriched_players", config.output.enriched_players.as_str()),
        ("output.team_summary", config.output.team_summary.as_str()),
        ("output.correlations", config.output.correlations.as_str()),
        ("output.comparison", config.output.comparison.as_str()),
        ("output.projections", config.output.projections.as_str()),
        ("output.report_json", config.output.report_json.as_str()),
    ];
    for (name, val) in file_names {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "file name must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
