//! Configuration for the `Tickbox` binary.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tickbox/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::app::Command;
use crate::persistence::RetryPolicy;
use crate::report::DEFAULT_REPORT_CAPACITY;

/// Log level used when neither `RUST_LOG` nor `--log-level` says otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    retry: RetryFileConfig,
    report: ReportFileConfig,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_dir: Option<PathBuf>,
}

/// `[retry]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RetryFileConfig {
    max_attempts: Option<u32>,
    delay_ms: Option<u64>,
}

/// `[report]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ReportFileConfig {
    capacity: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the store file.
    pub data_dir: PathBuf,
    /// Retry policy for every storage operation.
    pub retry: RetryPolicy,
    /// Number of error reports kept before the oldest is evicted.
    pub report_capacity: usize,
    /// Log filter directive.
    pub log_level: String,
    /// Log file; `None` logs to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            retry: RetryPolicy::default(),
            report_capacity: DEFAULT_REPORT_CAPACITY,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// Otherwise the default path (`<config_dir>/tickbox/config.toml`) is
    /// tried and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve from CLI args alone, ignoring any config file.
    #[must_use]
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self::resolve(cli, &ConfigFile::default())
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        let log_level = if cli.log_level.trim().is_empty() {
            defaults.log_level
        } else {
            cli.log_level.clone()
        };

        Self {
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.storage.data_dir.clone())
                .unwrap_or(defaults.data_dir),
            retry: RetryPolicy {
                max_attempts: file
                    .retry
                    .max_attempts
                    .unwrap_or(defaults.retry.max_attempts),
                delay: cli
                    .retry_delay_ms
                    .or(file.retry.delay_ms)
                    .map_or(defaults.retry.delay, Duration::from_millis),
            },
            report_capacity: file
                .report
                .capacity
                .unwrap_or(defaults.report_capacity),
            log_level,
            log_file: cli.log_file.clone(),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Local-first todo list")]
pub struct CliArgs {
    /// Directory holding the store file.
    #[arg(long, global = true, env = "TICKBOX_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Delay between storage retries, in milliseconds.
    #[arg(long, global = true)]
    pub retry_delay_ms: Option<u64>,

    /// Path to config file (default: `~/.config/tickbox/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL, env = "TICKBOX_LOG")]
    pub log_level: String,

    /// Path to log file (default: stderr).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Command to run (default: `list`).
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// `<data_dir>/tickbox`, or `./.tickbox` when the platform has no data dir.
fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".tickbox"), |dir| dir.join("tickbox"))
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        p.to_path_buf()
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        let path = config_dir.join("tickbox").join("config.toml");
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        path
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|source| ConfigError::ReadFile { path, source })?;
    Ok(toml::from_str(&contents)?)
}
