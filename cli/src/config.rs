//! `spinectl` configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use spine_detect::{DetectError, DetectorConfig};
use spine_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid [detector] table: {0}")]
    Detector(#[from] DetectError),
}

/// Settings shared by every subcommand.
///
/// Loaded from a TOML file via [`SpineConfig::from_toml_file`]; CLI flags and
/// `SPINE_*` environment variables override individual fields afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpineConfig {
    /// The append-only event file.
    #[serde(default = "default_spine_path")]
    pub spine_path: PathBuf,

    /// Parent directory for sealed runs when `--run-dir` is not given.
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Detector settings for `spinectl detect`.
    #[serde(default)]
    pub detector: DetectorConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_spine_path() -> PathBuf {
    PathBuf::from("./spine/events.jsonl")
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from("./runs")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            spine_path: default_spine_path(),
            runs_dir: default_runs_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            detector: DetectorConfig::default(),
        }
    }
}

impl SpineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string. The detector table is validated.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.detector.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Directory for `run_id` under [`runs_dir`](Self::runs_dir).
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir.join(run_id)
    }
}
