//! spinectl: append to, replay, seal and verify an event spine; run DetectB
//! over round records; project node files to a store digest.

mod commands;
mod config;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use config::SpineConfig;
use spine_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "spinectl", about = "Tamper-evident event spine and DetectB tooling")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SPINE_CONFIG")]
    config: Option<PathBuf>,

    /// Spine file (defaults to the config file's `spine_path`).
    #[arg(long, env = "SPINE_PATH")]
    spine: Option<PathBuf>,

    /// Parent directory for sealed runs.
    #[arg(long, env = "SPINE_RUNS_DIR")]
    runs_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SPINE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SPINE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Append one event and print it.
    Append {
        /// Event type.
        #[arg(long = "type")]
        event_type: String,
        /// JSON object payload.
        #[arg(long)]
        data: String,
    },
    /// Recompute the chain from genesis and report the first break.
    Replay,
    /// Print every event, one JSON object per line.
    Read {
        /// Skip malformed lines instead of failing.
        #[arg(long)]
        tolerant: bool,
    },
    /// Copy the spine into a run directory and write its manifest.
    Seal {
        #[arg(long)]
        run_id: String,
        /// Defaults to `<runs_dir>/<run_id>`.
        #[arg(long)]
        run_dir: Option<PathBuf>,
    },
    /// Check a sealed run against its manifest.
    Verify {
        #[arg(long)]
        run_dir: PathBuf,
    },
    /// Run DetectB over a file of round records.
    Detect {
        /// One round record JSON object per line.
        #[arg(long)]
        input: PathBuf,
        /// Append each fire to the spine.
        #[arg(long)]
        record_fires: bool,
    },
    /// Build a store from a file of nodes and print its digest.
    Project {
        /// One node JSON object per line.
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    /// File settings overridden by flags and environment.
    fn resolve_config(&self) -> anyhow::Result<SpineConfig> {
        let mut config = match &self.config {
            Some(path) => SpineConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => SpineConfig::default(),
        };
        if let Some(spine) = &self.spine {
            config.spine_path = spine.clone();
        }
        if let Some(runs_dir) = &self.runs_dir {
            config.runs_dir = runs_dir.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let passed = match cli.command {
        Command::Append { event_type, data } => {
            commands::append(&config, &event_type, &data, &mut out)?;
            true
        }
        Command::Replay => commands::replay(&config, &mut out)?,
        Command::Read { tolerant } => {
            commands::read(&config, tolerant, &mut out)?;
            true
        }
        Command::Seal { run_id, run_dir } => {
            commands::seal(&config, &run_id, run_dir.as_deref(), &mut out)?
        }
        Command::Verify { run_dir } => commands::verify(&run_dir, &mut out)?,
        Command::Detect {
            input,
            record_fires,
        } => {
            commands::detect(&config, &input, record_fires, &mut out)?;
            true
        }
        Command::Project { input } => {
            commands::project(&input, &mut out)?;
            true
        }
        Command::Config => {
            write!(out, "{}", config.to_toml_string()?)?;
            true
        }
    };
    out.flush()?;

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
