//! `sxm-cits` - plan and preview CITS grids from a configuration file.
//!
//! Every subcommand prints JSON on stdout; logs go to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sxm_cits::automove::{self, AutoMoveScript};
use sxm_cits::config::CitsConfig;
use sxm_cits::preview;
use sxm_cits::scanlines;
use sxm_cits::validation;

#[derive(Parser, Debug)]
#[command(name = "sxm-cits", version, about = "CITS grid-point geometry engine")]
struct Cli {
    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the frame and every area, including frame containment
    Validate {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the measurement plan
    Plan {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print preview geometry for the plan
    Preview {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print scan-line distributions for the plan
    Scanlines {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the scan centers visited by an auto-move script
    Route {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// Move letters, e.g. "RULLDDRR"
        #[arg(long)]
        script: String,
        /// Step distance in nanometers
        #[arg(long)]
        distance: f64,
    },
    /// Print a default configuration
    Init,
}

#[derive(Serialize)]
struct ScanlineOutput {
    local: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    standard: Option<Vec<u32>>,
}

#[derive(Serialize)]
struct RouteOutput {
    route: automove::AutoMoveRoute,
    preview: preview::RoutePreview,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            let rendered = CitsConfig::default().to_toml()?;
            print!("{rendered}");
            Ok(())
        }
        Command::Validate { config } => {
            let config = CitsConfig::read_from(&config)
                .with_context(|| format!("failed to read configuration from {}", config.display()))?;
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            let report = validation::report(&config.frame, &config.areas);
            emit(&report)?;
            if !report.valid {
                anyhow::bail!("validation failed");
            }
            Ok(())
        }
        Command::Plan { config } => {
            let config = load(&config, cli.log_level.as_deref())?;
            let plan = config.build_plan()?;
            emit(&plan)
        }
        Command::Preview { config } => {
            let config = load(&config, cli.log_level.as_deref())?;
            let plan = config.build_plan()?;
            emit(&preview::project_with(
                &config.frame,
                &plan,
                config.preview.axis_fraction,
            ))
        }
        Command::Scanlines { config } => {
            let config = load(&config, cli.log_level.as_deref())?;
            let plan = config.build_plan()?;
            let standard = config
                .standard
                .map(|s| {
                    scanlines::standard_distribution(config.frame.total_lines, s.ny, s.safe_margin)
                })
                .transpose()?;
            emit(&ScanlineOutput {
                local: scanlines::local_distribution(&plan),
                standard,
            })
        }
        Command::Route {
            config,
            script,
            distance,
        } => {
            let config = load(&config, cli.log_level.as_deref())?;
            let script = AutoMoveScript::parse(&script)?;
            let route = automove::route(&config.frame, &script, distance)?;
            let preview = preview::project_route(&config.frame, &route);
            emit(&RouteOutput { route, preview })
        }
    }
}

fn load(path: &Path, log_level: Option<&str>) -> Result<CitsConfig> {
    let config = CitsConfig::load_from(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    init_logging(log_level.unwrap_or(&config.application.log_level));
    tracing::info!(app = %config.application.name, areas = config.areas.len(), "Configuration loaded");
    Ok(config)
}

fn init_logging(level: &str) {
    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("failed to write JSON")?;
    writeln!(out)?;
    Ok(())
}
