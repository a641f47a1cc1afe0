//! Connwatch - IP Connection Surveillance
//!
//! Tracks connections by IP address in a self-balancing ordered index,
//! with on-demand eviction of idle entries and flat-file persistence.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use connwatch::audit::AuditLog;
use connwatch::config::ConfigManager;
use connwatch::menu::MenuSession;
use connwatch::ConnectionStore;

/// CLI arguments for Connwatch
#[derive(Parser, Debug)]
#[command(name = "connwatch")]
#[command(about = "Connwatch - IP connection surveillance")]
#[command(version)]
#[command(long_about = "
Connwatch - IP connection surveillance

Tracks connections by IP address in a self-balancing ordered index and
evicts entries that have been idle for longer than a configurable threshold.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  CONNWATCH_DATA_FILE  - Connection data file path
  CONNWATCH_AUDIT_LOG  - Audit log file path
  CONNWATCH_THRESHOLD  - Default inactivity threshold (e.g., 5m, 30s)
  CONNWATCH_LOG_LEVEL  - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "config.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Connection data file (overrides config file)
    #[arg(short, long, help = "Connection data file path")]
    pub data_file: Option<PathBuf>,

    /// Default inactivity threshold for sweeps (overrides config file)
    #[arg(short, long, value_parser = humantime::parse_duration, help = "Default inactivity threshold (e.g., 5m, 30s)")]
    pub threshold: Option<Duration>,

    /// Disable the audit log
    #[arg(long, help = "Disable the audit log")]
    pub no_audit: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", help = "Log level")]
    pub log_level: String,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_tracing(&args)?;

    info!("Starting Connwatch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with priority: CLI args > config file > environment > defaults
    let mut config = if args.config.exists() {
        ConfigManager::load_from_file(&args.config)?
    } else {
        info!("Config file not found, checking environment variables");
        ConfigManager::load_from_env()?
    };

    config.merge_with_cli_args(args.data_file.as_deref(), args.threshold, args.no_audit);

    config
        .validate()
        .context("Final configuration validation failed")?;

    if args.validate_config {
        info!("Configuration is valid");
        info!("  Data file: {}", config.storage.data_file.display());
        info!(
            "  Audit log: {} ({})",
            config.audit.log_file.display(),
            if config.audit.enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        info!(
            "  Default sweep threshold: {}",
            humantime::format_duration(config.sweep.default_threshold)
        );
        return Ok(());
    }

    let audit = AuditLog::new(&config.audit.log_file, config.audit.enabled);
    audit.system_started();

    let store = ConnectionStore::new(&config.storage.data_file);
    let (root, count) = store.load()?;
    if count > 0 {
        info!("Loaded {} connections from {}", count, store.path().display());
        audit.connections_loaded(store.path(), count);
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let session = MenuSession::new(
        stdin.lock(),
        stdout.lock(),
        root,
        store,
        audit,
        config.sweep.default_threshold,
    );
    session.run()?;

    info!("Connwatch shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(args: &CliArgs) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_ansi(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}
