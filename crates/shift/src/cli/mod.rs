mod migrate;
mod new;

pub use migrate::{ConnectionArgs, DownCommand, StatusCommand, UpCommand};
pub use new::NewCommand;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use shift_core::config::{LogFormat, LoggingConfig};
use shift_core::ShiftConfig;

/// SHIFT - versioned SQL schema migrations
#[derive(Parser)]
#[command(name = "shift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, default_value = "shift.toml", global = true)]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format.
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Apply all pending migrations.
    Up(UpCommand),

    /// Revert the latest applied migration.
    Down(DownCommand),

    /// Show applied and pending migrations.
    Status(StatusCommand),

    /// Create an empty up/down migration pair.
    New(NewCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        // Load .env if present
        dotenvy::dotenv().ok();

        let config = load_config(&self.config)?;
        init_logging(&config.logging, self.verbose, self.log_format.map(Into::into));

        match self.command {
            Commands::Up(cmd) => cmd.execute(config).await,
            Commands::Down(cmd) => cmd.execute(config).await,
            Commands::Status(cmd) => cmd.execute(config).await,
            Commands::New(cmd) => cmd.execute(&config),
        }
    }
}

/// Read the config file, or defaults when it does not exist.
///
/// A missing file is fine as long as the database URL arrives from the
/// command line or `DATABASE_URL`; that is checked once overrides are applied.
fn load_config(path: &Path) -> Result<ShiftConfig> {
    if !path.exists() {
        return Ok(ShiftConfig::default());
    }
    ShiftConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn init_logging(config: &LoggingConfig, verbose: bool, format: Option<LogFormat>) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded in a host binary.
    let _ = match format.unwrap_or(config.format) {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
}
