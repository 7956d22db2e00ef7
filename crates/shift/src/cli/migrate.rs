use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser};
use console::style;
use tracing::{debug, error, info};

use shift_core::{ShiftConfig, StatusReport};
use shift_runtime::{Database, Migrator, MigratorOptions, SourceAggregator};

/// Overrides for the `[database]` and `[migrations]` config sections.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Database connection URL.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Migrations directory. Repeat for several sources; order is kept.
    #[arg(short, long = "dir", env = "MIGRATIONS_DIR", value_delimiter = ',')]
    pub dirs: Vec<PathBuf>,

    /// Tracking table name.
    #[arg(long)]
    pub table: Option<String>,

    /// Advisory lock key.
    #[arg(long, allow_negative_numbers = true)]
    pub lock_key: Option<i64>,

    /// Upper bound for the whole run, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    /// Layer the overrides on top of `config` and validate the result.
    pub fn apply(&self, mut config: ShiftConfig) -> Result<ShiftConfig> {
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if !self.dirs.is_empty() {
            config.migrations.dirs = self.dirs.clone();
        }
        if let Some(table) = &self.table {
            config.migrations.table = table.clone();
        }
        if let Some(key) = self.lock_key {
            config.migrations.lock_key = key;
        }
        if let Some(secs) = self.timeout_secs {
            config.migrations.timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Connect and build a migrator over the configured directories.
async fn connect(config: &ShiftConfig) -> Result<(Database, Migrator)> {
    debug!("Connecting to database");
    let db = Database::connect(&config.database).await?;
    info!(
        "Using migrations from {:?} tracked in {}",
        config.migrations.dirs, config.migrations.table
    );
    let source = SourceAggregator::new().with_dirs(config.migrations.dirs.iter());
    let migrator = Migrator::postgres(
        db.pool().clone(),
        source,
        MigratorOptions::from(&config.migrations),
    );
    Ok((db, migrator))
}

fn log_outcome<T>(op: &str, result: &shift_core::Result<T>) {
    match result {
        Ok(_) => info!("shift {} finished", op),
        Err(e) => error!("shift {} failed: {}", op, e),
    }
}

fn print_header(title: &str) {
    println!();
    println!("  {} {}", style("SHIFT").bold().cyan(), title);
    println!();
}

/// Apply all pending migrations.
#[derive(Parser, Debug)]
pub struct UpCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl UpCommand {
    pub async fn execute(self, config: ShiftConfig) -> Result<()> {
        let config = self.connection.apply(config)?;
        let (db, migrator) = connect(&config).await?;

        print_header("Migrations");
        println!("  {} Running pending migrations...", style("→").dim());
        let result = migrator.up().await;
        db.close().await;
        log_outcome("up", &result);
        result?;

        println!("  {} Migrations complete", style("✓").green());
        println!();
        Ok(())
    }
}

/// Revert the latest applied migration.
#[derive(Parser, Debug)]
pub struct DownCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Allow reverting. Down is disabled unless this or `allow_down` is set.
    #[arg(long, env = "SHIFT_ALLOW_DOWN")]
    pub allow_down: bool,
}

impl DownCommand {
    pub async fn execute(self, config: ShiftConfig) -> Result<()> {
        let mut config = self.connection.apply(config)?;
        config.migrations.allow_down |= self.allow_down;
        let (db, migrator) = connect(&config).await?;

        print_header("Migrations");
        println!("  {} Reverting latest migration...", style("→").dim());
        let result = migrator.down().await;
        db.close().await;
        log_outcome("down", &result);
        result?;

        println!("  {} Revert complete", style("✓").green());
        println!();
        Ok(())
    }
}

/// Show applied and pending migrations.
#[derive(Parser, Debug)]
pub struct StatusCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(self, config: ShiftConfig) -> Result<()> {
        let config = self.connection.apply(config)?;
        let (db, migrator) = connect(&config).await?;
        let result = migrator.status().await;
        db.close().await;
        log_outcome("status", &result);
        let report = result?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        print_header("Migration Status");
        print!("{}", report);
        println!();
        print_summary(&report);
        Ok(())
    }
}

fn print_summary(report: &StatusReport) {
    let pending = report.pending().count();
    let drifted = report.drifted().count();
    println!(
        "  {} {} recorded, {} pending",
        style("ℹ").blue(),
        report.applied.len(),
        pending
    );
    if drifted > 0 {
        println!(
            "  {} {} applied migration(s) changed on disk",
            style("!").red().bold(),
            drifted
        );
    }
    println!();
    println!(
        "  {} = pending, {} = checksum mismatch",
        style("*").yellow(),
        style("!").red()
    );
    println!();
}
