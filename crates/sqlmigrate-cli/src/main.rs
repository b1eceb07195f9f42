mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlmigrate_common::Direction;
use sqlmigrate_config::{AppConfig, ConfigLoader};
use sqlmigrate_db::{DirectorySource, Migrator, SqliteDatabase};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlmigrate", version, about = "Apply SQL migration scripts exactly once")]
struct Cli {
    /// YAML or TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "SQLMIGRATE_DATABASE")]
    database: Option<PathBuf>,

    /// Directory of <id>.up.sql / <id>.down.sql scripts
    #[arg(long, env = "SQLMIGRATE_DIR")]
    dir: Option<PathBuf>,

    /// Ledger table name
    #[arg(long, env = "SQLMIGRATE_TABLE")]
    table: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply every pending migration
    Up,
    /// List applied and pending migrations
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }
    if let Some(dir) = &cli.dir {
        config.migrations.directory = dir.clone();
    }
    if let Some(table) = &cli.table {
        config.migrations.table_name = table.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let table = config
        .migrations
        .table()
        .context("invalid ledger table name")?;

    let migrator = Migrator::new(table);
    let source = DirectorySource::new(&config.migrations.directory);
    let mut db = SqliteDatabase::open(&config.database.path).with_context(|| {
        format!("failed to open database {}", config.database.path.display())
    })?;

    match cli.command {
        Command::Up => match migrator.apply(&mut db, &source, Direction::Up) {
            Ok(applied) => {
                info!("migration run complete");
                println!("{}", report::applied_summary(applied));
                Ok(())
            }
            Err(failure) => {
                println!("{}", report::applied_summary(failure.applied));
                Err(failure.error).context("migration run failed")
            }
        },
        Command::Status => {
            let status = migrator
                .status(&mut db, &source)
                .context("failed to read migration status")?;
            print!("{}", report::render_status(&status));
            Ok(())
        }
    }
}
