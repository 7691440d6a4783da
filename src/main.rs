use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use annot_reconcile::ReconcileConfig;
use annot_reconcile::logging::{LogFormat, init_logging};

mod cmd;

#[derive(Parser)]
#[command(name = "annot-reconcile")]
#[command(version, about = "Reconcile genome-annotation batch jobs with the record of expected work")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./reconcile.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Results root holding one directory per accession. Overrides the config file.
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    /// SQLite database path. Overrides the config file.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or migrate the database
    Init,
    /// Run one reconciliation pass
    Run {
        /// Print the pass report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show job, sequence unit, and assembly counts by status
    Status,
    /// Return every job of one sequence unit to unknown
    Reset {
        accession: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_format, cli.log_file.as_deref())?;

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = ReconcileConfig::discover(cli.config.as_deref(), &cwd)?
        .with_overrides(cli.results_dir.clone(), cli.database.clone());

    match &cli.command {
        Commands::Init => cmd::cmd_init(&config)?,
        Commands::Run { json } => cmd::cmd_run(&config, *json)?,
        Commands::Status => cmd::cmd_status(&config)?,
        Commands::Reset { accession } => cmd::cmd_reset(&config, accession)?,
    }

    Ok(())
}
