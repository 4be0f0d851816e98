//! Stocktake - physical inventory audits from the command line
//!
//! Pick a location, feed scanner codes on stdin, get a reconciliation
//! report of confirmed, missing and misplaced assets.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use stocktake_logging::{init_logging, LogConfig};

mod cli;

use cli::audit::AuditArgs;
use cli::context::CliContext;
use cli::locations::LocationsArgs;
use cli::reports::ReportsAction;

#[derive(Parser, Debug)]
#[command(name = "stocktake", version, about = "Physical inventory audit reconciliation")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.stocktake/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database path, overriding the config file
    #[arg(long, global = true, env = "STOCKTAKE_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List locations with their expected asset counts
    Locations {
        /// Sync this inventory snapshot (JSON array of assets) first
        #[arg(short, long)]
        inventory: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Audit one location, reading scanned codes from stdin
    Audit {
        /// Location to audit
        location: String,

        /// Sync this inventory snapshot (JSON array of assets) first
        #[arg(short, long)]
        inventory: Option<PathBuf>,

        /// Input comes from a camera; repeated frames are debounced
        #[arg(long)]
        camera: bool,

        /// Audit even if nothing is expected at the location
        #[arg(long)]
        allow_empty: bool,

        /// Finish instead of abandoning when input ends
        #[arg(long)]
        finish_on_eof: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse finished reconciliation reports
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Commands::Locations { json, .. } | Commands::Audit { json, .. } => *json,
            Commands::Reports { action } => action.json(),
        }
    }
}

async fn run_command(cli: Cli) -> Result<()> {
    let ctx = CliContext::load(cli.config.as_deref(), cli.db)?;

    match cli.command {
        Commands::Locations { inventory, json } => {
            cli::locations::run(&ctx, LocationsArgs { inventory, json }).await
        }
        Commands::Audit {
            location,
            inventory,
            camera,
            allow_empty,
            finish_on_eof,
            json,
        } => {
            let args = AuditArgs {
                location,
                inventory,
                camera,
                allow_empty,
                finish_on_eof,
                json,
            };
            cli::audit::run(&ctx, args).await
        }
        Commands::Reports { action } => cli::reports::run(&ctx, action).await,
    }
}

fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run_command(cli))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.command.wants_json();
    let interactive = json_mode || matches!(cli.command, Commands::Audit { .. });

    if let Err(err) = init_logging(LogConfig {
        app_name: "stocktake",
        verbose: cli.verbose,
        interactive,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else if let Some(helpful) = err.downcast_ref::<cli::error::HelpfulError>() {
                eprint!("{}", helpful);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
