pub mod host_path;
pub mod manifest;
pub mod output;
pub mod prune;
pub mod stats;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use manifest::{process_manifest_command, ManifestCommand};
use prune::{process_prune_command, PruneCommand};
use stats::{process_stats_command, StatsCommand};
use tracing::level_filters::LevelFilter;

use crate::utils::{
    dir::application_path,
    logging::{enable_logging, CLI_PREFIX},
};

#[derive(Parser, Debug)]
#[command(name = "sitetime", version, long_about = None)]
#[command(about = "Shows how much time was spent on each website", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to read from $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Display time spent per website")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(about = "Forget old days of history")]
    Prune {
        #[command(flatten)]
        command: PruneCommand,
    },
    #[command(about = "Print the native messaging manifest for the browser")]
    Manifest {
        #[command(flatten)]
        command: ManifestCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let dir = application_path(args.dir)?;
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    match args.commands {
        Commands::Stats { command } => process_stats_command(command, dir).await,
        Commands::Prune { command } => process_prune_command(command, dir).await,
        Commands::Manifest { command } => process_manifest_command(command),
    }
}
