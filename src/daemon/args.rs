use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;

use super::storage::entities::RetentionPolicy;

#[derive(Parser, Debug)]
#[command(name = "sitetime-host", version, long_about = None)]
#[command(about = "Native messaging host recording time spent on websites")]
pub struct HostArgs {
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    #[arg(long = "retention-days", help = "Forget days older than this many days")]
    pub retention_days: Option<u32>,
    /// This option is for debugging purposes only. Logs are written to stderr.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
    /// Windows browsers pass the handle of the calling window.
    #[arg(long = "parent-window", hide = true)]
    pub parent_window: Option<String>,
    /// Browsers pass the calling extension (and sometimes the manifest path).
    #[arg(hide = true)]
    pub caller: Vec<String>,
}

impl HostArgs {
    pub fn retention(&self) -> Result<Option<RetentionPolicy>> {
        self.retention_days
            .map(|days| RetentionPolicy::new(days).context("--retention-days must be at least 1"))
            .transpose()
    }
}
