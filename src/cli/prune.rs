use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::info;

use crate::daemon::storage::{
    entities::RetentionPolicy,
    time_storage::{JsonTimeStorage, TimeStorage},
};

#[derive(Debug, Parser)]
pub struct PruneCommand {
    #[arg(long = "keep-days", help = "Number of most recent days to keep, today included")]
    keep_days: u32,
}

pub async fn process_prune_command(
    PruneCommand { keep_days }: PruneCommand,
    dir: PathBuf,
) -> Result<()> {
    let policy = RetentionPolicy::new(keep_days).context("--keep-days must be at least 1")?;
    let storage = JsonTimeStorage::new(dir)?;
    let removed = prune(&storage, policy, Local::now().date_naive()).await?;
    println!("Removed {removed} day(s) of history");
    Ok(())
}

/// Drops days outside of the retention window. The store is only rewritten when something was
/// removed, and never while another process is between reading and writing it.
pub async fn prune(
    storage: &impl TimeStorage,
    policy: RetentionPolicy,
    today: NaiveDate,
) -> Result<usize> {
    let first_kept = policy.first_kept(today);
    let removed = storage.update(|data| data.retain_since(first_kept)).await?;
    if removed > 0 {
        info!("Pruned {removed} days before {first_kept}");
    }
    Ok(removed)
}
