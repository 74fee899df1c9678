use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{error, info, instrument, trace};

use crate::utils::clock::Clock;

use super::storage::{entities::RetentionPolicy, time_storage::TimeStorage};

/// Seconds credited for every tick.
pub const TICK_SECONDS: u64 = 1;

/// Bridges ticks and [TimeStorage]. Every increment is a full read-modify-write of the store.
pub struct Accountant<S: TimeStorage> {
    storage: S,
    clock: Arc<dyn Clock>,
    retention: Option<RetentionPolicy>,
    last_pruned: Option<NaiveDate>,
}

impl<S: TimeStorage> Accountant<S> {
    pub fn new(storage: S, clock: Arc<dyn Clock>, retention: Option<RetentionPolicy>) -> Self {
        Self {
            storage,
            clock,
            retention,
            last_pruned: None,
        }
    }

    /// Adds `seconds` to `hostname` for today. An empty hostname or zero seconds leave the store
    /// untouched.
    #[instrument(level = "trace", skip(self))]
    pub async fn increment(&mut self, hostname: &str, seconds: u64) -> Result<()> {
        if hostname.is_empty() || seconds == 0 {
            return Ok(());
        }

        let today = self.clock.today();
        // Pruning piggybacks on the first write of every day.
        let prune = self.retention.filter(|_| self.last_pruned != Some(today));
        let total = self
            .storage
            .update(|data| {
                if let Some(policy) = prune {
                    let removed = data.retain_since(policy.first_kept(today));
                    if removed > 0 {
                        info!("Pruned {removed} days older than {}", policy.first_kept(today));
                    }
                }
                data.add(today, hostname, seconds)
            })
            .await?;

        if prune.is_some() {
            self.last_pruned = Some(today);
        }
        trace!("{today} {hostname} now at {total}s");
        Ok(())
    }

    /// Accounts one tick. Failures lose the tick and are only logged.
    pub async fn record_tick(&mut self, hostname: &str) {
        if let Err(e) = self.increment(hostname, TICK_SECONDS).await {
            error!("Error incrementing stored time for {hostname}: {e:?}");
        }
    }
}
