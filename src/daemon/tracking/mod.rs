//! Turns browser events into accounted time. All events, including ticks, go through a single
//! queue consumed by [TrackingModule], so state changes and store updates never interleave.

pub mod resolve;
pub mod ticker;
pub mod tracker;

use std::sync::Arc;

use anyhow::Result;
use ticker::{Tick, Ticker};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracker::ActiveSiteTracker;

use crate::browser_api::{
    protocol::{BrowserEvent, HostMessage},
    registry::TabRegistry,
};

use super::{accounting::Accountant, storage::time_storage::TimeStorage};

/// Hostname of a tracked site, for example `www.example.com`.
pub type Hostname = Arc<str>;

/// Extension page showing the statistics, relative to the extension root.
pub const STATS_PAGE_PATH: &str = "options/options.html";

#[derive(Debug, Clone)]
pub enum TrackerEvent {
    Browser(BrowserEvent),
    Tick(Tick),
    /// The browser closed the connection, nothing more will arrive.
    Disconnected,
}

pub struct TrackingModule<S: TimeStorage, T: Ticker> {
    receiver: mpsc::Receiver<TrackerEvent>,
    replies: mpsc::Sender<HostMessage>,
    registry: TabRegistry,
    tracker: ActiveSiteTracker<T>,
    accountant: Accountant<S>,
    shutdown: CancellationToken,
}

impl<S: TimeStorage, T: Ticker> TrackingModule<S, T> {
    pub fn new(
        receiver: mpsc::Receiver<TrackerEvent>,
        replies: mpsc::Sender<HostMessage>,
        ticker: T,
        accountant: Accountant<S>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            replies,
            registry: TabRegistry::default(),
            tracker: ActiveSiteTracker::new(ticker),
            accountant,
            shutdown,
        }
    }

    /// Executes the tracking event loop until the browser disconnects or shutdown is requested.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = self.receiver.recv() => event,
            };
            match event {
                Some(TrackerEvent::Disconnected) | None => {
                    info!("Browser disconnected");
                    break;
                }
                Some(event) => self.process(event).await,
            }
        }

        self.tracker.clear();
        // Other modules wait for the same token, the host is done once tracking is.
        self.shutdown.cancel();
        Ok(())
    }

    async fn process(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::Browser(event) => {
                debug!("Processing event {:?}", event);
                self.registry.apply(&event);
                self.tracker.handle_browser_event(&event, &self.registry);
                if let BrowserEvent::ActionClicked = event {
                    self.reply(HostMessage::OpenStatsPage {
                        path: STATS_PAGE_PATH.into(),
                    })
                    .await;
                }
            }
            TrackerEvent::Tick(tick) => {
                if let Some(hostname) = self.tracker.handle_tick(tick) {
                    self.accountant.record_tick(&hostname).await;
                }
            }
            TrackerEvent::Disconnected => {}
        }
    }

    async fn reply(&self, message: HostMessage) {
        if let Err(e) = self.replies.send(message).await {
            warn!("Couldn't queue reply to the browser {e:?}");
        }
    }
}
