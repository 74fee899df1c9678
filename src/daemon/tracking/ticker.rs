use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::utils::clock::Clock;

use super::TrackerEvent;

/// Nominal period between two ticks. Each tick accounts exactly this much time.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A single firing of a ticker. `generation` tells apart ticks of different starts, so ticks
/// still queued after a stop can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Repeating timer driving accounting.
#[cfg_attr(test, mockall::automock)]
pub trait Ticker {
    /// (Re)starts ticking. Any previous ticker is stopped first.
    fn start(&mut self, period: Duration);

    fn stop(&mut self);

    /// Whether a tick was produced by the ticker that is currently running.
    fn is_current(&self, tick: Tick) -> bool;
}

/// [Ticker] implemented with a tokio task that pushes ticks into the tracker's event queue.
pub struct TokioTicker {
    events: mpsc::Sender<TrackerEvent>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
    generation: u64,
    running: Option<CancellationToken>,
}

impl TokioTicker {
    pub fn new(
        events: mpsc::Sender<TrackerEvent>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            events,
            clock,
            shutdown,
            generation: 0,
            running: None,
        }
    }
}

impl Ticker for TokioTicker {
    fn start(&mut self, period: Duration) {
        self.stop();
        self.generation += 1;

        let token = self.shutdown.child_token();
        self.running = Some(token.clone());
        debug!("Starting ticker {}", self.generation);
        tokio::spawn(run_ticker(
            self.events.clone(),
            self.clock.clone(),
            period,
            Tick {
                generation: self.generation,
            },
            token,
        ));
    }

    fn stop(&mut self) {
        if let Some(token) = self.running.take() {
            debug!("Stopping ticker {}", self.generation);
            token.cancel();
        }
    }

    fn is_current(&self, tick: Tick) -> bool {
        self.running.is_some() && tick.generation == self.generation
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticker(
    events: mpsc::Sender<TrackerEvent>,
    clock: Arc<dyn Clock>,
    period: Duration,
    tick: Tick,
    cancellation: CancellationToken,
) {
    let mut next_tick = clock.instant();
    loop {
        next_tick += period;
        tokio::select! {
            _ = cancellation.cancelled() => return,
            _ = clock.sleep_until(next_tick) => ()
        }
        trace!("Tick {tick:?}");
        if events.send(TrackerEvent::Tick(tick)).await.is_err() {
            return;
        }
    }
}
