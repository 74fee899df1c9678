use anyhow::Result;
use tracing::{debug, info, trace, warn};

use crate::browser_api::{
    focused_window, protocol::BrowserEvent, BrowserApi, WindowTarget,
};

use super::{
    resolve::resolve_hostname,
    ticker::{Tick, Ticker, TICK_PERIOD},
    Hostname,
};

/// The hostname time is currently accounted to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackerState {
    current: Option<Hostname>,
}

/// Outcome of feeding a resolved hostname into [TrackerState::transition].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Switch {
        /// Previous hostname was being timed and its ticker has to stop.
        stop_previous: bool,
        next: Option<Hostname>,
    },
}

impl TrackerState {
    pub fn current(&self) -> Option<&Hostname> {
        self.current.as_ref()
    }

    pub fn transition(&self, resolved: Option<Hostname>) -> Transition {
        if resolved == self.current {
            Transition::Unchanged
        } else {
            Transition::Switch {
                stop_previous: self.current.is_some(),
                next: resolved,
            }
        }
    }
}

/// Owns the active site state and the ticker that times it.
pub struct ActiveSiteTracker<T: Ticker> {
    ticker: T,
    state: TrackerState,
}

impl<T: Ticker> ActiveSiteTracker<T> {
    pub fn new(ticker: T) -> Self {
        Self {
            ticker,
            state: TrackerState::default(),
        }
    }

    pub fn current(&self) -> Option<&Hostname> {
        self.state.current()
    }

    /// Feeds a candidate url of the active tab. Switching hostnames restarts the ticker, the same
    /// hostname again changes nothing.
    pub fn on_new_url(&mut self, candidate: Option<&str>) {
        let resolved = resolve_hostname(candidate);
        match self.state.transition(resolved) {
            Transition::Unchanged => trace!("Active site unchanged {:?}", self.state.current),
            Transition::Switch {
                stop_previous,
                next,
            } => {
                if stop_previous {
                    self.ticker.stop();
                }
                info!("Active site {:?} -> {:?}", self.state.current, next);
                if next.is_some() {
                    self.ticker.start(TICK_PERIOD);
                }
                self.state.current = next;
            }
        }
    }

    pub fn handle_browser_event(&mut self, event: &BrowserEvent, browser: &impl BrowserApi) {
        match event {
            BrowserEvent::TabActivated { tab_id, .. } => {
                let url = lookup(browser.tab_url(*tab_id));
                self.on_new_url(url.as_deref());
            }
            BrowserEvent::TabUpdated {
                tab,
                changed_url: Some(url),
            } if tab.active => self.on_new_url(Some(url)),
            BrowserEvent::WindowFocusChanged { window_id } => match focused_window(*window_id) {
                Some(window) => {
                    let url = lookup(browser.active_tab_url(WindowTarget::Window(window)));
                    self.on_new_url(url.as_deref());
                }
                None => self.clear(),
            },
            BrowserEvent::Startup { .. } | BrowserEvent::Installed { .. } => {
                self.initialize(browser)
            }
            BrowserEvent::TabUpdated { .. }
            | BrowserEvent::TabRemoved { .. }
            | BrowserEvent::ActionClicked => {}
        }
    }

    /// Decides what a tick accounts for. Returns the hostname to credit, if any.
    pub fn handle_tick(&mut self, tick: Tick) -> Option<Hostname> {
        if !self.ticker.is_current(tick) {
            trace!("Dropping stale tick {tick:?}");
            return None;
        }
        match &self.state.current {
            Some(hostname) => Some(hostname.clone()),
            None => {
                debug!("Tick without an active site, stopping ticker");
                self.ticker.stop();
                None
            }
        }
    }

    /// Stops timing without waiting for a new url, used when the browser loses focus.
    pub fn clear(&mut self) {
        if let Some(previous) = self.state.current.take() {
            info!("Active site {previous:?} lost focus");
            self.ticker.stop();
        }
    }

    fn initialize(&mut self, browser: &impl BrowserApi) {
        // A fresh browser session starts from scratch, nothing from before keeps ticking.
        self.ticker.stop();
        self.state = TrackerState::default();
        if let Some(url) = lookup(browser.active_tab_url(WindowTarget::Current)) {
            self.on_new_url(Some(&url));
        }
    }
}

/// Failed lookups are treated as tabs without an url.
fn lookup(result: Result<Option<String>>) -> Option<String> {
    result
        .inspect_err(|e| warn!("Tab lookup failed {e:?}"))
        .ok()
        .flatten()
}
