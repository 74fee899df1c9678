//! Everything the host knows about the browser.
//! The extension forwards tab and window events through [protocol]; [registry::TabRegistry]
//! replays them into a mirror of the browser state that answers [BrowserApi] lookups.

pub mod protocol;
pub mod registry;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type WindowId = i64;

/// Window id browsers report when focus moved outside of any browser window.
pub const WINDOW_ID_NONE: WindowId = -1;

/// Subset of a browser tab the host cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub active: bool,
    /// Missing for tabs the extension isn't allowed to inspect.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTarget {
    /// The window the user interacted with last.
    Current,
    Window(WindowId),
}

/// Intended to serve as a contract for answering tab lookups.
#[cfg_attr(test, mockall::automock)]
pub trait BrowserApi {
    /// Url of a tab. Unknown tabs are an error, tabs without an url resolve to `None`.
    fn tab_url(&self, tab: TabId) -> Result<Option<String>>;

    /// Url of the active tab in a window.
    fn active_tab_url(&self, window: WindowTarget) -> Result<Option<String>>;
}

/// Turns a focus change payload into the focused window, if any.
pub fn focused_window(window_id: Option<WindowId>) -> Option<WindowId> {
    window_id.filter(|id| *id != WINDOW_ID_NONE)
}
