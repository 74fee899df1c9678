use std::collections::HashMap;

use anyhow::{anyhow, Result};
use tracing::trace;

use super::{
    focused_window, protocol::BrowserEvent, BrowserApi, TabId, TabInfo, WindowId, WindowTarget,
};

/// Mirror of the browser's tabs. It only knows what the extension reported, so a lookup for a
/// tab that was never reported fails the same way the browser fails for a closed tab.
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: HashMap<TabId, TabInfo>,
    last_focused_window: Option<WindowId>,
}

impl TabRegistry {
    /// Updates the mirror with an event. Must run before the tracker sees the same event.
    pub fn apply(&mut self, event: &BrowserEvent) {
        match event {
            BrowserEvent::TabActivated { tab_id, window_id } => {
                self.activate(*tab_id, *window_id);
            }
            BrowserEvent::TabUpdated { tab, changed_url } => {
                let mut tab = tab.clone();
                if let Some(url) = changed_url {
                    tab.url = Some(url.clone());
                }
                if tab.active {
                    self.activate(tab.id, tab.window_id);
                }
                self.tabs.insert(tab.id, tab);
            }
            BrowserEvent::TabRemoved { tab_id } => {
                self.tabs.remove(tab_id);
            }
            BrowserEvent::WindowFocusChanged { window_id } => {
                // Losing focus keeps the last window, that's still the "current" one.
                if let Some(window) = focused_window(*window_id) {
                    self.last_focused_window = Some(window);
                }
            }
            BrowserEvent::Startup {
                tabs,
                focused_window_id,
            }
            | BrowserEvent::Installed {
                tabs,
                focused_window_id,
                ..
            } => {
                self.tabs = tabs.iter().map(|tab| (tab.id, tab.clone())).collect();
                self.last_focused_window = focused_window(*focused_window_id);
            }
            BrowserEvent::ActionClicked => {}
        }
        trace!("Registry holds {} tabs", self.tabs.len());
    }

    fn activate(&mut self, tab_id: TabId, window_id: WindowId) {
        for tab in self.tabs.values_mut().filter(|tab| tab.window_id == window_id) {
            tab.active = tab.id == tab_id;
        }
        // A tab might have moved between windows without us hearing about it.
        if let Some(tab) = self.tabs.get_mut(&tab_id) {
            tab.window_id = window_id;
            tab.active = true;
        }
    }
}

impl BrowserApi for TabRegistry {
    fn tab_url(&self, tab: TabId) -> Result<Option<String>> {
        self.tabs
            .get(&tab)
            .map(|tab| tab.url.clone())
            .ok_or_else(|| anyhow!("No tab with id {tab}"))
    }

    fn active_tab_url(&self, window: WindowTarget) -> Result<Option<String>> {
        let window = match window {
            WindowTarget::Window(window) => window,
            WindowTarget::Current => match self.last_focused_window {
                Some(window) => window,
                None => return Ok(None),
            },
        };
        Ok(self
            .tabs
            .values()
            .find(|tab| tab.window_id == window && tab.active)
            .and_then(|tab| tab.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::browser_api::{
        protocol::BrowserEvent, BrowserApi, TabInfo, WindowTarget, WINDOW_ID_NONE,
    };

    use super::TabRegistry;

    fn tab(id: i64, window_id: i64, active: bool, url: &str) -> TabInfo {
        TabInfo {
            id,
            window_id,
            active,
            url: Some(url.into()),
        }
    }

    fn started_registry() -> TabRegistry {
        let mut registry = TabRegistry::default();
        registry.apply(&BrowserEvent::Startup {
            tabs: vec![
                tab(1, 10, true, "https://a.com/"),
                tab(2, 10, false, "https://b.com/"),
                tab(3, 20, true, "https://c.com/"),
            ],
            focused_window_id: Some(10),
        });
        registry
    }

    #[test]
    fn test_startup_snapshot() -> Result<()> {
        let registry = started_registry();

        assert_eq!(
            registry.active_tab_url(WindowTarget::Current)?.as_deref(),
            Some("https://a.com/")
        );
        assert_eq!(
            registry.active_tab_url(WindowTarget::Window(20))?.as_deref(),
            Some("https://c.com/")
        );
        assert_eq!(registry.tab_url(2)?.as_deref(), Some("https://b.com/"));
        Ok(())
    }

    #[test]
    fn test_activation_moves_active_tab() -> Result<()> {
        let mut registry = started_registry();
        registry.apply(&BrowserEvent::TabActivated {
            tab_id: 2,
            window_id: 10,
        });

        assert_eq!(
            registry.active_tab_url(WindowTarget::Window(10))?.as_deref(),
            Some("https://b.com/")
        );
        Ok(())
    }

    #[test]
    fn test_update_replaces_url() -> Result<()> {
        let mut registry = started_registry();
        registry.apply(&BrowserEvent::TabUpdated {
            tab: tab(1, 10, true, "https://a.com/"),
            changed_url: Some("https://d.com/".into()),
        });

        assert_eq!(registry.tab_url(1)?.as_deref(), Some("https://d.com/"));
        Ok(())
    }

    #[test]
    fn test_unknown_tab_is_an_error() {
        let mut registry = started_registry();
        registry.apply(&BrowserEvent::TabRemoved { tab_id: 1 });

        assert!(registry.tab_url(1).is_err());
        assert!(registry.tab_url(42).is_err());
    }

    #[test]
    fn test_losing_focus_keeps_current_window() -> Result<()> {
        let mut registry = started_registry();
        registry.apply(&BrowserEvent::WindowFocusChanged {
            window_id: Some(20),
        });
        registry.apply(&BrowserEvent::WindowFocusChanged {
            window_id: Some(WINDOW_ID_NONE),
        });

        assert_eq!(
            registry.active_tab_url(WindowTarget::Current)?.as_deref(),
            Some("https://c.com/")
        );
        Ok(())
    }

    #[test]
    fn test_no_known_window() -> Result<()> {
        let registry = TabRegistry::default();

        assert_eq!(registry.active_tab_url(WindowTarget::Current)?, None);
        Ok(())
    }
}
