//! Tab navigation and connectivity
//!
//! Losing the network while on the search tab moves the user to their saved
//! flights, which work offline.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Search,
    Saved,
}

#[derive(Debug, Clone, Default)]
pub struct Navigation {
    active_tab: Tab,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn go_to_search(&mut self) {
        self.active_tab = Tab::Search;
    }

    pub fn go_to_saved(&mut self) {
        self.active_tab = Tab::Saved;
    }

    /// React to a connectivity change
    pub fn on_connectivity_change(&mut self, online: bool) {
        if !online && self.active_tab == Tab::Search {
            tracing::info!("Offline, switching to saved flights");
            self.active_tab = Tab::Saved;
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkStatus {
    online: bool,
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self { online: true }
    }
}

impl NetworkStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Record the current connectivity, forwarding changes to `navigation`
    ///
    /// Returns whether the state changed.
    pub fn set_online(&mut self, online: bool, navigation: &mut Navigation) -> bool {
        if self.online == online {
            return false;
        }
        self.online = online;
        navigation.on_connectivity_change(online);
        true
    }
}
