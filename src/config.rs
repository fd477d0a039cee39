use std::time::Duration;

/// Tunables of a [`Panel`](crate::panel::Panel)'s dispatcher.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    /// Synthesize mouse events from primary pointer events.
    pub compatibility_mouse_events: bool,
    /// Maximum number of released instances kept per event kind.
    pub pool_capacity: usize,
    /// Remember the last two hit-test results.
    pub hit_test_cache: bool,
    /// Move focus to the nearest focusable element on pointer down.
    pub focus_on_pointer_down: bool,
    /// Send click events after matching pointer down/up pairs.
    pub click_events: bool,
    /// Maximum delay between two clicks counted as one multi-click.
    pub double_click_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            compatibility_mouse_events: true,
            pool_capacity: 100,
            hit_test_cache: true,
            focus_on_pointer_down: true,
            click_events: true,
            double_click_interval: Duration::from_millis(500),
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compatibility_mouse_events(mut self, enabled: bool) -> Self {
        self.compatibility_mouse_events = enabled;
        self
    }

    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn hit_test_cache(mut self, enabled: bool) -> Self {
        self.hit_test_cache = enabled;
        self
    }

    pub fn focus_on_pointer_down(mut self, enabled: bool) -> Self {
        self.focus_on_pointer_down = enabled;
        self
    }

    pub fn click_events(mut self, enabled: bool) -> Self {
        self.click_events = enabled;
        self
    }

    pub fn double_click_interval(mut self, interval: Duration) -> Self {
        self.double_click_interval = interval;
        self
    }
}
