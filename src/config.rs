use std::env;
use std::time::Duration;

/// Engine tunables. Domain defaults (costs, horizons, offsets) live in
/// [`crate::domain::models::settings::GlobalConfig`] and belong to the user;
/// these knobs belong to the runtime.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Trailing-edge debounce for the notification dirty queue.
    pub dirty_debounce: Duration,
    /// Debounce for batched generator invocations.
    pub generate_debounce: Duration,
    /// Notifications are only scheduled this many days ahead.
    pub notify_window_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dirty_debounce: Duration::from_millis(5000),
            generate_debounce: Duration::from_millis(100),
            notify_window_days: 7,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dirty_debounce: env_millis("AGENDA_DIRTY_DEBOUNCE_MS", defaults.dirty_debounce),
            generate_debounce: env_millis("AGENDA_GENERATE_DEBOUNCE_MS", defaults.generate_debounce),
            notify_window_days: env::var("AGENDA_NOTIFY_WINDOW_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.notify_window_days),
        }
    }
}

fn env_millis(key: &str, fallback: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(fallback)
}
