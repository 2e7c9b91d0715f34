//! Shared application state handed to every handler.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use flexstore::store::DynDocumentStore;

use crate::auth::Credentials;

/// Version reported by `/health` and `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: DynDocumentStore,
    pub credentials: Option<Arc<Credentials>>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: DynDocumentStore, credentials: Option<Credentials>) -> Self {
        Self {
            store,
            credentials: credentials.map(Arc::new),
            started_at: Instant::now(),
        }
    }

    /// Time since startup, formatted like `1h2m3s`.
    pub fn uptime(&self) -> String {
        format_uptime(self.started_at.elapsed())
    }
}

/// Formats a duration rounded to whole seconds, dropping leading zero units.
pub fn format_uptime(elapsed: Duration) -> String {
    let total = (elapsed.as_millis() + 500) / 1000;
    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::ZERO), "0s");
        assert_eq!(format_uptime(Duration::from_millis(1_499)), "1s");
        assert_eq!(format_uptime(Duration::from_millis(1_500)), "2s");
        assert_eq!(format_uptime(Duration::from_secs(65)), "1m5s");
        assert_eq!(format_uptime(Duration::from_secs(3_605)), "1h0m5s");
        assert_eq!(format_uptime(Duration::from_secs(3_723)), "1h2m3s");
    }
}
