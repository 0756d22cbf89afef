//! Minimum-interval gate shared by every outbound request
//!
//! One gate is owned by a `Checker` and handed to all of its HTTP clients,
//! so Crossref and ORCID calls are spaced against the same clock.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Serializes callers so that consecutive passes are at least `min_interval` apart
pub struct RateGate {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait if necessary to comply with the rate limit
    ///
    /// The lock is held through the sleep, so concurrent callers queue up.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!(wait_ms = wait_time.as_millis() as u64, "Rate limiting: waiting");
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}
