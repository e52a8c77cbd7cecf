//! Minimum spacing between outbound requests.
//!
//! Requests reserve consecutive slots at least `min_interval` apart and
//! sleep until their slot arrives, so bursts from one session are spread
//! out instead of tripping the collaborator's rate limiter.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::RetrySleeper;

/// Serialises request start times.
pub struct RequestThrottle {
    min_interval: TimeDelta,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    last_slot: Mutex<Option<DateTime<Utc>>>,
}

impl RequestThrottle {
    /// Build a throttle spacing requests by `min_interval`.
    pub fn new(
        min_interval: Duration,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn RetrySleeper>,
    ) -> Self {
        Self {
            min_interval: TimeDelta::from_std(min_interval).unwrap_or(TimeDelta::MAX),
            clock,
            sleeper,
            last_slot: Mutex::new(None),
        }
    }

    /// Wait until the next request may start.
    pub async fn acquire(&self) {
        let mut last_slot = self.last_slot.lock().await;
        let now = self.clock.utc();
        let slot = match *last_slot {
            Some(previous) => previous
                .checked_add_signed(self.min_interval)
                .map_or(now, |earliest| earliest.max(now)),
            None => now,
        };
        *last_slot = Some(slot);

        let wait = (slot - now).to_std().unwrap_or_default();
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis(), "throttling outbound request");
            self.sleeper.sleep(wait).await;
        }
    }
}
