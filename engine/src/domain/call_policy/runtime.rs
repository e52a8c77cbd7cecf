//! Production pause and jitter for collaborator retries.
//!
//! Tests swap both halves for the doubles in `crate::test_support` so retry
//! loops finish without waiting on the wall clock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{BackoffJitter, RetrySleeper};

/// How the policy waits between collaborator attempts.
pub struct CallPolicyRuntime {
    /// Pauses the retrying task.
    pub sleeper: Arc<dyn RetrySleeper>,
    /// Spreads retries from concurrent callers apart.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for CallPolicyRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(AttemptJitter),
        }
    }
}

/// Waits on the tokio timer, so paused test runtimes can advance it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Stretches a backoff delay by at most 25%.
///
/// The extra milliseconds come from the sub-second part of `now` mixed with
/// the attempt number, which keeps two callers retrying the same rate-limited
/// endpoint from waking together.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptJitter;

impl BackoffJitter for AttemptJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let spread = (base_ms / 4).max(1);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        let extra = seed % spread.saturating_add(1);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}
