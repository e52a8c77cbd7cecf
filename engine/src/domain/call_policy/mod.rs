//! Bounded retry policy for collaborator calls.
//!
//! Reads retry transient failures with jittered exponential backoff. Writes
//! are never blindly re-sent: after a rate limit the caller's re-derive
//! probe inspects collaborator state, and the write is repeated only when
//! the probe shows it was not applied. Timeouts and server failures on
//! writes surface immediately so callers can compensate.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, warn};

use super::ports::CollaboratorError;

mod runtime;

pub use runtime::{AttemptJitter, CallPolicyRuntime, TokioSleeper};

/// Attempt limits and backoff bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPolicyConfig {
    /// Maximum attempts for reads, including the first call.
    pub read_max_attempts: u32,
    /// Maximum attempts for writes, including the first call.
    pub write_max_attempts: u32,
    /// Initial retry backoff.
    pub initial_backoff: Duration,
    /// Maximum retry backoff cap.
    pub max_backoff: Duration,
}

impl Default for CallPolicyConfig {
    fn default() -> Self {
        Self {
            read_max_attempts: 3,
            write_max_attempts: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Async sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use reputation_engine::domain::BackoffJitter;
    /// use chrono::{DateTime, TimeZone, Utc};
    /// use std::time::Duration;
    /// struct FixedJitter;
    /// impl BackoffJitter for FixedJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _: DateTime<Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt) * 5)
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid time");
    /// assert_eq!(
    ///     FixedJitter.jittered_delay(Duration::from_millis(100), 2, now),
    ///     Duration::from_millis(110),
    /// );
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Retry policy shared by every domain service.
pub struct CallPolicy {
    config: CallPolicyConfig,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
}

impl CallPolicy {
    /// Build a policy using tokio sleeping and clock-seeded jitter.
    pub fn new(config: CallPolicyConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_runtime(config, clock, CallPolicyRuntime::default())
    }

    /// Build a policy with injected runtime abstractions.
    pub fn with_runtime(
        config: CallPolicyConfig,
        clock: Arc<dyn Clock>,
        runtime: CallPolicyRuntime,
    ) -> Self {
        Self {
            config,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
        }
    }

    /// Active limits.
    pub const fn config(&self) -> &CallPolicyConfig {
        &self.config
    }

    /// Run an idempotent read, retrying transient failures.
    ///
    /// ```rust,ignore
    /// let user = policy.read("get_user", || users.get_user(&username)).await?;
    /// ```
    pub async fn read<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, CollaboratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        let max_attempts = self.config.read_max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    warn!(operation, attempt, %error, "collaborator read failed; retrying");
                    self.pause(attempt).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Run a write, reconciling before any retry.
    ///
    /// On a rate limit the policy backs off and calls `rederive`. `Some`
    /// means the write is already visible and is returned without
    /// re-sending; `None` means it was not applied and may be retried; an
    /// error aborts.
    pub async fn write<T, W, WFut, R, RFut>(
        &self,
        operation: &'static str,
        mut write: W,
        mut rederive: R,
    ) -> Result<T, CollaboratorError>
    where
        W: FnMut() -> WFut,
        WFut: Future<Output = Result<T, CollaboratorError>>,
        R: FnMut() -> RFut,
        RFut: Future<Output = Result<Option<T>, CollaboratorError>>,
    {
        let max_attempts = self.config.write_max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match write().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_rate_limited() && attempt < max_attempts => {
                    warn!(
                        operation,
                        attempt,
                        %error,
                        "collaborator write rate limited; re-deriving state"
                    );
                    self.pause(attempt).await;
                    if let Some(value) = self.read(operation, &mut rederive).await? {
                        debug!(operation, attempt, "write already applied; not re-sending");
                        return Ok(value);
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn pause(&self, attempt: u32) {
        let base = self.retry_base_delay(attempt);
        let delay = self.jitter.jittered_delay(base, attempt, self.clock.utc());
        self.sleeper.sleep(delay).await;
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}
