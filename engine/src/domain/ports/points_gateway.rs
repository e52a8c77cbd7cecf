//! Driven port for atomic point adjustments.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::ids::Username;

/// Port applying signed point deltas to a user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointsGateway: Send + Sync {
    /// Apply `delta` atomically. Nothing is reflected locally until this
    /// returns `Ok`.
    async fn adjust_points(&self, username: &Username, delta: i64) -> Result<(), CollaboratorError>;
}
