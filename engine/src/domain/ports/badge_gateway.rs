//! Driven port for badge records.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::badge::BadgeKind;
use crate::domain::ids::Username;

/// Port for the append-only badge list of a user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeGateway: Send + Sync {
    /// Badges the user already holds. Unknown badge names are skipped by
    /// adapters.
    async fn list_badges(&self, username: &Username) -> Result<Vec<BadgeKind>, CollaboratorError>;

    /// Append a badge; the tier travels with the kind.
    async fn award_badge(
        &self,
        username: &Username,
        badge: BadgeKind,
    ) -> Result<(), CollaboratorError>;
}
