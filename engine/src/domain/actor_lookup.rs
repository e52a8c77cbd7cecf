//! Fresh reads of the acting user ahead of a level gate.
//!
//! A session's `User` carries the points seen at login. Escrows and votes
//! move those points afterwards, so gates re-read the directory instead.

use std::sync::Arc;

use super::call_policy::CallPolicy;
use super::collaborator_mapping::map_collaborator_error;
use super::error::DomainError;
use super::level::{self, Action, Denial};
use super::ports::UserDirectory;
use super::user::User;

/// Reloads the actor from the user directory.
pub(crate) struct ActorLookup {
    users: Arc<dyn UserDirectory>,
    policy: Arc<CallPolicy>,
}

impl ActorLookup {
    pub(crate) fn new(users: Arc<dyn UserDirectory>, policy: Arc<CallPolicy>) -> Self {
        Self { users, policy }
    }

    /// Current record for `actor`; anonymous callers are unauthenticated.
    pub(crate) async fn current(&self, actor: Option<&User>) -> Result<User, DomainError> {
        let actor = actor.ok_or_else(|| DomainError::from(Denial::Unauthenticated))?;
        self.policy
            .read("get_user", || self.users.get_user(actor.username()))
            .await
            .map_err(|cause| map_collaborator_error("load actor", &cause))
    }

    /// Current record for `actor`, provided its level allows `action`.
    pub(crate) async fn require(
        &self,
        actor: Option<&User>,
        action: Action,
    ) -> Result<User, DomainError> {
        let current = self.current(actor).await?;
        level::require(Some(&current), action)?;
        Ok(current)
    }
}
