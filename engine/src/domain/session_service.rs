//! Session login and profile completion.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::badge::{Badge, BadgeTrigger};
use super::badge_service::BadgeEvaluator;
use super::call_policy::CallPolicy;
use super::collaborator_mapping::map_collaborator_error;
use super::error::DomainError;
use super::ids::Username;
use super::level::{Denial, Level, NextThreshold, next_threshold};
use super::ports::{CollaboratorError, UserDirectory};
use super::user::{CredentialProof, User};

/// Authenticated user with derived standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Logged-in user.
    pub user: User,
    /// Level derived from the user's points.
    pub level: Level,
    /// Next level and the points still needed, below the top level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<NextThreshold>,
    /// Badges awarded by this login.
    pub badges_awarded: Vec<Badge>,
}

/// Logs users in against the collaborator.
pub struct SessionService {
    users: Arc<dyn UserDirectory>,
    badges: Arc<BadgeEvaluator>,
    policy: Arc<CallPolicy>,
}

impl SessionService {
    /// Build the service.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        badges: Arc<BadgeEvaluator>,
        policy: Arc<CallPolicy>,
    ) -> Self {
        Self {
            users,
            badges,
            policy,
        }
    }

    /// Authenticate `username` with `proof`.
    ///
    /// # Errors
    /// [`crate::domain::ErrorCode::NotFound`] when the user does not exist
    /// and [`crate::domain::ErrorCode::Unauthenticated`] when the proof is
    /// refused.
    pub async fn login(
        &self,
        username: &Username,
        proof: &CredentialProof,
    ) -> Result<Session, DomainError> {
        self.policy
            .read("get_user", || self.users.get_user(username))
            .await
            .map_err(|cause| map_collaborator_error("load user", &cause))?;

        let accepted = match self.users.authenticate(username, proof).await {
            Ok(accepted) => accepted,
            Err(CollaboratorError::Unauthorized { .. }) => false,
            Err(cause) => return Err(map_collaborator_error("authenticate", &cause)),
        };
        if !accepted {
            warn!(%username, "login refused");
            return Err(DomainError::unauthenticated("Invalid username or password"));
        }

        // Points may have moved between the lookup and the handshake.
        let user = self
            .policy
            .read("get_user", || self.users.get_user(username))
            .await
            .map_err(|cause| map_collaborator_error("load user", &cause))?;
        let level = user.level();
        info!(%username, level = level.get(), "user logged in");

        let kinds = self
            .badges
            .award_quietly(
                username,
                &[BadgeTrigger::FirstLogin, BadgeTrigger::PointsReached(user.points())],
            )
            .await;
        Ok(Session {
            next_level: next_threshold(user.points()),
            level,
            badges_awarded: Badge::all_held_by(username, kinds),
            user,
        })
    }

    /// Record that `actor` finished their profile.
    ///
    /// Only [`BadgeTrigger::ProfileCompleted`] is raised; the user must
    /// still exist in the directory.
    pub async fn complete_profile(&self, actor: Option<&User>) -> Result<Vec<Badge>, DomainError> {
        let actor = actor.ok_or_else(|| DomainError::from(Denial::Unauthenticated))?;
        let username = actor.username();
        self.policy
            .read("get_user", || self.users.get_user(username))
            .await
            .map_err(|cause| map_collaborator_error("load user", &cause))?;
        let kinds = self
            .badges
            .award_quietly(username, &[BadgeTrigger::ProfileCompleted])
            .await;
        info!(%username, awarded = kinds.len(), "profile completed");
        Ok(Badge::all_held_by(username, kinds))
    }
}
