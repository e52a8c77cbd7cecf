//! Driven port for per-user vote records on questions, answers and comments.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::content::VoteTarget;
use crate::domain::ids::Username;
use crate::domain::vote::{VoteCommand, VoteState};

/// Port for reading and adjusting one voter's vote on one item.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteGateway: Send + Sync {
    /// Current vote of `voter` on `target`.
    ///
    /// Adapters may report an absent vote either as [`VoteState::None`] or
    /// as [`CollaboratorError::NotFound`]; callers treat both as no vote.
    async fn get_vote(
        &self,
        target: &VoteTarget,
        voter: &Username,
    ) -> Result<VoteState, CollaboratorError>;

    /// Submit one count adjustment on behalf of `voter`.
    async fn submit_vote(
        &self,
        target: &VoteTarget,
        voter: &Username,
        command: VoteCommand,
    ) -> Result<(), CollaboratorError>;
}
