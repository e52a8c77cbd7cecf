//! Driven port for edit votes.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::content::PostRef;
use crate::domain::edit_vote::EditProposal;
use crate::domain::ids::EditVoteId;

/// Port for opening and approving edit votes. Quorum is the
/// collaborator's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EditVoteGateway: Send + Sync {
    /// Open an edit vote and return its identifier.
    async fn trigger_edit_vote(
        &self,
        post: &PostRef,
        proposal: &EditProposal,
    ) -> Result<EditVoteId, CollaboratorError>;

    /// Cast a "yes" vote on a pending edit.
    async fn vote_on_edit(
        &self,
        post: &PostRef,
        edit_vote_id: &EditVoteId,
    ) -> Result<(), CollaboratorError>;
}
