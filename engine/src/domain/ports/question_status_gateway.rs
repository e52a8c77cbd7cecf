//! Driven port for question status votes.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::content::{QuestionStatus, StatusVote};
use crate::domain::ids::{QuestionId, Username};

/// Port for protect, close and reopen votes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionStatusGateway: Send + Sync {
    /// Record a status vote and return the question's resulting status.
    async fn submit_status_vote(
        &self,
        question_id: &QuestionId,
        voter: &Username,
        vote: StatusVote,
    ) -> Result<QuestionStatus, CollaboratorError>;
}
