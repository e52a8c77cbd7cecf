//! Driven port for bounty records.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::bounty::{Bounty, BountyAmount};
use crate::domain::ids::{QuestionId, Username};

/// Port for the single bounty a question may carry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BountyGateway: Send + Sync {
    /// Current bounty on the question, if any.
    async fn get_bounty(
        &self,
        question_id: &QuestionId,
    ) -> Result<Option<Bounty>, CollaboratorError>;

    /// Record an active bounty. The points are escrowed separately.
    async fn create_bounty(
        &self,
        question_id: &QuestionId,
        poster: &Username,
        amount: BountyAmount,
    ) -> Result<Bounty, CollaboratorError>;

    /// Mark the bounty awarded to `awardee`.
    async fn award_bounty(
        &self,
        question_id: &QuestionId,
        awardee: &Username,
    ) -> Result<Bounty, CollaboratorError>;

    /// Mark the bounty refunded to its poster.
    async fn refund_bounty(&self, question_id: &QuestionId) -> Result<Bounty, CollaboratorError>;
}
