//! Driven port for answer acceptance.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::ids::{AnswerId, QuestionId};

/// Port marking an answer accepted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerGateway: Send + Sync {
    /// Mark `answer_id` as the accepted answer of `question_id`. Setting the
    /// flag twice is harmless.
    async fn accept_answer(
        &self,
        question_id: &QuestionId,
        answer_id: &AnswerId,
    ) -> Result<(), CollaboratorError>;
}
