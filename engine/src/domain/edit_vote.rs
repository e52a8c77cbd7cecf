//! Edit proposals submitted for community vote.

use serde::{Deserialize, Serialize};

use super::content::PostRef;
use super::error::DomainError;

/// Invalid edit proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EditProposalError {
    /// The proposed body was blank.
    #[error("the proposed body must not be empty")]
    EmptyBody,
    /// A title was proposed for an answer.
    #[error("only questions have titles")]
    TitleNotAllowed,
    /// A blank title was proposed for a question.
    #[error("the proposed title must not be empty")]
    EmptyTitle,
}

impl From<EditProposalError> for DomainError {
    fn from(value: EditProposalError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Proposed new content for a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProposal {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    body: String,
}

impl EditProposal {
    /// Validate a proposal against the post it edits.
    ///
    /// # Examples
    /// ```
    /// use reputation_engine::domain::{EditProposal, PostRef, QuestionId};
    ///
    /// let post = PostRef::Question { question_id: QuestionId::new("q1").expect("id") };
    /// let proposal = EditProposal::new(&post, Some("Better title".into()), "Clearer body");
    /// assert!(proposal.is_ok());
    /// ```
    pub fn new(
        post: &PostRef,
        title: Option<String>,
        body: impl Into<String>,
    ) -> Result<Self, EditProposalError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(EditProposalError::EmptyBody);
        }
        if let Some(title) = &title {
            if !post.is_question() {
                return Err(EditProposalError::TitleNotAllowed);
            }
            if title.trim().is_empty() {
                return Err(EditProposalError::EmptyTitle);
            }
        }
        Ok(Self { title, body })
    }

    /// Proposed title, questions only.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Proposed body.
    pub fn body(&self) -> &str {
        self.body.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ids::{AnswerId, QuestionId};
    use rstest::rstest;

    fn question() -> PostRef {
        PostRef::Question {
            question_id: QuestionId::new("q1").expect("valid id"),
        }
    }

    fn answer() -> PostRef {
        PostRef::Answer {
            question_id: QuestionId::new("q1").expect("valid id"),
            answer_id: AnswerId::new("a1").expect("valid id"),
        }
    }

    #[rstest]
    #[case(question(), None, "  ", EditProposalError::EmptyBody)]
    #[case(answer(), Some("Title"), "body", EditProposalError::TitleNotAllowed)]
    #[case(question(), Some(" "), "body", EditProposalError::EmptyTitle)]
    fn rejects_invalid_proposals(
        #[case] post: PostRef,
        #[case] title: Option<&str>,
        #[case] body: &str,
        #[case] expected: EditProposalError,
    ) {
        let result = EditProposal::new(&post, title.map(str::to_owned), body);
        assert_eq!(result, Err(expected));
    }

    #[rstest]
    fn answers_accept_body_only_edits() {
        let proposal = EditProposal::new(&answer(), None, "fixed typo").expect("valid proposal");
        assert_eq!(proposal.body(), "fixed typo");
        assert!(proposal.title().is_none());
    }
}
