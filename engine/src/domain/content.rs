//! References to votable content and the snapshots callers hold of it.
//!
//! The engine never owns content. Callers pass what they last loaded from
//! the collaborator; services validate against it and hand back updated
//! snapshots only after the collaborator confirms a change.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{AnswerId, CommentId, QuestionId, Username};
use super::level::Action;
use super::vote::VoteCounts;

/// Kind of votable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotableKind {
    /// A question.
    Question,
    /// An answer.
    Answer,
    /// A comment on a question or answer.
    Comment,
}

/// Post a comment hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CommentParent {
    /// Comment on the question itself.
    Question,
    /// Comment on one of the question's answers.
    Answer {
        /// Parent answer.
        answer_id: AnswerId,
    },
}

/// Item a vote is cast on, carrying its creator so self-votes can be
/// rejected without a collaborator round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum VoteTarget {
    /// A question.
    #[serde(rename_all = "camelCase")]
    Question {
        /// Question being voted on.
        question_id: QuestionId,
        /// Question author.
        creator: Username,
    },
    /// An answer.
    #[serde(rename_all = "camelCase")]
    Answer {
        /// Owning question.
        question_id: QuestionId,
        /// Answer being voted on.
        answer_id: AnswerId,
        /// Answer author.
        creator: Username,
        /// Whether the answer is the accepted one.
        #[serde(default)]
        accepted: bool,
    },
    /// A comment.
    #[serde(rename_all = "camelCase")]
    Comment {
        /// Owning question.
        question_id: QuestionId,
        /// Post the comment is attached to.
        parent: CommentParent,
        /// Comment being voted on.
        comment_id: CommentId,
        /// Comment author.
        creator: Username,
    },
}

impl VoteTarget {
    /// Author of the voted item.
    pub const fn creator(&self) -> &Username {
        match self {
            Self::Question { creator, .. }
            | Self::Answer { creator, .. }
            | Self::Comment { creator, .. } => creator,
        }
    }

    /// Question the item belongs to.
    pub const fn question_id(&self) -> &QuestionId {
        match self {
            Self::Question { question_id, .. }
            | Self::Answer { question_id, .. }
            | Self::Comment { question_id, .. } => question_id,
        }
    }

    /// Kind of the voted item.
    pub const fn kind(&self) -> VotableKind {
        match self {
            Self::Question { .. } => VotableKind::Question,
            Self::Answer { .. } => VotableKind::Answer,
            Self::Comment { .. } => VotableKind::Comment,
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Question { question_id, .. } => write!(f, "question/{question_id}"),
            Self::Answer {
                question_id,
                answer_id,
                ..
            } => write!(f, "question/{question_id}/answer/{answer_id}"),
            Self::Comment {
                question_id,
                parent: CommentParent::Question,
                comment_id,
                ..
            } => write!(f, "question/{question_id}/comment/{comment_id}"),
            Self::Comment {
                question_id,
                parent: CommentParent::Answer { answer_id },
                comment_id,
                ..
            } => write!(
                f,
                "question/{question_id}/answer/{answer_id}/comment/{comment_id}"
            ),
        }
    }
}

/// Moderation status of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    /// Accepting answers.
    #[default]
    Open,
    /// Closed to new answers.
    Closed,
    /// Protected from low-level answerers.
    Protected,
}

impl QuestionStatus {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Protected => "protected",
        }
    }

    /// Parse a wire name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "protected" => Some(Self::Protected),
            _ => None,
        }
    }
}

/// Moderation vote on a question's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusVote {
    /// Vote to protect the question.
    Protect,
    /// Vote to close the question.
    Close,
    /// Vote to reopen a closed question.
    Reopen,
}

impl StatusVote {
    /// Level-gated action guarding the vote.
    pub const fn action(self) -> Action {
        match self {
            Self::Protect => Action::ProtectQuestion,
            Self::Close | Self::Reopen => Action::CloseOrReopenQuestion,
        }
    }

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Protect => "protect",
            Self::Close => "close",
            Self::Reopen => "reopen",
        }
    }
}

/// Caller's view of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
    /// Question identifier.
    pub id: QuestionId,
    /// Question author.
    pub creator: Username,
    /// Moderation status.
    #[serde(default)]
    pub status: QuestionStatus,
    /// Whether an answer has already been accepted.
    #[serde(default)]
    pub has_accepted_answer: bool,
}

impl QuestionSnapshot {
    /// Open question with no accepted answer.
    pub const fn new(id: QuestionId, creator: Username) -> Self {
        Self {
            id,
            creator,
            status: QuestionStatus::Open,
            has_accepted_answer: false,
        }
    }
}

/// Caller's view of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSnapshot {
    /// Owning question.
    pub question_id: QuestionId,
    /// Answer identifier.
    pub id: AnswerId,
    /// Answer author.
    pub creator: Username,
    /// Last known vote counts.
    #[serde(default)]
    pub counts: VoteCounts,
    /// Whether the answer is accepted.
    #[serde(default)]
    pub accepted: bool,
}

/// Post addressed by an edit vote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PostRef {
    /// A question.
    #[serde(rename_all = "camelCase")]
    Question {
        /// Question identifier.
        question_id: QuestionId,
    },
    /// An answer.
    #[serde(rename_all = "camelCase")]
    Answer {
        /// Owning question.
        question_id: QuestionId,
        /// Answer identifier.
        answer_id: AnswerId,
    },
}

impl PostRef {
    /// Whether the post is a question.
    pub const fn is_question(&self) -> bool {
        matches!(self, Self::Question { .. })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn target() -> VoteTarget {
        VoteTarget::Comment {
            question_id: QuestionId::new("q1").expect("valid id"),
            parent: CommentParent::Answer {
                answer_id: AnswerId::new("a1").expect("valid id"),
            },
            comment_id: CommentId::new("c1").expect("valid id"),
            creator: Username::new("bob").expect("valid username"),
        }
    }

    #[rstest]
    fn comment_target_exposes_creator_and_kind() {
        let target = target();
        assert_eq!(target.creator().as_str(), "bob");
        assert_eq!(target.kind(), VotableKind::Comment);
        assert_eq!(target.question_id().as_str(), "q1");
    }

    #[rstest]
    fn display_is_a_stable_path() {
        assert_eq!(target().to_string(), "question/q1/answer/a1/comment/c1");
    }

    #[rstest]
    #[case("open", Some(QuestionStatus::Open))]
    #[case("protected", Some(QuestionStatus::Protected))]
    #[case("archived", None)]
    fn parses_status_names(#[case] raw: &str, #[case] expected: Option<QuestionStatus>) {
        assert_eq!(QuestionStatus::parse(raw), expected);
    }
}
