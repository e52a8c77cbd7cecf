//! Fixed point-value table and the ledger entries derived from events.

use serde::{Deserialize, Serialize};

use super::content::{VotableKind, VoteTarget};
use super::ids::Username;
use super::vote::{VoteCommand, VoteDirection, VoteOperation};

/// Event that moves someone's points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum ScoringEvent {
    /// A question was posted; credited to the asker.
    QuestionPosted,
    /// An answer was posted; credited to the answerer.
    AnswerPosted,
    /// A question received an upvote; credited to its creator.
    QuestionUpvoted,
    /// A question received a downvote; charged to its creator.
    QuestionDownvoted,
    /// An answer received an upvote; credited to its creator.
    AnswerUpvoted,
    /// An answer received a downvote; charged to its creator.
    AnswerDownvoted,
    /// The voter cast a downvote on a question or answer.
    DownvoteCast,
    /// An answer was accepted; credited to the answerer.
    AnswerAccepted,
    /// A bounty was escrowed; charged to the poster.
    BountyEscrowed {
        /// Escrowed amount.
        amount: u32,
    },
    /// A bounty was awarded; credited to the awardee.
    BountyAwarded {
        /// Awarded amount.
        amount: u32,
    },
}

impl ScoringEvent {
    /// Point delta for the event when applied forwards.
    ///
    /// # Examples
    /// ```
    /// use reputation_engine::domain::ScoringEvent;
    ///
    /// assert_eq!(ScoringEvent::AnswerUpvoted.points(), 10);
    /// assert_eq!(ScoringEvent::BountyEscrowed { amount: 100 }.points(), -100);
    /// ```
    pub fn points(self) -> i64 {
        match self {
            Self::QuestionPosted => 1,
            Self::AnswerPosted => 2,
            Self::QuestionUpvoted => 5,
            Self::QuestionDownvoted | Self::DownvoteCast => -1,
            Self::AnswerUpvoted => 10,
            Self::AnswerDownvoted => -5,
            Self::AnswerAccepted => 15,
            Self::BountyEscrowed { amount } => -i64::from(amount),
            Self::BountyAwarded { amount } => i64::from(amount),
        }
    }
}

/// One point adjustment for one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// User whose points move.
    pub username: Username,
    /// Originating event.
    pub event: ScoringEvent,
    /// Whether the event is being undone.
    pub reversal: bool,
}

impl LedgerEntry {
    /// Apply `event` forwards to `username`.
    pub const fn forward(username: Username, event: ScoringEvent) -> Self {
        Self {
            username,
            event,
            reversal: false,
        }
    }

    /// Undo `event` for `username`.
    pub const fn reverse(username: Username, event: ScoringEvent) -> Self {
        Self {
            username,
            event,
            reversal: true,
        }
    }

    /// Signed delta to submit.
    pub fn delta(&self) -> i64 {
        let points = self.event.points();
        if self.reversal { -points } else { points }
    }

    /// Entry cancelling this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            username: self.username.clone(),
            event: self.event,
            reversal: !self.reversal,
        }
    }
}

/// Ledger entries for one confirmed vote command.
///
/// Comment votes carry no points. A decrement reverses the entries its
/// matching increment produced, which keeps switching symmetric.
pub fn vote_entries(
    target: &VoteTarget,
    voter: &Username,
    command: VoteCommand,
) -> Vec<LedgerEntry> {
    let creator_event = match (target.kind(), command.direction) {
        (VotableKind::Question, VoteDirection::Up) => ScoringEvent::QuestionUpvoted,
        (VotableKind::Question, VoteDirection::Down) => ScoringEvent::QuestionDownvoted,
        (VotableKind::Answer, VoteDirection::Up) => ScoringEvent::AnswerUpvoted,
        (VotableKind::Answer, VoteDirection::Down) => ScoringEvent::AnswerDownvoted,
        (VotableKind::Comment, _) => return Vec::new(),
    };
    let reversal = command.operation == VoteOperation::Decrement;
    let entry = |username: &Username, event| LedgerEntry {
        username: username.clone(),
        event,
        reversal,
    };

    let mut entries = vec![entry(target.creator(), creator_event)];
    if command.direction == VoteDirection::Down {
        entries.push(entry(voter, ScoringEvent::DownvoteCast));
    }
    entries
}
