//! Bounty rules: amount bounds, residual points, award preconditions.
//!
//! Lifecycle: `none -> active -> awarded`, or `active -> refunded` when an
//! award cannot be recorded. A bounty never changes once awarded.

use serde::{Deserialize, Serialize};

use super::content::{AnswerSnapshot, QuestionSnapshot};
use super::error::DomainError;
use super::ids::{QuestionId, Username};

/// Smallest bounty a poster may offer.
pub const MIN_BOUNTY: u32 = 75;
/// Largest bounty a poster may offer.
pub const MAX_BOUNTY: u32 = 500;
/// Points a poster must keep after the escrow deduction.
pub const MIN_RESIDUAL_POINTS: i64 = 75;

/// Validated bounty amount in `MIN_BOUNTY..=MAX_BOUNTY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BountyAmount(u32);

impl BountyAmount {
    /// Validate an amount.
    pub const fn new(amount: u32) -> Result<Self, BountyRuleViolation> {
        if amount >= MIN_BOUNTY && amount <= MAX_BOUNTY {
            Ok(Self(amount))
        } else {
            Err(BountyRuleViolation::AmountOutOfRange { amount })
        }
    }

    /// Raw amount.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<BountyAmount> for u32 {
    fn from(value: BountyAmount) -> Self {
        value.0
    }
}

impl TryFrom<u32> for BountyAmount {
    type Error = BountyRuleViolation;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Where a bounty is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum BountyState {
    /// Escrowed and awaiting an award.
    Active,
    /// Paid out.
    #[serde(rename_all = "camelCase")]
    Awarded {
        /// Recipient of the bounty.
        awarded_to: Username,
    },
    /// Returned to the poster.
    Refunded,
}

/// Escrowed bounty on a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounty {
    /// Question carrying the bounty.
    pub question_id: QuestionId,
    /// User who escrowed the points.
    pub poster: Username,
    /// Escrowed amount.
    pub amount: BountyAmount,
    /// Lifecycle state.
    #[serde(flatten)]
    pub state: BountyState,
}

impl Bounty {
    /// Freshly escrowed bounty.
    pub const fn active(question_id: QuestionId, poster: Username, amount: BountyAmount) -> Self {
        Self {
            question_id,
            poster,
            amount,
            state: BountyState::Active,
        }
    }

    /// Whether the bounty still awaits an award.
    pub const fn is_active(&self) -> bool {
        matches!(self.state, BountyState::Active)
    }

    /// Recipient, once awarded.
    pub const fn awarded_to(&self) -> Option<&Username> {
        match &self.state {
            BountyState::Awarded { awarded_to } => Some(awarded_to),
            BountyState::Active | BountyState::Refunded => None,
        }
    }
}

/// Broken bounty rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BountyRuleViolation {
    /// The amount is outside `MIN_BOUNTY..=MAX_BOUNTY`.
    #[error("bounty must be between 75 and 500 points, got {amount}")]
    AmountOutOfRange {
        /// Requested amount.
        amount: u32,
    },
    /// The poster would drop below `MIN_RESIDUAL_POINTS`.
    #[error("posting a {amount} point bounty needs at least {required} points; you have {points}")]
    InsufficientPoints {
        /// Requested amount.
        amount: u32,
        /// Poster's confirmed points.
        points: i64,
        /// Points needed to post.
        required: i64,
    },
    /// Only the question's creator may post or award its bounty.
    #[error("only the question's creator may manage its bounty")]
    NotPoster,
    /// The question already has an accepted answer.
    #[error("the question already has an accepted answer")]
    AnswerAlreadyAccepted,
    /// The question already carries a bounty.
    #[error("the question already has a bounty")]
    AlreadyExists,
    /// The bounty was already paid out.
    #[error("the bounty has already been awarded")]
    AlreadyAwarded,
    /// The bounty was already returned to the poster.
    #[error("the bounty has been refunded")]
    AlreadyRefunded,
    /// Bounties go only to the accepted answer.
    #[error("a bounty can only be awarded to the accepted answer")]
    AnswerNotAccepted,
    /// The answer belongs to another question.
    #[error("the answer does not belong to this question")]
    AnswerMismatch,
}

impl From<BountyRuleViolation> for DomainError {
    fn from(value: BountyRuleViolation) -> Self {
        let message = value.to_string();
        match value {
            BountyRuleViolation::AmountOutOfRange { .. }
            | BountyRuleViolation::InsufficientPoints { .. }
            | BountyRuleViolation::AnswerMismatch => Self::invalid_request(message),
            BountyRuleViolation::NotPoster => Self::forbidden(message),
            BountyRuleViolation::AnswerAlreadyAccepted
            | BountyRuleViolation::AlreadyExists
            | BountyRuleViolation::AlreadyAwarded
            | BountyRuleViolation::AlreadyRefunded
            | BountyRuleViolation::AnswerNotAccepted => Self::conflict(message),
        }
    }
}

/// Checks that need only the caller's snapshot; run before any
/// collaborator call.
pub fn check_creation_request(
    poster: &Username,
    question: &QuestionSnapshot,
    amount: u32,
) -> Result<BountyAmount, BountyRuleViolation> {
    if poster != &question.creator {
        return Err(BountyRuleViolation::NotPoster);
    }
    let amount = BountyAmount::new(amount)?;
    if question.has_accepted_answer {
        return Err(BountyRuleViolation::AnswerAlreadyAccepted);
    }
    Ok(amount)
}

/// Residual-points rule against the poster's freshly read points.
///
/// # Examples
/// ```
/// use reputation_engine::domain::bounty::{check_residual_points, BountyAmount};
///
/// let amount = BountyAmount::new(100).expect("in range");
/// assert!(check_residual_points(175, amount).is_ok());
/// assert!(check_residual_points(174, amount).is_err());
/// ```
pub fn check_residual_points(points: i64, amount: BountyAmount) -> Result<(), BountyRuleViolation> {
    let required = MIN_RESIDUAL_POINTS.saturating_add(i64::from(amount.get()));
    if points < required {
        return Err(BountyRuleViolation::InsufficientPoints {
            amount: amount.get(),
            points,
            required,
        });
    }
    Ok(())
}

/// Award preconditions against the current bounty record.
pub fn check_award(
    bounty: &Bounty,
    actor: &Username,
    question: &QuestionSnapshot,
    answer: &AnswerSnapshot,
) -> Result<(), BountyRuleViolation> {
    if answer.question_id != question.id || bounty.question_id != question.id {
        return Err(BountyRuleViolation::AnswerMismatch);
    }
    if actor != &bounty.poster {
        return Err(BountyRuleViolation::NotPoster);
    }
    match bounty.state {
        BountyState::Active => {}
        BountyState::Awarded { .. } => return Err(BountyRuleViolation::AlreadyAwarded),
        BountyState::Refunded => return Err(BountyRuleViolation::AlreadyRefunded),
    }
    if !answer.accepted {
        return Err(BountyRuleViolation::AnswerNotAccepted);
    }
    Ok(())
}
