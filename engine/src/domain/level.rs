//! Level policy: points to privilege level to allowed actions.
//!
//! This is the single authoritative level table. Every gate in the engine
//! goes through [`authorize`] or [`require`]; both fail closed.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::user::{REGISTRATION_POINTS, User};

/// Minimum points per level, highest level first.
const LEVEL_THRESHOLDS: [(u8, i64); 7] = [
    (7, 10_000),
    (6, 3_000),
    (5, 1_000),
    (4, 125),
    (3, 50),
    (2, 15),
    (1, REGISTRATION_POINTS),
];

/// Privilege level in `1..=7`.
///
/// # Examples
/// ```
/// use reputation_engine::domain::Level;
///
/// assert_eq!(Level::from_points(124).get(), 3);
/// assert_eq!(Level::from_points(125).get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

/// Error returned when constructing a level outside `1..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("level must be between 1 and 7, got {0}")]
pub struct LevelOutOfRange(pub u8);

impl Level {
    /// Lowest level, held by every registered user.
    pub const MIN: Self = Self(1);
    /// Highest level.
    pub const MAX: Self = Self(7);

    /// Validate a raw level number.
    pub const fn new(value: u8) -> Result<Self, LevelOutOfRange> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(LevelOutOfRange(value))
        }
    }

    /// Derive the level for a point total. Negative totals map to level 1.
    pub fn from_points(points: i64) -> Self {
        LEVEL_THRESHOLDS
            .iter()
            .find(|(_, min)| points >= *min)
            .map_or(Self::MIN, |(level, _)| Self(*level))
    }

    /// Raw level number.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Points at which this level starts.
    pub fn min_points(self) -> i64 {
        LEVEL_THRESHOLDS
            .iter()
            .find(|(level, _)| *level == self.0)
            .map_or(REGISTRATION_POINTS, |(_, min)| *min)
    }

    /// The level above this one, if any.
    pub const fn next(self) -> Option<Self> {
        if self.0 < Self::MAX.0 {
            Some(Self(self.0 + 1))
        } else {
            None
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {}", self.0)
    }
}

impl From<Level> for u8 {
    fn from(value: Level) -> Self {
        value.0
    }
}

impl TryFrom<u8> for Level {
    type Error = LevelOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Level-gated actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Post an answer.
    CreateAnswer,
    /// Upvote a question, answer or comment.
    Upvote,
    /// Comment on any post.
    Comment,
    /// Downvote a question, answer or comment.
    Downvote,
    /// See raw upvote and downvote counts.
    ViewVoteCounts,
    /// Vote to protect a question.
    ProtectQuestion,
    /// Vote to close or reopen a question.
    CloseOrReopenQuestion,
    /// Trigger or approve an edit vote.
    VoteOnEdit,
}

impl Action {
    /// Every action, lowest threshold first.
    pub const ALL: [Self; 8] = [
        Self::CreateAnswer,
        Self::Upvote,
        Self::Comment,
        Self::Downvote,
        Self::ViewVoteCounts,
        Self::ProtectQuestion,
        Self::CloseOrReopenQuestion,
        Self::VoteOnEdit,
    ];

    /// Minimum level needed to perform the action.
    pub const fn required_level(self) -> Level {
        match self {
            Self::CreateAnswer => Level(1),
            Self::Upvote => Level(2),
            Self::Comment => Level(3),
            Self::Downvote => Level(4),
            Self::ViewVoteCounts => Level(5),
            Self::ProtectQuestion => Level(6),
            Self::CloseOrReopenQuestion | Self::VoteOnEdit => Level(7),
        }
    }

    /// Short verb phrase used in denial messages.
    pub const fn description(self) -> &'static str {
        match self {
            Self::CreateAnswer => "answer questions",
            Self::Upvote => "upvote",
            Self::Comment => "comment on any post",
            Self::Downvote => "downvote",
            Self::ViewVoteCounts => "view vote counts",
            Self::ProtectQuestion => "vote to protect questions",
            Self::CloseOrReopenQuestion => "vote to close or reopen questions",
            Self::VoteOnEdit => "vote on edits",
        }
    }
}

/// Why an authorization check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No user accompanied the request.
    Unauthenticated,
    /// The user's level is below the action's threshold.
    LevelTooLow {
        /// Denied action.
        action: Action,
        /// Level the action requires.
        required: Level,
        /// Level the user holds.
        actual: Level,
    },
}

impl Denial {
    /// User-facing explanation of the denial.
    pub fn message(&self) -> String {
        match self {
            Self::Unauthenticated => "You must be logged in".to_owned(),
            Self::LevelTooLow {
                action, required, ..
            } => format!(
                "You need {required} ({} points) to {}",
                required.min_points(),
                action.description()
            ),
        }
    }
}

impl From<Denial> for DomainError {
    fn from(value: Denial) -> Self {
        match value {
            Denial::Unauthenticated => Self::unauthenticated(value.message()),
            Denial::LevelTooLow {
                required, actual, ..
            } => Self::unauthorized(value.message()).with_details(serde_json::json!({
                "requiredLevel": required.get(),
                "actualLevel": actual.get(),
            })),
        }
    }
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// The action may proceed.
    Allowed,
    /// The action is denied.
    Denied(Denial),
}

impl Authorization {
    /// Whether the action may proceed.
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Convert into a domain result.
    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied(denial) => Err(denial.into()),
        }
    }
}

/// Decide whether `user` may perform `action`.
pub fn authorize(user: Option<&User>, action: Action) -> Authorization {
    let Some(user) = user else {
        return Authorization::Denied(Denial::Unauthenticated);
    };
    let actual = user.level();
    let required = action.required_level();
    if actual >= required {
        Authorization::Allowed
    } else {
        Authorization::Denied(Denial::LevelTooLow {
            action,
            required,
            actual,
        })
    }
}

/// Authorize and hand back the authenticated user.
pub fn require(user: Option<&User>, action: Action) -> Result<&User, DomainError> {
    authorize(user, action).into_result()?;
    user.ok_or_else(|| Denial::Unauthenticated.into())
}

/// Actions unlocked at `level`.
pub fn privileges(level: Level) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|action| action.required_level() <= level)
        .collect()
}

/// Progress towards the next level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextThreshold {
    /// Level that will be reached.
    pub level: Level,
    /// Points at which it starts.
    pub points_required: i64,
    /// Points still needed.
    pub points_remaining: i64,
}

/// Points needed for the next level, or `None` at the top level.
pub fn next_threshold(points: i64) -> Option<NextThreshold> {
    let level = Level::from_points(points).next()?;
    let points_required = level.min_points();
    Some(NextThreshold {
        level,
        points_required,
        points_remaining: points_required.saturating_sub(points),
    })
}

#[cfg(test)]
mod tests;
