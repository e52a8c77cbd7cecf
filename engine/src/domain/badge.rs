//! Badge catalogue and the rules deciding which badges a trigger earns.

use serde::{Deserialize, Serialize};

use super::ids::Username;

/// Badge tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTier {
    /// Bronze.
    Bronze,
    /// Silver.
    Silver,
    /// Gold.
    Gold,
}

impl BadgeTier {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }
}

/// Every badge the platform awards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    /// First successful login.
    FirstLogin,
    /// Question reached a net score of 10.
    NiceQuestion,
    /// Accepted answer reached a net score of 10.
    NiceAnswer,
    /// Reached 100 points.
    Curious,
    /// Accepted an answer.
    Scholar,
    /// Question reached a net score of 25.
    GoodQuestion,
    /// Accepted answer reached a net score of 25.
    GoodAnswer,
    /// Reached 3000 points.
    Inquisitive,
    /// A question of the user's was protected.
    Protected,
    /// Completed the profile.
    ProfileComplete,
    /// Question reached a net score of 100.
    GreatQuestion,
    /// Accepted answer reached a net score of 100.
    GreatAnswer,
    /// Reached 1000 points.
    ThousandPoints,
    /// Reached 10000 points.
    Socratic,
    /// A closed question of the user's was reopened.
    Zombie,
}

impl BadgeKind {
    /// The full catalogue.
    pub const ALL: [Self; 15] = [
        Self::FirstLogin,
        Self::NiceQuestion,
        Self::NiceAnswer,
        Self::Curious,
        Self::Scholar,
        Self::GoodQuestion,
        Self::GoodAnswer,
        Self::Inquisitive,
        Self::Protected,
        Self::ProfileComplete,
        Self::GreatQuestion,
        Self::GreatAnswer,
        Self::ThousandPoints,
        Self::Socratic,
        Self::Zombie,
    ];

    /// Display name, which is also the collaborator's badge key.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstLogin => "First Login",
            Self::NiceQuestion => "Nice Question",
            Self::NiceAnswer => "Nice Answer",
            Self::Curious => "Curious",
            Self::Scholar => "Scholar",
            Self::GoodQuestion => "Good Question",
            Self::GoodAnswer => "Good Answer",
            Self::Inquisitive => "Inquisitive",
            Self::Protected => "Protected",
            Self::ProfileComplete => "Profile Complete",
            Self::GreatQuestion => "Great Question",
            Self::GreatAnswer => "Great Answer",
            Self::ThousandPoints => "1000 Points",
            Self::Socratic => "Socratic",
            Self::Zombie => "Zombie",
        }
    }

    /// Tier of the badge.
    pub const fn tier(self) -> BadgeTier {
        match self {
            Self::FirstLogin
            | Self::NiceQuestion
            | Self::NiceAnswer
            | Self::Curious
            | Self::Scholar => BadgeTier::Bronze,
            Self::GoodQuestion
            | Self::GoodAnswer
            | Self::Inquisitive
            | Self::Protected
            | Self::ProfileComplete => BadgeTier::Silver,
            Self::GreatQuestion
            | Self::GreatAnswer
            | Self::ThousandPoints
            | Self::Socratic
            | Self::Zombie => BadgeTier::Gold,
        }
    }

    /// Look a badge up by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// A badge held by a user. Badges are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Which badge.
    pub kind: BadgeKind,
    /// Holder.
    pub earned_by: Username,
}

impl Badge {
    /// One badge per kind, all held by `username`.
    pub fn all_held_by(username: &Username, kinds: Vec<BadgeKind>) -> Vec<Self> {
        kinds
            .into_iter()
            .map(|kind| Self {
                kind,
                earned_by: username.clone(),
            })
            .collect()
    }
}

/// Milestone or event that may earn badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTrigger {
    /// The user logged in.
    FirstLogin,
    /// The user's confirmed point total.
    PointsReached(i64),
    /// Net score of a question the user asked.
    QuestionScore(i64),
    /// Net score of an accepted answer the user wrote.
    AcceptedAnswerScore(i64),
    /// The user accepted an answer.
    AnswerAccepted,
    /// A question of the user's became protected.
    QuestionProtected,
    /// A closed question of the user's was reopened.
    QuestionReopened,
    /// The user completed their profile.
    ProfileCompleted,
}

const SCORE_TIERS: [(i64, BadgeTier); 3] = [
    (10, BadgeTier::Bronze),
    (25, BadgeTier::Silver),
    (100, BadgeTier::Gold),
];

const POINT_BADGES: [(i64, BadgeKind); 4] = [
    (100, BadgeKind::Curious),
    (1_000, BadgeKind::ThousandPoints),
    (3_000, BadgeKind::Inquisitive),
    (10_000, BadgeKind::Socratic),
];

/// Badges earned by a single trigger, lowest threshold first.
///
/// # Examples
/// ```
/// use reputation_engine::domain::{badges_for, BadgeKind, BadgeTrigger};
///
/// assert_eq!(
///     badges_for(BadgeTrigger::QuestionScore(30)),
///     vec![BadgeKind::NiceQuestion, BadgeKind::GoodQuestion],
/// );
/// ```
pub fn badges_for(trigger: BadgeTrigger) -> Vec<BadgeKind> {
    match trigger {
        BadgeTrigger::FirstLogin => vec![BadgeKind::FirstLogin],
        BadgeTrigger::PointsReached(points) => POINT_BADGES
            .into_iter()
            .filter(|(threshold, _)| points >= *threshold)
            .map(|(_, kind)| kind)
            .collect(),
        BadgeTrigger::QuestionScore(score) => score_badges(score, |tier| match tier {
            BadgeTier::Bronze => BadgeKind::NiceQuestion,
            BadgeTier::Silver => BadgeKind::GoodQuestion,
            BadgeTier::Gold => BadgeKind::GreatQuestion,
        }),
        BadgeTrigger::AcceptedAnswerScore(score) => score_badges(score, |tier| match tier {
            BadgeTier::Bronze => BadgeKind::NiceAnswer,
            BadgeTier::Silver => BadgeKind::GoodAnswer,
            BadgeTier::Gold => BadgeKind::GreatAnswer,
        }),
        BadgeTrigger::AnswerAccepted => vec![BadgeKind::Scholar],
        BadgeTrigger::QuestionProtected => vec![BadgeKind::Protected],
        BadgeTrigger::QuestionReopened => vec![BadgeKind::Zombie],
        BadgeTrigger::ProfileCompleted => vec![BadgeKind::ProfileComplete],
    }
}

fn score_badges(score: i64, kind_for: impl Fn(BadgeTier) -> BadgeKind) -> Vec<BadgeKind> {
    SCORE_TIERS
        .into_iter()
        .filter(|(threshold, _)| score >= *threshold)
        .map(|(_, tier)| kind_for(tier))
        .collect()
}
