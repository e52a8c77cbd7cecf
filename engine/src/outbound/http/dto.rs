//! Wire DTOs for the Q&A API.
//!
//! Responses share one envelope: a `success` flag next to the payload
//! fields. Payloads decode into these DTOs first and are mapped into domain
//! types in one pass.

use serde::{Deserialize, Serialize};

use crate::domain::bounty::{Bounty, BountyAmount, BountyState};
use crate::domain::ports::CollaboratorError;
use crate::domain::vote::{VoteCommand, VoteOperation};
use crate::domain::{
    BadgeKind, EditProposal, EditVoteId, QuestionId, QuestionStatus, User, Username, VoteDirection,
    VoteState,
};

/// Response wrapper carrying the `success` flag.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    #[serde(default)]
    pub(super) success: Option<bool>,
    #[serde(flatten)]
    pub(super) payload: T,
}

impl<T> Envelope<T> {
    /// Payload, only when the response explicitly reported success.
    pub(super) fn into_payload(self) -> Result<T, CollaboratorError> {
        match self.success {
            Some(true) => Ok(self.payload),
            Some(false) => Err(CollaboratorError::rejected("response reported success: false")),
            None => Err(CollaboratorError::decode("response carried no success flag")),
        }
    }
}

/// Payload with no fields of interest.
#[derive(Debug, Deserialize)]
pub(super) struct EmptyDto {}

#[derive(Debug, Deserialize)]
pub(super) struct UserEnvelopeDto {
    pub(super) user: UserDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) username: String,
    #[serde(default)]
    pub(super) email: Option<String>,
    pub(super) points: i64,
}

impl UserDto {
    pub(super) fn into_domain(self) -> Result<User, CollaboratorError> {
        let username = Username::new(self.username)
            .map_err(|error| CollaboratorError::decode(format!("invalid username: {error}")))?;
        let user = User::new(username, self.points);
        Ok(match self.email {
            Some(email) => user.with_email(email),
            None => user,
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AuthRequestDto<'a> {
    pub(super) key: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PointsRequestDto {
    pub(super) operation: &'static str,
    pub(super) amount: u64,
}

impl PointsRequestDto {
    pub(super) const fn from_delta(delta: i64) -> Self {
        Self {
            operation: if delta < 0 { "decrement" } else { "increment" },
            amount: delta.unsigned_abs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct VoteDto {
    #[serde(default)]
    pub(super) vote: Option<String>,
}

impl VoteDto {
    pub(super) fn into_domain(self) -> Result<VoteState, CollaboratorError> {
        match self.vote.as_deref() {
            None => Ok(VoteState::None),
            Some("upvoted") => Ok(VoteState::Upvoted),
            Some("downvoted") => Ok(VoteState::Downvoted),
            Some(other) => Err(CollaboratorError::decode(format!("unknown vote state `{other}`"))),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct VoteRequestDto {
    pub(super) operation: &'static str,
    pub(super) target: &'static str,
}

impl From<VoteCommand> for VoteRequestDto {
    fn from(command: VoteCommand) -> Self {
        Self {
            operation: match command.operation {
                VoteOperation::Increment => "increment",
                VoteOperation::Decrement => "decrement",
            },
            target: match command.direction {
                VoteDirection::Up => "upvotes",
                VoteDirection::Down => "downvotes",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct BadgeListDto {
    #[serde(default)]
    pub(super) badges: Vec<BadgeDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BadgeDto {
    #[serde(alias = "badge")]
    pub(super) name: String,
}

impl BadgeListDto {
    /// Known badge kinds; names this engine does not award are skipped.
    pub(super) fn into_domain(self) -> Vec<BadgeKind> {
        self.badges
            .iter()
            .filter_map(|badge| BadgeKind::from_name(&badge.name))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AwardBadgeDto {
    pub(super) badge: &'static str,
    #[serde(rename = "type")]
    pub(super) tier: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct BountyEnvelopeDto {
    #[serde(default)]
    pub(super) bounty: Option<BountyDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BountyDto {
    #[serde(alias = "posterUsername")]
    pub(super) poster: String,
    pub(super) amount: u32,
    #[serde(default)]
    pub(super) awarded_to: Option<String>,
    #[serde(default)]
    pub(super) refunded: bool,
}

impl BountyDto {
    pub(super) fn into_domain(self, question_id: &QuestionId) -> Result<Bounty, CollaboratorError> {
        let poster = Username::new(self.poster)
            .map_err(|error| CollaboratorError::decode(format!("invalid bounty poster: {error}")))?;
        let amount = BountyAmount::new(self.amount)
            .map_err(|error| CollaboratorError::decode(format!("invalid bounty amount: {error}")))?;
        let state = match (self.awarded_to, self.refunded) {
            (Some(awarded_to), _) => BountyState::Awarded {
                awarded_to: Username::new(awarded_to).map_err(|error| {
                    CollaboratorError::decode(format!("invalid bounty awardee: {error}"))
                })?,
            },
            (None, true) => BountyState::Refunded,
            (None, false) => BountyState::Active,
        };
        Ok(Bounty {
            question_id: question_id.clone(),
            poster,
            amount,
            state,
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreateBountyDto<'a> {
    pub(super) poster: &'a str,
    pub(super) amount: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AwardBountyDto<'a> {
    pub(super) awarded_to: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RefundBountyDto {
    pub(super) refunded: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EditVoteRequestDto<'a> {
    pub(super) new_body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) new_title: Option<&'a str>,
}

impl<'a> From<&'a EditProposal> for EditVoteRequestDto<'a> {
    fn from(proposal: &'a EditProposal) -> Self {
        Self {
            new_body: proposal.body(),
            new_title: proposal.title(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EditVoteCreatedDto {
    #[serde(alias = "id")]
    pub(super) edit_vote_id: String,
}

impl EditVoteCreatedDto {
    pub(super) fn into_domain(self) -> Result<EditVoteId, CollaboratorError> {
        EditVoteId::new(self.edit_vote_id)
            .map_err(|error| CollaboratorError::decode(format!("invalid edit vote id: {error}")))
    }
}

#[derive(Debug, Serialize)]
pub(super) struct EditBallotDto {
    pub(super) vote: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct AcceptAnswerDto {
    pub(super) accepted: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct StatusVoteRequestDto {
    pub(super) vote: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusDto {
    pub(super) status: String,
}

impl StatusDto {
    pub(super) fn into_domain(self) -> Result<QuestionStatus, CollaboratorError> {
        QuestionStatus::parse(&self.status).ok_or_else(|| {
            CollaboratorError::decode(format!("unknown question status `{}`", self.status))
        })
    }
}
