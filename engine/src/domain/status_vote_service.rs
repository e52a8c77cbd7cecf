//! Protect, close and reopen votes on questions.
//!
//! The collaborator tallies the votes and reports the resulting status; the
//! service only gates the vote and reacts to the transition.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::actor_lookup::ActorLookup;
use super::badge::{Badge, BadgeTrigger};
use super::badge_service::BadgeEvaluator;
use super::call_policy::CallPolicy;
use super::collaborator_mapping::map_collaborator_error;
use super::content::{QuestionSnapshot, QuestionStatus, StatusVote};
use super::error::DomainError;
use super::ports::{QuestionStatusGateway, UserDirectory};
use super::user::User;

/// Confirmed status vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusVoteReceipt {
    /// Question with its resulting status.
    pub question: QuestionSnapshot,
    /// Badges awarded to the question creator.
    pub badges_awarded: Vec<Badge>,
}

/// Records moderation votes on question status.
pub struct StatusVoteService {
    statuses: Arc<dyn QuestionStatusGateway>,
    actors: ActorLookup,
    badges: Arc<BadgeEvaluator>,
}

impl StatusVoteService {
    /// Build the service.
    pub fn new(
        statuses: Arc<dyn QuestionStatusGateway>,
        users: Arc<dyn UserDirectory>,
        badges: Arc<BadgeEvaluator>,
        policy: Arc<CallPolicy>,
    ) -> Self {
        Self {
            statuses,
            actors: ActorLookup::new(users, policy),
            badges,
        }
    }

    /// Cast `vote` on `question`.
    ///
    /// The vote is sent once; a tally cannot be re-derived, so failures are
    /// reported for the caller to retry.
    pub async fn vote_on_status(
        &self,
        actor: Option<&User>,
        question: &QuestionSnapshot,
        vote: StatusVote,
    ) -> Result<StatusVoteReceipt, DomainError> {
        let voter = self.actors.require(actor, vote.action()).await?;
        if voter.username() == &question.creator {
            return Err(DomainError::forbidden(
                "You cannot vote on your own question's status",
            ));
        }
        check_applicable(question.status, vote)?;

        debug!(
            question = %question.id,
            voter = %voter.username(),
            vote = vote.as_str(),
            "submitting status vote"
        );
        let status = self
            .statuses
            .submit_status_vote(&question.id, voter.username(), vote)
            .await
            .map_err(|cause| map_collaborator_error("submit status vote", &cause))?;

        let trigger = match (question.status, status) {
            (QuestionStatus::Open | QuestionStatus::Closed, QuestionStatus::Protected) => {
                Some(BadgeTrigger::QuestionProtected)
            }
            (QuestionStatus::Closed, QuestionStatus::Open) if vote == StatusVote::Reopen => {
                Some(BadgeTrigger::QuestionReopened)
            }
            _ => None,
        };
        let mut badges_awarded = Vec::new();
        if let Some(trigger) = trigger {
            info!(
                question = %question.id,
                from = question.status.as_str(),
                to = status.as_str(),
                "question status changed"
            );
            let kinds = self.badges.award_quietly(&question.creator, &[trigger]).await;
            badges_awarded = Badge::all_held_by(&question.creator, kinds);
        }

        Ok(StatusVoteReceipt {
            question: QuestionSnapshot {
                status,
                ..question.clone()
            },
            badges_awarded,
        })
    }
}

fn check_applicable(status: QuestionStatus, vote: StatusVote) -> Result<(), DomainError> {
    match (status, vote) {
        (QuestionStatus::Protected, StatusVote::Protect) => {
            Err(DomainError::conflict("the question is already protected"))
        }
        (QuestionStatus::Closed, StatusVote::Close) => {
            Err(DomainError::conflict("the question is already closed"))
        }
        (QuestionStatus::Open | QuestionStatus::Protected, StatusVote::Reopen) => {
            Err(DomainError::conflict("only closed questions can be reopened"))
        }
        _ => Ok(()),
    }
}
