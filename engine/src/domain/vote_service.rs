//! Vote service: applies the vote state machine through the collaborator.
//!
//! Each request re-reads the voter's current vote, plans the transition and
//! submits the steps in order, confirming each before the next. Point deltas
//! go through the scoring ledger only after every step is confirmed. Any
//! failure rolls back the confirmed steps so the caller's projection can
//! stay at its pre-attempt value.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::actor_lookup::ActorLookup;
use super::badge::{Badge, BadgeTrigger};
use super::badge_service::BadgeEvaluator;
use super::call_policy::CallPolicy;
use super::collaborator_mapping::{compensation_failed, map_collaborator_error};
use super::content::VoteTarget;
use super::error::DomainError;
use super::ids::Username;
use super::in_flight::{InFlightGuard, InFlightRegistry};
use super::level::{self, Denial};
use super::ports::{CollaboratorError, UserDirectory, VoteGateway};
use super::scoring::vote_entries;
use super::scoring_ledger::{LedgerReceipt, ScoringLedger};
use super::user::User;
use super::vote::{
    VoteCounts, VoteDirection, VoteState, VoteStep, VoteTransition, plan_retraction, plan_vote,
};

/// Request to cast a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
    /// Item being voted on.
    pub target: VoteTarget,
    /// Requested direction.
    pub direction: VoteDirection,
    /// Caller's current projection of the item's counts.
    pub counts: VoteCounts,
}

/// Confirmed result of a vote or retraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    /// Item voted on.
    pub target: VoteTarget,
    /// Voter's resulting vote.
    pub state: VoteState,
    /// Counts after the confirmed steps.
    pub counts: VoteCounts,
    /// Creator's confirmed points, when they moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_points: Option<i64>,
    /// Voter's confirmed points, when they moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voter_points: Option<i64>,
    /// Badges awarded as a consequence.
    pub badges_awarded: Vec<Badge>,
}

/// Casts and retracts votes on questions, answers and comments.
pub struct VoteService {
    votes: Arc<dyn VoteGateway>,
    actors: ActorLookup,
    ledger: Arc<ScoringLedger>,
    badges: Arc<BadgeEvaluator>,
    policy: Arc<CallPolicy>,
    in_flight: InFlightRegistry,
}

impl VoteService {
    /// Build the service.
    pub fn new(
        votes: Arc<dyn VoteGateway>,
        users: Arc<dyn UserDirectory>,
        ledger: Arc<ScoringLedger>,
        badges: Arc<BadgeEvaluator>,
        policy: Arc<CallPolicy>,
    ) -> Self {
        Self {
            votes,
            actors: ActorLookup::new(users, Arc::clone(&policy)),
            ledger,
            badges,
            policy,
            in_flight: InFlightRegistry::default(),
        }
    }

    /// Cast, toggle or switch a vote.
    ///
    /// The level gate uses the voter's points as the directory reports them
    /// now, not as they were at login.
    ///
    /// ```rust,ignore
    /// let receipt = service.cast_vote(Some(&voter), &request).await?;
    /// assert_eq!(receipt.state, VoteState::Upvoted);
    /// ```
    pub async fn cast_vote(
        &self,
        actor: Option<&User>,
        request: &VoteRequest,
    ) -> Result<VoteReceipt, DomainError> {
        let caller = actor.ok_or_else(|| DomainError::from(Denial::Unauthenticated))?;
        ensure_not_creator(caller, &request.target)?;
        let _claim = self.claim(caller, &request.target)?;
        let voter = self
            .actors
            .require(Some(caller), request.direction.action())
            .await?;

        let current = self.current_state(&request.target, voter.username()).await?;
        let transition = plan_vote(current, request.direction);
        self.commit(&voter, &request.target, &transition, request.counts)
            .await
    }

    /// Retract whatever vote is active; succeeds without change when none is.
    pub async fn undo_vote(
        &self,
        actor: Option<&User>,
        target: &VoteTarget,
        counts: VoteCounts,
    ) -> Result<VoteReceipt, DomainError> {
        let caller = actor.ok_or_else(|| DomainError::from(Denial::Unauthenticated))?;
        ensure_not_creator(caller, target)?;
        let _claim = self.claim(caller, target)?;
        let voter = self.actors.current(Some(caller)).await?;

        let current = self.current_state(target, voter.username()).await?;
        if let Some(direction) = current.direction() {
            level::authorize(Some(&voter), direction.action()).into_result()?;
        }
        let transition = plan_retraction(current);
        self.commit(&voter, target, &transition, counts).await
    }

    async fn commit(
        &self,
        voter: &User,
        target: &VoteTarget,
        transition: &VoteTransition,
        counts: VoteCounts,
    ) -> Result<VoteReceipt, DomainError> {
        let username = voter.username();
        let mut confirmed = Vec::with_capacity(transition.steps().len());
        for step in transition.steps() {
            if let Err(cause) = self.submit_step(target, username, *step).await {
                let failure = map_collaborator_error("submit vote", &cause);
                return Err(self.roll_back(target, username, &confirmed, failure).await);
            }
            confirmed.push(*step);
        }

        let entries = transition
            .steps()
            .iter()
            .flat_map(|step| vote_entries(target, username, step.command))
            .collect::<Vec<_>>();
        let receipt = match self.ledger.apply(&entries).await {
            Ok(receipt) => receipt,
            Err(failure) => {
                return Err(self.roll_back(target, username, &confirmed, failure).await);
            }
        };

        let counts = transition.apply_to(counts);
        let badges_awarded = if transition.is_noop() {
            Vec::new()
        } else {
            info!(
                voter = %username,
                %target,
                from = ?transition.from(),
                to = ?transition.to(),
                "vote committed"
            );
            self.award_badges(username, target, counts, &receipt).await
        };

        Ok(VoteReceipt {
            target: target.clone(),
            state: transition.to(),
            counts,
            creator_points: receipt.total_for(target.creator()),
            voter_points: receipt.total_for(username),
            badges_awarded,
        })
    }

    async fn roll_back(
        &self,
        target: &VoteTarget,
        voter: &Username,
        confirmed: &[VoteStep],
        failure: DomainError,
    ) -> DomainError {
        for step in confirmed.iter().rev() {
            let undo = VoteStep {
                command: step.command.inverse(),
                from: step.to,
                to: step.from,
            };
            if let Err(cause) = self.submit_step(target, voter, undo).await {
                error!(%voter, %target, %cause, "vote rollback failed");
                return compensation_failed("submit vote", &failure);
            }
        }
        if !confirmed.is_empty() {
            warn!(%voter, %target, steps = confirmed.len(), "vote steps rolled back");
        }
        failure
    }

    async fn submit_step(
        &self,
        target: &VoteTarget,
        voter: &Username,
        step: VoteStep,
    ) -> Result<(), CollaboratorError> {
        debug!(%voter, %target, command = ?step.command, "submitting vote step");
        self.policy
            .write(
                "submit_vote",
                || self.votes.submit_vote(target, voter, step.command),
                || self.observe_step(target, voter, step),
            )
            .await
    }

    async fn observe_step(
        &self,
        target: &VoteTarget,
        voter: &Username,
        step: VoteStep,
    ) -> Result<Option<()>, CollaboratorError> {
        let observed = match self.votes.get_vote(target, voter).await {
            Ok(state) => state,
            Err(cause) if cause.is_not_found() => VoteState::None,
            Err(cause) => return Err(cause),
        };
        if observed == step.to {
            Ok(Some(()))
        } else if observed == step.from {
            Ok(None)
        } else {
            Err(CollaboratorError::conflict(format!(
                "vote on {target} changed concurrently to {observed:?}"
            )))
        }
    }

    async fn current_state(
        &self,
        target: &VoteTarget,
        voter: &Username,
    ) -> Result<VoteState, DomainError> {
        match self
            .policy
            .read("get_vote", || self.votes.get_vote(target, voter))
            .await
        {
            Ok(state) => Ok(state),
            Err(cause) if cause.is_not_found() => Ok(VoteState::None),
            Err(cause) => Err(map_collaborator_error("load vote", &cause)),
        }
    }

    fn claim(&self, voter: &User, target: &VoteTarget) -> Result<InFlightGuard<'_>, DomainError> {
        self.in_flight
            .try_begin(format!("{}:{target}", voter.username()))
            .ok_or_else(|| DomainError::conflict("A vote on this item is already in progress"))
    }

    async fn award_badges(
        &self,
        voter: &Username,
        target: &VoteTarget,
        counts: VoteCounts,
        receipt: &LedgerReceipt,
    ) -> Vec<Badge> {
        let creator = target.creator();
        let mut creator_triggers = Vec::new();
        if let Some(points) = receipt.total_for(creator) {
            creator_triggers.push(BadgeTrigger::PointsReached(points));
        }
        match target {
            VoteTarget::Question { .. } => {
                creator_triggers.push(BadgeTrigger::QuestionScore(counts.net()));
            }
            VoteTarget::Answer { accepted: true, .. } => {
                creator_triggers.push(BadgeTrigger::AcceptedAnswerScore(counts.net()));
            }
            VoteTarget::Answer { .. } | VoteTarget::Comment { .. } => {}
        }

        let creator_badges = self.badges.award_quietly(creator, &creator_triggers).await;
        let mut awarded = Badge::all_held_by(creator, creator_badges);
        if let Some(points) = receipt.total_for(voter) {
            let voter_badges = self
                .badges
                .award_quietly(voter, &[BadgeTrigger::PointsReached(points)])
                .await;
            awarded.extend(Badge::all_held_by(voter, voter_badges));
        }
        awarded
    }
}

fn ensure_not_creator(voter: &User, target: &VoteTarget) -> Result<(), DomainError> {
    if voter.username() == target.creator() {
        return Err(DomainError::forbidden("You cannot vote on your own content"));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
