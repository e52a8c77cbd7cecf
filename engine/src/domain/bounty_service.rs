//! Bounty escrow: reserves a poster's points and pays them out on accept.
//!
//! Creation deducts first and records second; awarding credits first and
//! marks second. Each second step is undone through the scoring ledger when
//! the collaborator refuses it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::badge::{Badge, BadgeTrigger};
use super::badge_service::BadgeEvaluator;
use super::bounty::{
    Bounty, BountyAmount, BountyRuleViolation, BountyState, check_award, check_creation_request,
    check_residual_points,
};
use super::call_policy::CallPolicy;
use super::collaborator_mapping::{compensation_failed, map_collaborator_error};
use super::content::{AnswerSnapshot, QuestionSnapshot};
use super::error::DomainError;
use super::ids::{QuestionId, Username};
use super::level::Denial;
use super::ports::{BountyGateway, CollaboratorError, UserDirectory};
use super::scoring::{LedgerEntry, ScoringEvent};
use super::scoring_ledger::{LedgerReceipt, ScoringLedger};
use super::user::User;

/// Confirmed bounty change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BountyReceipt {
    /// Bounty record as confirmed by the collaborator.
    pub bounty: Bounty,
    /// Poster's confirmed points, when they moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_points: Option<i64>,
    /// Awardee's confirmed points, when they moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awardee_points: Option<i64>,
    /// Badges awarded as a consequence.
    pub badges_awarded: Vec<Badge>,
}

/// Creates and awards question bounties.
pub struct BountyEscrow {
    bounties: Arc<dyn BountyGateway>,
    users: Arc<dyn UserDirectory>,
    ledger: Arc<ScoringLedger>,
    badges: Arc<BadgeEvaluator>,
    policy: Arc<CallPolicy>,
}

impl BountyEscrow {
    /// Build the escrow.
    pub fn new(
        bounties: Arc<dyn BountyGateway>,
        users: Arc<dyn UserDirectory>,
        ledger: Arc<ScoringLedger>,
        badges: Arc<BadgeEvaluator>,
        policy: Arc<CallPolicy>,
    ) -> Self {
        Self {
            bounties,
            users,
            ledger,
            badges,
            policy,
        }
    }

    /// Escrow `amount` points from the question's creator as a bounty.
    ///
    /// # Errors
    /// Rule violations are reported before any collaborator call, except the
    /// residual-points and existing-bounty checks which need fresh reads.
    pub async fn create_bounty(
        &self,
        actor: Option<&User>,
        question: &QuestionSnapshot,
        amount: u32,
    ) -> Result<BountyReceipt, DomainError> {
        let poster = actor.ok_or_else(|| DomainError::from(Denial::Unauthenticated))?;
        let amount = check_creation_request(poster.username(), question, amount)?;

        if self.load_bounty(&question.id).await?.is_some() {
            return Err(BountyRuleViolation::AlreadyExists.into());
        }
        let fresh = self
            .policy
            .read("get_user", || self.users.get_user(poster.username()))
            .await
            .map_err(|cause| map_collaborator_error("load poster", &cause))?;
        check_residual_points(fresh.points(), amount)?;

        let escrow = LedgerEntry::forward(
            poster.username().clone(),
            ScoringEvent::BountyEscrowed { amount: amount.get() },
        );
        let deducted = self.ledger.apply(&[escrow]).await?;

        let recorded = self
            .policy
            .write(
                "create_bounty",
                || self.bounties.create_bounty(&question.id, poster.username(), amount),
                || self.observe_created(&question.id, poster.username(), amount),
            )
            .await;
        let bounty = match recorded {
            Ok(bounty) => bounty,
            Err(cause) => {
                let failure = map_collaborator_error("record bounty", &cause);
                return Err(self.undo(&deducted, failure, "record bounty").await);
            }
        };

        info!(
            question = %question.id,
            poster = %poster.username(),
            amount = amount.get(),
            "bounty escrowed"
        );
        Ok(BountyReceipt {
            bounty,
            poster_points: deducted.total_for(poster.username()),
            awardee_points: None,
            badges_awarded: Vec::new(),
        })
    }

    /// Pay the active bounty to the accepted answer's creator.
    ///
    /// # Errors
    /// A failed credit aborts before marking. A transient marking failure
    /// reverses the credit and leaves the bounty active; a permanent one
    /// also refunds the poster.
    pub async fn award_bounty(
        &self,
        actor: Option<&User>,
        question: &QuestionSnapshot,
        answer: &AnswerSnapshot,
    ) -> Result<BountyReceipt, DomainError> {
        let actor = actor.ok_or_else(|| DomainError::from(Denial::Unauthenticated))?;
        let bounty = self
            .load_bounty(&question.id)
            .await?
            .ok_or_else(|| DomainError::not_found("the question has no bounty"))?;
        check_award(&bounty, actor.username(), question, answer)?;

        let awardee = &answer.creator;
        let amount = bounty.amount.get();
        let credit = LedgerEntry::forward(awardee.clone(), ScoringEvent::BountyAwarded { amount });
        let credited = self.ledger.apply(&[credit]).await?;

        let marked = self
            .policy
            .write(
                "award_bounty",
                || self.bounties.award_bounty(&question.id, awardee),
                || self.observe_awarded(&question.id, awardee),
            )
            .await;
        let awarded = match marked {
            Ok(awarded) => awarded,
            Err(cause) if cause.is_transient() => {
                let failure = map_collaborator_error("mark bounty awarded", &cause);
                return Err(self.undo(&credited, failure, "mark bounty awarded").await);
            }
            Err(cause) => return Err(self.abandon(&bounty, &credited, &cause).await),
        };

        info!(question = %question.id, %awardee, amount, "bounty awarded");
        let awardee_points = credited.total_for(awardee);
        let badges_awarded = match awardee_points {
            Some(points) => {
                let kinds = self
                    .badges
                    .award_quietly(awardee, &[BadgeTrigger::PointsReached(points)])
                    .await;
                Badge::all_held_by(awardee, kinds)
            }
            None => Vec::new(),
        };
        Ok(BountyReceipt {
            bounty: awarded,
            poster_points: None,
            awardee_points,
            badges_awarded,
        })
    }

    async fn load_bounty(&self, question_id: &QuestionId) -> Result<Option<Bounty>, DomainError> {
        match self
            .policy
            .read("get_bounty", || self.bounties.get_bounty(question_id))
            .await
        {
            Ok(bounty) => Ok(bounty),
            Err(cause) if cause.is_not_found() => Ok(None),
            Err(cause) => Err(map_collaborator_error("load bounty", &cause)),
        }
    }

    async fn undo(
        &self,
        receipt: &LedgerReceipt,
        failure: DomainError,
        operation: &str,
    ) -> DomainError {
        match self.ledger.revert(receipt).await {
            Ok(_) => {
                warn!(operation, %failure, "bounty step failed; points restored");
                failure
            }
            Err(cause) => {
                error!(operation, %cause, "bounty compensation failed");
                compensation_failed(operation, &failure)
            }
        }
    }

    /// Reverse the credit and, if the bounty is still active, mark it
    /// refunded before returning the escrow to the poster.
    async fn abandon(
        &self,
        bounty: &Bounty,
        credited: &LedgerReceipt,
        cause: &CollaboratorError,
    ) -> DomainError {
        let failure = map_collaborator_error("mark bounty awarded", cause);
        let question_id = &bounty.question_id;
        if let Err(reversal) = self.ledger.revert(credited).await {
            error!(question = %question_id, %reversal, "bounty credit reversal failed");
            return compensation_failed("mark bounty awarded", &failure);
        }

        match self.load_bounty(question_id).await {
            Ok(Some(current)) if current.is_active() => {}
            Ok(Some(current)) => {
                warn!(question = %question_id, state = ?current.state, "bounty settled elsewhere");
                let message = format!("bounty on {question_id} was settled concurrently");
                return DomainError::conflict(message).with_details(json!({ "refunded": false }));
            }
            Ok(None) => return failure.with_details(json!({ "refunded": false })),
            Err(reload) => {
                warn!(question = %question_id, %reload, "bounty state unknown after rejection");
                return failure.with_details(json!({ "refunded": false }));
            }
        }

        let marked = self
            .policy
            .write(
                "refund_bounty",
                || self.bounties.refund_bounty(question_id),
                || self.observe_refunded(question_id),
            )
            .await;
        if let Err(mark_failure) = marked {
            warn!(question = %question_id, %mark_failure, "bounty could not be marked refunded");
            return failure.with_details(json!({ "refunded": false }));
        }

        let refund = LedgerEntry::reverse(
            bounty.poster.clone(),
            ScoringEvent::BountyEscrowed { amount: bounty.amount.get() },
        );
        if let Err(refund_failure) = self.ledger.apply(&[refund]).await {
            error!(
                question = %question_id,
                %refund_failure,
                "bounty marked refunded but poster not credited"
            );
            return compensation_failed("refund bounty", &failure);
        }

        warn!(
            question = %question_id,
            poster = %bounty.poster,
            "bounty award rejected; poster refunded"
        );
        failure.with_details(json!({ "refunded": true }))
    }

    async fn observe_created(
        &self,
        question_id: &QuestionId,
        poster: &Username,
        amount: BountyAmount,
    ) -> Result<Option<Bounty>, CollaboratorError> {
        match self.bounties.get_bounty(question_id).await? {
            None => Ok(None),
            Some(bounty) if &bounty.poster == poster && bounty.amount == amount => Ok(Some(bounty)),
            Some(_) => Err(CollaboratorError::conflict(format!(
                "question {question_id} gained another bounty concurrently"
            ))),
        }
    }

    async fn observe_awarded(
        &self,
        question_id: &QuestionId,
        awardee: &Username,
    ) -> Result<Option<Bounty>, CollaboratorError> {
        let Some(bounty) = self.bounties.get_bounty(question_id).await? else {
            return Err(CollaboratorError::not_found(format!("bounty on {question_id}")));
        };
        match &bounty.state {
            BountyState::Active => Ok(None),
            BountyState::Awarded { awarded_to } if awarded_to == awardee => Ok(Some(bounty)),
            BountyState::Awarded { .. } | BountyState::Refunded => Err(CollaboratorError::conflict(
                format!("bounty on {question_id} changed concurrently"),
            )),
        }
    }

    async fn observe_refunded(
        &self,
        question_id: &QuestionId,
    ) -> Result<Option<Bounty>, CollaboratorError> {
        Ok(self
            .bounties
            .get_bounty(question_id)
            .await?
            .filter(|bounty| bounty.state == BountyState::Refunded))
    }
}
