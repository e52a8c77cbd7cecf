//! Answer acceptance: credit the answerer, then flag the answer.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use super::badge::{Badge, BadgeTrigger};
use super::badge_service::BadgeEvaluator;
use super::call_policy::CallPolicy;
use super::collaborator_mapping::{compensation_failed, map_collaborator_error};
use super::content::{AnswerSnapshot, QuestionSnapshot};
use super::error::DomainError;
use super::level::Denial;
use super::ports::{AnswerGateway, CollaboratorError};
use super::scoring::{LedgerEntry, ScoringEvent};
use super::scoring_ledger::ScoringLedger;
use super::user::User;

/// Confirmed acceptance with refreshed snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceReceipt {
    /// Question, now carrying an accepted answer.
    pub question: QuestionSnapshot,
    /// Answer, now accepted.
    pub answer: AnswerSnapshot,
    /// Answerer's confirmed points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answerer_points: Option<i64>,
    /// Badges awarded as a consequence.
    pub badges_awarded: Vec<Badge>,
}

/// Accepts answers on behalf of question creators.
pub struct AnswerAcceptance {
    answers: Arc<dyn AnswerGateway>,
    ledger: Arc<ScoringLedger>,
    badges: Arc<BadgeEvaluator>,
    policy: Arc<CallPolicy>,
}

impl AnswerAcceptance {
    /// Build the service.
    pub fn new(
        answers: Arc<dyn AnswerGateway>,
        ledger: Arc<ScoringLedger>,
        badges: Arc<BadgeEvaluator>,
        policy: Arc<CallPolicy>,
    ) -> Self {
        Self {
            answers,
            ledger,
            badges,
            policy,
        }
    }

    /// Accept `answer` as the solution to `question`.
    ///
    /// # Errors
    /// Ownership and state preconditions fail before any collaborator call.
    /// When the answer cannot be flagged the credit is reversed.
    pub async fn accept_answer(
        &self,
        actor: Option<&User>,
        question: &QuestionSnapshot,
        answer: &AnswerSnapshot,
    ) -> Result<AcceptanceReceipt, DomainError> {
        let acceptor = actor.ok_or_else(|| DomainError::from(Denial::Unauthenticated))?;
        check_acceptance(acceptor, question, answer)?;

        let credit = LedgerEntry::forward(answer.creator.clone(), ScoringEvent::AnswerAccepted);
        let credited = self.ledger.apply(&[credit]).await?;

        let marked = self
            .policy
            .write(
                "accept_answer",
                || self.answers.accept_answer(&question.id, &answer.id),
                || async { Ok::<_, CollaboratorError>(None) },
            )
            .await;
        if let Err(cause) = marked {
            let failure = map_collaborator_error("accept answer", &cause);
            return Err(match self.ledger.revert(&credited).await {
                Ok(_) => failure,
                Err(reversal) => {
                    error!(answer = %answer.id, %reversal, "acceptance credit reversal failed");
                    compensation_failed("accept answer", &failure)
                }
            });
        }

        info!(
            question = %question.id,
            answer = %answer.id,
            answerer = %answer.creator,
            "answer accepted"
        );
        let answerer_points = credited.total_for(&answer.creator);

        let scholar = self
            .badges
            .award_quietly(acceptor.username(), &[BadgeTrigger::AnswerAccepted])
            .await;
        let mut badges_awarded = Badge::all_held_by(acceptor.username(), scholar);
        let mut answerer_triggers = vec![BadgeTrigger::AcceptedAnswerScore(answer.counts.net())];
        answerer_triggers.extend(answerer_points.map(BadgeTrigger::PointsReached));
        let earned = self.badges.award_quietly(&answer.creator, &answerer_triggers).await;
        badges_awarded.extend(Badge::all_held_by(&answer.creator, earned));

        Ok(AcceptanceReceipt {
            question: QuestionSnapshot {
                has_accepted_answer: true,
                ..question.clone()
            },
            answer: AnswerSnapshot {
                accepted: true,
                ..answer.clone()
            },
            answerer_points,
            badges_awarded,
        })
    }
}

fn check_acceptance(
    acceptor: &User,
    question: &QuestionSnapshot,
    answer: &AnswerSnapshot,
) -> Result<(), DomainError> {
    if answer.question_id != question.id {
        return Err(DomainError::invalid_request(
            "the answer does not belong to this question",
        ));
    }
    if acceptor.username() != &question.creator {
        return Err(DomainError::forbidden(
            "Only the question's creator can accept an answer",
        ));
    }
    if acceptor.username() == &answer.creator {
        return Err(DomainError::forbidden("You cannot accept your own answer"));
    }
    if question.has_accepted_answer || answer.accepted {
        return Err(DomainError::conflict(
            "the question already has an accepted answer",
        ));
    }
    Ok(())
}
