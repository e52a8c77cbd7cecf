//! Badge evaluator: turns triggers into badge awards.
//!
//! Held badges are read before any award so a badge is never issued twice.
//! Badge failures never fail the operation that triggered them; callers use
//! [`BadgeEvaluator::award_quietly`], which logs and moves on.

use std::sync::Arc;

use tracing::{info, warn};

use super::badge::{BadgeKind, BadgeTrigger, badges_for};
use super::call_policy::CallPolicy;
use super::collaborator_mapping::map_collaborator_error;
use super::error::DomainError;
use super::ids::Username;
use super::ports::{BadgeGateway, CollaboratorError};

/// Outcome of one evaluation.
#[derive(Debug, Default)]
pub struct BadgeReport {
    /// Badges newly awarded.
    pub awarded: Vec<BadgeKind>,
    /// Badges that were due but could not be recorded.
    pub failures: Vec<(BadgeKind, DomainError)>,
}

/// Decides and records badge awards.
pub struct BadgeEvaluator {
    badges: Arc<dyn BadgeGateway>,
    policy: Arc<CallPolicy>,
}

impl BadgeEvaluator {
    /// Build the evaluator.
    pub fn new(badges: Arc<dyn BadgeGateway>, policy: Arc<CallPolicy>) -> Self {
        Self { badges, policy }
    }

    /// Award every badge the triggers earn that `username` does not hold.
    ///
    /// # Errors
    /// Fails only when the held badges cannot be read; individual award
    /// failures are collected in the report.
    pub async fn evaluate(
        &self,
        username: &Username,
        triggers: &[BadgeTrigger],
    ) -> Result<BadgeReport, DomainError> {
        let mut candidates = triggers
            .iter()
            .flat_map(|trigger| badges_for(*trigger))
            .collect::<Vec<_>>();
        candidates.sort_unstable();
        candidates.dedup();
        if candidates.is_empty() {
            return Ok(BadgeReport::default());
        }

        let held = self
            .policy
            .read("list_badges", || self.badges.list_badges(username))
            .await
            .map_err(|cause| map_collaborator_error("list badges", &cause))?;

        let mut report = BadgeReport::default();
        for badge in candidates.into_iter().filter(|badge| !held.contains(badge)) {
            let outcome = self
                .policy
                .write(
                    "award_badge",
                    || self.badges.award_badge(username, badge),
                    || self.observe_award(username, badge),
                )
                .await;
            match outcome {
                Ok(()) => {
                    info!(
                        %username,
                        badge = badge.name(),
                        tier = badge.tier().as_str(),
                        "badge awarded"
                    );
                    report.awarded.push(badge);
                }
                Err(cause) => report
                    .failures
                    .push((badge, map_collaborator_error("award badge", &cause))),
            }
        }
        Ok(report)
    }

    /// Evaluate, log any failure and return the badges awarded.
    pub async fn award_quietly(
        &self,
        username: &Username,
        triggers: &[BadgeTrigger],
    ) -> Vec<BadgeKind> {
        match self.evaluate(username, triggers).await {
            Ok(report) => {
                for (badge, error) in &report.failures {
                    warn!(%username, badge = badge.name(), %error, "badge award failed");
                }
                report.awarded
            }
            Err(error) => {
                warn!(%username, %error, "badge evaluation skipped");
                Vec::new()
            }
        }
    }

    async fn observe_award(
        &self,
        username: &Username,
        badge: BadgeKind,
    ) -> Result<Option<()>, CollaboratorError> {
        let held = self.badges.list_badges(username).await?;
        Ok(held.contains(&badge).then_some(()))
    }
}
