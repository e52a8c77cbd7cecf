//! Scoring ledger: persists point deltas for one logical event.
//!
//! Entries are applied one at a time and each is confirmed before the next
//! is sent. The ledger reads every affected user's points first so that a
//! rate-limited adjustment can be reconciled against the collaborator
//! before it is retried, and so badge evaluation sees confirmed totals. When
//! an adjustment fails, the entries already confirmed for the same event are
//! reversed.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use super::call_policy::CallPolicy;
use super::collaborator_mapping::{compensation_failed, map_collaborator_error};
use super::error::DomainError;
use super::ids::Username;
use super::ports::{CollaboratorError, PointsGateway, UserDirectory};
use super::scoring::LedgerEntry;

/// Confirmed outcome of a ledger application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceipt {
    applied: Vec<LedgerEntry>,
    totals: BTreeMap<Username, i64>,
}

impl LedgerReceipt {
    /// Entries confirmed by the collaborator, in submission order.
    pub fn applied(&self) -> &[LedgerEntry] {
        &self.applied
    }

    /// Confirmed point total of `username` after the entries.
    pub fn total_for(&self, username: &Username) -> Option<i64> {
        self.totals.get(username).copied()
    }

    /// Whether nothing was applied.
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Applies ledger entries through the points port.
pub struct ScoringLedger {
    users: Arc<dyn UserDirectory>,
    points: Arc<dyn PointsGateway>,
    policy: Arc<CallPolicy>,
}

impl ScoringLedger {
    /// Build the ledger.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        points: Arc<dyn PointsGateway>,
        policy: Arc<CallPolicy>,
    ) -> Self {
        Self {
            users,
            points,
            policy,
        }
    }

    /// Apply `entries` in order, all or nothing.
    ///
    /// # Errors
    /// Returns the mapped collaborator error when an adjustment fails and
    /// its predecessors were reversed, or [`crate::domain::ErrorCode::Internal`]
    /// when the reversal itself failed.
    pub async fn apply(&self, entries: &[LedgerEntry]) -> Result<LedgerReceipt, DomainError> {
        if entries.is_empty() {
            return Ok(LedgerReceipt::default());
        }

        let mut totals = self.baselines(entries).await?;
        let mut applied = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Err(cause) = self.adjust(entry, &mut totals).await {
                let failure = map_collaborator_error("adjust points", &cause);
                if self.compensate(&applied, &mut totals).await.is_err() {
                    return Err(compensation_failed("adjust points", &failure));
                }
                return Err(failure);
            }
            applied.push(entry.clone());
        }

        info!(entries = applied.len(), "ledger entries confirmed");
        Ok(LedgerReceipt { applied, totals })
    }

    /// Reverse a previously confirmed receipt.
    pub async fn revert(&self, receipt: &LedgerReceipt) -> Result<LedgerReceipt, DomainError> {
        let inverses = receipt
            .applied()
            .iter()
            .rev()
            .map(LedgerEntry::inverse)
            .collect::<Vec<_>>();
        self.apply(&inverses).await
    }

    async fn baselines(
        &self,
        entries: &[LedgerEntry],
    ) -> Result<BTreeMap<Username, i64>, DomainError> {
        let mut totals = BTreeMap::new();
        for entry in entries {
            if totals.contains_key(&entry.username) {
                continue;
            }
            let user = self
                .policy
                .read("get_user", || self.users.get_user(&entry.username))
                .await
                .map_err(|cause| map_collaborator_error("load points", &cause))?;
            totals.insert(entry.username.clone(), user.points());
        }
        Ok(totals)
    }

    async fn adjust(
        &self,
        entry: &LedgerEntry,
        totals: &mut BTreeMap<Username, i64>,
    ) -> Result<(), CollaboratorError> {
        let before = totals.get(&entry.username).copied().unwrap_or_default();
        let delta = entry.delta();
        let expected = before.saturating_add(delta);
        debug!(username = %entry.username, delta, "submitting point adjustment");

        self.policy
            .write(
                "adjust_points",
                || self.points.adjust_points(&entry.username, delta),
                || self.observe_adjustment(&entry.username, before, expected),
            )
            .await?;

        totals.insert(entry.username.clone(), expected);
        Ok(())
    }

    async fn observe_adjustment(
        &self,
        username: &Username,
        before: i64,
        expected: i64,
    ) -> Result<Option<()>, CollaboratorError> {
        let observed = self.users.get_user(username).await?.points();
        if observed == expected {
            Ok(Some(()))
        } else if observed == before {
            Ok(None)
        } else {
            Err(CollaboratorError::conflict(format!(
                "points for {username} moved from {before} to {observed} concurrently"
            )))
        }
    }

    async fn compensate(
        &self,
        applied: &[LedgerEntry],
        totals: &mut BTreeMap<Username, i64>,
    ) -> Result<(), CollaboratorError> {
        for entry in applied.iter().rev() {
            let inverse = entry.inverse();
            if let Err(cause) = self.adjust(&inverse, totals).await {
                error!(username = %entry.username, delta = inverse.delta(), %cause,
                    "point compensation failed; ledger left partially applied");
                return Err(cause);
            }
        }
        Ok(())
    }
}
