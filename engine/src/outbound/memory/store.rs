//! State and inspection helpers for the demo store.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::bounty::Bounty;
use crate::domain::ports::CollaboratorError;
use crate::domain::{
    AnswerId, BadgeKind, EditProposal, EditVoteId, PostRef, QuestionId, QuestionStatus, User,
    Username, VoteCounts, VoteState, VoteTarget,
};

/// Credential proof accepted for every seeded demo user.
pub const DEMO_PROOF: &str = "demo";

/// Store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOperation {
    /// `UserDirectory::get_user`.
    GetUser,
    /// `UserDirectory::authenticate`.
    Authenticate,
    /// `PointsGateway::adjust_points`.
    AdjustPoints,
    /// `VoteGateway::get_vote`.
    GetVote,
    /// `VoteGateway::submit_vote`.
    SubmitVote,
    /// `BountyGateway::get_bounty`.
    GetBounty,
    /// `BountyGateway::create_bounty`.
    CreateBounty,
    /// `BountyGateway::award_bounty`.
    AwardBounty,
    /// `BountyGateway::refund_bounty`.
    RefundBounty,
    /// `BadgeGateway::list_badges`.
    ListBadges,
    /// `BadgeGateway::award_badge`.
    AwardBadge,
    /// `EditVoteGateway::trigger_edit_vote`.
    TriggerEditVote,
    /// `EditVoteGateway::vote_on_edit`.
    VoteOnEdit,
    /// `AnswerGateway::accept_answer`.
    AcceptAnswer,
    /// `QuestionStatusGateway::submit_status_vote`.
    SubmitStatusVote,
}

#[derive(Debug)]
pub(super) struct StoredUser {
    pub(super) user: User,
    pub(super) proof: String,
}

#[derive(Debug)]
pub(super) struct EditVoteRecord {
    pub(super) id: EditVoteId,
    pub(super) post: PostRef,
    pub(super) proposal: EditProposal,
    pub(super) approvals: u32,
}

#[derive(Debug, Default)]
pub(super) struct StoreState {
    pub(super) users: BTreeMap<Username, StoredUser>,
    pub(super) votes: HashMap<(String, Username), VoteState>,
    pub(super) counts: HashMap<String, VoteCounts>,
    pub(super) bounties: BTreeMap<QuestionId, Bounty>,
    pub(super) badges: BTreeMap<Username, Vec<BadgeKind>>,
    pub(super) edit_votes: Vec<EditVoteRecord>,
    pub(super) accepted: BTreeSet<(QuestionId, AnswerId)>,
    pub(super) statuses: BTreeMap<QuestionId, QuestionStatus>,
    pub(super) failures: HashMap<MemoryOperation, VecDeque<CollaboratorError>>,
}

impl StoreState {
    /// Pop the next injected failure for `operation`.
    pub(super) fn injected(&mut self, operation: MemoryOperation) -> Result<(), CollaboratorError> {
        match self
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub(super) fn user_mut(
        &mut self,
        username: &Username,
    ) -> Result<&mut StoredUser, CollaboratorError> {
        self.users
            .get_mut(username)
            .ok_or_else(|| CollaboratorError::not_found(format!("user {username}")))
    }
}

/// Process-local implementation of every collaborator port.
#[derive(Debug, Default)]
pub struct InMemoryQaStore {
    state: Mutex<StoreState>,
}

impl InMemoryQaStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a small cast of demo users, all logging in with
    /// [`DEMO_PROOF`].
    pub fn demo() -> Self {
        let store = Self::new();
        for (name, points) in [
            ("demo-asker", 175),
            ("demo-answerer", 40),
            ("demo-voter", 150),
            ("demo-moderator", 12_000),
            ("demo-newcomer", 14),
        ] {
            if let Ok(username) = Username::new(name) {
                store.add_user(User::new(username, points), DEMO_PROOF);
            }
        }
        store
    }

    /// Register `user`, accepting `proof` at login.
    pub fn add_user(&self, user: User, proof: impl Into<String>) {
        self.lock().users.insert(
            user.username().clone(),
            StoredUser {
                user,
                proof: proof.into(),
            },
        );
    }

    /// Make the next call to `operation` fail with `error`. Failures queue
    /// per operation.
    pub fn fail_next(&self, operation: MemoryOperation, error: CollaboratorError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Current points of `username`.
    pub fn points_of(&self, username: &Username) -> Option<i64> {
        self.lock()
            .users
            .get(username)
            .map(|stored| stored.user.points())
    }

    /// Recorded counts of `target`.
    pub fn counts_of(&self, target: &VoteTarget) -> VoteCounts {
        self.lock()
            .counts
            .get(&target.to_string())
            .copied()
            .unwrap_or_default()
    }

    /// Badges held by `username`.
    pub fn badges_of(&self, username: &Username) -> Vec<BadgeKind> {
        self.lock().badges.get(username).cloned().unwrap_or_default()
    }

    /// Bounty on `question_id`.
    pub fn bounty_of(&self, question_id: &QuestionId) -> Option<Bounty> {
        self.lock().bounties.get(question_id).cloned()
    }

    /// Whether `answer_id` is accepted on `question_id`.
    pub fn is_accepted(&self, question_id: &QuestionId, answer_id: &AnswerId) -> bool {
        self.lock()
            .accepted
            .contains(&(question_id.clone(), answer_id.clone()))
    }

    /// Recorded status of `question_id`.
    pub fn status_of(&self, question_id: &QuestionId) -> QuestionStatus {
        self.lock()
            .statuses
            .get(question_id)
            .copied()
            .unwrap_or_default()
    }

    /// Approvals recorded for an edit vote.
    pub fn edit_vote_approvals(&self, edit_vote_id: &EditVoteId) -> Option<u32> {
        self.lock()
            .edit_votes
            .iter()
            .find(|record| &record.id == edit_vote_id)
            .map(|record| record.approvals)
    }

    /// Proposal carried by an edit vote.
    pub fn edit_proposal(&self, edit_vote_id: &EditVoteId) -> Option<EditProposal> {
        self.lock()
            .edit_votes
            .iter()
            .find(|record| &record.id == edit_vote_id)
            .map(|record| record.proposal.clone())
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
