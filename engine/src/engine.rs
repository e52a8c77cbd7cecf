//! Exposed facade over the domain services.
//!
//! Every operation returns an [`Outcome`], a uniform envelope carrying
//! either the confirmed data or a domain error. Nothing here panics; denials
//! and collaborator failures all fold into `success: false`.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::ports::{
    AnswerGateway, BadgeGateway, BountyGateway, EditVoteGateway, PointsGateway,
    QuestionStatusGateway, UserDirectory, VoteGateway,
};
use crate::domain::{
    AcceptanceReceipt, Action, AnswerAcceptance, AnswerSnapshot, Badge, BadgeEvaluator,
    BountyEscrow, BountyReceipt, CallPolicy, CredentialProof, EditVoteGate, EditVoteId,
    EditVoteReceipt, Error, Level, NextThreshold, PostRef, QuestionSnapshot, ScoringLedger,
    Session, SessionService, StatusVote, StatusVoteReceipt, StatusVoteService, User, Username,
    VoteCounts, VoteReceipt, VoteRequest, VoteService, VoteTarget, level,
};

/// Uniform result envelope returned by every engine operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    /// Whether the operation was confirmed.
    pub success: bool,
    /// Confirmed result, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure, present when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

impl<T> Outcome<T> {
    /// Successful outcome carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed outcome carrying `error`.
    pub const fn failed(error: Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Convert back into a `Result`.
    pub fn into_result(self) -> Result<T, Error> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(Error::internal("outcome carried neither data nor error")),
        }
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(value: Result<T, Error>) -> Self {
        match value {
            Ok(data) => Self::ok(data),
            Err(error) => Self::failed(error),
        }
    }
}

/// A user's level, unlocked actions and distance to the next level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// Current level.
    pub level: Level,
    /// Actions unlocked at that level.
    pub privileges: Vec<Action>,
    /// Next level, absent at the top.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<NextThreshold>,
}

/// Driven ports the engine is built from.
#[derive(Clone)]
pub struct EnginePorts {
    /// User lookup and authentication.
    pub users: Arc<dyn UserDirectory>,
    /// Point adjustments.
    pub points: Arc<dyn PointsGateway>,
    /// Per-user vote records.
    pub votes: Arc<dyn VoteGateway>,
    /// Bounty records.
    pub bounties: Arc<dyn BountyGateway>,
    /// Badge records.
    pub badges: Arc<dyn BadgeGateway>,
    /// Edit votes.
    pub edits: Arc<dyn EditVoteGateway>,
    /// Answer acceptance.
    pub answers: Arc<dyn AnswerGateway>,
    /// Question status votes.
    pub statuses: Arc<dyn QuestionStatusGateway>,
}

impl EnginePorts {
    /// Use one collaborator for every port.
    pub fn shared<C>(collaborator: Arc<C>) -> Self
    where
        C: UserDirectory
            + PointsGateway
            + VoteGateway
            + BountyGateway
            + BadgeGateway
            + EditVoteGateway
            + AnswerGateway
            + QuestionStatusGateway
            + 'static,
    {
        Self {
            users: collaborator.clone(),
            points: collaborator.clone(),
            votes: collaborator.clone(),
            bounties: collaborator.clone(),
            badges: collaborator.clone(),
            edits: collaborator.clone(),
            answers: collaborator.clone(),
            statuses: collaborator,
        }
    }
}

/// Reputation-gated voting and scoring engine.
pub struct ReputationEngine {
    votes: VoteService,
    bounties: BountyEscrow,
    edits: EditVoteGate,
    acceptance: AnswerAcceptance,
    statuses: StatusVoteService,
    sessions: SessionService,
}

impl ReputationEngine {
    /// Wire every service over `ports`.
    pub fn new(ports: EnginePorts, policy: CallPolicy) -> Self {
        let policy = Arc::new(policy);
        let ledger = Arc::new(ScoringLedger::new(
            ports.users.clone(),
            ports.points,
            policy.clone(),
        ));
        let badges = Arc::new(BadgeEvaluator::new(ports.badges, policy.clone()));
        Self {
            votes: VoteService::new(
                ports.votes,
                ports.users.clone(),
                ledger.clone(),
                badges.clone(),
                policy.clone(),
            ),
            bounties: BountyEscrow::new(
                ports.bounties,
                ports.users.clone(),
                ledger.clone(),
                badges.clone(),
                policy.clone(),
            ),
            edits: EditVoteGate::new(ports.edits, ports.users.clone(), policy.clone()),
            acceptance: AnswerAcceptance::new(
                ports.answers,
                ledger,
                badges.clone(),
                policy.clone(),
            ),
            statuses: StatusVoteService::new(
                ports.statuses,
                ports.users.clone(),
                badges.clone(),
                policy.clone(),
            ),
            sessions: SessionService::new(ports.users, badges, policy),
        }
    }

    /// Check whether `user` may perform `action`.
    pub fn authorize(&self, user: Option<&User>, action: Action) -> Outcome<Action> {
        settle("authorize", level::authorize(user, action).into_result().map(|()| action))
    }

    /// Level, privileges and next threshold of `user`.
    pub fn standing(&self, user: &User) -> Standing {
        let level = user.level();
        Standing {
            level,
            privileges: level::privileges(level),
            next: level::next_threshold(user.points()),
        }
    }

    /// Cast, toggle off or switch a vote.
    pub async fn cast_vote(
        &self,
        user: Option<&User>,
        request: &VoteRequest,
    ) -> Outcome<VoteReceipt> {
        settle("cast_vote", self.votes.cast_vote(user, request).await)
    }

    /// Retract whichever vote `user` holds on `target`.
    pub async fn undo_vote(
        &self,
        user: Option<&User>,
        target: &VoteTarget,
        counts: VoteCounts,
    ) -> Outcome<VoteReceipt> {
        settle("undo_vote", self.votes.undo_vote(user, target, counts).await)
    }

    /// Escrow `amount` points as a bounty on `question`.
    pub async fn create_bounty(
        &self,
        user: Option<&User>,
        question: &QuestionSnapshot,
        amount: u32,
    ) -> Outcome<BountyReceipt> {
        settle(
            "create_bounty",
            self.bounties.create_bounty(user, question, amount).await,
        )
    }

    /// Pay the bounty on `question` to the accepted `answer`.
    pub async fn award_bounty(
        &self,
        user: Option<&User>,
        question: &QuestionSnapshot,
        answer: &AnswerSnapshot,
    ) -> Outcome<BountyReceipt> {
        settle(
            "award_bounty",
            self.bounties.award_bounty(user, question, answer).await,
        )
    }

    /// Open an edit vote on `post`.
    pub async fn trigger_edit_vote(
        &self,
        user: Option<&User>,
        post: &PostRef,
        title: Option<String>,
        body: String,
    ) -> Outcome<EditVoteReceipt> {
        settle(
            "trigger_edit_vote",
            self.edits.trigger_edit_vote(user, post, title, body).await,
        )
    }

    /// Approve an open edit vote.
    pub async fn vote_on_edit(
        &self,
        user: Option<&User>,
        post: &PostRef,
        edit_vote_id: &EditVoteId,
    ) -> Outcome<EditVoteReceipt> {
        settle(
            "vote_on_edit",
            self.edits.vote_on_edit(user, post, edit_vote_id).await,
        )
    }

    /// Accept `answer` on `question`.
    pub async fn accept_answer(
        &self,
        user: Option<&User>,
        question: &QuestionSnapshot,
        answer: &AnswerSnapshot,
    ) -> Outcome<AcceptanceReceipt> {
        settle(
            "accept_answer",
            self.acceptance.accept_answer(user, question, answer).await,
        )
    }

    /// Vote to protect, close or reopen `question`.
    pub async fn vote_on_status(
        &self,
        user: Option<&User>,
        question: &QuestionSnapshot,
        vote: StatusVote,
    ) -> Outcome<StatusVoteReceipt> {
        settle(
            "vote_on_status",
            self.statuses.vote_on_status(user, question, vote).await,
        )
    }

    /// Authenticate and load a session.
    pub async fn login(&self, username: &Username, proof: &CredentialProof) -> Outcome<Session> {
        settle("login", self.sessions.login(username, proof).await)
    }

    /// Record a completed profile; awards at most the Profile Complete badge.
    pub async fn complete_profile(&self, user: Option<&User>) -> Outcome<Vec<Badge>> {
        settle("complete_profile", self.sessions.complete_profile(user).await)
    }
}

fn settle<T>(operation: &'static str, result: Result<T, Error>) -> Outcome<T> {
    if let Err(error) = &result {
        debug!(operation, code = ?error.code(), %error, "engine operation failed");
    }
    Outcome::from(result)
}
