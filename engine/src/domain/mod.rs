//! Domain primitives, policies and services.
//!
//! Purpose: hold every rule of the reputation engine. Pure policy (levels,
//! vote transitions, scoring, badges, bounty rules) lives in leaf modules;
//! services sequence calls to the collaborator through `ports` and
//! compensate confirmed steps when a later one fails.
//!
//! Public surface:
//! - Error (alias to `error::DomainError`) — failure payload with a stable
//!   code.
//! - ErrorCode — stable error identifier.
//! - Level, Action — privilege levels and the actions they unlock.
//! - The services re-exported below, composed by `crate::engine`.

pub mod acceptance_service;
mod actor_lookup;
pub mod badge;
pub mod badge_service;
pub mod bounty;
pub mod bounty_service;
pub mod call_policy;
mod collaborator_mapping;
pub mod content;
pub mod edit_vote;
pub mod edit_vote_service;
pub mod error;
pub mod ids;
mod in_flight;
pub mod level;
pub mod ports;
pub mod scoring;
pub mod scoring_ledger;
pub mod session_service;
pub mod status_vote_service;
pub mod user;
pub mod vote;
pub mod vote_service;

pub use self::acceptance_service::{AcceptanceReceipt, AnswerAcceptance};
pub use self::badge::{Badge, BadgeKind, BadgeTier, BadgeTrigger, badges_for};
pub use self::badge_service::{BadgeEvaluator, BadgeReport};
pub use self::bounty::{Bounty, BountyAmount, BountyRuleViolation, BountyState};
pub use self::bounty_service::{BountyEscrow, BountyReceipt};
pub use self::call_policy::{
    AttemptJitter, BackoffJitter, CallPolicy, CallPolicyConfig, CallPolicyRuntime, RetrySleeper,
    TokioSleeper,
};
pub use self::content::{
    AnswerSnapshot, CommentParent, PostRef, QuestionSnapshot, QuestionStatus, StatusVote,
    VotableKind, VoteTarget,
};
pub use self::edit_vote::{EditProposal, EditProposalError};
pub use self::edit_vote_service::{EditVoteGate, EditVoteReceipt};
pub use self::error::{DomainError as Error, ErrorCode, ErrorValidationError};
pub use self::ids::{AnswerId, CommentId, EditVoteId, IdentifierError, QuestionId, Username};
pub use self::level::{Action, Authorization, Denial, Level, NextThreshold};
pub use self::scoring::{LedgerEntry, ScoringEvent};
pub use self::scoring_ledger::{LedgerReceipt, ScoringLedger};
pub use self::session_service::{Session, SessionService};
pub use self::status_vote_service::{StatusVoteReceipt, StatusVoteService};
pub use self::user::{CredentialProof, User};
pub use self::vote::{VoteCounts, VoteDirection, VoteState};
pub use self::vote_service::{VoteReceipt, VoteRequest, VoteService};
