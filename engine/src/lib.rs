//! Reputation-gated voting and scoring engine for the qOverflow Q&A client.
//!
//! The crate decides who may vote, how votes and retractions move counts and
//! points, when badges are earned and how bounties are escrowed and paid. All
//! persistent state lives behind the remote API reached through the ports in
//! [`domain::ports`]; [`outbound`] provides an HTTP adapter and an in-memory
//! demo adapter. [`ReputationEngine`] is the facade callers drive.

pub mod config;
pub mod domain;
pub mod engine;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{EngineSettings, SettingsError};
pub use engine::{EnginePorts, Outcome, ReputationEngine, Standing};
