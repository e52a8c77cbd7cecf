//! User data model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::Username;
use super::level::Level;

/// Points granted at registration.
pub const REGISTRATION_POINTS: i64 = 1;

/// Collaborator-backed user record.
///
/// The level is never stored; [`User::level`] recomputes it from points on
/// every call so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    username: Username,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    points: i64,
}

impl User {
    /// Build a user record with the given point total.
    pub const fn new(username: Username, points: i64) -> Self {
        Self {
            username,
            email: None,
            points,
        }
    }

    /// Attach an email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Return a copy carrying a different confirmed point total.
    #[must_use]
    pub fn with_points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    /// Unique username.
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Email address, when the collaborator disclosed one.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Confirmed point total.
    pub const fn points(&self) -> i64 {
        self.points
    }

    /// Privilege level derived from the current points.
    pub fn level(&self) -> Level {
        Level::from_points(self.points)
    }
}

/// Opaque proof of credentials forwarded once to the collaborator.
///
/// Derivation happens upstream; the engine never inspects the value and
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialProof(String);

impl CredentialProof {
    /// Wrap an already-derived proof.
    pub fn new(proof: impl Into<String>) -> Self {
        Self(proof.into())
    }

    /// Borrow the raw proof for forwarding.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for CredentialProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialProof(<redacted>)")
    }
}
