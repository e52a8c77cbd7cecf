//! Validated string identifiers for users and content.
//!
//! The collaborator owns identifier formats; locally we only insist that an
//! identifier is non-empty and carries no surrounding whitespace so it can
//! be embedded in request paths verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by identifier constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The identifier was empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Human-readable identifier kind.
        kind: &'static str,
    },
    /// The identifier had leading or trailing whitespace.
    #[error("{kind} must not have surrounding whitespace")]
    SurroundingWhitespace {
        /// Human-readable identifier kind.
        kind: &'static str,
    },
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the identifier.
            pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(IdentifierError::Empty { kind: $kind });
                }
                if value.trim() != value {
                    return Err(IdentifierError::SurroundingWhitespace { kind: $kind });
                }
                Ok(Self(value))
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdentifierError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_identifier!(
    /// Unique username; the collaborator's primary key for users.
    Username,
    "username"
);
string_identifier!(
    /// Question identifier.
    QuestionId,
    "question id"
);
string_identifier!(
    /// Answer identifier, scoped to its question.
    AnswerId,
    "answer id"
);
string_identifier!(
    /// Comment identifier, scoped to its parent post.
    CommentId,
    "comment id"
);
string_identifier!(
    /// Identifier of a pending edit vote.
    EditVoteId,
    "edit vote id"
);
