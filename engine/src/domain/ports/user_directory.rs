//! Driven port for loading and authenticating users.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::ids::Username;
use crate::domain::user::{CredentialProof, User};

/// Port for user records held by the collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Load a user with its confirmed point total.
    ///
    /// A missing user is reported as [`CollaboratorError::NotFound`].
    async fn get_user(&self, username: &Username) -> Result<User, CollaboratorError>;

    /// Forward a credential proof; `Ok(false)` means the proof was refused.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let accepted = directory
    ///     .authenticate(&Username::new("alice")?, &CredentialProof::new(key))
    ///     .await?;
    /// assert!(accepted);
    /// ```
    async fn authenticate(
        &self,
        username: &Username,
        proof: &CredentialProof,
    ) -> Result<bool, CollaboratorError>;
}
