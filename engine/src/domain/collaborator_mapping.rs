//! Translation of collaborator failures into domain errors.

use serde_json::json;

use super::error::DomainError;
use super::ports::CollaboratorError;

/// Map a collaborator failure for `operation` into a domain error.
pub(crate) fn map_collaborator_error(operation: &str, error: &CollaboratorError) -> DomainError {
    let message = format!("{operation} failed: {error}");
    match error {
        CollaboratorError::Transport { .. }
        | CollaboratorError::Timeout { .. }
        | CollaboratorError::RateLimited { .. }
        | CollaboratorError::Server { .. } => {
            DomainError::transient(message).with_details(json!({ "retryable": true }))
        }
        CollaboratorError::NotFound { .. } => DomainError::not_found(message),
        CollaboratorError::Unauthorized { .. } => DomainError::unauthenticated(message),
        CollaboratorError::Conflict { .. } => DomainError::conflict(message),
        CollaboratorError::Rejected { .. } => DomainError::invalid_request(message),
        CollaboratorError::Decode { .. } => DomainError::internal(message),
    }
}

/// Error reported when a compensating call fails and local projections
/// can no longer be trusted.
pub(crate) fn compensation_failed(operation: &str, cause: &DomainError) -> DomainError {
    DomainError::internal(format!(
        "{operation} failed and could not be rolled back; re-sync required"
    ))
    .with_details(json!({ "cause": cause.message(), "resyncRequired": true }))
}
