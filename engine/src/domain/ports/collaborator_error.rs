//! Error shared by every port backed by the remote Q&A collaborator.
//!
//! All ports talk to the same API, so they share one failure taxonomy.
//! Services translate it into domain errors at their boundary.

use super::define_port_error;

define_port_error! {
    /// Failures reported by collaborator adapters.
    pub enum CollaboratorError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "collaborator transport failed: {message}",
        /// The call exceeded its deadline; the outcome is unknown.
        Timeout { message: String } =>
            "collaborator timed out: {message}",
        /// The collaborator asked us to slow down.
        RateLimited { message: String } =>
            "collaborator rate limited the request: {message}",
        /// The collaborator failed internally.
        Server { message: String } =>
            "collaborator server error: {message}",
        /// The addressed resource does not exist.
        NotFound { message: String } =>
            "collaborator resource not found: {message}",
        /// The collaborator refused the credentials or API key.
        Unauthorized { message: String } =>
            "collaborator refused credentials: {message}",
        /// The request conflicts with collaborator state.
        Conflict { message: String } =>
            "collaborator reported a conflict: {message}",
        /// The collaborator rejected the request as invalid.
        Rejected { message: String } =>
            "collaborator rejected the request: {message}",
        /// The response could not be decoded or lacked a success flag.
        Decode { message: String } =>
            "collaborator response decode failed: {message}",
    }
}

impl CollaboratorError {
    /// Whether retrying the same call may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::RateLimited { .. }
                | Self::Server { .. }
        )
    }

    /// Whether the collaborator explicitly rate limited the call.
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether the resource does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
