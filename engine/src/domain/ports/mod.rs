//! Domain ports for the hexagonal boundary.
//!
//! Every port is backed by the same remote collaborator, so they share
//! [`CollaboratorError`]. Adapters live under `crate::outbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod answer_gateway;
mod badge_gateway;
mod bounty_gateway;
mod collaborator_error;
mod edit_vote_gateway;
mod points_gateway;
mod question_status_gateway;
mod user_directory;
mod vote_gateway;

pub use answer_gateway::AnswerGateway;
#[cfg(test)]
pub use answer_gateway::MockAnswerGateway;
pub use badge_gateway::BadgeGateway;
#[cfg(test)]
pub use badge_gateway::MockBadgeGateway;
pub use bounty_gateway::BountyGateway;
#[cfg(test)]
pub use bounty_gateway::MockBountyGateway;
pub use collaborator_error::CollaboratorError;
pub use edit_vote_gateway::EditVoteGateway;
#[cfg(test)]
pub use edit_vote_gateway::MockEditVoteGateway;
pub use points_gateway::PointsGateway;
#[cfg(test)]
pub use points_gateway::MockPointsGateway;
pub use question_status_gateway::QuestionStatusGateway;
#[cfg(test)]
pub use question_status_gateway::MockQuestionStatusGateway;
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::UserDirectory;
#[cfg(test)]
pub use vote_gateway::MockVoteGateway;
pub use vote_gateway::VoteGateway;
