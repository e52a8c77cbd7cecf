//! Edit-vote gate: level 7 users open and approve community edits.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::actor_lookup::ActorLookup;
use super::call_policy::CallPolicy;
use super::collaborator_mapping::map_collaborator_error;
use super::content::PostRef;
use super::edit_vote::EditProposal;
use super::error::DomainError;
use super::ids::EditVoteId;
use super::level::Action;
use super::ports::{EditVoteGateway, UserDirectory};
use super::user::User;

/// Edit vote acknowledged by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditVoteReceipt {
    /// Post being edited.
    pub post: PostRef,
    /// Pending edit vote.
    pub edit_vote_id: EditVoteId,
}

/// Gates edit-vote calls on the actor's level.
pub struct EditVoteGate {
    edits: Arc<dyn EditVoteGateway>,
    actors: ActorLookup,
}

impl EditVoteGate {
    /// Build the gate.
    pub fn new(
        edits: Arc<dyn EditVoteGateway>,
        users: Arc<dyn UserDirectory>,
        policy: Arc<CallPolicy>,
    ) -> Self {
        Self {
            edits,
            actors: ActorLookup::new(users, policy),
        }
    }

    /// Open an edit vote proposing `title` and `body` for `post`.
    pub async fn trigger_edit_vote(
        &self,
        actor: Option<&User>,
        post: &PostRef,
        title: Option<String>,
        body: String,
    ) -> Result<EditVoteReceipt, DomainError> {
        let editor = self.actors.require(actor, Action::VoteOnEdit).await?;
        let proposal = EditProposal::new(post, title, body)?;
        let edit_vote_id = self
            .edits
            .trigger_edit_vote(post, &proposal)
            .await
            .map_err(|cause| map_collaborator_error("trigger edit vote", &cause))?;
        info!(editor = %editor.username(), %edit_vote_id, "edit vote opened");
        Ok(EditVoteReceipt {
            post: post.clone(),
            edit_vote_id,
        })
    }

    /// Approve a pending edit.
    pub async fn vote_on_edit(
        &self,
        actor: Option<&User>,
        post: &PostRef,
        edit_vote_id: &EditVoteId,
    ) -> Result<EditVoteReceipt, DomainError> {
        let voter = self.actors.require(actor, Action::VoteOnEdit).await?;
        self.edits
            .vote_on_edit(post, edit_vote_id)
            .await
            .map_err(|cause| map_collaborator_error("vote on edit", &cause))?;
        info!(voter = %voter.username(), %edit_vote_id, "edit vote approved");
        Ok(EditVoteReceipt {
            post: post.clone(),
            edit_vote_id: edit_vote_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Level gating for edit votes.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ids::{AnswerId, QuestionId, Username};
    use crate::domain::ports::{CollaboratorError, MockEditVoteGateway, MockUserDirectory};
    use crate::test_support::immediate_call_policy;
    use rstest::rstest;

    /// Gate whose directory reports `stored` points for the editor.
    fn gate(edits: MockEditVoteGateway, stored: i64) -> EditVoteGate {
        let mut users = MockUserDirectory::new();
        users
            .expect_get_user()
            .returning(move |name| Ok(User::new(name.clone(), stored)));
        EditVoteGate::new(Arc::new(edits), Arc::new(users), Arc::new(immediate_call_policy()))
    }

    fn editor(points: i64) -> User {
        User::new(Username::new("editor").expect("valid username"), points)
    }

    fn question_post() -> PostRef {
        PostRef::Question {
            question_id: QuestionId::new("q1").expect("valid id"),
        }
    }

    fn answer_post() -> PostRef {
        PostRef::Answer {
            question_id: QuestionId::new("q1").expect("valid id"),
            answer_id: AnswerId::new("a1").expect("valid id"),
        }
    }

    fn edit_vote_id() -> EditVoteId {
        EditVoteId::new("e1").expect("valid id")
    }

    #[rstest]
    #[tokio::test]
    async fn level_six_cannot_trigger_or_vote() {
        let edit_gate = gate(MockEditVoteGateway::new(), 9_999);
        let actor = editor(9_999);
        let trigger = edit_gate
            .trigger_edit_vote(Some(&actor), &question_post(), None, "body".to_owned())
            .await
            .expect_err("level 6");
        let vote = edit_gate
            .vote_on_edit(Some(&actor), &question_post(), &edit_vote_id())
            .await
            .expect_err("level 6");
        assert_eq!(trigger.code(), ErrorCode::Unauthorized);
        assert_eq!(vote.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn level_seven_opens_an_edit_vote() {
        let mut edits = MockEditVoteGateway::new();
        edits
            .expect_trigger_edit_vote()
            .withf(|_, proposal| proposal.title() == Some("Sharper title"))
            .times(1)
            .returning(|_, _| Ok(EditVoteId::new("e1").expect("valid id")));
        let receipt = gate(edits, 10_000)
            .trigger_edit_vote(
                Some(&editor(10_000)),
                &question_post(),
                Some("Sharper title".to_owned()),
                "Clearer body".to_owned(),
            )
            .await
            .expect("edit vote opened");
        assert_eq!(receipt.edit_vote_id, edit_vote_id());
    }

    #[rstest]
    #[case(Some("title".to_owned()), "body")]
    #[case(None, "   ")]
    #[tokio::test]
    async fn invalid_answer_proposals_are_rejected(
        #[case] title: Option<String>,
        #[case] body: &str,
    ) {
        let error = gate(MockEditVoteGateway::new(), 10_000)
            .trigger_edit_vote(Some(&editor(10_000)), &answer_post(), title, body.to_owned())
            .await
            .expect_err("invalid proposal");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn approval_failures_are_translated() {
        let mut edits = MockEditVoteGateway::new();
        edits
            .expect_vote_on_edit()
            .returning(|_, _| Err(CollaboratorError::not_found("edit vote")));
        let error = gate(edits, 10_000)
            .vote_on_edit(Some(&editor(10_000)), &answer_post(), &edit_vote_id())
            .await
            .expect_err("unknown edit vote");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn demoted_editors_are_refused_despite_their_session() {
        let mut edits = MockEditVoteGateway::new();
        edits.expect_vote_on_edit().times(0);
        let error = gate(edits, 9_000)
            .vote_on_edit(Some(&editor(12_000)), &question_post(), &edit_vote_id())
            .await
            .expect_err("directory says level 6");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }
}
