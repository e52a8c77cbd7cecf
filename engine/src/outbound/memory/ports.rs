//! Port implementations for [`InMemoryQaStore`].

use async_trait::async_trait;

use super::store::{EditVoteRecord, InMemoryQaStore, MemoryOperation};
use crate::domain::bounty::{Bounty, BountyAmount, BountyState};
use crate::domain::ports::{
    AnswerGateway, BadgeGateway, BountyGateway, CollaboratorError, EditVoteGateway, PointsGateway,
    QuestionStatusGateway, UserDirectory, VoteGateway,
};
use crate::domain::vote::{VoteCommand, VoteOperation};
use crate::domain::{
    AnswerId, BadgeKind, CredentialProof, EditProposal, EditVoteId, PostRef, QuestionId,
    QuestionStatus, StatusVote, User, Username, VoteState, VoteTarget,
};

#[async_trait]
impl UserDirectory for InMemoryQaStore {
    async fn get_user(&self, username: &Username) -> Result<User, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::GetUser)?;
        Ok(state.user_mut(username)?.user.clone())
    }

    async fn authenticate(
        &self,
        username: &Username,
        proof: &CredentialProof,
    ) -> Result<bool, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::Authenticate)?;
        Ok(state.user_mut(username)?.proof == proof.expose())
    }
}

#[async_trait]
impl PointsGateway for InMemoryQaStore {
    async fn adjust_points(
        &self,
        username: &Username,
        delta: i64,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::AdjustPoints)?;
        let stored = state.user_mut(username)?;
        let points = stored.user.points().saturating_add(delta);
        stored.user = stored.user.clone().with_points(points);
        Ok(())
    }
}

#[async_trait]
impl VoteGateway for InMemoryQaStore {
    async fn get_vote(
        &self,
        target: &VoteTarget,
        voter: &Username,
    ) -> Result<VoteState, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::GetVote)?;
        state
            .votes
            .get(&(target.to_string(), voter.clone()))
            .copied()
            .ok_or_else(|| CollaboratorError::not_found(format!("vote by {voter} on {target}")))
    }

    async fn submit_vote(
        &self,
        target: &VoteTarget,
        voter: &Username,
        command: VoteCommand,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::SubmitVote)?;
        let key = (target.to_string(), voter.clone());
        let current = state.votes.get(&key).copied().unwrap_or_default();
        let next = match command.operation {
            VoteOperation::Increment if current == VoteState::None => {
                VoteState::from_direction(command.direction)
            }
            VoteOperation::Decrement if current.direction() == Some(command.direction) => {
                VoteState::None
            }
            _ => {
                return Err(CollaboratorError::rejected(format!(
                    "cannot apply {command:?} to a {current:?} vote"
                )));
            }
        };
        let counts = state.counts.entry(key.0.clone()).or_default();
        *counts = counts.apply(command);
        if next == VoteState::None {
            state.votes.remove(&key);
        } else {
            state.votes.insert(key, next);
        }
        Ok(())
    }
}

#[async_trait]
impl BountyGateway for InMemoryQaStore {
    async fn get_bounty(
        &self,
        question_id: &QuestionId,
    ) -> Result<Option<Bounty>, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::GetBounty)?;
        Ok(state.bounties.get(question_id).cloned())
    }

    async fn create_bounty(
        &self,
        question_id: &QuestionId,
        poster: &Username,
        amount: BountyAmount,
    ) -> Result<Bounty, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::CreateBounty)?;
        if state.bounties.contains_key(question_id) {
            return Err(CollaboratorError::conflict(format!(
                "question {question_id} already has a bounty"
            )));
        }
        let bounty = Bounty::active(question_id.clone(), poster.clone(), amount);
        state.bounties.insert(question_id.clone(), bounty.clone());
        Ok(bounty)
    }

    async fn award_bounty(
        &self,
        question_id: &QuestionId,
        awardee: &Username,
    ) -> Result<Bounty, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::AwardBounty)?;
        let bounty = active_bounty(state.bounties.get_mut(question_id), question_id)?;
        bounty.state = BountyState::Awarded {
            awarded_to: awardee.clone(),
        };
        Ok(bounty.clone())
    }

    async fn refund_bounty(&self, question_id: &QuestionId) -> Result<Bounty, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::RefundBounty)?;
        let bounty = active_bounty(state.bounties.get_mut(question_id), question_id)?;
        bounty.state = BountyState::Refunded;
        Ok(bounty.clone())
    }
}

fn active_bounty<'a>(
    bounty: Option<&'a mut Bounty>,
    question_id: &QuestionId,
) -> Result<&'a mut Bounty, CollaboratorError> {
    match bounty {
        Some(bounty) if bounty.is_active() => Ok(bounty),
        Some(_) => Err(CollaboratorError::rejected(format!(
            "bounty on {question_id} is no longer active"
        ))),
        None => Err(CollaboratorError::not_found(format!("bounty on {question_id}"))),
    }
}

#[async_trait]
impl BadgeGateway for InMemoryQaStore {
    async fn list_badges(&self, username: &Username) -> Result<Vec<BadgeKind>, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::ListBadges)?;
        Ok(state.badges.get(username).cloned().unwrap_or_default())
    }

    async fn award_badge(
        &self,
        username: &Username,
        badge: BadgeKind,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::AwardBadge)?;
        let held = state.badges.entry(username.clone()).or_default();
        if !held.contains(&badge) {
            held.push(badge);
        }
        Ok(())
    }
}

#[async_trait]
impl EditVoteGateway for InMemoryQaStore {
    async fn trigger_edit_vote(
        &self,
        post: &PostRef,
        proposal: &EditProposal,
    ) -> Result<EditVoteId, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::TriggerEditVote)?;
        let id = EditVoteId::new(format!("edit-{}", state.edit_votes.len() + 1))
            .map_err(|error| CollaboratorError::server(error.to_string()))?;
        state.edit_votes.push(EditVoteRecord {
            id: id.clone(),
            post: post.clone(),
            proposal: proposal.clone(),
            approvals: 0,
        });
        Ok(id)
    }

    async fn vote_on_edit(
        &self,
        post: &PostRef,
        edit_vote_id: &EditVoteId,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::VoteOnEdit)?;
        let record = state
            .edit_votes
            .iter_mut()
            .find(|record| &record.id == edit_vote_id && &record.post == post)
            .ok_or_else(|| CollaboratorError::not_found(format!("edit vote {edit_vote_id}")))?;
        record.approvals = record.approvals.saturating_add(1);
        Ok(())
    }
}

#[async_trait]
impl AnswerGateway for InMemoryQaStore {
    async fn accept_answer(
        &self,
        question_id: &QuestionId,
        answer_id: &AnswerId,
    ) -> Result<(), CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::AcceptAnswer)?;
        let other_accepted = state
            .accepted
            .iter()
            .any(|(question, answer)| question == question_id && answer != answer_id);
        if other_accepted {
            return Err(CollaboratorError::rejected(format!(
                "question {question_id} already has an accepted answer"
            )));
        }
        state.accepted.insert((question_id.clone(), answer_id.clone()));
        Ok(())
    }
}

#[async_trait]
impl QuestionStatusGateway for InMemoryQaStore {
    async fn submit_status_vote(
        &self,
        question_id: &QuestionId,
        _voter: &Username,
        vote: StatusVote,
    ) -> Result<QuestionStatus, CollaboratorError> {
        let mut state = self.lock();
        state.injected(MemoryOperation::SubmitStatusVote)?;
        // One vote is a quorum in the demo store.
        let status = match vote {
            StatusVote::Protect => QuestionStatus::Protected,
            StatusVote::Close => QuestionStatus::Closed,
            StatusVote::Reopen => QuestionStatus::Open,
        };
        state.statuses.insert(question_id.clone(), status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    //! Demo store behaviour.
    use super::*;
    use crate::domain::{VoteCounts, VoteDirection};
    use crate::outbound::memory::DEMO_PROOF;

    fn name(raw: &str) -> Username {
        Username::new(raw).expect("valid username")
    }

    fn target() -> VoteTarget {
        VoteTarget::Question {
            question_id: QuestionId::new("q1").expect("valid id"),
            creator: name("demo-asker"),
        }
    }

    #[tokio::test]
    async fn demo_users_authenticate_with_the_demo_proof() {
        let store = InMemoryQaStore::demo();
        let accepted = store
            .authenticate(&name("demo-asker"), &CredentialProof::new(DEMO_PROOF))
            .await
            .expect("known user");
        let refused = store
            .authenticate(&name("demo-asker"), &CredentialProof::new("guess"))
            .await
            .expect("known user");
        assert!(accepted);
        assert!(!refused);
    }

    #[tokio::test]
    async fn missing_votes_are_not_found_and_counts_track_commands() {
        let store = InMemoryQaStore::demo();
        let voter = name("demo-voter");
        let missing = store.get_vote(&target(), &voter).await.expect_err("no vote yet");
        assert!(missing.is_not_found());

        store
            .submit_vote(&target(), &voter, VoteCommand::increment(VoteDirection::Up))
            .await
            .expect("vote recorded");
        assert_eq!(store.get_vote(&target(), &voter).await.expect("vote"), VoteState::Upvoted);
        assert_eq!(store.counts_of(&target()), VoteCounts::new(1, 0));

        let double = store
            .submit_vote(&target(), &voter, VoteCommand::increment(VoteDirection::Down))
            .await;
        assert!(double.is_err());
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let store = InMemoryQaStore::demo();
        store.fail_next(MemoryOperation::AdjustPoints, CollaboratorError::server("555"));

        let first = store.adjust_points(&name("demo-asker"), 5).await;
        let second = store.adjust_points(&name("demo-asker"), 5).await;

        assert!(first.is_err());
        assert!(second.is_ok());
        assert_eq!(store.points_of(&name("demo-asker")), Some(180));
    }

    #[tokio::test]
    async fn settled_bounties_cannot_be_awarded_again() {
        let store = InMemoryQaStore::demo();
        let question = QuestionId::new("q1").expect("valid id");
        let amount = BountyAmount::new(100).expect("in range");
        store
            .create_bounty(&question, &name("demo-asker"), amount)
            .await
            .expect("created");
        store
            .award_bounty(&question, &name("demo-answerer"))
            .await
            .expect("awarded");
        let again = store.award_bounty(&question, &name("demo-voter")).await;
        assert!(matches!(again, Err(CollaboratorError::Rejected { .. })));
    }
}
