//! Port implementations for [`QaHttpClient`].

use async_trait::async_trait;
use reqwest::Method;

use super::client::QaHttpClient;
use super::dto::{
    AcceptAnswerDto, AuthRequestDto, AwardBadgeDto, AwardBountyDto, BadgeListDto,
    BountyEnvelopeDto, CreateBountyDto, EditBallotDto, EditVoteCreatedDto, EditVoteRequestDto,
    EmptyDto, PointsRequestDto, RefundBountyDto, StatusDto, StatusVoteRequestDto, UserEnvelopeDto,
    VoteDto, VoteRequestDto,
};
use crate::domain::bounty::{Bounty, BountyAmount};
use crate::domain::ports::{
    AnswerGateway, BadgeGateway, BountyGateway, CollaboratorError, EditVoteGateway, PointsGateway,
    QuestionStatusGateway, UserDirectory, VoteGateway,
};
use crate::domain::vote::VoteCommand;
use crate::domain::{
    AnswerId, BadgeKind, CommentParent, CredentialProof, EditProposal, EditVoteId, PostRef,
    QuestionId, QuestionStatus, StatusVote, User, Username, VoteState, VoteTarget,
};

fn vote_path<'a>(target: &'a VoteTarget, voter: &'a Username) -> Vec<&'a str> {
    let mut path = vec!["questions", target.question_id().as_str()];
    match target {
        VoteTarget::Question { .. } => {}
        VoteTarget::Answer { answer_id, .. } => path.extend(["answers", answer_id.as_str()]),
        VoteTarget::Comment {
            parent, comment_id, ..
        } => {
            if let CommentParent::Answer { answer_id } = parent {
                path.extend(["answers", answer_id.as_str()]);
            }
            path.extend(["comments", comment_id.as_str()]);
        }
    }
    path.extend(["vote", voter.as_str()]);
    path
}

fn post_path(post: &PostRef) -> [&str; 2] {
    match post {
        PostRef::Question { question_id } => ["questions", question_id.as_str()],
        PostRef::Answer { answer_id, .. } => ["answers", answer_id.as_str()],
    }
}

fn bounty_path(question_id: &QuestionId) -> [&str; 3] {
    ["questions", question_id.as_str(), "bounty"]
}

impl QaHttpClient {
    async fn bounty_call<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        question_id: &QuestionId,
        body: &B,
    ) -> Result<Bounty, CollaboratorError> {
        let url = self.endpoint(&bounty_path(question_id))?;
        let payload: BountyEnvelopeDto = self.send(method, url, body).await?;
        payload
            .bounty
            .ok_or_else(|| CollaboratorError::decode("bounty response carried no bounty"))?
            .into_domain(question_id)
    }
}

#[async_trait]
impl UserDirectory for QaHttpClient {
    async fn get_user(&self, username: &Username) -> Result<User, CollaboratorError> {
        let url = self.endpoint(&["users", username.as_str()])?;
        let payload: UserEnvelopeDto = self.get(url).await?;
        payload.user.into_domain()
    }

    async fn authenticate(
        &self,
        username: &Username,
        proof: &CredentialProof,
    ) -> Result<bool, CollaboratorError> {
        let url = self.endpoint(&["users", username.as_str(), "auth"])?;
        let body = AuthRequestDto { key: proof.expose() };
        let envelope = self
            .envelope::<_, EmptyDto>(Method::POST, url, Some(&body))
            .await?;
        Ok(envelope.success == Some(true))
    }
}

#[async_trait]
impl PointsGateway for QaHttpClient {
    async fn adjust_points(
        &self,
        username: &Username,
        delta: i64,
    ) -> Result<(), CollaboratorError> {
        let url = self.endpoint(&["users", username.as_str(), "points"])?;
        let _: EmptyDto = self
            .send(Method::PATCH, url, &PointsRequestDto::from_delta(delta))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VoteGateway for QaHttpClient {
    async fn get_vote(
        &self,
        target: &VoteTarget,
        voter: &Username,
    ) -> Result<VoteState, CollaboratorError> {
        let url = self.endpoint(vote_path(target, voter).as_slice())?;
        let payload: VoteDto = self.get(url).await?;
        payload.into_domain()
    }

    async fn submit_vote(
        &self,
        target: &VoteTarget,
        voter: &Username,
        command: VoteCommand,
    ) -> Result<(), CollaboratorError> {
        let url = self.endpoint(vote_path(target, voter).as_slice())?;
        let _: EmptyDto = self
            .send(Method::PATCH, url, &VoteRequestDto::from(command))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BountyGateway for QaHttpClient {
    async fn get_bounty(
        &self,
        question_id: &QuestionId,
    ) -> Result<Option<Bounty>, CollaboratorError> {
        let url = self.endpoint(&bounty_path(question_id))?;
        let payload: BountyEnvelopeDto = self.get(url).await?;
        payload
            .bounty
            .map(|bounty| bounty.into_domain(question_id))
            .transpose()
    }

    async fn create_bounty(
        &self,
        question_id: &QuestionId,
        poster: &Username,
        amount: BountyAmount,
    ) -> Result<Bounty, CollaboratorError> {
        let body = CreateBountyDto {
            poster: poster.as_str(),
            amount: amount.get(),
        };
        self.bounty_call(Method::POST, question_id, &body).await
    }

    async fn award_bounty(
        &self,
        question_id: &QuestionId,
        awardee: &Username,
    ) -> Result<Bounty, CollaboratorError> {
        let body = AwardBountyDto {
            awarded_to: awardee.as_str(),
        };
        self.bounty_call(Method::PATCH, question_id, &body).await
    }

    async fn refund_bounty(&self, question_id: &QuestionId) -> Result<Bounty, CollaboratorError> {
        self.bounty_call(Method::PATCH, question_id, &RefundBountyDto { refunded: true })
            .await
    }
}

#[async_trait]
impl BadgeGateway for QaHttpClient {
    async fn list_badges(&self, username: &Username) -> Result<Vec<BadgeKind>, CollaboratorError> {
        let url = self.endpoint(&["users", username.as_str(), "badges"])?;
        let payload: BadgeListDto = self.get(url).await?;
        Ok(payload.into_domain())
    }

    async fn award_badge(
        &self,
        username: &Username,
        badge: BadgeKind,
    ) -> Result<(), CollaboratorError> {
        let url = self.endpoint(&["users", username.as_str(), "badges"])?;
        let body = AwardBadgeDto {
            badge: badge.name(),
            tier: badge.tier().as_str(),
        };
        let _: EmptyDto = self.send(Method::POST, url, &body).await?;
        Ok(())
    }
}

#[async_trait]
impl EditVoteGateway for QaHttpClient {
    async fn trigger_edit_vote(
        &self,
        post: &PostRef,
        proposal: &EditProposal,
    ) -> Result<EditVoteId, CollaboratorError> {
        let [kind, id] = post_path(post);
        let url = self.endpoint(&[kind, id, "edit-votes"])?;
        let payload: EditVoteCreatedDto = self
            .send(Method::POST, url, &EditVoteRequestDto::from(proposal))
            .await?;
        payload.into_domain()
    }

    async fn vote_on_edit(
        &self,
        post: &PostRef,
        edit_vote_id: &EditVoteId,
    ) -> Result<(), CollaboratorError> {
        let [kind, id] = post_path(post);
        let url = self.endpoint(&[kind, id, "edit-votes", edit_vote_id.as_str(), "vote"])?;
        let _: EmptyDto = self
            .send(Method::POST, url, &EditBallotDto { vote: "yes" })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AnswerGateway for QaHttpClient {
    async fn accept_answer(
        &self,
        question_id: &QuestionId,
        answer_id: &AnswerId,
    ) -> Result<(), CollaboratorError> {
        let url = self.endpoint(&[
            "questions",
            question_id.as_str(),
            "answers",
            answer_id.as_str(),
        ])?;
        let _: EmptyDto = self
            .send(Method::PATCH, url, &AcceptAnswerDto { accepted: true })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionStatusGateway for QaHttpClient {
    async fn submit_status_vote(
        &self,
        question_id: &QuestionId,
        voter: &Username,
        vote: StatusVote,
    ) -> Result<QuestionStatus, CollaboratorError> {
        let url = self.endpoint(&["questions", question_id.as_str(), "status", voter.as_str()])?;
        let payload: StatusDto = self
            .send(Method::PATCH, url, &StatusVoteRequestDto { vote: vote.as_str() })
            .await?;
        payload.into_domain()
    }
}
