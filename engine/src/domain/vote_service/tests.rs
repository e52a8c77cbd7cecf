//! Vote service orchestration coverage.

use std::sync::Arc;

use mockall::Sequence;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::badge::BadgeKind;
use crate::domain::content::CommentParent;
use crate::domain::ids::{CommentId, QuestionId};
use crate::domain::ports::{
    MockBadgeGateway, MockPointsGateway, MockUserDirectory, MockVoteGateway, UserDirectory,
};
use crate::domain::vote::VoteCommand;
use crate::test_support::immediate_call_policy;

fn username(raw: &str) -> Username {
    Username::new(raw).expect("valid username")
}

fn voter(points: i64) -> User {
    User::new(username("voter"), points)
}

fn question() -> VoteTarget {
    VoteTarget::Question {
        question_id: QuestionId::new("q1").expect("valid id"),
        creator: username("asker"),
    }
}

fn request(direction: VoteDirection, counts: VoteCounts) -> VoteRequest {
    VoteRequest {
        target: question(),
        direction,
        counts,
    }
}

fn is_command(expected: VoteCommand) -> impl Fn(&VoteTarget, &Username, &VoteCommand) -> bool {
    move |_, _, command| *command == expected
}

fn adjusts(name: &'static str, delta: i64) -> impl Fn(&Username, &i64) -> bool {
    move |candidate, candidate_delta| candidate.as_str() == name && *candidate_delta == delta
}

struct Harness {
    votes: MockVoteGateway,
    users: MockUserDirectory,
    points: MockPointsGateway,
    badges: MockBadgeGateway,
    voter_points: i64,
}

impl Harness {
    /// Points the directory reports for `voter`.
    fn with_voter(mut self, points: i64) -> Self {
        self.voter_points = points;
        self
    }

    fn build(mut self) -> VoteService {
        let voter_points = self.voter_points;
        self.users.expect_get_user().returning(move |name| {
            let points = match name.as_str() {
                "asker" => 100,
                "voter" => voter_points,
                _ => 500,
            };
            Ok(User::new(name.clone(), points))
        });
        let policy = Arc::new(immediate_call_policy());
        let users: Arc<dyn UserDirectory> = Arc::new(self.users);
        let ledger = Arc::new(ScoringLedger::new(
            Arc::clone(&users),
            Arc::new(self.points),
            Arc::clone(&policy),
        ));
        let badges = Arc::new(BadgeEvaluator::new(Arc::new(self.badges), Arc::clone(&policy)));
        VoteService::new(Arc::new(self.votes), users, ledger, badges, policy)
    }
}

#[fixture]
fn harness() -> Harness {
    let mut badges = MockBadgeGateway::new();
    badges
        .expect_list_badges()
        .returning(|_| Ok(BadgeKind::ALL.to_vec()));
    Harness {
        votes: MockVoteGateway::new(),
        users: MockUserDirectory::new(),
        points: MockPointsGateway::new(),
        badges,
        voter_points: 500,
    }
}

#[rstest]
#[tokio::test]
async fn fourteen_points_cannot_upvote_and_nothing_is_submitted(harness: Harness) {
    let service = harness.with_voter(14).build();
    let error = service
        .cast_vote(Some(&voter(14)), &request(VoteDirection::Up, VoteCounts::new(5, 1)))
        .await
        .expect_err("level 1 cannot upvote");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn anonymous_votes_are_rejected(harness: Harness) {
    let error = harness
        .build()
        .cast_vote(None, &request(VoteDirection::Up, VoteCounts::default()))
        .await
        .expect_err("no user");
    assert_eq!(error.code(), ErrorCode::Unauthenticated);
}

#[rstest]
#[tokio::test]
async fn creators_cannot_vote_on_their_own_content(harness: Harness) {
    let asker = User::new(username("asker"), 5_000);
    let error = harness
        .build()
        .cast_vote(Some(&asker), &request(VoteDirection::Up, VoteCounts::default()))
        .await
        .expect_err("self vote");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn fifteen_point_upvote_credits_the_creator(mut harness: Harness) {
    harness
        .votes
        .expect_get_vote()
        .returning(|_, _| Err(CollaboratorError::not_found("no vote")));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::increment(VoteDirection::Up)))
        .times(1)
        .returning(|_, _, _| Ok(()));
    harness
        .points
        .expect_adjust_points()
        .withf(adjusts("asker", 5))
        .times(1)
        .returning(|_, _| Ok(()));

    let receipt = harness
        .with_voter(15)
        .build()
        .cast_vote(Some(&voter(15)), &request(VoteDirection::Up, VoteCounts::new(5, 1)))
        .await
        .expect("vote commits");

    assert_eq!(receipt.state, VoteState::Upvoted);
    assert_eq!(receipt.counts, VoteCounts::new(6, 1));
    assert_eq!(receipt.creator_points, Some(105));
    assert_eq!(receipt.voter_points, None);
}

#[rstest]
#[tokio::test]
async fn upvoting_twice_toggles_back(mut harness: Harness) {
    let mut reads = Sequence::new();
    harness
        .votes
        .expect_get_vote()
        .times(1)
        .in_sequence(&mut reads)
        .returning(|_, _| Ok(VoteState::None));
    harness
        .votes
        .expect_get_vote()
        .times(1)
        .in_sequence(&mut reads)
        .returning(|_, _| Ok(VoteState::Upvoted));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::increment(VoteDirection::Up)))
        .times(1)
        .returning(|_, _, _| Ok(()));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::decrement(VoteDirection::Up)))
        .times(1)
        .returning(|_, _, _| Ok(()));
    harness
        .points
        .expect_adjust_points()
        .withf(adjusts("asker", 5))
        .times(1)
        .returning(|_, _| Ok(()));
    harness
        .points
        .expect_adjust_points()
        .withf(adjusts("asker", -5))
        .times(1)
        .returning(|_, _| Ok(()));

    let service = harness.with_voter(15).build();
    let start = VoteCounts::new(5, 1);
    let first = service
        .cast_vote(Some(&voter(15)), &request(VoteDirection::Up, start))
        .await
        .expect("first upvote");
    let second = service
        .cast_vote(Some(&voter(15)), &request(VoteDirection::Up, first.counts))
        .await
        .expect("second upvote toggles");

    assert_eq!(second.state, VoteState::None);
    assert_eq!(second.counts, start);
}

#[rstest]
#[tokio::test]
async fn switching_retracts_first_and_refunds_the_penalty(mut harness: Harness) {
    harness
        .votes
        .expect_get_vote()
        .returning(|_, _| Ok(VoteState::Downvoted));
    let mut steps = Sequence::new();
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::decrement(VoteDirection::Down)))
        .times(1)
        .in_sequence(&mut steps)
        .returning(|_, _, _| Ok(()));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::increment(VoteDirection::Up)))
        .times(1)
        .in_sequence(&mut steps)
        .returning(|_, _, _| Ok(()));
    for (name, delta) in [("asker", 1), ("voter", 1), ("asker", 5)] {
        harness
            .points
            .expect_adjust_points()
            .withf(adjusts(name, delta))
            .times(1)
            .returning(|_, _| Ok(()));
    }

    let receipt = harness
        .build()
        .cast_vote(Some(&voter(500)), &request(VoteDirection::Up, VoteCounts::new(3, 3)))
        .await
        .expect("switch commits");

    assert_eq!(receipt.state, VoteState::Upvoted);
    assert_eq!(receipt.counts, VoteCounts::new(4, 2));
    assert_eq!(receipt.creator_points, Some(106));
    assert_eq!(receipt.voter_points, Some(501));
}

#[rstest]
#[tokio::test]
async fn failed_apply_step_restores_the_retracted_vote(mut harness: Harness) {
    harness
        .votes
        .expect_get_vote()
        .returning(|_, _| Ok(VoteState::Downvoted));
    let mut steps = Sequence::new();
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::decrement(VoteDirection::Down)))
        .times(1)
        .in_sequence(&mut steps)
        .returning(|_, _, _| Ok(()));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::increment(VoteDirection::Up)))
        .times(1)
        .in_sequence(&mut steps)
        .returning(|_, _, _| Err(CollaboratorError::rejected("vote refused")));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::increment(VoteDirection::Down)))
        .times(1)
        .in_sequence(&mut steps)
        .returning(|_, _, _| Ok(()));
    harness.points.expect_adjust_points().times(0);

    let error = harness
        .build()
        .cast_vote(Some(&voter(500)), &request(VoteDirection::Up, VoteCounts::new(3, 3)))
        .await
        .expect_err("apply step rejected");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn ledger_failure_rolls_the_vote_back(mut harness: Harness) {
    harness
        .votes
        .expect_get_vote()
        .returning(|_, _| Ok(VoteState::None));
    let mut steps = Sequence::new();
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::increment(VoteDirection::Up)))
        .times(1)
        .in_sequence(&mut steps)
        .returning(|_, _, _| Ok(()));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::decrement(VoteDirection::Up)))
        .times(1)
        .in_sequence(&mut steps)
        .returning(|_, _, _| Ok(()));
    harness
        .points
        .expect_adjust_points()
        .returning(|_, _| Err(CollaboratorError::timeout("points slow")));

    let error = harness
        .with_voter(15)
        .build()
        .cast_vote(Some(&voter(15)), &request(VoteDirection::Up, VoteCounts::new(5, 1)))
        .await
        .expect_err("ledger failed");

    assert_eq!(error.code(), ErrorCode::Transient);
}

#[rstest]
#[tokio::test]
async fn failed_rollback_is_internal(mut harness: Harness) {
    harness
        .votes
        .expect_get_vote()
        .returning(|_, _| Ok(VoteState::None));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::increment(VoteDirection::Up)))
        .times(1)
        .returning(|_, _, _| Ok(()));
    harness
        .votes
        .expect_submit_vote()
        .withf(is_command(VoteCommand::decrement(VoteDirection::Up)))
        .times(1)
        .returning(|_, _, _| Err(CollaboratorError::server("555")));
    harness
        .points
        .expect_adjust_points()
        .returning(|_, _| Err(CollaboratorError::rejected("refused")));

    let error = harness
        .with_voter(15)
        .build()
        .cast_vote(Some(&voter(15)), &request(VoteDirection::Up, VoteCounts::new(5, 1)))
        .await
        .expect_err("rollback failed");

    assert_eq!(error.code(), ErrorCode::Internal);
}

#[rstest]
#[tokio::test]
async fn comment_votes_move_no_points(mut harness: Harness) {
    let target = VoteTarget::Comment {
        question_id: QuestionId::new("q1").expect("valid id"),
        parent: CommentParent::Question,
        comment_id: CommentId::new("c1").expect("valid id"),
        creator: username("commenter"),
    };
    harness
        .votes
        .expect_get_vote()
        .returning(|_, _| Ok(VoteState::None));
    harness
        .votes
        .expect_submit_vote()
        .times(1)
        .returning(|_, _, _| Ok(()));
    harness.points.expect_adjust_points().times(0);

    let receipt = harness
        .with_voter(15)
        .build()
        .cast_vote(
            Some(&voter(15)),
            &VoteRequest {
                target,
                direction: VoteDirection::Up,
                counts: VoteCounts::new(0, 0),
            },
        )
        .await
        .expect("comment vote commits");

    assert_eq!(receipt.counts, VoteCounts::new(1, 0));
    assert_eq!(receipt.creator_points, None);
}

#[rstest]
#[tokio::test]
async fn undo_without_a_vote_is_a_noop(mut harness: Harness) {
    harness
        .votes
        .expect_get_vote()
        .returning(|_, _| Err(CollaboratorError::not_found("no vote")));
    harness.votes.expect_submit_vote().times(0);

    let receipt = harness
        .with_voter(1)
        .build()
        .undo_vote(Some(&voter(1)), &question(), VoteCounts::new(2, 2))
        .await
        .expect("nothing to undo");

    assert_eq!(receipt.state, VoteState::None);
    assert_eq!(receipt.counts, VoteCounts::new(2, 2));
}

#[rstest]
#[tokio::test]
async fn undoing_a_downvote_needs_downvote_level(mut harness: Harness) {
    harness
        .votes
        .expect_get_vote()
        .returning(|_, _| Ok(VoteState::Downvoted));
    harness.votes.expect_submit_vote().times(0);

    let error = harness
        .with_voter(20)
        .build()
        .undo_vote(Some(&voter(20)), &question(), VoteCounts::new(2, 2))
        .await
        .expect_err("level 2 cannot retract a downvote");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn duplicate_in_flight_votes_conflict(harness: Harness) {
    let service = harness.build();
    let voter = voter(500);
    let _outstanding = service.claim(&voter, &question()).expect("first claim");

    let error = service
        .cast_vote(Some(&voter), &request(VoteDirection::Up, VoteCounts::default()))
        .await
        .expect_err("duplicate request");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn rate_limited_vote_seen_as_applied_is_not_resent(mut harness: Harness) {
    let mut reads = Sequence::new();
    harness
        .votes
        .expect_get_vote()
        .times(1)
        .in_sequence(&mut reads)
        .returning(|_, _| Ok(VoteState::None));
    harness
        .votes
        .expect_get_vote()
        .times(1)
        .in_sequence(&mut reads)
        .returning(|_, _| Ok(VoteState::Upvoted));
    harness
        .votes
        .expect_submit_vote()
        .times(1)
        .returning(|_, _, _| Err(CollaboratorError::rate_limited("429")));
    harness
        .points
        .expect_adjust_points()
        .withf(adjusts("asker", 5))
        .times(1)
        .returning(|_, _| Ok(()));

    let receipt = harness
        .with_voter(15)
        .build()
        .cast_vote(Some(&voter(15)), &request(VoteDirection::Up, VoteCounts::new(5, 1)))
        .await
        .expect("reconciled");

    assert_eq!(receipt.state, VoteState::Upvoted);
    assert_eq!(receipt.counts, VoteCounts::new(6, 1));
}

#[rstest]
#[tokio::test]
async fn stale_session_points_do_not_unlock_downvotes(mut harness: Harness) {
    harness.votes.expect_get_vote().times(0);
    harness.votes.expect_submit_vote().times(0);
    harness.points.expect_adjust_points().times(0);

    let error = harness
        .with_voter(75)
        .build()
        .cast_vote(Some(&voter(175)), &request(VoteDirection::Down, VoteCounts::new(5, 1)))
        .await
        .expect_err("directory says level 3");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
}
