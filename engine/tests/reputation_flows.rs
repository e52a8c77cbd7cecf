//! End-to-end reputation flows driven through the facade over the demo store.

use std::sync::Arc;

use async_trait::async_trait;
use reputation_engine::domain::ports::{BountyGateway, CollaboratorError};
use reputation_engine::domain::{
    AnswerId, AnswerSnapshot, BadgeKind, Bounty, BountyAmount, BountyState, CredentialProof,
    ErrorCode, PostRef, QuestionId, QuestionSnapshot, QuestionStatus, StatusVote, User, Username,
    VoteCounts, VoteDirection, VoteRequest, VoteState, VoteTarget,
};
use reputation_engine::outbound::memory::{DEMO_PROOF, InMemoryQaStore, MemoryOperation};
use reputation_engine::test_support::immediate_call_policy;
use reputation_engine::{EnginePorts, ReputationEngine};
use rstest::{fixture, rstest};

struct World {
    store: Arc<InMemoryQaStore>,
    engine: ReputationEngine,
}

impl World {
    async fn login(&self, name: &str) -> User {
        self.engine
            .login(&username(name), &CredentialProof::new(DEMO_PROOF))
            .await
            .into_result()
            .expect("demo login succeeds")
            .user
    }

    fn points(&self, name: &str) -> i64 {
        self.store.points_of(&username(name)).expect("known user")
    }
}

#[fixture]
fn world() -> World {
    let store = Arc::new(InMemoryQaStore::demo());
    store.add_user(User::new(username("rich-asker"), 500), DEMO_PROOF);
    store.add_user(User::new(username("fresh-voter"), 15), DEMO_PROOF);
    let engine = ReputationEngine::new(EnginePorts::shared(store.clone()), immediate_call_policy());
    World { store, engine }
}

fn username(raw: &str) -> Username {
    Username::new(raw).expect("valid username")
}

fn question(id: &str, creator: &str) -> QuestionSnapshot {
    QuestionSnapshot::new(QuestionId::new(id).expect("valid id"), username(creator))
}

fn answer(question_id: &str, id: &str, creator: &str) -> AnswerSnapshot {
    AnswerSnapshot {
        question_id: QuestionId::new(question_id).expect("valid id"),
        id: AnswerId::new(id).expect("valid id"),
        creator: username(creator),
        counts: VoteCounts::default(),
        accepted: false,
    }
}

fn question_target(id: &str, creator: &str) -> VoteTarget {
    VoteTarget::Question {
        question_id: QuestionId::new(id).expect("valid id"),
        creator: username(creator),
    }
}

fn upvote(target: VoteTarget, counts: VoteCounts) -> VoteRequest {
    VoteRequest {
        target,
        direction: VoteDirection::Up,
        counts,
    }
}

#[rstest]
#[tokio::test]
async fn fifteen_point_upvote_credits_the_creator(world: World) {
    let voter = world.login("fresh-voter").await;
    let target = question_target("q1", "demo-asker");

    let receipt = world
        .engine
        .cast_vote(Some(&voter), &upvote(target.clone(), VoteCounts::new(5, 1)))
        .await
        .into_result()
        .expect("vote confirmed");

    assert_eq!(receipt.state, VoteState::Upvoted);
    assert_eq!(receipt.counts, VoteCounts::new(6, 1));
    assert_eq!(world.points("demo-asker"), 180);
    assert_eq!(world.store.counts_of(&target), VoteCounts::new(1, 0));
}

#[rstest]
#[tokio::test]
async fn fourteen_point_upvote_never_reaches_the_store(world: World) {
    let newcomer = world.login("demo-newcomer").await;
    let target = question_target("q1", "demo-asker");

    let outcome = world
        .engine
        .cast_vote(Some(&newcomer), &upvote(target.clone(), VoteCounts::new(5, 1)))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.map(|error| error.code()), Some(ErrorCode::Unauthorized));
    assert_eq!(world.store.counts_of(&target), VoteCounts::default());
    assert_eq!(world.points("demo-asker"), 175);
}

#[rstest]
#[tokio::test]
async fn upvoting_twice_restores_counts_and_points(world: World) {
    let voter = world.login("demo-voter").await;
    let target = question_target("q1", "demo-asker");
    let start = VoteCounts::new(5, 1);

    let first = world
        .engine
        .cast_vote(Some(&voter), &upvote(target.clone(), start))
        .await
        .into_result()
        .expect("first vote");
    let second = world
        .engine
        .cast_vote(Some(&voter), &upvote(target.clone(), first.counts))
        .await
        .into_result()
        .expect("toggle off");

    assert_eq!(second.state, VoteState::None);
    assert_eq!(second.counts, start);
    assert_eq!(world.points("demo-asker"), 175);
    assert_eq!(world.store.counts_of(&target), VoteCounts::default());
}

#[rstest]
#[tokio::test]
async fn switching_moves_each_count_by_one(world: World) {
    let voter = world.login("demo-voter").await;
    let target = question_target("q1", "demo-asker");

    let up = world
        .engine
        .cast_vote(Some(&voter), &upvote(target.clone(), VoteCounts::new(3, 3)))
        .await
        .into_result()
        .expect("upvote");
    let down = world
        .engine
        .cast_vote(
            Some(&voter),
            &VoteRequest {
                target: target.clone(),
                direction: VoteDirection::Down,
                counts: up.counts,
            },
        )
        .await
        .into_result()
        .expect("switch");

    assert_eq!(down.state, VoteState::Downvoted);
    assert_eq!(down.counts, VoteCounts::new(3, 4));
    assert_eq!(world.points("demo-asker"), 174);
    assert_eq!(world.points("demo-voter"), 149);
}

#[rstest]
#[tokio::test]
async fn failed_submit_leaves_counts_and_points_untouched(world: World) {
    let voter = world.login("demo-voter").await;
    let target = question_target("q1", "demo-asker");
    world
        .store
        .fail_next(MemoryOperation::SubmitVote, CollaboratorError::server("555"));

    let outcome = world
        .engine
        .cast_vote(Some(&voter), &upvote(target.clone(), VoteCounts::new(5, 1)))
        .await;

    assert_eq!(outcome.error.map(|error| error.code()), Some(ErrorCode::Transient));
    assert_eq!(world.store.counts_of(&target), VoteCounts::default());
    assert_eq!(world.points("demo-asker"), 175);
}

#[rstest]
#[tokio::test]
async fn rate_limited_submit_is_retried_after_rederiving(world: World) {
    let voter = world.login("demo-voter").await;
    let target = question_target("q1", "demo-asker");
    world.store.fail_next(
        MemoryOperation::SubmitVote,
        CollaboratorError::rate_limited("slow down"),
    );

    let receipt = world
        .engine
        .cast_vote(Some(&voter), &upvote(target.clone(), VoteCounts::new(0, 0)))
        .await
        .into_result()
        .expect("retried vote confirmed");

    assert_eq!(receipt.counts, VoteCounts::new(1, 0));
    assert_eq!(world.store.counts_of(&target), VoteCounts::new(1, 0));
}

#[rstest]
#[case::below_minimum(50)]
#[case::above_maximum(501)]
#[tokio::test]
async fn out_of_range_bounties_leave_points_unchanged(world: World, #[case] amount: u32) {
    let asker = world.login("demo-asker").await;

    let outcome = world
        .engine
        .create_bounty(Some(&asker), &question("q1", "demo-asker"), amount)
        .await;

    assert_eq!(outcome.error.map(|error| error.code()), Some(ErrorCode::InvalidRequest));
    assert_eq!(world.points("demo-asker"), 175);
}

#[rstest]
#[tokio::test]
async fn bounty_of_one_hundred_from_175_leaves_75(world: World) {
    let asker = world.login("demo-asker").await;

    let receipt = world
        .engine
        .create_bounty(Some(&asker), &question("q1", "demo-asker"), 100)
        .await
        .into_result()
        .expect("bounty escrowed");

    assert_eq!(receipt.poster_points, Some(75));
    assert_eq!(receipt.bounty.state, BountyState::Active);
    assert_eq!(world.points("demo-asker"), 75);
}

#[rstest]
#[tokio::test]
async fn failed_bounty_record_credits_the_escrow_back(world: World) {
    let asker = world.login("demo-asker").await;
    world.store.fail_next(
        MemoryOperation::CreateBounty,
        CollaboratorError::rejected("nope"),
    );

    let outcome = world
        .engine
        .create_bounty(Some(&asker), &question("q1", "demo-asker"), 100)
        .await;

    assert!(!outcome.success);
    assert_eq!(world.points("demo-asker"), 175);
    assert!(
        world
            .store
            .bounty_of(&QuestionId::new("q1").expect("valid id"))
            .is_none()
    );
}

#[rstest]
#[tokio::test]
async fn acceptance_then_bounty_award_credits_the_answerer(world: World) {
    let asker = world.login("rich-asker").await;
    let question = question("q7", "rich-asker");
    world
        .engine
        .create_bounty(Some(&asker), &question, 200)
        .await
        .into_result()
        .expect("bounty escrowed");

    let accepted = world
        .engine
        .accept_answer(Some(&asker), &question, &answer("q7", "a1", "demo-answerer"))
        .await
        .into_result()
        .expect("answer accepted");
    assert_eq!(accepted.answerer_points, Some(55));

    let awarded = world
        .engine
        .award_bounty(Some(&asker), &accepted.question, &accepted.answer)
        .await
        .into_result()
        .expect("bounty awarded");

    assert_eq!(awarded.awardee_points, Some(255));
    assert_eq!(awarded.bounty.awarded_to(), Some(&username("demo-answerer")));
    assert_eq!(world.points("rich-asker"), 300);
    assert!(world.store.is_accepted(&question.id, &accepted.answer.id));

    let again = world
        .engine
        .award_bounty(Some(&asker), &accepted.question, &accepted.answer)
        .await;
    assert_eq!(again.error.map(|error| error.code()), Some(ErrorCode::Conflict));
    assert_eq!(world.points("demo-answerer"), 255);
}

#[rstest]
#[tokio::test]
async fn scholar_is_awarded_at_most_once(world: World) {
    let asker = world.login("demo-asker").await;

    let first = world
        .engine
        .accept_answer(
            Some(&asker),
            &question("q1", "demo-asker"),
            &answer("q1", "a1", "demo-answerer"),
        )
        .await
        .into_result()
        .expect("first acceptance");
    let second = world
        .engine
        .accept_answer(
            Some(&asker),
            &question("q2", "demo-asker"),
            &answer("q2", "a2", "demo-voter"),
        )
        .await
        .into_result()
        .expect("second acceptance");

    let scholar_in = |badges: &[reputation_engine::domain::Badge]| {
        badges
            .iter()
            .filter(|badge| badge.kind == BadgeKind::Scholar)
            .count()
    };
    assert_eq!(scholar_in(&first.badges_awarded), 1);
    assert_eq!(scholar_in(&second.badges_awarded), 0);
    let held = world.store.badges_of(&username("demo-asker"));
    assert_eq!(held.iter().filter(|kind| **kind == BadgeKind::Scholar).count(), 1);
}

#[rstest]
#[tokio::test]
async fn protecting_a_question_awards_the_creator(world: World) {
    let moderator = world.login("demo-moderator").await;
    let question = question("q1", "demo-asker");

    let receipt = world
        .engine
        .vote_on_status(Some(&moderator), &question, StatusVote::Protect)
        .await
        .into_result()
        .expect("status vote");

    assert_eq!(receipt.question.status, QuestionStatus::Protected);
    assert_eq!(world.store.status_of(&question.id), QuestionStatus::Protected);
    assert!(
        world
            .store
            .badges_of(&username("demo-asker"))
            .contains(&BadgeKind::Protected)
    );
}

#[rstest]
#[tokio::test]
async fn edit_votes_are_opened_and_approved_by_level_seven(world: World) {
    let moderator = world.login("demo-moderator").await;
    let post = PostRef::Question {
        question_id: QuestionId::new("q1").expect("valid id"),
    };

    let opened = world
        .engine
        .trigger_edit_vote(
            Some(&moderator),
            &post,
            Some("Better title".to_owned()),
            "Clearer body".to_owned(),
        )
        .await
        .into_result()
        .expect("edit vote opened");
    world
        .engine
        .vote_on_edit(Some(&moderator), &post, &opened.edit_vote_id)
        .await
        .into_result()
        .expect("edit vote approved");

    assert_eq!(world.store.edit_vote_approvals(&opened.edit_vote_id), Some(1));
    assert_eq!(
        world
            .store
            .edit_proposal(&opened.edit_vote_id)
            .map(|proposal| proposal.body().to_owned()),
        Some("Clearer body".to_owned())
    );
}

#[rstest]
#[tokio::test]
async fn login_rejects_a_wrong_proof(world: World) {
    let outcome = world
        .engine
        .login(&username("demo-asker"), &CredentialProof::new("guess"))
        .await;

    assert_eq!(outcome.error.map(|error| error.code()), Some(ErrorCode::Unauthenticated));
    assert!(world.store.badges_of(&username("demo-asker")).is_empty());
}

#[rstest]
#[tokio::test]
async fn downvote_gate_uses_points_left_after_an_escrow(world: World) {
    let asker = world.login("demo-asker").await;
    world
        .engine
        .create_bounty(Some(&asker), &question("q1", "demo-asker"), 100)
        .await
        .into_result()
        .expect("bounty escrowed");
    assert_eq!(world.points("demo-asker"), 75);
    let target = question_target("q2", "demo-answerer");

    let outcome = world
        .engine
        .cast_vote(
            Some(&asker),
            &VoteRequest {
                target: target.clone(),
                direction: VoteDirection::Down,
                counts: VoteCounts::default(),
            },
        )
        .await;

    assert_eq!(outcome.error.map(|error| error.code()), Some(ErrorCode::Unauthorized));
    assert_eq!(world.store.counts_of(&target), VoteCounts::default());
    assert_eq!(world.points("demo-answerer"), 40);
}

#[rstest]
#[tokio::test]
async fn completing_a_profile_awards_nothing_else(world: World) {
    let newcomer = world.login("demo-newcomer").await;

    let awarded = world
        .engine
        .complete_profile(Some(&newcomer))
        .await
        .into_result()
        .expect("profile completed");

    assert_eq!(awarded.len(), 1);
    let held = world.store.badges_of(&username("demo-newcomer"));
    assert!(held.contains(&BadgeKind::ProfileComplete));
    assert!(
        held.iter()
            .all(|kind| matches!(kind, BadgeKind::ProfileComplete | BadgeKind::FirstLogin))
    );
}

/// Bounty records where another award lands just before ours.
struct RivalAward {
    store: Arc<InMemoryQaStore>,
    rival: Username,
}

#[async_trait]
impl BountyGateway for RivalAward {
    async fn get_bounty(
        &self,
        question_id: &QuestionId,
    ) -> Result<Option<Bounty>, CollaboratorError> {
        self.store.get_bounty(question_id).await
    }

    async fn create_bounty(
        &self,
        question_id: &QuestionId,
        poster: &Username,
        amount: BountyAmount,
    ) -> Result<Bounty, CollaboratorError> {
        self.store.create_bounty(question_id, poster, amount).await
    }

    async fn award_bounty(
        &self,
        question_id: &QuestionId,
        awardee: &Username,
    ) -> Result<Bounty, CollaboratorError> {
        self.store.award_bounty(question_id, &self.rival).await?;
        self.store.award_bounty(question_id, awardee).await
    }

    async fn refund_bounty(&self, question_id: &QuestionId) -> Result<Bounty, CollaboratorError> {
        self.store.refund_bounty(question_id).await
    }
}

#[rstest]
#[tokio::test]
async fn losing_an_award_race_refunds_nobody() {
    let store = Arc::new(InMemoryQaStore::demo());
    store.add_user(User::new(username("rich-asker"), 500), DEMO_PROOF);
    let mut ports = EnginePorts::shared(store.clone());
    ports.bounties = Arc::new(RivalAward {
        store: store.clone(),
        rival: username("demo-voter"),
    });
    let world = World {
        store,
        engine: ReputationEngine::new(ports, immediate_call_policy()),
    };
    let asker = world.login("rich-asker").await;
    let question = question("q7", "rich-asker");
    world
        .engine
        .create_bounty(Some(&asker), &question, 200)
        .await
        .into_result()
        .expect("bounty escrowed");
    let accepted = world
        .engine
        .accept_answer(Some(&asker), &question, &answer("q7", "a1", "demo-answerer"))
        .await
        .into_result()
        .expect("answer accepted");

    let outcome = world
        .engine
        .award_bounty(Some(&asker), &accepted.question, &accepted.answer)
        .await;

    assert_eq!(outcome.error.map(|error| error.code()), Some(ErrorCode::Conflict));
    assert_eq!(world.points("rich-asker"), 300);
    assert_eq!(world.points("demo-answerer"), 55);
    assert_eq!(
        world
            .store
            .bounty_of(&question.id)
            .and_then(|bounty| bounty.awarded_to().cloned()),
        Some(username("demo-voter"))
    );
}
