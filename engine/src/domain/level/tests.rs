//! Level policy coverage.

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ids::Username;
use rstest::{fixture, rstest};

fn user_with(points: i64) -> User {
    User::new(Username::new("alice").expect("valid username"), points)
}

#[fixture]
fn boundary_user() -> User {
    user_with(15)
}

#[rstest]
#[case(i64::MIN, 1)]
#[case(-5, 1)]
#[case(0, 1)]
#[case(1, 1)]
#[case(14, 1)]
#[case(15, 2)]
#[case(49, 2)]
#[case(50, 3)]
#[case(124, 3)]
#[case(125, 4)]
#[case(999, 4)]
#[case(1_000, 5)]
#[case(2_000, 5)]
#[case(2_999, 5)]
#[case(3_000, 6)]
#[case(9_999, 6)]
#[case(10_000, 7)]
#[case(i64::MAX, 7)]
fn level_of_points_matches_table(#[case] points: i64, #[case] expected: u8) {
    assert_eq!(Level::from_points(points).get(), expected);
}

#[rstest]
fn level_is_monotonic_in_points() {
    let mut previous = Level::from_points(-100);
    for points in (-100..=12_000).step_by(7) {
        let level = Level::from_points(points);
        assert!(level >= previous, "level dropped at {points} points");
        assert_eq!(level, Level::from_points(points));
        previous = level;
    }
}

#[rstest]
fn level_rejects_out_of_range_values() {
    assert_eq!(Level::new(0), Err(LevelOutOfRange(0)));
    assert_eq!(Level::new(8), Err(LevelOutOfRange(8)));
    assert_eq!(Level::new(7), Ok(Level::MAX));
}

#[rstest]
#[case(Action::CreateAnswer, 1)]
#[case(Action::Upvote, 2)]
#[case(Action::Comment, 3)]
#[case(Action::Downvote, 4)]
#[case(Action::ViewVoteCounts, 5)]
#[case(Action::ProtectQuestion, 6)]
#[case(Action::CloseOrReopenQuestion, 7)]
#[case(Action::VoteOnEdit, 7)]
fn action_thresholds(#[case] action: Action, #[case] level: u8) {
    assert_eq!(action.required_level().get(), level);
}

#[rstest]
fn authorize_fails_closed_without_user() {
    assert_eq!(
        authorize(None, Action::CreateAnswer),
        Authorization::Denied(Denial::Unauthenticated)
    );
}

#[rstest]
fn fourteen_points_cannot_upvote() {
    let user = user_with(14);
    let decision = authorize(Some(&user), Action::Upvote);

    let Authorization::Denied(denial) = decision else {
        panic!("expected denial, got {decision:?}");
    };
    assert_eq!(denial.message(), "You need Level 2 (15 points) to upvote");

    let error = decision.into_result().expect_err("denied");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[rstest]
fn fifteen_points_can_upvote_but_not_downvote(boundary_user: User) {
    assert!(authorize(Some(&boundary_user), Action::Upvote).is_allowed());
    assert!(!authorize(Some(&boundary_user), Action::Downvote).is_allowed());
}

#[rstest]
fn require_returns_the_user(boundary_user: User) {
    let user = require(Some(&boundary_user), Action::Upvote).expect("allowed");
    assert_eq!(user.points(), 15);

    let error = require(None, Action::Upvote).expect_err("no user");
    assert_eq!(error.code(), ErrorCode::Unauthenticated);
}

#[rstest]
fn privileges_grow_with_level() {
    assert_eq!(privileges(Level::MIN), vec![Action::CreateAnswer]);
    assert_eq!(privileges(Level::MAX).len(), Action::ALL.len());
    let level_four = Level::new(4).expect("valid level");
    assert!(privileges(level_four).contains(&Action::Downvote));
    assert!(!privileges(level_four).contains(&Action::ViewVoteCounts));
}

#[rstest]
fn next_threshold_reports_remaining_points() {
    let next = next_threshold(40).expect("level 2 has a successor");
    assert_eq!(next.level.get(), 3);
    assert_eq!(next.points_required, 50);
    assert_eq!(next.points_remaining, 10);
    assert!(next_threshold(10_000).is_none());
}
