//! Vote state machine coverage.

use super::*;
use rstest::rstest;

#[rstest]
#[case(VoteState::None, VoteDirection::Up, VoteState::Upvoted, VoteCounts::new(6, 1))]
#[case(VoteState::None, VoteDirection::Down, VoteState::Downvoted, VoteCounts::new(5, 2))]
#[case(VoteState::Upvoted, VoteDirection::Up, VoteState::None, VoteCounts::new(4, 1))]
#[case(VoteState::Downvoted, VoteDirection::Down, VoteState::None, VoteCounts::new(5, 0))]
#[case(VoteState::Downvoted, VoteDirection::Up, VoteState::Upvoted, VoteCounts::new(6, 0))]
#[case(VoteState::Upvoted, VoteDirection::Down, VoteState::Downvoted, VoteCounts::new(4, 2))]
fn transitions_from_five_and_one(
    #[case] current: VoteState,
    #[case] requested: VoteDirection,
    #[case] expected_state: VoteState,
    #[case] expected_counts: VoteCounts,
) {
    let plan = plan_vote(current, requested);
    assert_eq!(plan.to(), expected_state);
    assert_eq!(plan.apply_to(VoteCounts::new(5, 1)), expected_counts);
}

#[rstest]
fn upvoting_twice_returns_to_the_original_counts() {
    let start = VoteCounts::new(5, 1);
    let first = plan_vote(VoteState::None, VoteDirection::Up);
    let second = plan_vote(first.to(), VoteDirection::Up);

    assert_eq!(second.to(), VoteState::None);
    assert_eq!(second.apply_to(first.apply_to(start)), start);
}

#[rstest]
fn switching_retracts_before_applying() {
    let plan = plan_vote(VoteState::Downvoted, VoteDirection::Up);
    let commands = plan
        .steps()
        .iter()
        .map(|step| step.command)
        .collect::<Vec<_>>();

    assert_eq!(
        commands,
        vec![
            VoteCommand::decrement(VoteDirection::Down),
            VoteCommand::increment(VoteDirection::Up),
        ]
    );
    assert_eq!(plan.steps()[0].to, VoteState::None);
    assert_eq!(plan.steps()[1].from, VoteState::None);
}

#[rstest]
fn switching_moves_each_count_by_one() {
    let before = VoteCounts::new(3, 3);
    let after = plan_vote(VoteState::Downvoted, VoteDirection::Up).apply_to(before);
    assert_eq!(after.upvotes, before.upvotes + 1);
    assert_eq!(after.downvotes, before.downvotes - 1);
}

#[rstest]
fn retraction_of_nothing_is_a_noop() {
    let plan = plan_retraction(VoteState::None);
    assert!(plan.is_noop());
    assert_eq!(plan.apply_to(VoteCounts::new(2, 2)), VoteCounts::new(2, 2));
}

#[rstest]
fn inverse_commands_cancel_out() {
    let counts = VoteCounts::new(4, 4);
    for direction in [VoteDirection::Up, VoteDirection::Down] {
        for command in [
            VoteCommand::increment(direction),
            VoteCommand::decrement(direction),
        ] {
            assert_eq!(counts.apply(command).apply(command.inverse()), counts);
        }
    }
}

#[rstest]
fn stale_projection_never_goes_negative() {
    let counts = VoteCounts::new(0, 0).apply(VoteCommand::decrement(VoteDirection::Up));
    assert_eq!(counts, VoteCounts::new(0, 0));
}

#[rstest]
fn net_score_is_signed() {
    assert_eq!(VoteCounts::new(1, 4).net(), -3);
}
