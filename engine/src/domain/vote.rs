//! Per-voter vote state machine.
//!
//! A voter holds at most one active vote per item. Requesting the active
//! direction toggles it off; requesting the opposite direction retracts the
//! old vote before applying the new one. Plans are pure: the vote service
//! executes the steps in order and only then reflects them in counts.

use serde::{Deserialize, Serialize};

use super::level::Action;

/// Requested vote direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    /// Upvote.
    Up,
    /// Downvote.
    Down,
}

impl VoteDirection {
    /// Level-gated action guarding this direction.
    pub const fn action(self) -> Action {
        match self {
            Self::Up => Action::Upvote,
            Self::Down => Action::Downvote,
        }
    }

    /// The other direction.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// Tri-state vote of one user on one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    /// No active vote.
    #[default]
    None,
    /// Active upvote.
    Upvoted,
    /// Active downvote.
    Downvoted,
}

impl VoteState {
    /// Direction of the active vote, if any.
    pub const fn direction(self) -> Option<VoteDirection> {
        match self {
            Self::None => None,
            Self::Upvoted => Some(VoteDirection::Up),
            Self::Downvoted => Some(VoteDirection::Down),
        }
    }

    /// State holding an active vote in `direction`.
    pub const fn from_direction(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => Self::Upvoted,
            VoteDirection::Down => Self::Downvoted,
        }
    }
}

/// Count adjustment sent to the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOperation {
    /// Add one to the count.
    Increment,
    /// Remove one from the count.
    Decrement,
}

/// One count adjustment on one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCommand {
    /// Increment or decrement.
    pub operation: VoteOperation,
    /// Which count to adjust.
    pub direction: VoteDirection,
}

impl VoteCommand {
    /// Add a vote in `direction`.
    pub const fn increment(direction: VoteDirection) -> Self {
        Self {
            operation: VoteOperation::Increment,
            direction,
        }
    }

    /// Remove a vote in `direction`.
    pub const fn decrement(direction: VoteDirection) -> Self {
        Self {
            operation: VoteOperation::Decrement,
            direction,
        }
    }

    /// Command undoing this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self.operation {
            VoteOperation::Increment => Self::decrement(self.direction),
            VoteOperation::Decrement => Self::increment(self.direction),
        }
    }
}

/// Upvote and downvote counts of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    /// Upvotes.
    pub upvotes: u32,
    /// Downvotes.
    pub downvotes: u32,
}

impl VoteCounts {
    /// Build counts.
    pub const fn new(upvotes: u32, downvotes: u32) -> Self {
        Self { upvotes, downvotes }
    }

    /// `upvotes - downvotes`.
    pub fn net(self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    /// Counts after a confirmed command. Counts never drop below zero; a
    /// stale projection saturates instead.
    #[must_use]
    pub fn apply(self, command: VoteCommand) -> Self {
        let adjust = |count: u32| match command.operation {
            VoteOperation::Increment => count.saturating_add(1),
            VoteOperation::Decrement => count.saturating_sub(1),
        };
        match command.direction {
            VoteDirection::Up => Self::new(adjust(self.upvotes), self.downvotes),
            VoteDirection::Down => Self::new(self.upvotes, adjust(self.downvotes)),
        }
    }
}

/// One command together with the vote states around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteStep {
    /// Command to submit.
    pub command: VoteCommand,
    /// Voter's state before the command.
    pub from: VoteState,
    /// Voter's state once the command is confirmed.
    pub to: VoteState,
}

/// Ordered plan moving a voter from one state to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTransition {
    from: VoteState,
    to: VoteState,
    steps: Vec<VoteStep>,
}

impl VoteTransition {
    /// State before the plan.
    pub const fn from(&self) -> VoteState {
        self.from
    }

    /// State after the plan.
    pub const fn to(&self) -> VoteState {
        self.to
    }

    /// Steps in submission order.
    pub fn steps(&self) -> &[VoteStep] {
        &self.steps
    }

    /// Whether the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }

    /// Counts after every step is confirmed.
    #[must_use]
    pub fn apply_to(&self, counts: VoteCounts) -> VoteCounts {
        self.steps
            .iter()
            .fold(counts, |acc, step| acc.apply(step.command))
    }
}

/// Plan the transition for a requested vote.
///
/// # Examples
/// ```
/// use reputation_engine::domain::vote::{plan_vote, VoteDirection, VoteState};
///
/// let plan = plan_vote(VoteState::Downvoted, VoteDirection::Up);
/// assert_eq!(plan.steps().len(), 2);
/// assert_eq!(plan.to(), VoteState::Upvoted);
/// ```
pub fn plan_vote(current: VoteState, requested: VoteDirection) -> VoteTransition {
    match current.direction() {
        None => {
            let to = VoteState::from_direction(requested);
            VoteTransition {
                from: current,
                to,
                steps: vec![VoteStep {
                    command: VoteCommand::increment(requested),
                    from: current,
                    to,
                }],
            }
        }
        Some(active) if active == requested => plan_retraction(current),
        Some(active) => {
            let to = VoteState::from_direction(requested);
            VoteTransition {
                from: current,
                to,
                steps: vec![
                    VoteStep {
                        command: VoteCommand::decrement(active),
                        from: current,
                        to: VoteState::None,
                    },
                    VoteStep {
                        command: VoteCommand::increment(requested),
                        from: VoteState::None,
                        to,
                    },
                ],
            }
        }
    }
}

/// Plan the retraction of whatever vote is active.
pub fn plan_retraction(current: VoteState) -> VoteTransition {
    let steps = current
        .direction()
        .map(|active| VoteStep {
            command: VoteCommand::decrement(active),
            from: current,
            to: VoteState::None,
        })
        .into_iter()
        .collect();
    VoteTransition {
        from: current,
        to: VoteState::None,
        steps,
    }
}

#[cfg(test)]
mod tests;
