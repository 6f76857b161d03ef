/// Run state definitions for the merge orchestrator
///
/// A run moves `Idle -> Running -> {Finalizing, Empty} -> Done`. `Empty` and
/// `Done` are both normal completions.
use std::fmt;

/// Represents the current state of a merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// No batch received yet
    Idle,

    /// Fetching and appending items in batch order
    Running,

    /// At least one item was appended; the output is being written
    Finalizing,

    /// Nothing was appended; no output is written
    Empty,

    /// Output written and resources released
    Done,
}

impl RunState {
    /// Returns true if the run has completed (with or without output)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Empty | Self::Done)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Finalizing)
                | (Self::Running, Self::Empty)
                | (Self::Finalizing, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Finalizing => "finalizing",
            Self::Empty => "empty",
            Self::Done => "done",
        }
    }

    /// Returns all possible run states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Running,
            Self::Finalizing,
            Self::Empty,
            Self::Done,
        ]
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
