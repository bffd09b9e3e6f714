//! Why an episode ended.

use std::fmt;

/// The typed reason carried by every episode-end event.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EpisodeEndReason {
    /// The task was accomplished.
    Success,
    /// The task was failed (agent caught, fell off, …).
    Failure,
    /// The configured step budget ran out.
    MaxStepsReached,
    /// The configured wall/sim time budget ran out.
    TimeLimit,
    /// The agent left the permitted area.
    BoundaryViolation,
    /// An operator or the trainer forced a reset.
    ManualReset,
    /// Something went wrong; the episode was abandoned.
    Error,
}

impl EpisodeEndReason {
    /// `true` when the episode was cut short rather than reaching a terminal
    /// state.  Trainers bootstrap the value of interrupted episodes instead of
    /// treating the last step as terminal.
    pub fn is_interruption(self) -> bool {
        matches!(
            self,
            EpisodeEndReason::MaxStepsReached
                | EpisodeEndReason::TimeLimit
                | EpisodeEndReason::ManualReset
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EpisodeEndReason::Success           => "success",
            EpisodeEndReason::Failure           => "failure",
            EpisodeEndReason::MaxStepsReached   => "max_steps_reached",
            EpisodeEndReason::TimeLimit         => "time_limit",
            EpisodeEndReason::BoundaryViolation => "boundary_violation",
            EpisodeEndReason::ManualReset       => "manual_reset",
            EpisodeEndReason::Error             => "error",
        }
    }
}

impl fmt::Display for EpisodeEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
