//! Simulation time model.
//!
//! # Design
//!
//! The host engine drives the agent from its fixed-step callback and hands in
//! the step's `delta_time`.  `StepClock` accumulates both an integer step
//! counter and elapsed simulated seconds:
//!
//!   elapsed_secs = Σ delta_time over all advanced steps
//!
//! Elapsed time is accumulated in `f64` so long runs do not drift the way an
//! `f32` sum would.  Wall-clock time is never consulted; two runs fed the same
//! deltas see identical timestamps.

use std::fmt;

// ── Step ──────────────────────────────────────────────────────────────────────

/// An absolute fixed-update counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    /// Return the step `n` after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Step {
        Step(self.0 + n)
    }

    /// Steps elapsed from `earlier` to `self` (saturating).
    #[inline]
    pub fn since(self, earlier: Step) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Step {
    type Output = Step;
    #[inline]
    fn add(self, rhs: u64) -> Step {
        Step(self.0 + rhs)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── StepClock ─────────────────────────────────────────────────────────────────

/// Tracks the global step counter and accumulated simulated seconds.
///
/// `StepClock` is cheap to copy and holds no heap data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepClock {
    /// The current step — advanced by [`StepClock::advance`] each fixed update.
    pub current_step: Step,
    /// Simulated seconds since the clock was created.
    pub elapsed_secs: f64,
    /// The delta of the most recent advance.
    pub last_delta_secs: f32,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one step of `delta_secs` simulated seconds.
    ///
    /// Negative or non-finite deltas are treated as zero so a misbehaving
    /// host cannot move time backwards.
    #[inline]
    pub fn advance(&mut self, delta_secs: f32) {
        let dt = if delta_secs.is_finite() && delta_secs > 0.0 { delta_secs } else { 0.0 };
        self.current_step = self.current_step + 1;
        self.elapsed_secs += dt as f64;
        self.last_delta_secs = dt;
    }

    /// Seconds elapsed since `earlier_secs` (a previous `elapsed_secs` reading).
    #[inline]
    pub fn secs_since(&self, earlier_secs: f64) -> f64 {
        (self.elapsed_secs - earlier_secs).max(0.0)
    }
}

impl fmt::Display for StepClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3}s)", self.current_step, self.elapsed_secs)
    }
}
