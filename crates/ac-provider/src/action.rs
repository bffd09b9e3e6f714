//! Action buffers, per-receiver segments, and the `ActionReceiver` trait.

use ac_context::AgentContext;
use ac_core::ActionSpec;

use crate::{Provider, ProviderResult};

// ── ActionBuffers ─────────────────────────────────────────────────────────────

/// The flat action vector produced by a decision and consumed by receivers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionBuffers {
    pub continuous: Vec<f32>,
    pub discrete:   Vec<i32>,
}

impl ActionBuffers {
    /// Zeroed buffers sized for `spec`.
    pub fn for_spec(spec: &ActionSpec) -> Self {
        Self::zeroed(spec.continuous_actions, spec.discrete_actions())
    }

    pub fn zeroed(continuous: usize, discrete: usize) -> Self {
        Self {
            continuous: vec![0.0; continuous],
            discrete:   vec![0; discrete],
        }
    }

    /// Set every slot to zero / no-op without changing lengths.
    pub fn clear(&mut self) {
        self.continuous.fill(0.0);
        self.discrete.fill(0);
    }

    pub fn is_zero(&self) -> bool {
        self.continuous.iter().all(|&v| v == 0.0) && self.discrete.iter().all(|&v| v == 0)
    }

    pub fn is_empty(&self) -> bool {
        self.continuous.is_empty() && self.discrete.is_empty()
    }

    /// Copy `other` into `self` slot by slot, up to the shorter length of each
    /// buffer.
    pub fn copy_from(&mut self, other: &ActionBuffers) {
        let n = self.continuous.len().min(other.continuous.len());
        self.continuous[..n].copy_from_slice(&other.continuous[..n]);
        let m = self.discrete.len().min(other.discrete.len());
        self.discrete[..m].copy_from_slice(&other.discrete[..m]);
    }
}

// ── Segments ──────────────────────────────────────────────────────────────────

/// One receiver's read-only view into [`ActionBuffers`].
///
/// `continuous_start`/`discrete_start` are the offsets of this segment within
/// the full buffers (the running start index during distribution).
#[derive(Debug, Clone, Copy)]
pub struct ActionSegment<'a> {
    pub continuous:       &'a [f32],
    pub discrete:         &'a [i32],
    pub continuous_start: usize,
    pub discrete_start:   usize,
}

/// One receiver's writable view into [`ActionBuffers`], used for heuristics.
#[derive(Debug)]
pub struct ActionSegmentMut<'a> {
    pub continuous:       &'a mut [f32],
    pub discrete:         &'a mut [i32],
    pub continuous_start: usize,
    pub discrete_start:   usize,
}

// ── ActionReceiver ────────────────────────────────────────────────────────────

/// Consumes a contiguous slice of the action buffers.
///
/// The distributor assigns segments in dispatch order, each sized by the
/// receiver's declared counts.
pub trait ActionReceiver: Provider {
    fn continuous_action_count(&self) -> usize {
        0
    }

    /// One entry per discrete branch, giving that branch's size.
    fn discrete_branch_sizes(&self) -> &[usize] {
        &[]
    }

    fn receive_actions(
        &mut self,
        ctx:     &mut AgentContext,
        actions: ActionSegment<'_>,
    ) -> ProviderResult<()>;

    /// Fill the segment with hand-written control values (keyboard, script).
    /// Default leaves the segment as zeros.
    fn heuristic(&mut self, _ctx: &AgentContext, _out: ActionSegmentMut<'_>) -> ProviderResult<()> {
        Ok(())
    }
}
