//! `ActionDistributor` — slices the flat action buffers into per-receiver
//! segments.
//!
//! Segments are laid out over every registered receiver in dispatch order,
//! sized by each receiver's declared continuous count and discrete branches.
//! Inactive receivers keep their segment; they are just not called.

use ac_context::AgentContext;
use ac_core::{ActionSpec, EpisodeEndReason, ProviderKind};
use ac_provider::{ActionBuffers, ActionReceiver, ActionSegment, ActionSegmentMut};
use tracing::warn;

use crate::{Registry, RegistryResult};

/// One receiver's position in the action buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSlot {
    pub name:             String,
    pub continuous_start: usize,
    pub continuous_len:   usize,
    pub discrete_start:   usize,
    pub discrete_len:     usize,
}

pub struct ActionDistributor {
    registry: Registry<dyn ActionReceiver>,
    /// Zero-padded copy used when incoming buffers are shorter than the layout.
    scratch:  ActionBuffers,
}

impl Default for ActionDistributor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionDistributor {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(ProviderKind::Action),
            scratch:  ActionBuffers::default(),
        }
    }

    pub fn registry(&self) -> &Registry<dyn ActionReceiver> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<dyn ActionReceiver> {
        &mut self.registry
    }

    pub fn register(
        &mut self,
        receiver: Box<dyn ActionReceiver>,
        ctx:      &mut AgentContext,
    ) -> RegistryResult<()> {
        self.registry.register(receiver, ctx)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn ActionReceiver>> {
        self.registry.unregister(name)
    }

    pub fn initialize(&mut self, ctx: &mut AgentContext) {
        self.registry.initialize(ctx);
    }

    // ── Layout ────────────────────────────────────────────────────────────

    pub fn layout(&self) -> Vec<ActionSlot> {
        let (mut c, mut d) = (0, 0);
        let mut slots = Vec::with_capacity(self.registry.len());
        for idx in 0..self.registry.len() {
            let (Some(name), Some(r)) = (self.registry.name_at(idx), self.registry.provider_at(idx))
            else {
                continue;
            };
            let slot = ActionSlot {
                name:             name.to_string(),
                continuous_start: c,
                continuous_len:   r.continuous_action_count(),
                discrete_start:   d,
                discrete_len:     r.discrete_branch_sizes().len(),
            };
            c += slot.continuous_len;
            d += slot.discrete_len;
            slots.push(slot);
        }
        slots
    }

    pub fn continuous_action_count(&self) -> usize {
        (0..self.registry.len())
            .filter_map(|i| self.registry.provider_at(i))
            .map(|r| r.continuous_action_count())
            .sum()
    }

    /// Branch sizes of every receiver, concatenated in layout order.
    pub fn discrete_branch_sizes(&self) -> Vec<usize> {
        (0..self.registry.len())
            .filter_map(|i| self.registry.provider_at(i))
            .flat_map(|r| r.discrete_branch_sizes().iter().copied())
            .collect()
    }

    /// The action space implied by the registered receivers.
    pub fn action_spec(&self) -> ActionSpec {
        ActionSpec {
            continuous_actions: self.continuous_action_count(),
            discrete_branches:  self.discrete_branch_sizes(),
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Hand each active receiver its segment of `actions`.  Buffers shorter
    /// than the layout are zero-padded; extra trailing values are ignored.
    ///
    /// Returns the number of receivers that accepted their segment.
    pub fn distribute(&mut self, ctx: &mut AgentContext, actions: &ActionBuffers) -> usize {
        let layout = self.layout();
        let (need_c, need_d) = layout
            .last()
            .map_or((0, 0), |s| (s.continuous_start + s.continuous_len, s.discrete_start + s.discrete_len));

        let short = actions.continuous.len() < need_c || actions.discrete.len() < need_d;
        if short {
            warn!(
                agent = %ctx.agent_id(),
                continuous = actions.continuous.len(),
                discrete = actions.discrete.len(),
                need_continuous = need_c,
                need_discrete = need_d,
                "action buffers shorter than receiver layout; zero-padding"
            );
            self.scratch = ActionBuffers::zeroed(need_c, need_d);
            self.scratch.copy_from(actions);
        }
        // Temporarily move the scratch out so `self.registry` stays borrowable.
        let scratch = std::mem::take(&mut self.scratch);
        let source = if short { &scratch } else { actions };

        let mut delivered = 0;
        for (idx, slot) in layout.iter().enumerate() {
            if !self.registry.is_dispatchable(idx) {
                continue;
            }
            let segment = ActionSegment {
                continuous:       &source.continuous[slot.continuous_start..slot.continuous_start + slot.continuous_len],
                discrete:         &source.discrete[slot.discrete_start..slot.discrete_start + slot.discrete_len],
                continuous_start: slot.continuous_start,
                discrete_start:   slot.discrete_start,
            };
            if self.registry.call(idx, "receive_actions", |r| r.receive_actions(ctx, segment)).is_some() {
                delivered += 1;
            }
        }

        self.scratch = scratch;
        delivered
    }

    /// Fill `out` with every active receiver's heuristic actions.  `out` is
    /// resized to the layout and zeroed first; a failing receiver leaves its
    /// segment zeroed.
    pub fn heuristic(&mut self, ctx: &AgentContext, out: &mut ActionBuffers) {
        let layout = self.layout();
        let (need_c, need_d) = layout
            .last()
            .map_or((0, 0), |s| (s.continuous_start + s.continuous_len, s.discrete_start + s.discrete_len));
        out.continuous.resize(need_c, 0.0);
        out.discrete.resize(need_d, 0);
        out.clear();

        for (idx, slot) in layout.iter().enumerate() {
            if !self.registry.is_dispatchable(idx) {
                continue;
            }
            let c_range = slot.continuous_start..slot.continuous_start + slot.continuous_len;
            let d_range = slot.discrete_start..slot.discrete_start + slot.discrete_len;
            let segment = ActionSegmentMut {
                continuous:       &mut out.continuous[c_range.clone()],
                discrete:         &mut out.discrete[d_range.clone()],
                continuous_start: slot.continuous_start,
                discrete_start:   slot.discrete_start,
            };
            if self.registry.call(idx, "heuristic", |r| r.heuristic(ctx, segment)).is_none() {
                out.continuous[c_range].fill(0.0);
                out.discrete[d_range].fill(0);
            }
        }
        ac_provider::helpers::sanitize_slice(&mut out.continuous);
    }

    pub fn on_episode_begin(&mut self, ctx: &mut AgentContext) {
        self.registry.episode_begin(ctx);
    }

    pub fn on_episode_end(&mut self, ctx: &mut AgentContext, reason: EpisodeEndReason) {
        self.registry.episode_end(ctx, reason);
    }

    pub fn update(&mut self, ctx: &mut AgentContext, delta_secs: f32) {
        self.registry.update(ctx, delta_secs);
    }
}
