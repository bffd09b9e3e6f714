//! `ObservationCollector` — concatenates provider observations into one
//! fixed-layout vector.
//!
//! Every registered provider owns a slot of `observation_size()` values,
//! assigned in dispatch order.  Slots are reserved whether or not the
//! provider is active this step: inactive or failing providers read as
//! zeros, so the offsets seen by a trained policy never shift.

use std::collections::BTreeSet;
use std::ops::Range;

use ac_context::AgentContext;
use ac_core::{EpisodeEndReason, ProviderKind};
use ac_provider::helpers::{fit_to_size, sanitize_slice};
use ac_provider::{ObservationProvider, ObservationSink};
use tracing::{debug, warn};

use crate::{Registry, RegistryResult};

pub struct ObservationCollector {
    registry: Registry<dyn ObservationProvider>,
    buffer:   Vec<f32>,
    /// Providers already warned about a size mismatch.
    warned_size:       BTreeSet<String>,
    /// Providers already warned about non-finite values this episode.
    warned_non_finite: BTreeSet<String>,
}

impl Default for ObservationCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationCollector {
    pub fn new() -> Self {
        Self {
            registry:          Registry::new(ProviderKind::Observation),
            buffer:            Vec::new(),
            warned_size:       BTreeSet::new(),
            warned_non_finite: BTreeSet::new(),
        }
    }

    pub fn registry(&self) -> &Registry<dyn ObservationProvider> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<dyn ObservationProvider> {
        &mut self.registry
    }

    pub fn register(
        &mut self,
        provider: Box<dyn ObservationProvider>,
        ctx:      &mut AgentContext,
    ) -> RegistryResult<()> {
        self.registry.register(provider, ctx)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn ObservationProvider>> {
        self.registry.unregister(name)
    }

    pub fn initialize(&mut self, ctx: &mut AgentContext) {
        self.registry.initialize(ctx);
    }

    /// Sum of every registered provider's declared size.
    pub fn total_size(&self) -> usize {
        (0..self.registry.len())
            .filter_map(|i| self.registry.provider_at(i))
            .map(|p| p.observation_size())
            .sum()
    }

    /// `(provider, range)` for each slot, in layout order.
    pub fn layout(&self) -> Vec<(&str, Range<usize>)> {
        let mut start = 0;
        (0..self.registry.len())
            .filter_map(|i| Some((self.registry.name_at(i)?, self.registry.provider_at(i)?)))
            .map(|(name, p)| {
                let end = start + p.observation_size();
                let range = start..end;
                start = end;
                (name, range)
            })
            .collect()
    }

    /// Collect one observation vector.  Its length is always
    /// [`total_size`](Self::total_size) and every value is finite.
    pub fn collect(&mut self, ctx: &AgentContext) -> &[f32] {
        self.buffer.clear();

        for idx in 0..self.registry.len() {
            let size = self.registry.provider_at(idx).map_or(0, |p| p.observation_size());
            if !self.registry.is_dispatchable(idx) {
                self.buffer.resize(self.buffer.len() + size, 0.0);
                continue;
            }

            let mut sink = ObservationSink::with_capacity(size);
            let collected = self
                .registry
                .call(idx, "collect_observations", |p| p.collect_observations(ctx, &mut sink))
                .is_some();
            if !collected {
                self.buffer.resize(self.buffer.len() + size, 0.0);
                continue;
            }

            let name = self.registry.name_at(idx).unwrap_or_default();
            let mut values = sink.into_vec();
            let written = values.len();
            if fit_to_size(&mut values, size) {
                if self.warned_size.insert(name.to_string()) {
                    warn!(provider = %name, declared = size, written, "observation size mismatch; padded/truncated");
                } else {
                    debug!(provider = %name, declared = size, written, "observation size mismatch");
                }
            }
            let replaced = sanitize_slice(&mut values);
            if replaced > 0 && self.warned_non_finite.insert(name.to_string()) {
                warn!(provider = %name, replaced, "non-finite observations replaced with 0");
            }
            self.buffer.extend_from_slice(&values);
        }

        &self.buffer
    }

    /// The vector produced by the last [`collect`](Self::collect).
    pub fn last_observations(&self) -> &[f32] {
        &self.buffer
    }

    pub fn on_episode_begin(&mut self, ctx: &mut AgentContext) {
        self.warned_non_finite.clear();
        self.registry.episode_begin(ctx);
    }

    pub fn on_episode_end(&mut self, ctx: &mut AgentContext, reason: EpisodeEndReason) {
        self.registry.episode_end(ctx, reason);
    }

    pub fn update(&mut self, ctx: &mut AgentContext, delta_secs: f32) {
        self.registry.update(ctx, delta_secs);
    }
}
