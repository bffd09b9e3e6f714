//! `StatisticsCollector` — fan-in of numeric telemetry.
//!
//! Metrics are namespaced by provider: provider `Speed` reporting `"mean"`
//! appears as `"Speed/mean"`.  Two views are kept:
//!
//! * [`all_current`](StatisticsCollector::all_current) — every value from the
//!   latest collection;
//! * [`changed_since_last`](StatisticsCollector::changed_since_last) — only
//!   values that are new or different since the previous call to it.

use std::collections::BTreeMap;

use ac_context::AgentContext;
use ac_core::{EpisodeEndReason, ProviderKind};
use ac_provider::StatisticsProvider;
use tracing::debug;

use crate::{Registry, RegistryResult};

pub struct StatisticsCollector {
    registry: Registry<dyn StatisticsProvider>,
    current:  BTreeMap<String, f32>,
    /// Snapshot taken by the last `changed_since_last` call.
    reported: BTreeMap<String, f32>,
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(ProviderKind::Statistics),
            current:  BTreeMap::new(),
            reported: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry<dyn StatisticsProvider> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<dyn StatisticsProvider> {
        &mut self.registry
    }

    pub fn register(
        &mut self,
        provider: Box<dyn StatisticsProvider>,
        ctx:      &mut AgentContext,
    ) -> RegistryResult<()> {
        self.registry.register(provider, ctx)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn StatisticsProvider>> {
        let removed = self.registry.unregister(name)?;
        let prefix = format!("{name}/");
        self.current.retain(|k, _| !k.starts_with(&prefix));
        self.reported.retain(|k, _| !k.starts_with(&prefix));
        Some(removed)
    }

    pub fn initialize(&mut self, ctx: &mut AgentContext) {
        self.registry.initialize(ctx);
    }

    /// Poll every active provider and rebuild the current view.  A failing
    /// provider contributes nothing this round; non-finite values are
    /// dropped.  Returns the number of metrics collected.
    pub fn collect(&mut self, ctx: &AgentContext) -> usize {
        self.current.clear();
        let results = self
            .registry
            .dispatch("collect_statistics", |p| p.collect_statistics(ctx));
        for (idx, stats) in results {
            let Some(stats) = stats else { continue };
            let provider = self.registry.name_at(idx).unwrap_or_default();
            for (metric, value) in stats {
                if !value.is_finite() {
                    debug!(provider = %provider, metric = %metric, value, "non-finite statistic dropped");
                    continue;
                }
                self.current.insert(format!("{provider}/{metric}"), value);
            }
        }
        self.current.len()
    }

    /// Every value from the latest [`collect`](Self::collect).
    pub fn all_current(&self) -> &BTreeMap<String, f32> {
        &self.current
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.current.get(key).copied()
    }

    /// Values that are new or changed since the previous call.
    pub fn changed_since_last(&mut self) -> BTreeMap<String, f32> {
        let changed: BTreeMap<String, f32> = self
            .current
            .iter()
            .filter(|&(k, v)| self.reported.get(k) != Some(v))
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        self.reported.extend(changed.iter().map(|(k, &v)| (k.clone(), v)));
        changed
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
