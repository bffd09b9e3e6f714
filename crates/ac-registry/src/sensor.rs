//! `SensorManager` — throttled, optionally time-sliced sensor updates.
//!
//! # Scheduling
//!
//! A sensor is *due* once `update_interval_secs × lod_factor` simulated
//! seconds have passed since its last update (or it has never updated).
//!
//! * Not time-sliced: every due sensor updates this frame.
//! * Time-sliced: at most `max_sensors_per_frame` due sensors update, picked
//!   round-robin from a cursor that persists across frames, so cost is
//!   spread evenly and no sensor starves.
//!
//! # LOD
//!
//! With `enable_lod`, the viewer distance set by the host selects a band in
//! `lod_distances` (ascending): band 0 → `High`, 1 → `Medium`, 2 → `Low`,
//! beyond → `Culled`.  Lower detail stretches the interval (×1, ×2, ×4);
//! culled sensors do not update at all.

use ac_context::AgentContext;
use ac_core::{EpisodeEndReason, ProviderKind};
use ac_provider::{LodLevel, SensorCache, SensorFrame, SensorProvider};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{Registry, RegistryResult};

// ── SensorConfig ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct SensorConfig {
    pub update_interval_secs:  f64,
    pub time_sliced:           bool,
    pub max_sensors_per_frame: usize,
    pub enable_lod:            bool,
    /// Ascending band edges, in world units.
    pub lod_distances:         Vec<f32>,
    pub cache_ttl_secs:        f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            update_interval_secs:  0.1,
            time_sliced:           false,
            max_sensors_per_frame: 4,
            enable_lod:            false,
            lod_distances:         vec![10.0, 25.0, 50.0],
            cache_ttl_secs:        0.1,
        }
    }
}

impl SensorConfig {
    /// Update every sensor on every frame.
    pub fn every_frame() -> Self {
        Self { update_interval_secs: 0.0, ..Self::default() }
    }
}

fn lod_factor(lod: LodLevel) -> f64 {
    match lod {
        LodLevel::High   => 1.0,
        LodLevel::Medium => 2.0,
        LodLevel::Low    => 4.0,
        LodLevel::Culled => f64::INFINITY,
    }
}

// ── SensorManager ─────────────────────────────────────────────────────────────

pub struct SensorManager {
    registry:        Registry<dyn SensorProvider>,
    config:          SensorConfig,
    cache:           SensorCache,
    /// `ctx.elapsed_secs()` at each sensor's last update.
    last_update:     FxHashMap<String, f64>,
    cursor:          usize,
    viewer_distance: Option<f32>,
    updated_last:    usize,
}

impl Default for SensorManager {
    fn default() -> Self {
        Self::new(SensorConfig::default())
    }
}

impl SensorManager {
    pub fn new(config: SensorConfig) -> Self {
        Self {
            registry:        Registry::new(ProviderKind::Sensor),
            cache:           SensorCache::new(config.cache_ttl_secs),
            config,
            last_update:     FxHashMap::default(),
            cursor:          0,
            viewer_distance: None,
            updated_last:    0,
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry<dyn SensorProvider> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<dyn SensorProvider> {
        &mut self.registry
    }

    pub fn cache(&self) -> &SensorCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SensorCache {
        &mut self.cache
    }

    pub fn register(
        &mut self,
        sensor: Box<dyn SensorProvider>,
        ctx:    &mut AgentContext,
    ) -> RegistryResult<()> {
        self.registry.register(sensor, ctx)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn SensorProvider>> {
        self.last_update.remove(name);
        self.registry.unregister(name)
    }

    pub fn initialize(&mut self, ctx: &mut AgentContext) {
        self.registry.initialize(ctx);
    }

    // ── LOD ───────────────────────────────────────────────────────────────

    /// Distance from the viewer (camera) to the agent.  `None` means unknown
    /// and is treated as `High`.
    pub fn set_viewer_distance(&mut self, distance: Option<f32>) {
        self.viewer_distance = distance;
    }

    pub fn current_lod(&self) -> LodLevel {
        if !self.config.enable_lod {
            return LodLevel::High;
        }
        match self.viewer_distance {
            Some(d) if d.is_finite() => {
                let band = self
                    .config
                    .lod_distances
                    .iter()
                    .position(|&edge| d <= edge)
                    .unwrap_or(self.config.lod_distances.len());
                LodLevel::from_band(band)
            }
            _ => LodLevel::High,
        }
    }

    // ── Update ────────────────────────────────────────────────────────────

    fn is_due(&self, name: &str, now: f64, lod: LodLevel) -> bool {
        match self.last_update.get(name) {
            None => true,
            Some(&last) => now - last >= self.config.update_interval_secs * lod_factor(lod),
        }
    }

    /// Run one frame of sensor scheduling.  Returns the number of sensors
    /// updated successfully.
    pub fn update(&mut self, ctx: &mut AgentContext) -> usize {
        let now = ctx.elapsed_secs();
        self.cache.set_clock(now);
        self.cache.evict_expired();

        let lod = self.current_lod();
        if lod == LodLevel::Culled {
            self.updated_last = 0;
            return 0;
        }

        let active = self.registry.active_indices();
        let n = active.len();
        if n == 0 {
            self.updated_last = 0;
            return 0;
        }

        let budget = if self.config.time_sliced { self.config.max_sensors_per_frame.max(1) } else { n };
        let start = if self.config.time_sliced { self.cursor % n } else { 0 };

        let mut attempted = 0;
        let mut updated = 0;
        for k in 0..n {
            if attempted == budget {
                break;
            }
            let pos = (start + k) % n;
            let idx = active[pos];
            let Some(name) = self.registry.name_at(idx).map(str::to_string) else {
                continue;
            };
            if !self.is_due(&name, now, lod) {
                continue;
            }
            attempted += 1;
            if self.run_sensor(idx, &name, ctx, now, lod) {
                updated += 1;
            }
            self.cursor = pos + 1;
        }

        trace!(agent = %ctx.agent_id(), attempted, updated, %lod, "sensor frame");
        self.updated_last = updated;
        updated
    }

    /// Update every active sensor now, ignoring intervals, slicing and LOD
    /// culling.
    pub fn force_update_all(&mut self, ctx: &mut AgentContext) -> usize {
        let now = ctx.elapsed_secs();
        self.cache.set_clock(now);
        let lod = self.current_lod().min(LodLevel::Low);
        let mut updated = 0;
        for idx in self.registry.active_indices() {
            let Some(name) = self.registry.name_at(idx).map(str::to_string) else {
                continue;
            };
            if self.run_sensor(idx, &name, ctx, now, lod) {
                updated += 1;
            }
        }
        self.updated_last = updated;
        updated
    }

    fn run_sensor(&mut self, idx: usize, name: &str, ctx: &mut AgentContext, now: f64, lod: LodLevel) -> bool {
        let since = self.last_update.get(name).map_or(0.0, |&last| now - last);
        let frame = SensorFrame {
            elapsed_secs: since as f32,
            lod,
            cache:        &mut self.cache,
        };
        let ok = self
            .registry
            .call(idx, "update_sensor", |s| s.update_sensor(ctx, frame))
            .is_some();
        // Failed sensors also wait a full interval before the next attempt.
        self.last_update.insert(name.to_string(), now);
        ok
    }

    /// Sensors updated successfully on the last frame.
    pub fn updated_last_frame(&self) -> usize {
        self.updated_last
    }

    pub fn last_update_secs(&self, name: &str) -> Option<f64> {
        self.last_update.get(name).copied()
    }

    pub fn on_episode_begin(&mut self, ctx: &mut AgentContext) {
        self.cache.clear();
        self.last_update.clear();
        self.registry.episode_begin(ctx);
    }

    pub fn on_episode_end(&mut self, ctx: &mut AgentContext, reason: EpisodeEndReason) {
        self.registry.episode_end(ctx, reason);
    }

    /// Generic per-step `Provider::update` fan-out (separate from sensor
    /// scheduling).
    pub fn update_providers(&mut self, ctx: &mut AgentContext, delta_secs: f32) {
        self.registry.update(ctx, delta_secs);
    }
}
