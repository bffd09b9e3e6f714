//! The pursuit arena and the providers that plug the chaser into it.
//!
//! The arena is the "engine": it owns positions and moves the target.  The
//! providers hold an `Rc<RefCell<Arena>>` and only borrow it for the length
//! of one callback.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use ac_context::AgentContext;
use ac_core::{AgentRng, EpisodeEndReason};
use ac_provider::helpers::{clamp_unit, safe_get};
use ac_provider::{
    ActionReceiver, ActionSegment, ActionSegmentMut, EpisodeHandler, ObservationProvider,
    ObservationSink, Provider, ProviderError, ProviderResult, RewardProvider, SensorFrame,
    SensorKind, SensorProvider, StatisticsProvider,
};

pub type SharedArena = Rc<RefCell<Arena>>;

/// Shared-data key for the latest target fix `[dx, dy, distance]`.
const TARGET_FIX_KEY: &str = "chase.target_fix";

// ── Arena ─────────────────────────────────────────────────────────────────────

pub struct Arena {
    pub half_extent:  f32,
    pub catch_radius: f32,
    pub chaser_speed: f32,
    pub target_speed: f32,
    pub chaser:       [f32; 2],
    pub velocity:     [f32; 2],
    pub target:       [f32; 2],
    target_heading:   f32,
    rng:              AgentRng,
}

impl Arena {
    pub fn new(seed: u64) -> Self {
        Self {
            half_extent:    10.0,
            catch_radius:   0.75,
            chaser_speed:   4.0,
            target_speed:   2.0,
            chaser:         [0.0; 2],
            velocity:       [0.0; 2],
            target:         [0.0; 2],
            target_heading: 0.0,
            rng:            AgentRng::new(seed, "arena"),
        }
    }

    pub fn shared(seed: u64) -> SharedArena {
        Rc::new(RefCell::new(Self::new(seed)))
    }

    /// Chaser at the centre, target somewhere on the outer ring.
    pub fn reset(&mut self) {
        self.chaser = [0.0; 2];
        self.velocity = [0.0; 2];
        let angle: f32 = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let radius = self.half_extent * 0.7;
        self.target = [radius * angle.cos(), radius * angle.sin()];
        self.target_heading = self.rng.gen_range(0.0..std::f32::consts::TAU);
    }

    /// Random-walk the target, bouncing off the walls.
    pub fn step_target(&mut self, dt: f32) {
        self.target_heading += self.rng.gen_range(-0.4..0.4);
        let mut next = [
            self.target[0] + self.target_heading.cos() * self.target_speed * dt,
            self.target[1] + self.target_heading.sin() * self.target_speed * dt,
        ];
        for axis in 0..2 {
            if next[axis].abs() > self.half_extent {
                next[axis] = next[axis].clamp(-self.half_extent, self.half_extent);
                self.target_heading += std::f32::consts::PI;
            }
        }
        self.target = next;
    }

    pub fn offset(&self) -> [f32; 2] {
        [self.target[0] - self.chaser[0], self.target[1] - self.chaser[1]]
    }

    pub fn distance(&self) -> f32 {
        let [dx, dy] = self.offset();
        dx.hypot(dy)
    }

    pub fn out_of_bounds(&self) -> bool {
        self.chaser.iter().any(|c| c.abs() > self.half_extent)
    }
}

// ── Sensor ────────────────────────────────────────────────────────────────────

/// Range finder: publishes `[dx, dy, distance]` to the target into shared
/// data at the sensor manager's rate.
pub struct RangeFinder {
    pub arena: SharedArena,
}

impl Provider for RangeFinder {}

impl SensorProvider for RangeFinder {
    fn sensor_kind(&self) -> SensorKind {
        SensorKind::Raycast
    }

    fn update_sensor(&mut self, ctx: &mut AgentContext, frame: SensorFrame<'_>) -> ProviderResult<()> {
        let arena = self.arena.borrow();
        let [dx, dy] = arena.offset();
        let fix = [dx, dy, arena.distance()];
        frame.cache.insert("last_fix", fix);
        ctx.shared_mut().set(TARGET_FIX_KEY, fix);
        Ok(())
    }
}

// ── Observations ──────────────────────────────────────────────────────────────

/// Own position and velocity, normalised to the arena.
pub struct Kinematics {
    pub arena: SharedArena,
}

impl Provider for Kinematics {}

impl ObservationProvider for Kinematics {
    fn observation_size(&self) -> usize {
        4
    }

    fn collect_observations(&mut self, _ctx: &AgentContext, sink: &mut ObservationSink) -> ProviderResult<()> {
        let arena = self.arena.borrow();
        for p in arena.chaser {
            sink.add(p / arena.half_extent);
        }
        for v in arena.velocity {
            sink.add(v / arena.chaser_speed);
        }
        Ok(())
    }
}

/// The range finder's last fix: unit direction to the target and distance.
pub struct TargetFix;

impl Provider for TargetFix {
    fn priority(&self) -> i32 {
        -10
    }
}

impl ObservationProvider for TargetFix {
    fn observation_size(&self) -> usize {
        3
    }

    fn collect_observations(&mut self, ctx: &AgentContext, sink: &mut ObservationSink) -> ProviderResult<()> {
        let [dx, dy, distance] = *ctx
            .shared()
            .get::<[f32; 3]>(TARGET_FIX_KEY)
            .ok_or_else(|| ProviderError::MissingReference(TARGET_FIX_KEY.into()))?;
        let norm = distance.max(f32::EPSILON);
        sink.add_slice(&[dx / norm, dy / norm, distance]);
        Ok(())
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

/// Two continuous actions: desired velocity in `[-1, 1]` per axis.
pub struct Thruster {
    pub arena: SharedArena,
}

impl Provider for Thruster {}

impl ActionReceiver for Thruster {
    fn continuous_action_count(&self) -> usize {
        2
    }

    fn receive_actions(&mut self, ctx: &mut AgentContext, actions: ActionSegment<'_>) -> ProviderResult<()> {
        let dt = ctx.clock().last_delta_secs;
        let mut arena = self.arena.borrow_mut();
        let speed = arena.chaser_speed;
        for axis in 0..2 {
            let v = clamp_unit(safe_get(actions.continuous, axis)) * speed;
            arena.velocity[axis] = v;
            arena.chaser[axis] += v * dt;
        }
        Ok(())
    }

    /// Head straight for the target.
    fn heuristic(&mut self, _ctx: &AgentContext, out: ActionSegmentMut<'_>) -> ProviderResult<()> {
        let arena = self.arena.borrow();
        let [dx, dy] = arena.offset();
        let norm = arena.distance().max(f32::EPSILON);
        out.continuous.copy_from_slice(&[dx / norm, dy / norm]);
        Ok(())
    }
}

// ── Rewards ───────────────────────────────────────────────────────────────────

/// Shaping: reward for closing distance since the previous step.
pub struct Closing {
    pub arena: SharedArena,
    pub scale: f32,
    previous:  Option<f32>,
}

impl Closing {
    pub fn new(arena: SharedArena, scale: f32) -> Self {
        Self { arena, scale, previous: None }
    }
}

impl Provider for Closing {
    fn on_episode_begin(&mut self, _ctx: &mut AgentContext) -> ProviderResult<()> {
        self.previous = None;
        Ok(())
    }
}

impl RewardProvider for Closing {
    fn calculate_reward(&mut self, _ctx: &AgentContext, _dt: f32) -> ProviderResult<f32> {
        let distance = self.arena.borrow().distance();
        let closed = self.previous.map_or(0.0, |p| p - distance);
        self.previous = Some(distance);
        Ok(closed * self.scale)
    }
}

/// Terminal bonus on catch, penalty on leaving the arena.
pub struct Outcome {
    pub arena: SharedArena,
}

impl Provider for Outcome {}

impl RewardProvider for Outcome {
    fn calculate_reward(&mut self, _ctx: &AgentContext, _dt: f32) -> ProviderResult<f32> {
        let arena = self.arena.borrow();
        Ok(if arena.distance() <= arena.catch_radius {
            1.0
        } else if arena.out_of_bounds() {
            -1.0
        } else {
            0.0
        })
    }
}

// ── Episode ───────────────────────────────────────────────────────────────────

/// Resets the arena on begin; ends on catch or when the chaser leaves.
pub struct Referee {
    pub arena: SharedArena,
}

impl Provider for Referee {
    fn priority(&self) -> i32 {
        10
    }

    fn on_episode_begin(&mut self, _ctx: &mut AgentContext) -> ProviderResult<()> {
        self.arena.borrow_mut().reset();
        Ok(())
    }
}

impl EpisodeHandler for Referee {
    fn should_end_episode(&mut self, _ctx: &AgentContext) -> ProviderResult<Option<EpisodeEndReason>> {
        let arena = self.arena.borrow();
        if arena.distance() <= arena.catch_radius {
            Ok(Some(EpisodeEndReason::Success))
        } else if arena.out_of_bounds() {
            Ok(Some(EpisodeEndReason::BoundaryViolation))
        } else {
            Ok(None)
        }
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

pub struct PursuitStats {
    pub arena: SharedArena,
}

impl Provider for PursuitStats {}

impl StatisticsProvider for PursuitStats {
    fn collect_statistics(&mut self, ctx: &AgentContext) -> ProviderResult<BTreeMap<String, f32>> {
        let arena = self.arena.borrow();
        let [vx, vy] = arena.velocity;
        Ok(BTreeMap::from([
            ("distance".to_string(), arena.distance()),
            ("speed".to_string(), vx.hypot(vy)),
            ("reward".to_string(), ctx.cumulative_reward()),
        ]))
    }
}
