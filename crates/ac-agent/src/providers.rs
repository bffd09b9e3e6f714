//! Stock decision providers.
//!
//! | Provider                    | Opts in            | Produces                                  |
//! |-----------------------------|--------------------|-------------------------------------------|
//! | `RandomDecisionProvider`    | configurable       | uniform actions from the agent's RNG      |
//! | `ScriptedDecisionProvider`  | configurable       | whatever its closure writes               |
//! | `HeuristicDecisionProvider` | configurable       | the action receivers' heuristic actions   |

use ac_context::AgentContext;
use ac_core::{ActionSpec, AgentRng};
use ac_provider::{ActionBuffers, DecisionProvider, Provider, ProviderError, ProviderResult};

/// Shared-data key under which the agent publishes the receivers' latest
/// heuristic actions (an [`ActionBuffers`]).
pub const HEURISTIC_ACTIONS_KEY: &str = "ac.heuristic_actions";

// ── Random ────────────────────────────────────────────────────────────────────

/// Uniform random actions: continuous values in `[-1, 1]`, discrete values in
/// `0..branch_size`.
///
/// The RNG is seeded in `initialize` from the seed and the agent id, so two
/// runs with the same seed produce the same action stream.
pub struct RandomDecisionProvider {
    seed:     u64,
    spec:     ActionSpec,
    priority: i32,
    opt_in:   bool,
    rng:      Option<AgentRng>,
}

impl RandomDecisionProvider {
    pub fn new(seed: u64, spec: ActionSpec) -> Self {
        Self { seed, spec, priority: 0, opt_in: false, rng: None }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Compete for control every step instead of only acting as fallback.
    pub fn opt_in(mut self, opt_in: bool) -> Self {
        self.opt_in = opt_in;
        self
    }
}

impl Provider for RandomDecisionProvider {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn initialize(&mut self, ctx: &mut AgentContext) -> ProviderResult<()> {
        self.rng = Some(AgentRng::new(self.seed, ctx.agent_id()));
        Ok(())
    }

    fn validate(&self, _ctx: &AgentContext) -> ProviderResult<()> {
        if self.spec.discrete_branches.contains(&0) {
            return Err(ProviderError::Config("discrete branch of size 0".into()));
        }
        Ok(())
    }
}

impl DecisionProvider for RandomDecisionProvider {
    fn should_decide(&mut self, _ctx: &AgentContext, _observations: &[f32]) -> ProviderResult<bool> {
        Ok(self.opt_in)
    }

    fn decide_action(
        &mut self,
        _ctx:          &AgentContext,
        _observations: &[f32],
        actions:       &mut ActionBuffers,
    ) -> ProviderResult<()> {
        let rng = self
            .rng
            .as_mut()
            .ok_or_else(|| ProviderError::MissingReference("rng (not initialized)".into()))?;
        actions.continuous.resize(self.spec.continuous_actions, 0.0);
        actions.discrete.resize(self.spec.discrete_actions(), 0);
        for v in actions.continuous.iter_mut() {
            *v = rng.gen_range(-1.0..=1.0);
        }
        for (v, &branch) in actions.discrete.iter_mut().zip(&self.spec.discrete_branches) {
            *v = rng.gen_range(0..branch) as i32;
        }
        Ok(())
    }
}

// ── Scripted ──────────────────────────────────────────────────────────────────

type Script = Box<dyn FnMut(&AgentContext, &[f32], &mut ActionBuffers)>;

/// Runs a closure to produce actions.  Useful for scripted baselines and
/// tests.
pub struct ScriptedDecisionProvider {
    name:     String,
    priority: i32,
    opt_in:   bool,
    script:   Script,
}

impl ScriptedDecisionProvider {
    pub fn new(
        name:   impl Into<String>,
        script: impl FnMut(&AgentContext, &[f32], &mut ActionBuffers) + 'static,
    ) -> Self {
        Self {
            name:     name.into(),
            priority: 0,
            opt_in:   true,
            script:   Box::new(script),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn opt_in(mut self, opt_in: bool) -> Self {
        self.opt_in = opt_in;
        self
    }
}

impl Provider for ScriptedDecisionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

impl DecisionProvider for ScriptedDecisionProvider {
    fn should_decide(&mut self, _ctx: &AgentContext, _observations: &[f32]) -> ProviderResult<bool> {
        Ok(self.opt_in)
    }

    fn decide_action(
        &mut self,
        ctx:          &AgentContext,
        observations: &[f32],
        actions:      &mut ActionBuffers,
    ) -> ProviderResult<()> {
        (self.script)(ctx, observations, actions);
        Ok(())
    }
}

// ── Heuristic ─────────────────────────────────────────────────────────────────

/// Forwards the action receivers' own heuristics (keyboard, hand-written
/// control) as the decision.
///
/// The agent refreshes [`HEURISTIC_ACTIONS_KEY`] before every decision while
/// this provider is registered.
pub struct HeuristicDecisionProvider {
    priority: i32,
    opt_in:   bool,
}

impl HeuristicDecisionProvider {
    pub const NAME: &'static str = "heuristic";

    pub fn new() -> Self {
        Self { priority: 0, opt_in: false }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Opt in every step (human override).
    pub fn opt_in(mut self, opt_in: bool) -> Self {
        self.opt_in = opt_in;
        self
    }
}

impl Default for HeuristicDecisionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for HeuristicDecisionProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

impl DecisionProvider for HeuristicDecisionProvider {
    fn should_decide(&mut self, _ctx: &AgentContext, _observations: &[f32]) -> ProviderResult<bool> {
        Ok(self.opt_in)
    }

    fn decide_action(
        &mut self,
        ctx:           &AgentContext,
        _observations: &[f32],
        actions:       &mut ActionBuffers,
    ) -> ProviderResult<()> {
        let heuristic = ctx
            .shared()
            .get::<ActionBuffers>(HEURISTIC_ACTIONS_KEY)
            .ok_or_else(|| ProviderError::MissingReference(HEURISTIC_ACTIONS_KEY.into()))?;
        actions.clear();
        actions.copy_from(heuristic);
        Ok(())
    }
}
