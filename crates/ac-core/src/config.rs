//! Behavior configuration consumed at agent initialization.
//!
//! The framework treats this as an opaque, read-only structure: the
//! application's configuration layer loads it (JSON, YAML, an asset) and the
//! agent only reads it through typed accessors.  With the `serde` feature the
//! types derive `Serialize`/`Deserialize` so any serde format works.

use std::collections::BTreeMap;

use crate::{AcError, AcResult};

// ── ActionSpec ────────────────────────────────────────────────────────────────

/// Shape of the agent's action space.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActionSpec {
    /// Number of continuous action values.
    pub continuous_actions: usize,
    /// Size of each discrete branch.  One discrete value is produced per branch.
    pub discrete_branches: Vec<usize>,
}

impl ActionSpec {
    pub fn continuous(n: usize) -> Self {
        Self { continuous_actions: n, discrete_branches: Vec::new() }
    }

    pub fn discrete(branches: Vec<usize>) -> Self {
        Self { continuous_actions: 0, discrete_branches: branches }
    }

    /// Number of discrete action values (one per branch).
    #[inline]
    pub fn discrete_actions(&self) -> usize {
        self.discrete_branches.len()
    }

    /// `true` if the spec declares no actions at all.
    pub fn is_empty(&self) -> bool {
        self.continuous_actions == 0 && self.discrete_branches.is_empty()
    }

    /// Reject empty spaces and zero-sized discrete branches.
    pub fn validate(&self) -> AcResult<()> {
        if self.is_empty() {
            return Err(AcError::ActionSpec("action space has no actions".into()));
        }
        if let Some(i) = self.discrete_branches.iter().position(|&b| b == 0) {
            return Err(AcError::ActionSpec(format!("discrete branch {i} has size 0")));
        }
        Ok(())
    }
}

// ── BehaviorConfig ────────────────────────────────────────────────────────────

/// Top-level per-behavior configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BehaviorConfig {
    /// Name the trainer uses to group agents sharing a policy.
    pub behavior_name: String,

    /// Expected total length of the observation vector.  `0` means "derive
    /// from the registered observation providers".
    pub observation_size: usize,

    pub action_spec: ActionSpec,

    /// Episode step budget.  `0` means unlimited.
    pub max_steps: u64,

    /// Request a fresh decision every N fixed updates; the last action is
    /// repeated in between.  Values below 1 are treated as 1.
    pub decision_period: u32,

    /// Master RNG seed for deterministic providers.
    pub seed: u64,

    /// Training hyperparameters, passed through untouched.
    pub hyperparameters: BTreeMap<String, f64>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            behavior_name:    "default".into(),
            observation_size: 0,
            action_spec:      ActionSpec::default(),
            max_steps:        0,
            decision_period:  1,
            seed:             0,
            hyperparameters:  BTreeMap::new(),
        }
    }
}

impl BehaviorConfig {
    pub fn new(behavior_name: impl Into<String>) -> Self {
        Self { behavior_name: behavior_name.into(), ..Self::default() }
    }

    /// `max_steps` as an option; `None` when unlimited.
    pub fn max_steps(&self) -> Option<u64> {
        (self.max_steps > 0).then_some(self.max_steps)
    }

    /// Effective decision period (never below 1).
    pub fn decision_period(&self) -> u32 {
        self.decision_period.max(1)
    }

    /// Look up a hyperparameter by name.
    pub fn hyperparameter(&self, name: &str) -> Option<f64> {
        self.hyperparameters.get(name).copied()
    }

    /// Check the fields the framework depends on.
    pub fn validate(&self) -> AcResult<()> {
        if self.behavior_name.trim().is_empty() {
            return Err(AcError::Config("behavior_name must not be empty".into()));
        }
        self.action_spec.validate()?;
        if let Some((k, _)) = self.hyperparameters.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AcError::Config(format!("hyperparameter '{k}' is not finite")));
        }
        Ok(())
    }
}
