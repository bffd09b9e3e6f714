//! Deterministic per-agent RNG wrapper.
//!
//! # Determinism strategy
//!
//! Agents are identified by strings, so each agent's seed is derived from a
//! stable FNV-1a hash of its id mixed with the run's global seed:
//!
//!   seed = global_seed XOR (fnv1a(agent_id) * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio.
//! Two runs with the same seed and the same agent ids draw identical streams,
//! independent of how many other agents exist.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME:  u64 = 0x0000_0100_0000_01b3;

/// Stable 64-bit FNV-1a hash.  Unlike `DefaultHasher` it is guaranteed not to
/// change between Rust releases.
pub fn stable_hash(s: &str) -> u64 {
    s.bytes().fold(FNV_OFFSET, |h, b| (h ^ b as u64).wrapping_mul(FNV_PRIME))
}

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG.
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed and an agent id.
    pub fn new(global_seed: u64, agent_id: &str) -> Self {
        let seed = global_seed ^ stable_hash(agent_id).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
