//! chase — pursuit demo for the rust_ac agent composition framework.
//!
//! One chaser agent hunts a randomly wandering target in a square arena.
//! The run switches decision sources through a side channel: a scripted
//! pursuit policy first, then the receivers' heuristic, then uniform random
//! actions as a baseline.  Episode summaries and statistics go to CSV.
//!
//! ```text
//! cargo run -p chase -- [behavior.json] [output_dir]
//! RUST_LOG=ac_registry=debug cargo run -p chase
//! ```

mod arena;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use ac_agent::{
    AgentBuilder, AgentCommand, AgentObserver, ChannelMessage, EpisodeSummary,
    HeuristicDecisionProvider, MemoryChannel, RandomDecisionProvider, ScriptedDecisionProvider,
};
use ac_core::{ActionSpec, BehaviorConfig, EpisodeEndReason};
use ac_output::{AgentOutputObserver, CsvWriter};
use ac_provider::helpers::safe_get;
use ac_registry::{DecisionMode, RewardConfig, SensorConfig};

use arena::{Arena, Closing, Kinematics, Outcome, PursuitStats, RangeFinder, Referee, TargetFix, Thruster};

// ── Constants ─────────────────────────────────────────────────────────────────

const EPISODES_PER_PHASE: u64 = 10;
const DT:                 f32 = 0.02;
const STATS_EVERY:        u64 = 25;

const DEFAULT_BEHAVIOR: &str = r#"{
    "behavior_name": "chase",
    "max_steps": 750,
    "decision_period": 2,
    "seed": 42,
    "hyperparameters": { "closing_scale": 0.1, "pursuit_gain": 0.9 }
}"#;

// ── Console report ────────────────────────────────────────────────────────────

/// Logs each episode and tallies outcomes per decision phase.
#[derive(Default)]
struct ConsoleReport {
    phase:    &'static str,
    outcomes: BTreeMap<(&'static str, &'static str), (u64, f32)>,
}

impl AgentObserver for ConsoleReport {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        info!(
            episode = summary.episode,
            steps = summary.steps,
            reward = summary.cumulative_reward,
            reason = %summary.reason,
            phase = self.phase,
            "episode finished"
        );
        let entry = self.outcomes.entry((self.phase, summary.reason.as_str())).or_default();
        entry.0 += 1;
        entry.1 += summary.cumulative_reward;
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let behavior: BehaviorConfig = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => serde_json::from_str(DEFAULT_BEHAVIOR)?,
    };
    let output_dir = args.next().map_or_else(|| PathBuf::from("output/chase"), PathBuf::from);

    println!("=== chase — rust_ac agent composition ===");
    println!(
        "Behavior: {}  |  Max steps: {}  |  Decision period: {}  |  Seed: {}",
        behavior.behavior_name, behavior.max_steps, behavior.decision_period, behavior.seed
    );
    println!();

    // 1. World.
    let arena = Arena::shared(behavior.seed);
    let closing_scale = behavior.hyperparameter("closing_scale").unwrap_or(0.1) as f32;
    let gain = behavior.hyperparameter("pursuit_gain").unwrap_or(1.0) as f32;

    // 2. Decision sources.  Observations: [x, y, vx, vy, dir_x, dir_y, dist].
    let pursuit = ScriptedDecisionProvider::new("pursuit", move |_, obs, actions| {
        actions.continuous.resize(2, 0.0);
        actions.continuous[0] = gain * safe_get(obs, 4);
        actions.continuous[1] = gain * safe_get(obs, 5);
    })
    .with_priority(10);
    let random = RandomDecisionProvider::new(behavior.seed, ActionSpec::continuous(2));

    // 3. Agent.
    let channel = MemoryChannel::new("trainer");
    let writer = CsvWriter::new(&output_dir)
        .with_context(|| format!("creating output in {}", output_dir.display()))?;
    let observer = (
        AgentOutputObserver::new(writer).statistics_every(STATS_EVERY),
        ConsoleReport { phase: "pursuit", ..Default::default() },
    );

    let mut agent = AgentBuilder::new("chaser-0", behavior)
        .reward_config(RewardConfig::clamped(-1.0, 1.0))
        .sensor_config(SensorConfig { update_interval_secs: 0.04, ..SensorConfig::default() })
        .sensor(RangeFinder { arena: arena.clone() })
        .observation(Kinematics { arena: arena.clone() })
        .observation(TargetFix)
        .action(Thruster { arena: arena.clone() })
        .reward(Closing::new(arena.clone(), closing_scale))
        .reward(Outcome { arena: arena.clone() })
        .episode_handler(Referee { arena: arena.clone() })
        .statistics(PursuitStats { arena: arena.clone() })
        .decision(pursuit)
        .decision(random)
        .decision(HeuristicDecisionProvider::new())
        .side_channel(channel.clone())
        .observer(observer)
        .build()?;

    agent.initialize();
    println!(
        "Observation size: {}  |  Actions: {} continuous",
        agent.config().observation_size,
        agent.config().action_spec.continuous_actions
    );

    // 4. Run three phases, switching the decision source over the channel.
    let phases: [(&'static str, DecisionMode, Option<&str>); 3] = [
        ("pursuit", DecisionMode::Auto, None),
        ("heuristic", DecisionMode::Manual, Some(HeuristicDecisionProvider::NAME)),
        ("random", DecisionMode::Manual, Some("RandomDecisionProvider")),
    ];

    let t0 = Instant::now();
    let mut steps = 0_u64;
    for (phase, mode, provider) in phases {
        agent.observer_mut().1.phase = phase;
        channel.push_command(AgentCommand::SetDecisionMode {
            mode,
            provider_id: provider.map(str::to_string),
        });
        channel.push_command(AgentCommand::EndEpisode(EpisodeEndReason::ManualReset));
        // The reset above closes the running episode; don't count it.
        let mut finished = 0;
        let mut skip_reset = true;
        while finished < EPISODES_PER_PHASE {
            arena.borrow_mut().step_target(DT);
            let report = agent.fixed_update(DT);
            steps += 1;
            if let Some(reason) = report.ended {
                if skip_reset && reason == EpisodeEndReason::ManualReset {
                    skip_reset = false;
                    continue;
                }
                skip_reset = false;
                finished += 1;
            }
        }
    }
    agent.on_destroy();
    let elapsed = t0.elapsed();

    let (output, report) = agent.observer_mut();
    if let Some(e) = output.take_error() {
        eprintln!("output error: {e}");
    }

    // 5. Report.
    println!();
    println!("{:<10} {:<20} {:>8} {:>12}", "phase", "reason", "count", "mean reward");
    for ((phase, reason), (count, total)) in &report.outcomes {
        println!("{phase:<10} {reason:<20} {count:>8} {:>12.3}", total / *count as f32);
    }

    let sent = channel.drain_sent();
    let stats_msgs = sent.iter().filter(|m| matches!(m, ChannelMessage::Statistics { .. })).count();
    println!();
    println!(
        "{steps} steps in {:.2?}  |  channel: {} messages ({stats_msgs} statistics)",
        elapsed,
        sent.len()
    );
    println!("Output written to {}", output_dir.display());
    Ok(())
}
