//! Unit tests for ac-registry.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ac_context::AgentContext;
use ac_core::EpisodeEndReason;
use ac_provider::{Provider, ProviderError, ProviderResult};

// ── Helpers ───────────────────────────────────────────────────────────────────

type Log = Rc<RefCell<Vec<String>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

fn ctx() -> AgentContext {
    let mut ctx = AgentContext::new("agent-0");
    ctx.begin_episode();
    ctx
}

/// Reward provider recording every call into a shared log.
struct TestReward {
    name:     String,
    priority: i32,
    value:    f32,
    active:   bool,
    log:      Log,
    inits:    Rc<Cell<u32>>,
}

impl TestReward {
    fn new(name: &str, priority: i32, value: f32, log: &Log) -> Box<Self> {
        Box::new(Self {
            name:     name.to_string(),
            priority,
            value,
            active:   true,
            log:      log.clone(),
            inits:    Rc::new(Cell::new(0)),
        })
    }
}

impl Provider for TestReward {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn initialize(&mut self, _ctx: &mut AgentContext) -> ProviderResult<()> {
        self.inits.set(self.inits.get() + 1);
        Ok(())
    }
}

impl ac_provider::RewardProvider for TestReward {
    fn calculate_reward(&mut self, _ctx: &AgentContext, _dt: f32) -> ProviderResult<f32> {
        self.log.borrow_mut().push(self.name.clone());
        Ok(self.value)
    }

    fn on_event(&mut self, _ctx: &AgentContext, event: &ac_provider::RewardEvent<'_>) -> ProviderResult<()> {
        self.log.borrow_mut().push(format!("{}:{}", self.name, event.name));
        Ok(())
    }
}

/// Panics from every reward callback.
struct PanickingReward;

impl Provider for PanickingReward {
    fn priority(&self) -> i32 {
        50
    }
}

impl ac_provider::RewardProvider for PanickingReward {
    fn calculate_reward(&mut self, _ctx: &AgentContext, _dt: f32) -> ProviderResult<f32> {
        panic!("reward exploded");
    }

    fn on_event(&mut self, _ctx: &AgentContext, _event: &ac_provider::RewardEvent<'_>) -> ProviderResult<()> {
        panic!("event exploded");
    }
}

/// Fails validation while `broken` is set.
struct FragileReward {
    broken: Rc<Cell<bool>>,
}

impl Provider for FragileReward {
    fn validate(&self, _ctx: &AgentContext) -> ProviderResult<()> {
        if self.broken.get() {
            Err(ProviderError::MissingReference("target".into()))
        } else {
            Ok(())
        }
    }
}

impl ac_provider::RewardProvider for FragileReward {
    fn calculate_reward(&mut self, _ctx: &AgentContext, _dt: f32) -> ProviderResult<f32> {
        Ok(1.0)
    }
}

// ── Registry core ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry_tests {
    use super::*;
    use crate::{InitState, Registry, RegistryError};
    use ac_core::ProviderKind;
    use ac_provider::RewardProvider;

    fn registry() -> Registry<dyn RewardProvider> {
        Registry::new(ProviderKind::Reward)
    }

    #[test]
    fn orders_by_priority_desc_then_name_asc() {
        let log = new_log();
        let mut ctx = ctx();
        let mut reg = registry();
        reg.register(TestReward::new("a", 0, 0.0, &log), &mut ctx).unwrap();
        reg.register(TestReward::new("c", 10, 0.0, &log), &mut ctx).unwrap();
        reg.register(TestReward::new("b", 10, 0.0, &log), &mut ctx).unwrap();
        reg.register(TestReward::new("d", -5, 0.0, &log), &mut ctx).unwrap();
        assert_eq!(reg.names(), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let log = new_log();
        let mut ctx = ctx();
        let mut reg = registry();
        reg.register(TestReward::new("a", 0, 0.0, &log), &mut ctx).unwrap();
        let err = reg.register(TestReward::new("a", 5, 0.0, &log), &mut ctx).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.priority_at(0), Some(0));
    }

    #[test]
    fn initialize_is_idempotent() {
        let log = new_log();
        let mut ctx = ctx();
        let mut reg = registry();
        let provider = TestReward::new("a", 0, 0.0, &log);
        let inits = provider.inits.clone();
        reg.register(provider, &mut ctx).unwrap();
        reg.register(TestReward::new("b", 1, 0.0, &log), &mut ctx).unwrap();

        reg.initialize(&mut ctx);
        let names_once = reg.names().into_iter().map(String::from).collect::<Vec<_>>();
        reg.initialize(&mut ctx);

        assert_eq!(inits.get(), 1);
        assert_eq!(reg.names(), names_once);
        assert!(reg.is_initialized());
    }

    #[test]
    fn late_joiner_is_initialized_on_register() {
        let log = new_log();
        let mut ctx = ctx();
        let mut reg = registry();
        reg.initialize(&mut ctx);

        let provider = TestReward::new("late", 0, 0.0, &log);
        let inits = provider.inits.clone();
        reg.register(provider, &mut ctx).unwrap();

        assert_eq!(inits.get(), 1);
        assert_eq!(reg.state("late"), Some(InitState::Initialized));
    }

    #[test]
    fn register_then_unregister_round_trips() {
        let log = new_log();
        let mut ctx = ctx();
        let mut reg = registry();
        reg.register(TestReward::new("a", 3, 0.0, &log), &mut ctx).unwrap();
        reg.register(TestReward::new("b", 1, 0.0, &log), &mut ctx).unwrap();
        reg.initialize(&mut ctx);
        let before: Vec<String> = reg.names().into_iter().map(String::from).collect();

        reg.register(TestReward::new("x", 2, 0.0, &log), &mut ctx).unwrap();
        assert_eq!(reg.names(), vec!["a", "x", "b"]);
        assert!(reg.unregister("x").is_some());

        assert_eq!(reg.names(), before);
        assert_eq!(reg.len(), 2);
        assert!(reg.unregister("x").is_none());
    }

    #[test]
    fn failed_validation_excludes_until_retry() {
        let mut ctx = ctx();
        let mut reg = registry();
        let broken = Rc::new(Cell::new(true));
        reg.register(Box::new(FragileReward { broken: broken.clone() }), &mut ctx).unwrap();
        reg.initialize(&mut ctx);

        assert_eq!(reg.state("FragileReward"), Some(InitState::Failed));
        assert!(reg.active_indices().is_empty());
        assert_eq!(reg.len(), 1, "failed provider stays registered");

        broken.set(false);
        assert_eq!(reg.retry_failed(&mut ctx), 1);
        assert_eq!(reg.active_indices(), vec![0]);
    }

    #[test]
    fn panic_is_isolated_and_counted() {
        let log = new_log();
        let mut ctx = ctx();
        let mut reg = registry();
        reg.register(Box::new(PanickingReward), &mut ctx).unwrap();
        reg.register(TestReward::new("ok", 0, 2.0, &log), &mut ctx).unwrap();
        reg.initialize(&mut ctx);

        let results = reg.dispatch("calculate_reward", |p| p.calculate_reward(&ctx, 0.02));
        assert_eq!(results, vec![(0, None), (1, Some(2.0))]);
        assert_eq!(reg.failure_count("PanickingReward"), Some(1));
        assert_eq!(reg.failure_count("ok"), Some(0));
    }

    #[test]
    fn disabled_provider_is_skipped_but_kept() {
        let log = new_log();
        let mut ctx = ctx();
        let mut reg = registry();
        reg.register(TestReward::new("a", 0, 1.0, &log), &mut ctx).unwrap();
        reg.initialize(&mut ctx);
        assert!(reg.set_enabled("a", false));
        assert!(reg.active_indices().is_empty());
        assert_eq!(reg.is_enabled("a"), Some(false));
        assert!(!reg.set_enabled("missing", false));
    }
}

// ── RewardCalculator ──────────────────────────────────────────────────────────

#[cfg(test)]
mod reward_tests {
    use super::*;
    use crate::{RewardCalculator, RewardConfig};
    use proptest::prelude::*;

    fn calculator(config: RewardConfig, providers: Vec<Box<TestReward>>, ctx: &mut AgentContext) -> RewardCalculator {
        let mut calc = RewardCalculator::new(config);
        for p in providers {
            calc.register(p, ctx).unwrap();
        }
        calc.initialize(ctx);
        calc
    }

    #[test]
    fn visits_in_priority_then_name_order() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::default(),
            vec![
                TestReward::new("zeta", 1, 0.0, &log),
                TestReward::new("alpha", 1, 0.0, &log),
                TestReward::new("high", 9, 0.0, &log),
                TestReward::new("low", -3, 0.0, &log),
            ],
            &mut ctx,
        );
        calc.calculate_step_reward(&mut ctx, 0.02);
        assert_eq!(entries(&log), vec!["high", "alpha", "zeta", "low"]);
    }

    #[test]
    fn sums_pre_weighted_values() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::default(),
            vec![TestReward::new("a", 0, 0.5, &log), TestReward::new("b", 0, -0.25, &log)],
            &mut ctx,
        );
        assert_eq!(calc.calculate_step_reward(&mut ctx, 0.02), 0.25);
        assert_eq!(ctx.cumulative_reward(), 0.25);
        assert_eq!(calc.contribution("a"), Some(0.5));
        assert_eq!(calc.last_contributions().len(), 2);
    }

    #[test]
    fn clamps_total_to_max() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::clamped(-10.0, 10.0),
            vec![TestReward::new("a", 0, 7.0, &log), TestReward::new("b", 0, 8.0, &log)],
            &mut ctx,
        );
        assert_eq!(calc.calculate_step_reward(&mut ctx, 0.02), 10.0);
        assert_eq!(ctx.cumulative_reward(), 10.0);
        // Contributions are recorded unclamped.
        assert_eq!(calc.contribution("b"), Some(8.0));
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::clamped(5.0, -5.0),
            vec![TestReward::new("a", 0, 100.0, &log)],
            &mut ctx,
        );
        assert_eq!(calc.calculate_step_reward(&mut ctx, 0.02), 5.0);
    }

    #[test]
    fn nan_provider_contributes_zero() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::default(),
            vec![TestReward::new("nan", 5, f32::NAN, &log), TestReward::new("ok", 0, 1.5, &log)],
            &mut ctx,
        );
        assert_eq!(calc.calculate_step_reward(&mut ctx, 0.02), 1.5);
        assert_eq!(calc.contribution("nan"), Some(0.0));
        assert_eq!(ctx.cumulative_reward(), 1.5);
        assert!(!calc.last_step_valid());
        assert_eq!(calc.invalid_step_count(), 1);
    }

    #[test]
    fn infinite_provider_flags_each_step() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::default(),
            vec![TestReward::new("inf", 0, f32::NEG_INFINITY, &log)],
            &mut ctx,
        );
        calc.calculate_step_reward(&mut ctx, 0.02);
        calc.calculate_step_reward(&mut ctx, 0.02);
        assert_eq!(calc.invalid_step_count(), 2);
        assert!(calc.unregister("inf").is_some());

        calc.register(TestReward::new("ok", 0, 1.0, &log), &mut ctx).unwrap();
        assert_eq!(calc.calculate_step_reward(&mut ctx, 0.02), 1.0);
        assert!(calc.last_step_valid());
        assert_eq!(calc.invalid_step_count(), 2);
    }

    #[test]
    fn overflowing_sum_is_zeroed_and_flagged() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::default(),
            vec![TestReward::new("a", 0, f32::MAX, &log), TestReward::new("b", 0, f32::MAX, &log)],
            &mut ctx,
        );
        assert_eq!(calc.calculate_step_reward(&mut ctx, 0.02), 0.0);
        assert!(!calc.last_step_valid());
        assert_eq!(calc.invalid_step_count(), 1);
        assert_eq!(ctx.cumulative_reward(), 0.0);
    }

    #[test]
    fn panicking_provider_counts_as_zero() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = RewardCalculator::default();
        calc.register(Box::new(PanickingReward), &mut ctx).unwrap();
        calc.register(TestReward::new("ok", 0, 2.0, &log), &mut ctx).unwrap();
        calc.initialize(&mut ctx);

        assert_eq!(calc.calculate_step_reward(&mut ctx, 0.02), 2.0);
        assert_eq!(calc.contribution("PanickingReward"), Some(0.0));
    }

    #[test]
    fn inactive_provider_is_skipped() {
        let log = new_log();
        let mut ctx = ctx();
        let mut off = TestReward::new("off", 0, 3.0, &log);
        off.active = false;
        let mut calc = calculator(
            RewardConfig::default(),
            vec![off, TestReward::new("on", 0, 1.0, &log)],
            &mut ctx,
        );
        assert_eq!(calc.calculate_step_reward(&mut ctx, 0.02), 1.0);
        assert_eq!(entries(&log), vec!["on"]);
        assert_eq!(calc.contribution("off"), None);
    }

    #[test]
    fn event_reaches_others_despite_failure() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = RewardCalculator::default();
        calc.register(Box::new(PanickingReward), &mut ctx).unwrap();
        calc.register(TestReward::new("a", 0, 0.0, &log), &mut ctx).unwrap();
        calc.register(TestReward::new("b", -1, 0.0, &log), &mut ctx).unwrap();
        calc.initialize(&mut ctx);

        let handled = calc.trigger_event(&ctx, "GoalReached", None);
        assert_eq!(handled, 2);
        assert_eq!(entries(&log), vec!["a:GoalReached", "b:GoalReached"]);
    }

    #[test]
    fn unregister_discards_contribution() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::default(),
            vec![TestReward::new("a", 0, 1.0, &log), TestReward::new("b", 0, 2.0, &log)],
            &mut ctx,
        );
        calc.calculate_step_reward(&mut ctx, 0.02);
        assert!(calc.unregister("a").is_some());
        assert_eq!(calc.contribution("a"), None);
        assert_eq!(calc.contribution("b"), Some(2.0));
        assert!(calc.unregister("a").is_none());
    }

    #[test]
    fn unregister_drops_episode_total() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(
            RewardConfig::default(),
            vec![TestReward::new("gone", 0, 1.0, &log), TestReward::new("kept", 0, 2.0, &log)],
            &mut ctx,
        );
        calc.calculate_step_reward(&mut ctx, 0.02);
        calc.unregister("gone");
        assert_eq!(calc.episode_totals().keys().collect::<Vec<_>>(), vec!["kept"]);
    }

    #[test]
    fn episode_begin_resets_totals() {
        let log = new_log();
        let mut ctx = ctx();
        let mut calc = calculator(RewardConfig::default(), vec![TestReward::new("a", 0, 1.0, &log)], &mut ctx);
        calc.calculate_step_reward(&mut ctx, 0.02);
        calc.calculate_step_reward(&mut ctx, 0.02);
        assert_eq!(calc.episode_cumulative_reward(), 2.0);
        assert_eq!(calc.episode_totals().get("a"), Some(&2.0));

        ctx.begin_episode();
        calc.on_episode_begin(&mut ctx);
        assert_eq!(calc.episode_cumulative_reward(), 0.0);
        assert!(calc.episode_totals().is_empty());
    }

    proptest! {
        #[test]
        fn clamped_result_stays_in_bounds(
            values in prop::collection::vec(-1.0e6_f32..1.0e6, 0..8),
            min in -100.0_f32..0.0,
            max in 0.0_f32..100.0,
        ) {
            let log = new_log();
            let mut ctx = ctx();
            let providers = values
                .iter()
                .enumerate()
                .map(|(i, &v)| TestReward::new(&format!("p{i}"), 0, v, &log))
                .collect();
            let mut calc = calculator(RewardConfig::clamped(min, max), providers, &mut ctx);
            let r = calc.calculate_step_reward(&mut ctx, 0.02);
            prop_assert!(r >= min && r <= max);
        }

        #[test]
        fn non_finite_never_reaches_context(
            values in prop::collection::vec(
                prop_oneof![
                    Just(f32::NAN),
                    Just(f32::INFINITY),
                    Just(f32::NEG_INFINITY),
                    -10.0_f32..10.0,
                ],
                1..8,
            ),
        ) {
            let log = new_log();
            let mut ctx = ctx();
            let providers = values
                .iter()
                .enumerate()
                .map(|(i, &v)| TestReward::new(&format!("p{i}"), 0, v, &log))
                .collect();
            let mut calc = calculator(RewardConfig::default(), providers, &mut ctx);
            let r = calc.calculate_step_reward(&mut ctx, 0.02);
            prop_assert!(r.is_finite());
            prop_assert!(ctx.cumulative_reward().is_finite());
        }
    }
}

// ── DecisionRouter ────────────────────────────────────────────────────────────

#[cfg(test)]
mod decision_tests {
    use super::*;
    use crate::{DecisionConfig, DecisionMode, DecisionOutcome, DecisionRouter};
    use ac_provider::{ActionBuffers, DecisionProvider};

    struct TestDecision {
        name:     String,
        priority: i32,
        wants:    bool,
        value:    f32,
        fail:     bool,
        active:   bool,
        log:      Log,
    }

    impl TestDecision {
        fn new(name: &str, priority: i32, wants: bool, value: f32, log: &Log) -> Box<Self> {
            Box::new(Self {
                name:     name.to_string(),
                priority,
                wants,
                value,
                fail:     false,
                active:   true,
                log:      log.clone(),
            })
        }
    }

    impl Provider for TestDecision {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    impl DecisionProvider for TestDecision {
        fn should_decide(&mut self, _ctx: &AgentContext, _obs: &[f32]) -> ProviderResult<bool> {
            self.log.borrow_mut().push(format!("poll:{}", self.name));
            Ok(self.wants)
        }

        fn decide_action(
            &mut self,
            _ctx:    &AgentContext,
            _obs:    &[f32],
            actions: &mut ActionBuffers,
        ) -> ProviderResult<()> {
            self.log.borrow_mut().push(format!("decide:{}", self.name));
            actions.continuous.fill(self.value);
            actions.discrete.fill(1);
            if self.fail {
                return Err(ProviderError::failed("inference backend unavailable"));
            }
            Ok(())
        }
    }

    fn router(config: DecisionConfig, providers: Vec<Box<TestDecision>>, ctx: &mut AgentContext) -> DecisionRouter {
        let mut router = DecisionRouter::new(config);
        for p in providers {
            router.add_decision_provider(p, ctx).unwrap();
        }
        router.initialize(ctx);
        router
    }

    fn decides(log: &Log) -> Vec<String> {
        entries(log).into_iter().filter(|e| e.starts_with("decide:")).collect()
    }

    #[test]
    fn auto_picks_highest_priority_opt_in() {
        let log = new_log();
        let mut ctx = ctx();
        let mut r = router(
            DecisionConfig::default(),
            vec![TestDecision::new("low", 10, true, 0.1, &log), TestDecision::new("high", 100, true, 0.9, &log)],
            &mut ctx,
        );
        let mut actions = ActionBuffers::zeroed(2, 1);
        let outcome = r.decide_action(&ctx, &[], &mut actions);

        assert_eq!(outcome, DecisionOutcome::Delegated { provider: "high".into() });
        assert_eq!(decides(&log), vec!["decide:high"]);
        assert_eq!(actions.continuous, vec![0.9, 0.9]);
        assert_eq!(r.last_decider(), Some("high"));
    }

    #[test]
    fn every_active_provider_is_polled() {
        let log = new_log();
        let mut ctx = ctx();
        let mut r = router(
            DecisionConfig::default(),
            vec![
                TestDecision::new("a", 100, true, 0.0, &log),
                TestDecision::new("b", 50, false, 0.0, &log),
                TestDecision::new("c", 10, true, 0.0, &log),
            ],
            &mut ctx,
        );
        r.decide_action(&ctx, &[], &mut ActionBuffers::zeroed(1, 0));
        let polls: Vec<String> = entries(&log).into_iter().filter(|e| e.starts_with("poll:")).collect();
        assert_eq!(polls, vec!["poll:a", "poll:b", "poll:c"]);
    }

    #[test]
    fn equal_priority_resolves_by_name() {
        let log = new_log();
        let mut ctx = ctx();
        let mut r = router(
            DecisionConfig::default(),
            vec![TestDecision::new("beta", 5, true, 0.0, &log), TestDecision::new("alpha", 5, true, 0.0, &log)],
            &mut ctx,
        );
        assert_eq!(r.select(&ctx, &[]), Some("alpha".to_string()));
    }

    #[test]
    fn falls_back_to_first_registered_when_nobody_opts_in() {
        let log = new_log();
        let mut ctx = ctx();
        let mut r = router(
            DecisionConfig::default(),
            vec![TestDecision::new("first", 0, false, 0.3, &log), TestDecision::new("second", 9, false, 0.6, &log)],
            &mut ctx,
        );
        assert_eq!(r.default_provider(), Some("first"));
        let mut actions = ActionBuffers::zeroed(1, 0);
        let outcome = r.decide_action(&ctx, &[], &mut actions);
        assert_eq!(outcome, DecisionOutcome::Fallback { provider: "first".into() });
        assert_eq!(actions.continuous, vec![0.3]);
    }

    #[test]
    fn configured_default_wins_over_first_registered() {
        let log = new_log();
        let mut ctx = ctx();
        let config = DecisionConfig { default_provider_id: Some("second".into()), ..Default::default() };
        let r = router(
            config,
            vec![TestDecision::new("first", 0, false, 0.0, &log), TestDecision::new("second", 0, false, 0.0, &log)],
            &mut ctx,
        );
        assert_eq!(r.default_provider(), Some("second"));
    }

    #[test]
    fn no_eligible_and_no_default_zeroes_buffers() {
        let mut ctx = ctx();
        let mut r = router(DecisionConfig::default(), Vec::new(), &mut ctx);
        let mut actions = ActionBuffers { continuous: vec![0.5, -0.7, 1.0], discrete: vec![2, 3] };
        let outcome = r.decide_action(&ctx, &[], &mut actions);
        assert_eq!(outcome, DecisionOutcome::Cleared);
        assert_eq!(actions.continuous, vec![0.0, 0.0, 0.0]);
        assert_eq!(actions.discrete, vec![0, 0]);
    }

    #[test]
    fn priority_only_has_no_fallback() {
        let log = new_log();
        let mut ctx = ctx();
        let config = DecisionConfig { mode: DecisionMode::PriorityOnly, ..Default::default() };
        let mut r = router(config, vec![TestDecision::new("idle", 0, false, 0.4, &log)], &mut ctx);
        let mut actions = ActionBuffers { continuous: vec![0.5], discrete: vec![1] };
        assert_eq!(r.decide_action(&ctx, &[], &mut actions), DecisionOutcome::Cleared);
        assert!(actions.is_zero());
        assert!(decides(&log).is_empty());
    }

    #[test]
    fn manual_mode_uses_bound_provider() {
        let log = new_log();
        let mut ctx = ctx();
        let mut r = router(
            DecisionConfig::default(),
            vec![TestDecision::new("model", 100, true, 0.9, &log), TestDecision::new("keyboard", 0, false, 0.2, &log)],
            &mut ctx,
        );
        r.set_decision_mode(DecisionMode::Manual, Some("keyboard".into()));
        let mut actions = ActionBuffers::zeroed(1, 0);
        let outcome = r.decide_action(&ctx, &[], &mut actions);
        assert_eq!(outcome, DecisionOutcome::Delegated { provider: "keyboard".into() });
        assert_eq!(actions.continuous, vec![0.2]);
    }

    #[test]
    fn manual_mode_falls_through_when_bound_inactive() {
        let log = new_log();
        let mut ctx = ctx();
        let mut keyboard = TestDecision::new("keyboard", 0, false, 0.2, &log);
        keyboard.active = false;
        let config = DecisionConfig {
            mode: DecisionMode::Manual,
            manual_provider_id: Some("keyboard".into()),
            ..Default::default()
        };
        let mut r = router(config, vec![TestDecision::new("model", 100, true, 0.9, &log), keyboard], &mut ctx);
        let outcome = r.decide_action(&ctx, &[], &mut ActionBuffers::zeroed(1, 0));
        assert_eq!(outcome.provider(), Some("model"));
    }

    #[test]
    fn failure_zeroes_buffers() {
        let log = new_log();
        let mut ctx = ctx();
        let mut broken = TestDecision::new("model", 10, true, 0.8, &log);
        broken.fail = true;
        let mut r = router(DecisionConfig::default(), vec![broken], &mut ctx);
        let mut actions = ActionBuffers::zeroed(2, 2);
        let outcome = r.decide_action(&ctx, &[], &mut actions);
        assert_eq!(outcome, DecisionOutcome::Failed { provider: "model".into() });
        assert!(actions.is_zero());
        assert_eq!(r.last_decider(), None);
    }

    #[test]
    fn removing_default_re_resolves() {
        let log = new_log();
        let mut ctx = ctx();
        let mut r = router(
            DecisionConfig::default(),
            vec![TestDecision::new("a", 0, false, 0.0, &log), TestDecision::new("b", 0, false, 0.0, &log)],
            &mut ctx,
        );
        assert_eq!(r.default_provider(), Some("a"));
        assert!(r.remove_decision_provider("a").is_some());
        assert_eq!(r.default_provider(), Some("b"));
        assert!(r.remove_decision_provider("b").is_some());
        assert_eq!(r.default_provider(), None);
    }

    #[test]
    fn duplicate_id_rejected() {
        let log = new_log();
        let mut ctx = ctx();
        let mut r = router(DecisionConfig::default(), vec![TestDecision::new("a", 0, true, 0.0, &log)], &mut ctx);
        assert!(r.add_decision_provider(TestDecision::new("a", 99, true, 0.0, &log), &mut ctx).is_err());
        assert_eq!(r.registry().len(), 1);
    }

    #[test]
    fn set_mode_rebinds_default() {
        let log = new_log();
        let mut ctx = ctx();
        let mut r = router(
            DecisionConfig::default(),
            vec![TestDecision::new("a", 0, false, 0.0, &log), TestDecision::new("b", 0, false, 0.0, &log)],
            &mut ctx,
        );
        r.set_decision_mode(DecisionMode::Auto, Some("b".into()));
        assert_eq!(r.default_provider(), Some("b"));
        assert_eq!(r.mode(), DecisionMode::Auto);
    }
}

// ── EpisodeManager ────────────────────────────────────────────────────────────

#[cfg(test)]
mod episode_tests {
    use super::*;
    use crate::{EpisodeConfig, EpisodeManager};
    use ac_provider::EpisodeHandler;

    struct TestHandler {
        name:        String,
        end:         Option<EpisodeEndReason>,
        allow_start: bool,
        log:         Log,
    }

    impl TestHandler {
        fn new(name: &str, end: Option<EpisodeEndReason>, log: &Log) -> Box<Self> {
            Box::new(Self { name: name.to_string(), end, allow_start: true, log: log.clone() })
        }
    }

    impl Provider for TestHandler {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_episode_begin(&mut self, _ctx: &mut AgentContext) -> ProviderResult<()> {
            self.log.borrow_mut().push(format!("begin:{}", self.name));
            Ok(())
        }

        fn on_episode_end(&mut self, _ctx: &mut AgentContext, reason: EpisodeEndReason) -> ProviderResult<()> {
            self.log.borrow_mut().push(format!("end:{}:{}", self.name, reason));
            Ok(())
        }
    }

    impl EpisodeHandler for TestHandler {
        fn should_start_episode(&mut self, _ctx: &AgentContext) -> ProviderResult<bool> {
            Ok(self.allow_start)
        }

        fn should_end_episode(&mut self, _ctx: &AgentContext) -> ProviderResult<Option<EpisodeEndReason>> {
            Ok(self.end)
        }
    }

    fn manager(config: EpisodeConfig, handlers: Vec<Box<TestHandler>>, ctx: &mut AgentContext) -> EpisodeManager {
        let mut m = EpisodeManager::new(config);
        for h in handlers {
            m.register(h, ctx).unwrap();
        }
        m.initialize(ctx);
        m
    }

    #[test]
    fn any_handler_ends_episode_and_each_is_notified_once() {
        let log = new_log();
        let mut ctx = AgentContext::new("agent-0");
        let mut m = manager(
            EpisodeConfig::default(),
            vec![
                TestHandler::new("h1", None, &log),
                TestHandler::new("h2", Some(EpisodeEndReason::BoundaryViolation), &log),
            ],
            &mut ctx,
        );
        m.begin_episode(&mut ctx);

        let reason = m.check_end(&ctx).unwrap();
        assert_eq!(reason, EpisodeEndReason::BoundaryViolation);
        assert!(m.end_episode(&mut ctx, reason));
        assert!(!m.end_episode(&mut ctx, reason), "second end is a no-op");

        let ends: Vec<String> = entries(&log).into_iter().filter(|e| e.starts_with("end:")).collect();
        assert_eq!(ends, vec!["end:h1:boundary_violation", "end:h2:boundary_violation"]);
        assert_eq!(ctx.last_end_reason(), Some(EpisodeEndReason::BoundaryViolation));
        assert_eq!(m.episodes_completed(), 1);
    }

    #[test]
    fn max_steps_ends_episode() {
        let mut ctx = AgentContext::new("agent-0");
        let config = EpisodeConfig { max_steps: 3, ..Default::default() };
        let mut m = manager(config, Vec::new(), &mut ctx);
        m.begin_episode(&mut ctx);
        for _ in 0..2 {
            ctx.advance(0.02);
            assert_eq!(m.check_end(&ctx), None);
        }
        ctx.advance(0.02);
        assert_eq!(m.check_end(&ctx), Some(EpisodeEndReason::MaxStepsReached));
    }

    #[test]
    fn time_limit_ends_episode() {
        let mut ctx = AgentContext::new("agent-0");
        let config = EpisodeConfig { time_limit_secs: Some(1.5), ..Default::default() };
        let mut m = manager(config, Vec::new(), &mut ctx);
        m.begin_episode(&mut ctx);
        ctx.advance(1.0);
        assert_eq!(m.check_end(&ctx), None);
        ctx.advance(1.0);
        assert_eq!(m.check_end(&ctx), Some(EpisodeEndReason::TimeLimit));
    }

    #[test]
    fn explicit_request_wins_and_first_request_sticks() {
        let log = new_log();
        let mut ctx = AgentContext::new("agent-0");
        let mut m = manager(
            EpisodeConfig::default(),
            vec![TestHandler::new("h", Some(EpisodeEndReason::Failure), &log)],
            &mut ctx,
        );
        m.begin_episode(&mut ctx);
        m.request_end(EpisodeEndReason::ManualReset);
        m.request_end(EpisodeEndReason::Success);
        assert_eq!(m.check_end(&ctx), Some(EpisodeEndReason::ManualReset));
    }

    #[test]
    fn context_request_is_honored() {
        let mut ctx = AgentContext::new("agent-0");
        let mut m = manager(EpisodeConfig::default(), Vec::new(), &mut ctx);
        m.begin_episode(&mut ctx);
        ctx.request_episode_end(EpisodeEndReason::Success);
        assert_eq!(m.check_end(&ctx), Some(EpisodeEndReason::Success));
    }

    #[test]
    fn handler_can_veto_start() {
        let log = new_log();
        let mut ctx = AgentContext::new("agent-0");
        let mut blocker = TestHandler::new("blocker", None, &log);
        blocker.allow_start = false;
        let mut m = manager(EpisodeConfig::default(), vec![blocker, TestHandler::new("ok", None, &log)], &mut ctx);
        assert!(!m.can_start(&ctx));
    }

    #[test]
    fn begin_while_active_resets_first() {
        let log = new_log();
        let mut ctx = AgentContext::new("agent-0");
        let mut m = manager(EpisodeConfig::default(), vec![TestHandler::new("h", None, &log)], &mut ctx);
        m.begin_episode(&mut ctx);
        m.begin_episode(&mut ctx);
        assert_eq!(
            entries(&log),
            vec!["begin:h", "end:h:manual_reset", "begin:h"]
        );
        assert_eq!(ctx.episode_count(), 2);
        assert!(ctx.is_episode_active());
    }

    #[test]
    fn no_end_check_without_active_episode() {
        let log = new_log();
        let mut ctx = AgentContext::new("agent-0");
        let mut m = manager(
            EpisodeConfig::default(),
            vec![TestHandler::new("h", Some(EpisodeEndReason::Failure), &log)],
            &mut ctx,
        );
        assert_eq!(m.check_end(&ctx), None);
    }
}

// ── ObservationCollector ──────────────────────────────────────────────────────

#[cfg(test)]
mod observation_tests {
    use super::*;
    use crate::ObservationCollector;
    use ac_provider::{ObservationProvider, ObservationSink};

    struct TestObs {
        name:     String,
        priority: i32,
        size:     usize,
        values:   Vec<f32>,
        active:   bool,
        panics:   bool,
    }

    impl TestObs {
        fn new(name: &str, priority: i32, size: usize, values: Vec<f32>) -> Box<Self> {
            Box::new(Self { name: name.to_string(), priority, size, values, active: true, panics: false })
        }
    }

    impl Provider for TestObs {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    impl ObservationProvider for TestObs {
        fn observation_size(&self) -> usize {
            self.size
        }

        fn collect_observations(&mut self, _ctx: &AgentContext, sink: &mut ObservationSink) -> ProviderResult<()> {
            if self.panics {
                panic!("sensor disconnected");
            }
            sink.add_slice(&self.values);
            Ok(())
        }
    }

    fn collector(providers: Vec<Box<TestObs>>, ctx: &mut AgentContext) -> ObservationCollector {
        let mut c = ObservationCollector::new();
        for p in providers {
            c.register(p, ctx).unwrap();
        }
        c.initialize(ctx);
        c
    }

    #[test]
    fn misbehaving_sizes_never_shift_offsets() {
        let mut ctx = ctx();
        let mut c = collector(
            vec![
                TestObs::new("wide", 10, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0]),
                TestObs::new("narrow", 0, 2, vec![9.0]),
            ],
            &mut ctx,
        );
        assert_eq!(c.total_size(), 5);
        assert_eq!(c.collect(&ctx), &[1.0, 2.0, 3.0, 9.0, 0.0]);
    }

    #[test]
    fn concatenates_in_priority_order() {
        let mut ctx = ctx();
        let mut c = collector(
            vec![TestObs::new("low", 0, 1, vec![0.5]), TestObs::new("high", 5, 2, vec![1.0, 1.5])],
            &mut ctx,
        );
        assert_eq!(c.collect(&ctx), &[1.0, 1.5, 0.5]);
        let layout = c.layout();
        assert_eq!(layout[0], ("high", 0..2));
        assert_eq!(layout[1], ("low", 2..3));
    }

    #[test]
    fn inactive_and_panicking_providers_are_zero_filled() {
        let mut ctx = ctx();
        let mut off = TestObs::new("off", 10, 2, vec![7.0, 7.0]);
        off.active = false;
        let mut bad = TestObs::new("bad", 5, 1, vec![7.0]);
        bad.panics = true;
        let mut c = collector(vec![off, bad, TestObs::new("ok", 0, 1, vec![3.0])], &mut ctx);
        assert_eq!(c.collect(&ctx), &[0.0, 0.0, 0.0, 3.0]);
    }

    #[test]
    fn non_finite_values_are_sanitized() {
        let mut ctx = ctx();
        let mut c = collector(
            vec![TestObs::new("raw", 0, 3, vec![f32::NAN, 1.0, f32::NEG_INFINITY])],
            &mut ctx,
        );
        assert_eq!(c.collect(&ctx), &[0.0, 1.0, 0.0]);
    }
}

// ── ActionDistributor ─────────────────────────────────────────────────────────

#[cfg(test)]
mod action_tests {
    use super::*;
    use crate::ActionDistributor;
    use ac_core::ActionSpec;
    use ac_provider::{ActionBuffers, ActionReceiver, ActionSegment, ActionSegmentMut};

    type Received = Rc<RefCell<Vec<(String, Vec<f32>, Vec<i32>, usize, usize)>>>;

    struct TestReceiver {
        name:       String,
        priority:   i32,
        continuous: usize,
        branches:   Vec<usize>,
        heuristic:  f32,
        fail:       bool,
        received:   Received,
    }

    impl TestReceiver {
        fn new(name: &str, priority: i32, continuous: usize, branches: Vec<usize>, received: &Received) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                priority,
                continuous,
                branches,
                heuristic: 0.5,
                fail: false,
                received: received.clone(),
            })
        }
    }

    impl Provider for TestReceiver {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    impl ActionReceiver for TestReceiver {
        fn continuous_action_count(&self) -> usize {
            self.continuous
        }

        fn discrete_branch_sizes(&self) -> &[usize] {
            &self.branches
        }

        fn receive_actions(&mut self, _ctx: &mut AgentContext, actions: ActionSegment<'_>) -> ProviderResult<()> {
            self.received.borrow_mut().push((
                self.name.clone(),
                actions.continuous.to_vec(),
                actions.discrete.to_vec(),
                actions.continuous_start,
                actions.discrete_start,
            ));
            Ok(())
        }

        fn heuristic(&mut self, _ctx: &AgentContext, out: ActionSegmentMut<'_>) -> ProviderResult<()> {
            out.continuous.fill(self.heuristic);
            out.discrete.fill(1);
            if self.fail {
                return Err(ProviderError::failed("no input device"));
            }
            Ok(())
        }
    }

    fn distributor(received: &Received, ctx: &mut AgentContext) -> ActionDistributor {
        let mut d = ActionDistributor::new();
        d.register(TestReceiver::new("move", 10, 2, vec![3], received), ctx).unwrap();
        d.register(TestReceiver::new("jump", 0, 1, vec![2, 2], received), ctx).unwrap();
        d.initialize(ctx);
        d
    }

    #[test]
    fn action_spec_concatenates_receivers() {
        let received = Received::default();
        let mut ctx = ctx();
        let d = distributor(&received, &mut ctx);
        assert_eq!(
            d.action_spec(),
            ActionSpec { continuous_actions: 3, discrete_branches: vec![3, 2, 2] }
        );
    }

    #[test]
    fn slices_by_running_offsets() {
        let received = Received::default();
        let mut ctx = ctx();
        let mut d = distributor(&received, &mut ctx);
        let actions = ActionBuffers { continuous: vec![0.1, 0.2, 0.3], discrete: vec![2, 1, 0] };

        assert_eq!(d.distribute(&mut ctx, &actions), 2);
        let got = received.borrow();
        assert_eq!(got[0], ("move".to_string(), vec![0.1, 0.2], vec![2], 0, 0));
        assert_eq!(got[1], ("jump".to_string(), vec![0.3], vec![1, 0], 2, 1));
    }

    #[test]
    fn short_buffers_are_zero_padded() {
        let received = Received::default();
        let mut ctx = ctx();
        let mut d = distributor(&received, &mut ctx);
        let actions = ActionBuffers { continuous: vec![0.1], discrete: Vec::new() };

        assert_eq!(d.distribute(&mut ctx, &actions), 2);
        let got = received.borrow();
        assert_eq!(got[0].1, vec![0.1, 0.0]);
        assert_eq!(got[1].1, vec![0.0]);
        assert_eq!(got[1].2, vec![0, 0]);
    }

    #[test]
    fn heuristic_fills_and_zeroes_failed_segments() {
        let received = Received::default();
        let mut ctx = ctx();
        let mut d = ActionDistributor::new();
        let mut broken = TestReceiver::new("broken", 0, 1, vec![2], &received);
        broken.fail = true;
        d.register(TestReceiver::new("ok", 5, 2, Vec::new(), &received), &mut ctx).unwrap();
        d.register(broken, &mut ctx).unwrap();
        d.initialize(&mut ctx);

        let mut out = ActionBuffers::default();
        d.heuristic(&ctx, &mut out);
        assert_eq!(out.continuous, vec![0.5, 0.5, 0.0]);
        assert_eq!(out.discrete, vec![0]);
    }
}

// ── SensorManager ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod sensor_tests {
    use super::*;
    use crate::{SensorConfig, SensorManager};
    use ac_provider::{LodLevel, SensorFrame, SensorProvider};

    struct TestSensor {
        name: String,
        log:  Log,
    }

    impl Provider for TestSensor {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl SensorProvider for TestSensor {
        fn update_sensor(&mut self, _ctx: &mut AgentContext, frame: SensorFrame<'_>) -> ProviderResult<()> {
            self.log.borrow_mut().push(self.name.clone());
            frame.cache.insert(format!("{}/hits", self.name), 3_u32);
            Ok(())
        }
    }

    fn manager(config: SensorConfig, names: &[&str], log: &Log, ctx: &mut AgentContext) -> SensorManager {
        let mut m = SensorManager::new(config);
        for name in names {
            m.register(Box::new(TestSensor { name: name.to_string(), log: log.clone() }), ctx).unwrap();
        }
        m.initialize(ctx);
        m
    }

    #[test]
    fn interval_throttles_updates() {
        let log = new_log();
        let mut ctx = ctx();
        let config = SensorConfig { update_interval_secs: 0.5, ..Default::default() };
        let mut m = manager(config, &["cam"], &log, &mut ctx);
        let mut per_frame = Vec::new();
        for _ in 0..5 {
            ctx.advance(0.25);
            per_frame.push(m.update(&mut ctx));
        }
        // t = 0.25, 0.50, 0.75, 1.00, 1.25
        assert_eq!(per_frame, vec![1, 0, 1, 0, 1]);
    }

    #[test]
    fn time_slicing_round_robins() {
        let log = new_log();
        let mut ctx = ctx();
        let config = SensorConfig { time_sliced: true, max_sensors_per_frame: 2, ..SensorConfig::every_frame() };
        let mut m = manager(config, &["s0", "s1", "s2", "s3", "s4"], &log, &mut ctx);
        for _ in 0..3 {
            ctx.advance(0.02);
            assert_eq!(m.update(&mut ctx), 2);
        }
        assert_eq!(entries(&log), vec!["s0", "s1", "s2", "s3", "s4", "s0"]);
    }

    #[test]
    fn lod_bands_and_culling() {
        let log = new_log();
        let mut ctx = ctx();
        let config = SensorConfig { enable_lod: true, ..SensorConfig::every_frame() };
        let mut m = manager(config, &["cam"], &log, &mut ctx);

        m.set_viewer_distance(Some(5.0));
        assert_eq!(m.current_lod(), LodLevel::High);
        m.set_viewer_distance(Some(15.0));
        assert_eq!(m.current_lod(), LodLevel::Medium);
        m.set_viewer_distance(Some(1000.0));
        assert_eq!(m.current_lod(), LodLevel::Culled);

        ctx.advance(0.02);
        assert_eq!(m.update(&mut ctx), 0);
        assert!(entries(&log).is_empty());
        assert_eq!(m.force_update_all(&mut ctx), 1);
    }

    #[test]
    fn cache_entries_expire() {
        let log = new_log();
        let mut ctx = ctx();
        let config = SensorConfig { update_interval_secs: 10.0, cache_ttl_secs: 0.5, ..Default::default() };
        let mut m = manager(config, &["ray"], &log, &mut ctx);

        ctx.advance(0.25);
        m.update(&mut ctx);
        assert_eq!(m.cache().get::<u32>("ray/hits"), Some(&3));

        ctx.advance(1.0);
        m.update(&mut ctx);
        assert_eq!(m.cache().get::<u32>("ray/hits"), None);
        assert!(m.cache().is_empty());
    }
}

// ── StatisticsCollector ───────────────────────────────────────────────────────

#[cfg(test)]
mod statistics_tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::StatisticsCollector;
    use ac_provider::StatisticsProvider;

    struct Speed {
        value: Rc<Cell<f32>>,
    }

    impl Provider for Speed {}

    impl StatisticsProvider for Speed {
        fn collect_statistics(&mut self, _ctx: &AgentContext) -> ProviderResult<BTreeMap<String, f32>> {
            Ok(BTreeMap::from([
                ("mean".to_string(), self.value.get()),
                ("max".to_string(), 10.0),
                ("bogus".to_string(), f32::NAN),
            ]))
        }
    }

    struct Broken;

    impl Provider for Broken {}

    impl StatisticsProvider for Broken {
        fn collect_statistics(&mut self, _ctx: &AgentContext) -> ProviderResult<BTreeMap<String, f32>> {
            Err(ProviderError::failed("counter overflow"))
        }
    }

    #[test]
    fn namespaces_and_tracks_changes() {
        let mut ctx = ctx();
        let value = Rc::new(Cell::new(1.0));
        let mut stats = StatisticsCollector::new();
        stats.register(Box::new(Speed { value: value.clone() }), &mut ctx).unwrap();
        stats.register(Box::new(Broken), &mut ctx).unwrap();
        stats.initialize(&mut ctx);

        assert_eq!(stats.collect(&ctx), 2);
        assert_eq!(stats.get("Speed/mean"), Some(1.0));
        assert_eq!(stats.get("Speed/bogus"), None);
        assert_eq!(stats.changed_since_last().len(), 2);

        stats.collect(&ctx);
        assert!(stats.changed_since_last().is_empty());

        value.set(2.5);
        stats.collect(&ctx);
        let changed = stats.changed_since_last();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed.get("Speed/mean"), Some(&2.5));
        assert_eq!(stats.all_current().len(), 2);
    }

    #[test]
    fn re_registered_provider_reports_again() {
        let mut ctx = ctx();
        let value = Rc::new(Cell::new(1.0));
        let mut stats = StatisticsCollector::new();
        stats.register(Box::new(Speed { value: value.clone() }), &mut ctx).unwrap();
        stats.initialize(&mut ctx);
        stats.collect(&ctx);
        assert_eq!(stats.changed_since_last().len(), 2);

        assert!(stats.unregister("Speed").is_some());
        assert!(stats.all_current().is_empty());
        stats.register(Box::new(Speed { value }), &mut ctx).unwrap();
        stats.collect(&ctx);

        let changed = stats.changed_since_last();
        assert_eq!(changed.get("Speed/mean"), Some(&1.0));
        assert_eq!(changed.get("Speed/max"), Some(&10.0));
    }
}
