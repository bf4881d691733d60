//! The engine owns one session: an ECS world holding the state, the
//! tunables and the market RNG, plus the schedule that advances it.

use std::sync::Arc;
use std::time::Duration;

use bevy_ecs::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::{
    validate_config, Action, ActionOutcome, GameConfig, PriceDirection, RoundId,
    SimulationState, UpgradeId, ValidationError,
};
use tracing::{debug, info};

use crate::actions;
use crate::snapshot::{SchedulerState, SimSnapshot};
use crate::tick::{build_schedule, MarketRng, Store, Tunables};

pub struct Engine {
    world: World,
    schedule: Schedule,
    config: Arc<GameConfig>,
}

impl Engine {
    /// Validate `config` and start a fresh session seeded from `rng_seed`.
    pub fn new(config: GameConfig) -> Result<Self, ValidationError> {
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: GameConfig, rng: ChaCha8Rng) -> Result<Self, ValidationError> {
        validate_config(&config)?;
        let state = SimulationState::new(&config);
        info!(seed = config.rng_seed, tick_ms = config.tick_interval_ms, "engine initialized");
        Ok(Self::assemble(Arc::new(config), state, rng))
    }

    /// Resume from an existing state, e.g. one restored from JSON.
    pub fn with_state(config: GameConfig, state: SimulationState) -> Result<Self, ValidationError> {
        validate_config(&config)?;
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Ok(Self::assemble(Arc::new(config), state, rng))
    }

    fn assemble(config: Arc<GameConfig>, state: SimulationState, rng: ChaCha8Rng) -> Self {
        let mut world = World::new();
        world.insert_resource(Store(state));
        world.insert_resource(Tunables(Arc::clone(&config)));
        world.insert_resource(MarketRng(rng));
        Self {
            world,
            schedule: build_schedule(),
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.world.resource::<Store>().0
    }

    fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.world.resource_mut::<Store>().into_inner().0
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        SchedulerState::of(self.state())
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot::capture(self.state(), &self.config)
    }

    /// Advance one tick. Returns false, leaving the state untouched, while
    /// paused or halted.
    pub fn tick(&mut self) -> bool {
        if self.scheduler_state() != SchedulerState::Running {
            return false;
        }
        self.state_mut().tick += 1;
        self.schedule.run(&mut self.world);
        true
    }

    /// Run up to `n` ticks; stops early on a pause or a terminal outcome.
    /// Returns the number of ticks executed.
    pub fn run_ticks(&mut self, n: u64) -> u64 {
        let mut executed = 0;
        while executed < n && self.tick() {
            executed += 1;
        }
        executed
    }

    /// Run the ticks that fit into `elapsed` of game time.
    pub fn run_for(&mut self, elapsed: Duration) -> u64 {
        let per_tick = self.config.tick_interval().as_millis().max(1);
        let n = elapsed.as_millis() / per_tick;
        self.run_ticks(u64::try_from(n).unwrap_or(u64::MAX))
    }

    pub fn apply(&mut self, action: &Action) -> ActionOutcome {
        let config = Arc::clone(&self.config);
        let outcome = actions::apply(self.state_mut(), &config, action);
        match &outcome {
            ActionOutcome::Applied => debug!(?action, "action applied"),
            ActionOutcome::Rejected(reason) => debug!(?action, %reason, "action rejected"),
        }
        outcome
    }

    pub fn produce_one(&mut self) -> ActionOutcome {
        self.apply(&Action::ProduceOne)
    }

    /// Buy `batch_size` units of resource; see
    /// `ProductionConfig::resource_batch_size` for the standard batch.
    pub fn purchase_resource_batch(&mut self, batch_size: u32) -> ActionOutcome {
        self.apply(&Action::PurchaseResourceBatch { batch_size })
    }

    pub fn adjust_price(&mut self, direction: PriceDirection) -> ActionOutcome {
        self.apply(&Action::AdjustPrice { direction })
    }

    pub fn purchase_upgrade(&mut self, upgrade_id: impl Into<UpgradeId>) -> ActionOutcome {
        self.apply(&Action::PurchaseUpgrade {
            upgrade_id: upgrade_id.into(),
        })
    }

    pub fn purchase_marketing_level(&mut self) -> ActionOutcome {
        self.apply(&Action::PurchaseMarketingLevel)
    }

    pub fn raise_funding_round(&mut self, round_id: impl Into<RoundId>) -> ActionOutcome {
        self.apply(&Action::RaiseFundingRound {
            round_id: round_id.into(),
        })
    }

    pub fn launch_mvp(&mut self) -> ActionOutcome {
        self.apply(&Action::LaunchMvp)
    }

    pub fn setup_holding(&mut self) -> ActionOutcome {
        self.apply(&Action::SetupHolding)
    }

    pub fn trigger_exit(&mut self) -> ActionOutcome {
        self.apply(&Action::TriggerExit)
    }

    pub fn acknowledge_milestone(&mut self) -> ActionOutcome {
        self.apply(&Action::AcknowledgeMilestone)
    }

    /// Start over from the configured initial conditions. The RNG stream
    /// continues; it is not reseeded.
    pub fn restart_session(&mut self) -> ActionOutcome {
        self.apply(&Action::RestartSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use sim_core::{Rejection, Stage};

    fn engine() -> Engine {
        Engine::new(GameConfig::default()).unwrap()
    }

    fn engine_from(state: SimulationState) -> Engine {
        Engine::with_state(GameConfig::default(), state).unwrap()
    }

    #[test]
    fn invalid_config_is_refused() {
        let cfg = GameConfig {
            tick_interval_ms: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            Engine::new(cfg),
            Err(ValidationError::ZeroTickInterval)
        ));
    }

    #[test]
    fn new_session_matches_initial_conditions() {
        let e = engine();
        let s = e.state();
        assert_eq!(s.tick, 0);
        assert_eq!(s.resource_stock, 1000.0);
        assert_eq!(s.resource_unit_cost, Decimal::new(20, 0));
        assert_eq!(s.cash, Decimal::ZERO);
        assert_eq!(s.unit_price, Decimal::new(25, 2));
        assert_eq!(s.stage, Stage::Bootstrap);
        assert_eq!(s.log.latest(), Some("> System initialized. Start writing code."));
        assert_eq!(e.scheduler_state(), SchedulerState::Running);
    }

    #[test]
    fn ten_ticks_of_sales_earn_the_demand_share() {
        let mut e = engine();
        for _ in 0..10 {
            assert!(e.produce_one().is_applied());
        }
        assert_eq!(e.run_ticks(10), 10);
        let s = e.state();
        assert_eq!(s.tick, 10);
        assert!((s.product_inventory - 6.8).abs() < 1e-6);
        assert!((s.cash - Decimal::new(80, 2)).abs() < Decimal::new(1, 6));
        assert_eq!(s.revenue_per_sec, Decimal::new(80, 2));
    }

    #[test]
    fn batch_purchase_uses_configured_size() {
        let mut state = SimulationState::new(&GameConfig::default());
        state.cash = Decimal::new(20_000, 0);
        let mut e = engine_from(state);
        let batch = e.config().production.resource_batch_size;
        assert!(e.purchase_resource_batch(batch).is_applied());
        assert_eq!(e.state().cash, Decimal::ZERO);
        assert_eq!(e.state().resource_stock, 2000.0);
    }

    #[test]
    fn cash_victory_halts_the_session() {
        let mut cfg = GameConfig::default();
        cfg.milestones.enabled = false;
        let mut state = SimulationState::new(&cfg);
        state.cash = Decimal::new(99_999_995, 2);
        state.product_inventory = 100.0;
        state.unit_price = Decimal::ONE;
        let mut e = Engine::with_state(cfg, state).unwrap();
        assert_eq!(e.run_ticks(100), 1);
        let s = e.state().clone();
        assert!(s.is_victory);
        assert!(!s.is_bankrupt);
        assert_eq!(s.stage, Stage::Unicorn);
        assert_eq!(s.log.occurrences("You win"), 1);
        assert_eq!(e.scheduler_state(), SchedulerState::Halted);
        assert!(!e.tick());
        assert_eq!(e.state(), &s);
        assert_eq!(e.produce_one().rejection(), Some(&Rejection::SessionOver));
        assert_eq!(
            e.purchase_marketing_level().rejection(),
            Some(&Rejection::SessionOver)
        );
        assert_eq!(e.state(), &s);
    }

    #[test]
    fn burn_without_revenue_goes_bankrupt() {
        let mut cfg = GameConfig::default();
        cfg.milestones.enabled = false;
        let mut state = SimulationState::new(&cfg);
        state.upgrade_mut(&UpgradeId::from("developer")).unwrap().owned = 1;
        state.cash = Decimal::new(1, 0);
        state.resource_stock = 0.0;
        let mut e = Engine::with_state(cfg, state).unwrap();
        let ran = e.run_ticks(100);
        assert!(ran < 100);
        assert!(e.state().is_bankrupt);
        assert!(e.state().cash <= Decimal::ZERO);
        assert_eq!(e.state().log.occurrences("INSOLVENCY"), 1);
        assert_eq!(
            e.produce_one().rejection(),
            Some(&Rejection::SessionOver)
        );
    }

    #[test]
    fn milestone_pauses_until_acknowledged() {
        let mut state = SimulationState::new(&GameConfig::default());
        state.cash = Decimal::new(4_999, 0);
        state.product_inventory = 50.0;
        state.unit_price = Decimal::new(10, 0);
        let mut e = engine_from(state);
        let ran = e.run_ticks(50);
        assert!(ran < 50);
        assert_eq!(e.scheduler_state(), SchedulerState::Paused);
        let tick = e.state().tick;
        assert_eq!(e.run_ticks(5), 0);
        assert_eq!(e.state().tick, tick);
        assert_eq!(e.produce_one().rejection(), Some(&Rejection::Paused));
        assert!(e.acknowledge_milestone().is_applied());
        assert_eq!(e.scheduler_state(), SchedulerState::Running);
        assert_eq!(e.run_ticks(1), 1);
    }

    #[test]
    fn run_for_converts_game_time_to_ticks() {
        let mut e = engine();
        assert_eq!(e.run_for(Duration::from_millis(1_050)), 10);
        assert_eq!(e.state().tick, 10);
    }

    #[test]
    fn restart_returns_to_initial_conditions() {
        let mut e = engine();
        for _ in 0..60 {
            e.produce_one();
        }
        e.run_ticks(30);
        assert!(e.restart_session().is_applied());
        assert_eq!(e.state(), &SimulationState::new(e.config()));
    }

    #[test]
    fn same_seed_same_trajectory() {
        let mut a = engine();
        let mut b = engine();
        a.run_ticks(2_000);
        b.run_ticks(2_000);
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn full_funding_path_to_exit() {
        let mut cfg = GameConfig::default();
        cfg.milestones.enabled = false;
        cfg.victory.cash_threshold = Decimal::MAX;
        let mut state = SimulationState::new(&cfg);
        state.cash = Decimal::new(1_000_000, 0);
        let mut e = Engine::with_state(cfg, state).unwrap();
        e.run_ticks(1);
        assert!(e.raise_funding_round("seed").is_applied());
        assert_eq!(e.state().stage, Stage::Market);
        assert!(matches!(
            e.raise_funding_round("series_a").rejection(),
            Some(Rejection::ValuationTooLow { .. })
        ));
        let equity_before = e.state().equity_percent;
        assert!(e.trigger_exit().is_applied());
        let exit = e.state().exit.clone().unwrap();
        assert!((exit.equity_percent - equity_before).abs() < 1e-9);
        assert!(exit.payout > Decimal::ZERO);
        assert_eq!(e.run_ticks(10), 0);
    }

    proptest! {
        #[test]
        fn ticks_preserve_invariants(
            seed in any::<u64>(),
            clicks in 0usize..200,
            ticks in 1u64..300,
        ) {
            let cfg = GameConfig { rng_seed: seed, ..GameConfig::default() };
            let mut e = Engine::new(cfg).unwrap();
            for _ in 0..clicks {
                e.produce_one();
            }
            let mut last_tick = 0;
            let mut last_stage = Stage::Bootstrap;
            for _ in 0..ticks {
                if e.scheduler_state() == SchedulerState::Paused {
                    e.acknowledge_milestone();
                }
                e.tick();
                let s = e.state();
                prop_assert!(s.tick >= last_tick);
                prop_assert!(s.stage >= last_stage);
                prop_assert!(s.resource_stock >= 0.0);
                prop_assert!(s.product_inventory >= 0.0);
                prop_assert!(s.unit_price >= e.config().market.price_floor);
                prop_assert!(s.resource_unit_cost >= e.config().resource_market.cost_floor);
                prop_assert!(s.resource_unit_cost <= e.config().resource_market.cost_ceiling);
                prop_assert!((0.0..=100.0).contains(&s.equity_percent));
                prop_assert!(!(s.is_bankrupt && s.is_victory));
                last_tick = s.tick;
                last_stage = s.stage;
            }
        }
    }
}
