#![deny(warnings)]

//! Autopilot for The Unicorn Run.
//!
//! A greedy policy that looks at one state and proposes at most one action.
//! Mandatory moves come first (acknowledging milestones, raising rounds,
//! keeping automation fed); purchases are ranked by `utility`; the unit price
//! is nudged from the inventory signal; otherwise it clicks.

use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{Action, GameConfig, PriceDirection, SimulationState, Stage, UpgradeId};
use sim_econ::{marketing_upgrade_cost, money_to_f64};
use tracing::debug;

/// Tuning knobs for the autopilot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Seconds of burn kept in the bank and never spent.
    pub reserve_secs: f64,
    /// Restock when automation has less resource than this many seconds.
    pub restock_below_secs: f64,
    /// Inventory above this many seconds of demand is a glut.
    pub glut_secs: f64,
    /// Inventory below this many seconds of demand is scarce.
    pub scarce_secs: f64,
    /// Sell the company once valuation reaches this; never when unset.
    pub exit_at_valuation: Option<Decimal>,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            reserve_secs: 60.0,
            restock_below_secs: 30.0,
            glut_secs: 30.0,
            scarce_secs: 2.0,
            exit_at_valuation: None,
        }
    }
}

impl AutopilotConfig {
    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(s).context("parse autopilot config")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read autopilot config {}", path.display()))?;
        Self::from_yaml_str(&text)
    }
}

/// Score of a purchase: income gained per second per unit of cost.
/// Higher is better; zero for free or useless purchases.
pub fn utility(gain_per_sec: f64, cost: f64) -> f64 {
    if !(cost > 0.0) || !(gain_per_sec > 0.0) {
        return 0.0;
    }
    gain_per_sec / cost
}

#[derive(Clone, Debug, Default)]
pub struct Autopilot {
    cfg: AutopilotConfig,
}

impl Autopilot {
    pub fn new(cfg: AutopilotConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &AutopilotConfig {
        &self.cfg
    }

    /// Next action for `state`, or `None` when there is nothing useful to
    /// do (including after a terminal outcome).
    pub fn decide(&self, state: &SimulationState, config: &GameConfig) -> Option<Action> {
        if state.is_terminal() {
            return None;
        }
        if state.pending_milestone.is_some() {
            return Some(Action::AcknowledgeMilestone);
        }
        if let Some(target) = self.cfg.exit_at_valuation {
            if state.valuation >= target {
                return Some(Action::TriggerExit);
            }
        }
        if let Some(round) = config
            .funding_rounds
            .iter()
            .find(|r| !state.round_raised(&r.id) && state.valuation >= r.valuation_threshold)
        {
            return Some(Action::RaiseFundingRound {
                round_id: round.id.clone(),
            });
        }

        let spendable =
            (money_to_f64(state.cash) - state.burn_rate(config) * self.cfg.reserve_secs).max(0.0);
        let per_unit = config.production.resource_per_unit;
        let rate = state.production_rate(config);
        let batch = config.production.resource_batch_size;
        let batch_cost = f64::from(batch) * money_to_f64(state.resource_unit_cost);
        let can_restock = batch > 0 && batch_cost <= spendable;

        let starving =
            rate > 0.0 && state.resource_stock / (rate * per_unit) < self.cfg.restock_below_secs;
        if starving && can_restock {
            return Some(Action::PurchaseResourceBatch { batch_size: batch });
        }

        if !state.mvp_launched
            && state.cumulative_produced >= config.mvp.unlock_at
            && money_to_f64(config.mvp.cost) <= spendable
        {
            return Some(Action::LaunchMvp);
        }

        if !state.holding_setup
            && state.round_raised(&config.holding.requires_round)
            && money_to_f64(config.holding.cost) <= spendable
        {
            return Some(Action::SetupHolding);
        }

        if let Some(action) = self.best_purchase(state, config, spendable) {
            return Some(action);
        }
        if let Some(direction) = self.price_move(state, config) {
            return Some(Action::AdjustPrice { direction });
        }
        if state.resource_stock >= per_unit
            && state.product_inventory < state.demand.max(1.0) * self.cfg.glut_secs
        {
            return Some(Action::ProduceOne);
        }
        if state.resource_stock < per_unit && can_restock {
            return Some(Action::PurchaseResourceBatch { batch_size: batch });
        }
        None
    }

    fn best_purchase(
        &self,
        state: &SimulationState,
        config: &GameConfig,
        spendable: f64,
    ) -> Option<Action> {
        let price = money_to_f64(state.unit_price);
        let rate = state.production_rate(config);
        let headroom = (state.demand - rate).max(0.0);
        let revenue = money_to_f64(state.revenue_per_sec);

        let mut best: Option<(f64, Action)> = None;
        let mut consider = |score: f64, action: Action| {
            if score > 0.0 && best.as_ref().map_or(true, |(b, _)| score > *b) {
                best = Some((score, action));
            }
        };

        for def in &config.upgrades {
            let Some(slot) = state.upgrade(&def.id) else {
                continue;
            };
            let cost = money_to_f64(slot.next_cost);
            if state.cumulative_produced < def.unlock_at || cost > spendable {
                continue;
            }
            let gain = def.code_per_sec.min(headroom) * price
                - def.burn_per_sec * state.burn_multiplier
                + state.burn_rate(config) * def.burn_reduction
                + revenue * def.hype_boost;
            consider(utility(gain, cost), purchase(&def.id));
        }

        // Extra demand only pays when supply already keeps up.
        if rate >= state.demand {
            let cost = money_to_f64(marketing_upgrade_cost(
                state.marketing_level,
                config.market.marketing_base_cost,
            ));
            if cost <= spendable {
                let gain = revenue * (config.market.marketing_growth - 1.0);
                consider(utility(gain, cost), Action::PurchaseMarketingLevel);
            }
        }

        best.map(|(score, action)| {
            debug!(score, ?action, "autopilot purchase");
            action
        })
    }

    fn price_move(&self, state: &SimulationState, config: &GameConfig) -> Option<PriceDirection> {
        if state.stage < Stage::Market || !(state.demand > 0.0) {
            return None;
        }
        let stocked_secs = state.product_inventory / state.demand;
        if stocked_secs > self.cfg.glut_secs && state.unit_price > config.market.price_floor {
            Some(PriceDirection::Down)
        } else if stocked_secs < self.cfg.scarce_secs
            && state.unit_price < config.market.price_ceiling
        {
            Some(PriceDirection::Up)
        } else {
            None
        }
    }
}

fn purchase(id: &UpgradeId) -> Action {
    Action::PurchaseUpgrade {
        upgrade_id: id.clone(),
    }
}

/// Decision of the default autopilot.
pub fn next_action(state: &SimulationState, config: &GameConfig) -> Option<Action> {
    Autopilot::default().decide(state, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::RoundId;
    use sim_runtime::Engine;

    fn fresh() -> (GameConfig, SimulationState) {
        let cfg = GameConfig::default();
        let s = SimulationState::new(&cfg);
        (cfg, s)
    }

    #[test]
    fn utility_is_monotonic() {
        assert!(utility(1.0, 100.0) < utility(2.0, 100.0));
        assert!(utility(1.0, 200.0) < utility(1.0, 100.0));
        assert_eq!(utility(-1.0, 100.0), 0.0);
        assert_eq!(utility(1.0, 0.0), 0.0);
    }

    #[test]
    fn opening_move_is_a_click() {
        let (cfg, s) = fresh();
        assert_eq!(next_action(&s, &cfg), Some(Action::ProduceOne));
    }

    #[test]
    fn nothing_to_do_after_the_end() {
        let (cfg, mut s) = fresh();
        s.is_victory = true;
        assert_eq!(next_action(&s, &cfg), None);
    }

    #[test]
    fn milestones_are_acknowledged_first() {
        let (cfg, mut s) = fresh();
        s.pending_milestone = Some(0);
        s.valuation = Decimal::new(1_000_000, 0);
        assert_eq!(next_action(&s, &cfg), Some(Action::AcknowledgeMilestone));
    }

    #[test]
    fn raisable_round_is_taken() {
        let (cfg, mut s) = fresh();
        s.valuation = Decimal::new(1_000_000, 0);
        assert_eq!(
            next_action(&s, &cfg),
            Some(Action::RaiseFundingRound {
                round_id: RoundId::from("seed")
            })
        );
    }

    #[test]
    fn starving_automation_is_restocked() {
        let (cfg, mut s) = fresh();
        s.upgrade_mut(&UpgradeId::from("autocoder2")).unwrap().owned = 2;
        s.resource_stock = 100.0;
        s.cash = Decimal::new(25_000, 0);
        assert_eq!(
            next_action(&s, &cfg),
            Some(Action::PurchaseResourceBatch { batch_size: 1000 })
        );
    }

    #[test]
    fn affordable_automation_is_bought() {
        let (cfg, mut s) = fresh();
        s.cumulative_produced = 60.0;
        s.cash = Decimal::new(150, 0);
        s.demand = 3.2;
        assert_eq!(
            next_action(&s, &cfg),
            Some(Action::PurchaseUpgrade {
                upgrade_id: UpgradeId::from("autocoder1")
            })
        );
    }

    #[test]
    fn glut_lowers_the_price() {
        let (cfg, mut s) = fresh();
        s.stage = Stage::Market;
        s.demand = 3.2;
        s.product_inventory = 500.0;
        assert_eq!(
            next_action(&s, &cfg),
            Some(Action::AdjustPrice {
                direction: PriceDirection::Down
            })
        );
    }

    #[test]
    fn exit_target_triggers_exit() {
        let (cfg, mut s) = fresh();
        s.valuation = Decimal::new(500, 0);
        let pilot = Autopilot::new(AutopilotConfig {
            exit_at_valuation: Some(Decimal::new(500, 0)),
            ..AutopilotConfig::default()
        });
        assert_eq!(pilot.decide(&s, &cfg), Some(Action::TriggerExit));
    }

    #[test]
    fn yaml_overrides_defaults() {
        let cfg = AutopilotConfig::from_yaml_str("reserve_secs: 5\nglut_secs: 10\n").unwrap();
        assert_eq!(cfg.reserve_secs, 5.0);
        assert_eq!(cfg.glut_secs, 10.0);
        assert_eq!(cfg.scarce_secs, AutopilotConfig::default().scarce_secs);
        assert!(AutopilotConfig::from_yaml_str("reserve_secs: [").is_err());
    }

    #[test]
    fn autopilot_reaches_the_market() {
        let mut engine = Engine::new(GameConfig::default()).unwrap();
        let pilot = Autopilot::default();
        for _ in 0..3_000 {
            if let Some(action) = pilot.decide(engine.state(), engine.config()) {
                engine.apply(&action);
            }
            engine.tick();
        }
        let s = engine.state();
        assert!(s.stage >= Stage::Market);
        assert!(s.cash > Decimal::ZERO || s.owned(&UpgradeId::from("autocoder1")) > 0);
        assert!(!s.is_bankrupt);
    }
}
