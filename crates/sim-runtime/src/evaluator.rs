//! Stage, victory, bankruptcy and milestone evaluation.
//!
//! `assess` is a pure function of the state; `apply_assessment` commits its
//! verdict. Both run at the end of every tick and after every applied action.

use rust_decimal::Decimal;
use sim_core::{GameConfig, SimulationState, Stage, StageThresholds, WinMetric};
use sim_econ::valuation;
use tracing::{info, warn};

/// Inventory below this is treated as sold out.
const SELLABLE_EPSILON: f64 = 1e-9;

/// Verdict computed from one state.
#[derive(Clone, Debug, PartialEq)]
pub struct Assessment {
    pub valuation: Decimal,
    /// Stage the session should be in; never below the current one.
    pub stage: Stage,
    /// Victory is reached now.
    pub victory: bool,
    /// Bankruptcy is reached now.
    pub bankrupt: bool,
    /// Milestone index to surface now.
    pub milestone: Option<usize>,
}

/// Stage implied by lifetime production alone.
pub fn stage_for_production(produced: f64, thresholds: &StageThresholds) -> Stage {
    if produced >= thresholds.scale_at {
        Stage::Scale
    } else if produced >= thresholds.market_at {
        Stage::Market
    } else {
        Stage::Bootstrap
    }
}

fn has_won(state: &SimulationState, config: &GameConfig, valuation: Decimal) -> bool {
    match config.victory.metric {
        WinMetric::Cash => state.cash >= config.victory.cash_threshold,
        WinMetric::Valuation => valuation >= config.victory.valuation_threshold,
    }
}

/// Out of cash with nothing left to sell, build or raise.
fn is_insolvent(state: &SimulationState, config: &GameConfig, valuation: Decimal) -> bool {
    if state.cash < Decimal::ZERO {
        return true;
    }
    if state.cash > Decimal::ZERO {
        return false;
    }
    let can_sell = state.product_inventory > SELLABLE_EPSILON;
    let can_build = state.resource_stock >= config.production.resource_per_unit
        || (state.resource_stock > 0.0 && state.production_rate(config) > 0.0);
    let can_raise = config
        .funding_rounds
        .iter()
        .any(|r| !state.round_raised(&r.id) && valuation >= r.valuation_threshold);
    !(can_sell || can_build || can_raise)
}

pub fn assess(state: &SimulationState, config: &GameConfig) -> Assessment {
    if state.is_terminal() {
        return Assessment {
            valuation: state.valuation,
            stage: state.stage,
            victory: false,
            bankrupt: false,
            milestone: None,
        };
    }

    let valuation = valuation(
        state.cash,
        state.revenue_per_sec,
        state.hype_multiplier,
        &config.valuation,
    )
    .unwrap_or(state.valuation);

    let victory = has_won(state, config, valuation);
    let stage = if victory {
        Stage::Unicorn
    } else {
        state
            .stage
            .max(stage_for_production(state.cumulative_produced, &config.stages))
    };
    let bankrupt = !victory && is_insolvent(state, config, valuation);

    let milestone = if victory || bankrupt || !config.milestones.enabled {
        None
    } else if state.pending_milestone.is_some() {
        None
    } else {
        config
            .milestones
            .thresholds
            .get(state.milestones_reached)
            .filter(|m| state.cash >= m.threshold)
            .map(|_| state.milestones_reached)
    };

    Assessment {
        valuation,
        stage,
        victory,
        bankrupt,
        milestone,
    }
}

/// Move the session forward to `target`, announcing every stage passed.
/// Lower targets are ignored.
pub(crate) fn advance_stage(state: &mut SimulationState, target: Stage) {
    if target <= state.stage {
        return;
    }
    let from = state.stage;
    // Victory carries its own announcement.
    if target < Stage::Unicorn {
        if from < Stage::Market {
            state.log.push("Market unlocked! Set your price.");
        }
        if from < Stage::Scale && target == Stage::Scale {
            state.log.push("Scaling phase! Automate production.");
        }
    }
    state.stage = target;
    info!(%from, to = %target, "stage advanced");
}

pub fn apply_assessment(state: &mut SimulationState, verdict: Assessment, config: &GameConfig) {
    if state.is_terminal() {
        return;
    }
    state.valuation = verdict.valuation;
    advance_stage(state, verdict.stage);

    if verdict.victory {
        state.is_victory = true;
        let message = match config.victory.metric {
            WinMetric::Cash => format!(
                "UNICORN STATUS: {} in the bank. You win!",
                config.victory.cash_threshold
            ),
            WinMetric::Valuation => format!(
                "UNICORN STATUS: valued at {}. You win!",
                verdict.valuation
            ),
        };
        state.log.push(message);
        info!(tick = state.tick, cash = %state.cash, valuation = %state.valuation, "victory");
    }

    if verdict.bankrupt {
        state.is_bankrupt = true;
        state
            .log
            .push("INSOLVENCY: the company has run out of cash. Game over.");
        info!(tick = state.tick, cash = %state.cash, "bankrupt");
    }

    if let Some(index) = verdict.milestone {
        state.pending_milestone = Some(index);
        state.milestones_reached = index + 1;
        if let Some(m) = config.milestones.thresholds.get(index) {
            state.log.push(format!("Milestone: {}", m.title));
            info!(index, title = %m.title, "milestone reached");
        }
    }
}

/// Clamp values a formula bug could push out of range. Returns whether
/// anything had to be repaired.
pub fn repair_invariants(state: &mut SimulationState) -> bool {
    let mut repaired: Vec<&'static str> = Vec::new();
    if !(state.resource_stock >= 0.0) {
        state.resource_stock = 0.0;
        repaired.push("resource_stock");
    }
    if !(state.product_inventory >= 0.0) {
        state.product_inventory = 0.0;
        repaired.push("product_inventory");
    }
    if !state.cumulative_produced.is_finite() {
        state.cumulative_produced = 0.0;
        repaired.push("cumulative_produced");
    }
    if !state.demand.is_finite() {
        state.demand = 0.0;
        repaired.push("demand");
    }
    if !(0.0..=100.0).contains(&state.equity_percent) {
        state.equity_percent = if state.equity_percent > 100.0 {
            100.0
        } else {
            0.0
        };
        repaired.push("equity_percent");
    }
    for field in &repaired {
        warn!(field, tick = state.tick, "invariant repaired");
    }
    if !repaired.is_empty() {
        state
            .log
            .push(format!("Invariant repaired: {}", repaired.join(", ")));
    }
    !repaired.is_empty()
}

/// Repair, assess and apply in one step.
pub fn evaluate(state: &mut SimulationState, config: &GameConfig) {
    if state.is_terminal() {
        return;
    }
    repair_invariants(state);
    let verdict = assess(state, config);
    apply_assessment(state, verdict, config);
}
