//! Player actions.
//!
//! Every action validates against the current state and either applies in
//! full or is rejected with no state change. After a terminal outcome only a
//! restart is accepted; while a milestone is pending only its
//! acknowledgement (or a restart) is.

use rust_decimal::Decimal;
use sim_core::{
    Action, ActionOutcome, ExitSummary, GameConfig, PriceDirection, Rejection, RoundId,
    SimulationState, UpgradeId,
};
use sim_econ::{exit_payout, marketing_upgrade_cost, upgrade_cost};
use tracing::{info, warn};

use crate::evaluator::{self, advance_stage};
use crate::tick::recompute_demand;

fn ensure_active(state: &SimulationState) -> Result<(), Rejection> {
    if state.is_terminal() {
        return Err(Rejection::SessionOver);
    }
    if state.pending_milestone.is_some() {
        return Err(Rejection::Paused);
    }
    Ok(())
}

fn ensure_cash(state: &SimulationState, needed: Decimal) -> Result<(), Rejection> {
    if state.cash < needed {
        return Err(Rejection::InsufficientCash {
            needed,
            available: state.cash,
        });
    }
    Ok(())
}

/// Hand-build one unit from stock.
pub fn produce_one(state: &mut SimulationState, config: &GameConfig) -> Result<(), Rejection> {
    ensure_active(state)?;
    let needed = config.production.resource_per_unit;
    if state.resource_stock < needed {
        return Err(Rejection::InsufficientResource {
            needed,
            available: state.resource_stock,
        });
    }
    state.resource_stock = (state.resource_stock - needed).max(0.0);
    state.product_inventory += 1.0;
    state.cumulative_produced += 1.0;
    Ok(())
}

/// Buy `batch_size` units of resource at the current unit cost.
pub fn purchase_resource_batch(
    state: &mut SimulationState,
    batch_size: u32,
) -> Result<(), Rejection> {
    ensure_active(state)?;
    if batch_size == 0 {
        return Err(Rejection::EmptyBatch);
    }
    let cost = Decimal::from(batch_size)
        .checked_mul(state.resource_unit_cost)
        .unwrap_or(Decimal::MAX);
    ensure_cash(state, cost)?;
    state.cash -= cost;
    state.resource_stock += f64::from(batch_size);
    Ok(())
}

/// Move the unit price one step, clamped to the configured band.
pub fn adjust_price(
    state: &mut SimulationState,
    config: &GameConfig,
    direction: PriceDirection,
) -> Result<(), Rejection> {
    ensure_active(state)?;
    let market = &config.market;
    let next = match direction {
        PriceDirection::Up => state.unit_price.saturating_add(market.price_step),
        PriceDirection::Down => state.unit_price.saturating_sub(market.price_step),
    };
    state.unit_price = next.clamp(market.price_floor, market.price_ceiling);
    recompute_demand(state, config);
    Ok(())
}

pub fn purchase_upgrade(
    state: &mut SimulationState,
    config: &GameConfig,
    id: &UpgradeId,
) -> Result<(), Rejection> {
    ensure_active(state)?;
    let def = config
        .upgrade_def(id)
        .ok_or_else(|| Rejection::UnknownUpgrade(id.clone()))?;
    let cost = state
        .upgrade(id)
        .map(|u| u.next_cost)
        .ok_or_else(|| Rejection::UnknownUpgrade(id.clone()))?;
    if state.cumulative_produced < def.unlock_at {
        return Err(Rejection::Locked {
            what: def.name.clone(),
            required: def.unlock_at,
        });
    }
    ensure_cash(state, cost)?;

    state.cash -= cost;
    if let Some(slot) = state.upgrade_mut(id) {
        slot.owned = slot.owned.saturating_add(1);
        slot.next_cost = upgrade_cost(cost, def.cost_growth);
    }
    if def.hype_boost > 0.0 {
        state.hype_multiplier += def.hype_boost;
    }
    if def.burn_reduction > 0.0 {
        state.burn_multiplier *= 1.0 - def.burn_reduction;
    }
    if def.code_per_sec > 0.0 {
        state
            .log
            .push(format!("{} hired. Automation +{}/sec", def.name, def.code_per_sec));
    } else {
        state.log.push(format!("{} acquired.", def.name));
    }
    Ok(())
}

pub fn purchase_marketing_level(
    state: &mut SimulationState,
    config: &GameConfig,
) -> Result<(), Rejection> {
    ensure_active(state)?;
    let cost = marketing_upgrade_cost(state.marketing_level, config.market.marketing_base_cost);
    ensure_cash(state, cost)?;
    state.cash -= cost;
    state.marketing_level = state.marketing_level.saturating_add(1);
    recompute_demand(state, config);
    state.log.push(format!(
        "Marketing level {}. Demand is up.",
        state.marketing_level
    ));
    Ok(())
}

/// Close a funding round once valuation clears its threshold.
///
/// Each round may be raised once. Equity falls by the round's cost in
/// percentage points and never below zero.
pub fn raise_funding_round(
    state: &mut SimulationState,
    config: &GameConfig,
    id: &RoundId,
) -> Result<(), Rejection> {
    ensure_active(state)?;
    let def = config
        .round_def(id)
        .ok_or_else(|| Rejection::UnknownRound(id.clone()))?;
    if state.round_raised(id) {
        return Err(Rejection::AlreadyDone(def.name.clone()));
    }
    if state.valuation < def.valuation_threshold {
        return Err(Rejection::ValuationTooLow {
            round: id.clone(),
            required: def.valuation_threshold,
            current: state.valuation,
        });
    }

    state.cash = state.cash.saturating_add(def.cash_injection);
    let equity = state.equity_percent;
    state.equity_percent = (equity - def.equity_cost).clamp(0.0, equity.max(0.0));
    state.hype_multiplier *= def.hype_multiplier;
    state.rounds_raised.insert(id.clone());
    state.log.push(format!(
        "{} closed: +{}. Founder equity {:.1}%.",
        def.name, def.cash_injection, state.equity_percent
    ));
    info!(round = %id, equity = state.equity_percent, "funding round raised");
    if let Some(stage) = def.advances_to {
        advance_stage(state, stage);
    }
    Ok(())
}

/// One-off launch; automated output earns cash directly from then on.
pub fn launch_mvp(state: &mut SimulationState, config: &GameConfig) -> Result<(), Rejection> {
    ensure_active(state)?;
    let mvp = &config.mvp;
    if state.mvp_launched {
        return Err(Rejection::AlreadyDone("MVP launch".into()));
    }
    if state.cumulative_produced < mvp.unlock_at {
        return Err(Rejection::Locked {
            what: "MVP launch".into(),
            required: mvp.unlock_at,
        });
    }
    ensure_cash(state, mvp.cost)?;
    state.cash -= mvp.cost;
    state.mvp_launched = true;
    state.log.push(format!(
        "MVP launched! Automation now earns {} per unit.",
        mvp.revenue_per_unit
    ));
    Ok(())
}

/// Offshore holding structure; lowers the tax applied at exit.
pub fn setup_holding(state: &mut SimulationState, config: &GameConfig) -> Result<(), Rejection> {
    ensure_active(state)?;
    let holding = &config.holding;
    if state.holding_setup {
        return Err(Rejection::AlreadyDone("holding setup".into()));
    }
    if !state.round_raised(&holding.requires_round) {
        return Err(Rejection::RoundRequired(holding.requires_round.clone()));
    }
    ensure_cash(state, holding.cost)?;
    state.cash -= holding.cost;
    state.holding_setup = true;
    state.log.push(format!(
        "Holding established. Exit tax {:.0}%.",
        holding.exit_tax_rate * 100.0
    ));
    Ok(())
}

/// Sell the company. Ends the session.
pub fn trigger_exit(state: &mut SimulationState, config: &GameConfig) -> Result<(), Rejection> {
    ensure_active(state)?;
    let tax_rate = if state.holding_setup {
        config.holding.exit_tax_rate
    } else {
        config.valuation.exit_tax_rate
    };
    let (valuation, payout) = exit_payout(
        state.cash,
        state.equity_percent,
        config.valuation.exit_multiplier,
        tax_rate,
    )
    .unwrap_or_else(|err| {
        warn!(%err, "exit payout saturated");
        (Decimal::MAX, Decimal::MAX)
    });
    state.valuation = valuation;
    state.exit = Some(ExitSummary {
        valuation,
        equity_percent: state.equity_percent,
        tax_rate,
        payout,
    });
    state.log.push(format!(
        "EXIT: company sold at {valuation}. Founder payout {payout}."
    ));
    info!(%valuation, %payout, tax_rate, "exit completed");
    Ok(())
}

/// Dismiss the pending milestone and resume ticking.
pub fn acknowledge_milestone(state: &mut SimulationState) -> Result<(), Rejection> {
    if state.is_terminal() {
        return Err(Rejection::SessionOver);
    }
    state.pending_milestone.take().ok_or(Rejection::NoMilestone)?;
    Ok(())
}

/// Replace the session with a fresh one built from `config`.
pub fn restart_session(state: &mut SimulationState, config: &GameConfig) {
    *state = SimulationState::new(config);
    info!("session restarted");
}

/// Route an action and run the evaluator after it applies.
pub fn apply(state: &mut SimulationState, config: &GameConfig, action: &Action) -> ActionOutcome {
    let result = match action {
        Action::ProduceOne => produce_one(state, config),
        Action::PurchaseResourceBatch { batch_size } => purchase_resource_batch(state, *batch_size),
        Action::AdjustPrice { direction } => adjust_price(state, config, *direction),
        Action::PurchaseUpgrade { upgrade_id } => purchase_upgrade(state, config, upgrade_id),
        Action::PurchaseMarketingLevel => purchase_marketing_level(state, config),
        Action::RaiseFundingRound { round_id } => raise_funding_round(state, config, round_id),
        Action::LaunchMvp => launch_mvp(state, config),
        Action::SetupHolding => setup_holding(state, config),
        Action::TriggerExit => trigger_exit(state, config),
        Action::AcknowledgeMilestone => acknowledge_milestone(state),
        Action::RestartSession => {
            restart_session(state, config);
            Ok(())
        }
    };
    if result.is_ok() {
        evaluator::evaluate(state, config);
    }
    ActionOutcome::from(result)
}
