//! Per-tick phases and the ECS schedule that chains them.
//!
//! Phase order: automated production, demand, sales settlement (MVP income
//! and burn included), resource cost walk, evaluation. Each phase is a plain function
//! over the state so it can be tested without a `World`.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use sim_core::{GameConfig, SimulationState};
use sim_econ::{demand, resource_cost_walk, revenue, sales_volume_per_tick, to_money};
use tracing::{debug, warn};

use crate::evaluator;

/// The single mutable session state.
#[derive(Resource)]
pub struct Store(pub SimulationState);

/// Validated, read-only tunables.
#[derive(Resource)]
pub struct Tunables(pub Arc<GameConfig>);

/// Seeded generator for the resource cost walk.
#[derive(Resource)]
pub struct MarketRng(pub ChaCha8Rng);

/// Demand per second at the current price and marketing level.
pub fn market_demand(state: &SimulationState, config: &GameConfig) -> f64 {
    let d = demand(state.unit_price, state.marketing_level, &config.market);
    if d.is_finite() {
        d.max(0.0)
    } else {
        0.0
    }
}

/// Owned automation turns resource into product, bounded by stock on hand.
pub fn automated_production(state: &mut SimulationState, config: &GameConfig) {
    state.automated_last_tick = 0.0;
    let rate = state.production_rate(config);
    if rate <= 0.0 || state.resource_stock <= 0.0 {
        return;
    }
    let per_unit = config.production.resource_per_unit;
    let wanted = rate / config.ticks_per_second();
    let made = wanted.min(state.resource_stock / per_unit);
    if !(made > 0.0) {
        return;
    }
    state.resource_stock = (state.resource_stock - made * per_unit).max(0.0);
    state.product_inventory += made;
    state.cumulative_produced += made;
    state.automated_last_tick = made;
}

/// Cash a live MVP earns from this tick's automated output.
pub fn mvp_income(state: &SimulationState, config: &GameConfig) -> Decimal {
    if !state.mvp_launched || !(state.automated_last_tick > 0.0) {
        return Decimal::ZERO;
    }
    to_money(state.automated_last_tick)
        .ok()
        .and_then(|units| units.checked_mul(config.mvp.revenue_per_unit))
        .unwrap_or(Decimal::ZERO)
}

pub fn recompute_demand(state: &mut SimulationState, config: &GameConfig) {
    state.demand = market_demand(state, config);
}

/// Sell this tick's share of demand, collect MVP income, then pay this
/// tick's share of burn.
pub fn settle_sales(state: &mut SimulationState, config: &GameConfig) {
    let ticks_per_sec = config.ticks_per_second();
    let volume = sales_volume_per_tick(state.product_inventory, state.demand, ticks_per_sec);
    let sales = match revenue(volume, state.unit_price) {
        Ok(income) => {
            state.product_inventory = (state.product_inventory - volume).max(0.0);
            income
        }
        Err(err) => {
            warn!(%err, volume, "sales settlement skipped");
            Decimal::ZERO
        }
    };
    let income = sales.saturating_add(mvp_income(state, config));
    state.cash = state.cash.saturating_add(income);
    state.lifetime_revenue = state.lifetime_revenue.saturating_add(income);

    let burn = state.burn_rate(config) / ticks_per_sec;
    if burn > 0.0 {
        match to_money(burn) {
            Ok(cost) => state.cash = state.cash.saturating_sub(cost),
            Err(err) => warn!(%err, burn, "burn skipped"),
        }
    }

    state.revenue_per_sec = to_money(ticks_per_sec)
        .ok()
        .and_then(|t| income.checked_mul(t))
        .map(|r| r.round_dp(2))
        .unwrap_or(Decimal::ZERO);
}

pub fn fluctuate_resource_cost<R: Rng + ?Sized>(
    state: &mut SimulationState,
    config: &GameConfig,
    rng: &mut R,
) {
    let next = resource_cost_walk(rng, state.resource_unit_cost, &config.resource_market);
    if next != state.resource_unit_cost {
        debug!(from = %state.resource_unit_cost, to = %next, "resource cost moved");
        state.resource_unit_cost = next;
    }
}

fn production_system(mut store: ResMut<Store>, tunables: Res<Tunables>) {
    automated_production(&mut store.0, &tunables.0);
}

fn demand_system(mut store: ResMut<Store>, tunables: Res<Tunables>) {
    recompute_demand(&mut store.0, &tunables.0);
}

fn sales_system(mut store: ResMut<Store>, tunables: Res<Tunables>) {
    settle_sales(&mut store.0, &tunables.0);
}

fn resource_cost_system(
    mut store: ResMut<Store>,
    tunables: Res<Tunables>,
    mut rng: ResMut<MarketRng>,
) {
    fluctuate_resource_cost(&mut store.0, &tunables.0, &mut rng.0);
}

fn evaluation_system(mut store: ResMut<Store>, tunables: Res<Tunables>) {
    evaluator::evaluate(&mut store.0, &tunables.0);
}

/// Strictly ordered, single-threaded schedule for one tick.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            production_system,
            demand_system,
            sales_system,
            resource_cost_system,
            evaluation_system,
        )
            .chain(),
    );
    schedule
}
