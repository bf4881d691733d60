#![deny(warnings)]

//! Economic models for The Unicorn Run.
//!
//! Pure functions, deterministic except for the injected RNG:
//! - Demand from price and marketing level
//! - Per-tick sales volume and revenue
//! - Upgrade and marketing cost curves
//! - Bounded random walk of the resource purchase price
//! - Valuation, exit payout and runway

use rand::Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sim_core::{MarketConfig, ResourceMarketConfig, ValuationConfig};
use thiserror::Error;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// A float could not be represented as money.
    #[error("non-finite numeric value: {0}")]
    NonFinite(f64),
    /// Result exceeds the representable monetary range.
    #[error("monetary value out of range")]
    Overflow,
}

/// Convert a float quantity to money.
pub fn to_money(value: f64) -> Result<Decimal, EconError> {
    if !value.is_finite() {
        return Err(EconError::NonFinite(value));
    }
    Decimal::from_f64(value).ok_or(EconError::Overflow)
}

/// Lossy conversion of money to a float for use inside formulas.
pub fn money_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Units per second the market absorbs.
///
/// demand = base_demand / max(price, price_floor) * marketing_growth^(level - 1)
///
/// The price is clamped to the floor first, so a zero or negative price
/// yields a large but finite demand.
///
/// Example:
/// let d = demand(Decimal::new(25, 2), 1, &MarketConfig::default());
/// assert!((d - 3.2).abs() < 1e-9);
pub fn demand(price: Decimal, marketing_level: u32, market: &MarketConfig) -> f64 {
    let floor = money_to_f64(market.price_floor).max(f64::MIN_POSITIVE);
    let p = money_to_f64(price).max(floor);
    let growth = market
        .marketing_growth
        .powf(f64::from(marketing_level.saturating_sub(1)));
    let d = market.base_demand / p * growth;
    if d.is_nan() {
        0.0
    } else {
        d.clamp(0.0, f64::MAX)
    }
}

/// Units sold in one tick: min(inventory, demand_per_sec / ticks_per_sec).
pub fn sales_volume_per_tick(inventory: f64, demand_per_sec: f64, ticks_per_sec: f64) -> f64 {
    if !(ticks_per_sec > 0.0) {
        return 0.0;
    }
    let capacity = (demand_per_sec / ticks_per_sec).max(0.0);
    inventory.max(0.0).min(capacity)
}

/// Income for selling `volume` units at `price`.
pub fn revenue(volume: f64, price: Decimal) -> Result<Decimal, EconError> {
    to_money(volume.max(0.0))?
        .checked_mul(price)
        .ok_or(EconError::Overflow)
}

/// Next price of a repeatable upgrade: floor(previous * growth).
///
/// Always strictly greater than `previous`; when rounding (or a growth
/// factor <= 1) would stall the curve, the cost rises by one instead.
///
/// Example:
/// assert_eq!(upgrade_cost(Decimal::new(100, 0), 1.2), Decimal::new(120, 0));
pub fn upgrade_cost(previous: Decimal, growth: f64) -> Decimal {
    let bumped = previous.saturating_add(Decimal::ONE);
    Decimal::from_f64(growth)
        .and_then(|g| previous.checked_mul(g))
        .map(|c| c.floor())
        .filter(|c| *c > previous)
        .unwrap_or(bumped)
}

/// Price of the next marketing level: base * 2^(level - 1).
pub fn marketing_upgrade_cost(level: u32, base: Decimal) -> Decimal {
    2u64.checked_pow(level.saturating_sub(1))
        .and_then(|factor| base.checked_mul(Decimal::from(factor)))
        .unwrap_or(Decimal::MAX)
}

/// One step of the resource price random walk.
///
/// With probability `walk_probability` the cost moves by a uniform amount in
/// [-walk_step, walk_step]; the result is rounded to cents and clamped into
/// [cost_floor, cost_ceiling].
pub fn resource_cost_walk<R: Rng + ?Sized>(
    rng: &mut R,
    previous: Decimal,
    market: &ResourceMarketConfig,
) -> Decimal {
    let p = market.walk_probability;
    if !(p > 0.0) {
        return previous.clamp(market.cost_floor, market.cost_ceiling);
    }
    if !rng.gen_bool(p.min(1.0)) {
        return previous.clamp(market.cost_floor, market.cost_ceiling);
    }
    let step = market.walk_step;
    let delta = if step > 0.0 && step.is_finite() {
        rng.gen_range(-step..=step)
    } else {
        0.0
    };
    let moved = Decimal::from_f64(money_to_f64(previous) + delta)
        .map(|d| d.round_dp(2))
        .unwrap_or(previous);
    moved.clamp(market.cost_floor, market.cost_ceiling)
}

/// Company valuation: (cash + revenue_per_sec * revenue_multiple_secs) * hype.
///
/// Negative cash and revenue count as zero.
pub fn valuation(
    cash: Decimal,
    revenue_per_sec: Decimal,
    hype: f64,
    cfg: &ValuationConfig,
) -> Result<Decimal, EconError> {
    let multiple = to_money(cfg.revenue_multiple_secs)?;
    let hype = to_money(hype.max(0.0))?;
    revenue_per_sec
        .max(Decimal::ZERO)
        .checked_mul(multiple)
        .and_then(|r| r.checked_add(cash.max(Decimal::ZERO)))
        .and_then(|v| v.checked_mul(hype))
        .map(|v| v.round_dp(2))
        .ok_or(EconError::Overflow)
}

/// Exit valuation and the founder's after-tax payout.
///
/// valuation = cash * exit_multiplier;
/// payout = valuation * equity_percent / 100 * (1 - tax_rate).
pub fn exit_payout(
    cash: Decimal,
    equity_percent: f64,
    exit_multiplier: f64,
    tax_rate: f64,
) -> Result<(Decimal, Decimal), EconError> {
    let multiplier = to_money(exit_multiplier)?;
    let share = to_money(equity_percent.clamp(0.0, 100.0) / 100.0)?;
    let kept = to_money((1.0 - tax_rate).clamp(0.0, 1.0))?;
    let value = cash
        .max(Decimal::ZERO)
        .checked_mul(multiplier)
        .ok_or(EconError::Overflow)?;
    let payout = value
        .checked_mul(share)
        .and_then(|v| v.checked_mul(kept))
        .ok_or(EconError::Overflow)?;
    Ok((value.round_dp(2), payout.round_dp(2)))
}

/// Seconds until cash runs out at the given burn; `None` when nothing burns.
pub fn runway_secs(cash: Decimal, burn_per_sec: f64) -> Option<f64> {
    if !(burn_per_sec > 0.0) {
        return None;
    }
    Some(money_to_f64(cash.max(Decimal::ZERO)) / burn_per_sec)
}
