//! The authoritative mutable record of one game session.

use crate::config::GameConfig;
use crate::log::EventLog;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of an upgrade in the catalog, e.g. "autocoder1".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub String);

/// Identifier of a funding round, e.g. "seed".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub String);

impl From<&str> for UpgradeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for RoundId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse progression of the company. Ordering follows progression, and a
/// session only ever moves forward through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Bootstrap,
    Market,
    Scale,
    Unicorn,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Bootstrap => "BOOTSTRAP",
            Stage::Market => "MARKET",
            Stage::Scale => "SCALE",
            Stage::Unicorn => "UNICORN",
        };
        f.write_str(s)
    }
}

/// Ownership of one catalog upgrade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnedUpgrade {
    pub id: UpgradeId,
    pub owned: u32,
    /// Price of the next unit.
    pub next_cost: Decimal,
}

/// Outcome of the founder cashing out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExitSummary {
    pub valuation: Decimal,
    pub equity_percent: f64,
    pub tax_rate: f64,
    pub payout: Decimal,
}

/// Full session state. Only the engine mutates it; everyone else sees clones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub tick: u64,
    /// Cloud credits available for production.
    pub resource_stock: f64,
    pub resource_unit_cost: Decimal,
    /// Unsold lines of code.
    pub product_inventory: f64,
    /// Lifetime lines of code written.
    pub cumulative_produced: f64,
    pub cash: Decimal,
    pub unit_price: Decimal,
    pub marketing_level: u32,
    /// Units per second the market will absorb at the current price.
    pub demand: f64,
    pub upgrades: Vec<OwnedUpgrade>,
    pub stage: Stage,
    pub equity_percent: f64,
    pub valuation: Decimal,
    pub hype_multiplier: f64,
    pub burn_multiplier: f64,
    /// Units the automation produced on the latest tick.
    #[serde(default)]
    pub automated_last_tick: f64,
    pub revenue_per_sec: Decimal,
    pub lifetime_revenue: Decimal,
    pub rounds_raised: BTreeSet<RoundId>,
    pub mvp_launched: bool,
    pub holding_setup: bool,
    /// Number of milestone thresholds already surfaced.
    pub milestones_reached: usize,
    /// Index of a surfaced milestone awaiting acknowledgement.
    pub pending_milestone: Option<usize>,
    pub exit: Option<ExitSummary>,
    pub is_bankrupt: bool,
    pub is_victory: bool,
    pub log: EventLog,
}

impl SimulationState {
    /// Fresh session state from the configured initial conditions.
    pub fn new(config: &GameConfig) -> Self {
        let init = &config.initial;
        let mut log = EventLog::new(config.log_capacity);
        log.push("System initialized. Start writing code.");
        Self {
            tick: 0,
            resource_stock: init.resource_stock,
            resource_unit_cost: init.resource_unit_cost,
            product_inventory: 0.0,
            cumulative_produced: 0.0,
            cash: init.cash,
            unit_price: init.unit_price,
            marketing_level: init.marketing_level,
            demand: 0.0,
            upgrades: config
                .upgrades
                .iter()
                .map(|u| OwnedUpgrade {
                    id: u.id.clone(),
                    owned: 0,
                    next_cost: u.base_cost,
                })
                .collect(),
            stage: Stage::Bootstrap,
            equity_percent: init.equity_percent,
            valuation: Decimal::ZERO,
            hype_multiplier: 1.0,
            burn_multiplier: 1.0,
            automated_last_tick: 0.0,
            revenue_per_sec: Decimal::ZERO,
            lifetime_revenue: Decimal::ZERO,
            rounds_raised: BTreeSet::new(),
            mvp_launched: false,
            holding_setup: false,
            milestones_reached: 0,
            pending_milestone: None,
            exit: None,
            is_bankrupt: false,
            is_victory: false,
            log,
        }
    }

    /// Bankrupt, victorious or exited: no further mutation except restart.
    pub fn is_terminal(&self) -> bool {
        self.is_bankrupt || self.is_victory || self.exit.is_some()
    }

    pub fn upgrade(&self, id: &UpgradeId) -> Option<&OwnedUpgrade> {
        self.upgrades.iter().find(|u| &u.id == id)
    }

    pub fn upgrade_mut(&mut self, id: &UpgradeId) -> Option<&mut OwnedUpgrade> {
        self.upgrades.iter_mut().find(|u| &u.id == id)
    }

    /// Units of `id` owned (0 for unknown ids).
    pub fn owned(&self, id: &UpgradeId) -> u32 {
        self.upgrade(id).map_or(0, |u| u.owned)
    }

    pub fn round_raised(&self, id: &RoundId) -> bool {
        self.rounds_raised.contains(id)
    }

    /// Automated production in units per second.
    pub fn production_rate(&self, config: &GameConfig) -> f64 {
        self.upgrades
            .iter()
            .filter_map(|o| config.upgrade_def(&o.id).map(|d| d.code_per_sec * o.owned as f64))
            .sum()
    }

    /// Recurring cash outflow per second, after burn reductions.
    pub fn burn_rate(&self, config: &GameConfig) -> f64 {
        let gross: f64 = self
            .upgrades
            .iter()
            .filter_map(|o| config.upgrade_def(&o.id).map(|d| d.burn_per_sec * o.owned as f64))
            .sum();
        gross * self.burn_multiplier
    }
}
