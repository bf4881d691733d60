//! Tunables for a game session.
//!
//! Every constant the engine uses lives here so a YAML file can rebalance the
//! game without touching code. Each section is `#[serde(default)]`, so files
//! only need to list what they override.

use crate::state::{RoundId, Stage, UpgradeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Wall-clock period between ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Seed for the resource-cost random walk.
    pub rng_seed: u64,
    /// Number of log entries retained.
    pub log_capacity: usize,
    pub initial: InitialConditions,
    pub production: ProductionConfig,
    pub market: MarketConfig,
    pub resource_market: ResourceMarketConfig,
    pub stages: StageThresholds,
    pub victory: VictoryConfig,
    pub valuation: ValuationConfig,
    pub milestones: MilestoneConfig,
    /// Automation/staffing catalog, in display order.
    pub upgrades: Vec<UpgradeDef>,
    /// Funding rounds, in display order.
    pub funding_rounds: Vec<FundingRoundDef>,
    pub mvp: MvpConfig,
    pub holding: HoldingConfig,
}

/// Values a fresh (or restarted) session starts from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConditions {
    pub resource_stock: f64,
    pub resource_unit_cost: Decimal,
    pub cash: Decimal,
    pub unit_price: Decimal,
    pub marketing_level: u32,
    pub equity_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Resource consumed per unit of product.
    pub resource_per_unit: f64,
    /// Batch size offered to the player when buying resource.
    pub resource_batch_size: u32,
}

/// Demand curve and price controls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub base_demand: f64,
    pub marketing_growth: f64,
    pub price_floor: Decimal,
    pub price_ceiling: Decimal,
    pub price_step: Decimal,
    pub marketing_base_cost: Decimal,
}

/// Bounded random walk of the resource purchase price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceMarketConfig {
    pub cost_floor: Decimal,
    pub cost_ceiling: Decimal,
    /// Per-tick probability of a price move, in [0, 1].
    pub walk_probability: f64,
    /// Maximum absolute move per step.
    pub walk_step: f64,
}

/// Cumulative production required to enter each stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageThresholds {
    pub market_at: f64,
    pub scale_at: f64,
}

/// Which quantity wins the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinMetric {
    Cash,
    Valuation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VictoryConfig {
    pub metric: WinMetric,
    pub cash_threshold: Decimal,
    pub valuation_threshold: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Seconds of trailing revenue counted into valuation.
    pub revenue_multiple_secs: f64,
    /// Multiple applied to cash when the founder exits.
    pub exit_multiplier: f64,
    /// Share of the payout lost at exit without a holding structure.
    pub exit_tax_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MilestoneDef {
    pub threshold: Decimal,
    pub title: String,
    /// Narrative shown while the session is paused on this milestone.
    #[serde(default)]
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneConfig {
    pub enabled: bool,
    /// Strictly ascending cash thresholds.
    pub thresholds: Vec<MilestoneDef>,
}

/// A purchasable, persistent modifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: String,
    pub base_cost: Decimal,
    /// Lifetime production required before purchase (0 = always available).
    #[serde(default)]
    pub unlock_at: f64,
    #[serde(default)]
    pub code_per_sec: f64,
    #[serde(default)]
    pub burn_per_sec: f64,
    /// Added to the hype multiplier per unit.
    #[serde(default)]
    pub hype_boost: f64,
    /// Fraction of burn removed per unit, in [0, 1).
    #[serde(default)]
    pub burn_reduction: f64,
    #[serde(default = "default_cost_growth")]
    pub cost_growth: f64,
}

fn default_cost_growth() -> f64 {
    1.2
}

/// A one-time equity-for-cash round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundingRoundDef {
    pub id: RoundId,
    pub name: String,
    pub valuation_threshold: Decimal,
    pub cash_injection: Decimal,
    /// Equity points given up.
    pub equity_cost: f64,
    #[serde(default = "default_hype_multiplier")]
    pub hype_multiplier: f64,
    #[serde(default)]
    pub advances_to: Option<Stage>,
}

fn default_hype_multiplier() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MvpConfig {
    pub unlock_at: f64,
    pub cost: Decimal,
    /// Cash earned per unit of automated production once the MVP is live.
    pub revenue_per_unit: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldingConfig {
    pub requires_round: RoundId,
    pub cost: Decimal,
    /// Exit tax rate once the holding is in place.
    pub exit_tax_rate: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            rng_seed: 42,
            log_capacity: 10,
            initial: InitialConditions::default(),
            production: ProductionConfig::default(),
            market: MarketConfig::default(),
            resource_market: ResourceMarketConfig::default(),
            stages: StageThresholds::default(),
            victory: VictoryConfig::default(),
            valuation: ValuationConfig::default(),
            milestones: MilestoneConfig::default(),
            upgrades: default_upgrades(),
            funding_rounds: default_funding_rounds(),
            mvp: MvpConfig::default(),
            holding: HoldingConfig::default(),
        }
    }
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            resource_stock: 1000.0,
            resource_unit_cost: Decimal::new(20, 0),
            cash: Decimal::ZERO,
            unit_price: Decimal::new(25, 2),
            marketing_level: 1,
            equity_percent: 100.0,
        }
    }
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            resource_per_unit: 1.0,
            resource_batch_size: 1000,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_demand: 0.8,
            marketing_growth: 1.1,
            price_floor: Decimal::new(1, 2),
            price_ceiling: Decimal::new(10, 0),
            price_step: Decimal::new(1, 2),
            marketing_base_cost: Decimal::new(100, 0),
        }
    }
}

impl Default for ResourceMarketConfig {
    fn default() -> Self {
        Self {
            cost_floor: Decimal::new(15, 0),
            cost_ceiling: Decimal::new(30, 0),
            walk_probability: 0.05,
            walk_step: 2.0,
        }
    }
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            market_at: 50.0,
            scale_at: 500.0,
        }
    }
}

impl Default for VictoryConfig {
    fn default() -> Self {
        Self {
            metric: WinMetric::Cash,
            cash_threshold: Decimal::new(1_000_000, 0),
            valuation_threshold: Decimal::new(1_000_000_000, 0),
        }
    }
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            revenue_multiple_secs: 3600.0,
            exit_multiplier: 10.0,
            exit_tax_rate: 0.25,
        }
    }
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        let ladder = [
            (
                5,
                "First Revenue",
                "You made your first 5K! People will pay for what you're building. \
                 Keep the momentum going.",
            ),
            (
                10,
                "Early Validation",
                "10K in revenue shows consistent demand. There's a real market here. \
                 Time to think about scaling operations.",
            ),
            (
                20,
                "First Real Traction",
                "Paying users are arriving. Learn what customers truly value, \
                 listen to their feedback and iterate fast.",
            ),
            (
                40,
                "Hiring Your First Team Member",
                "Hiring means payroll, culture decisions and a burn rate to manage. \
                 Your first hires shape everything.",
            ),
            (
                60,
                "From Product to Process",
                "You can't hustle forever. Build clear workflows and repeatable \
                 processes: the machine that builds the product.",
            ),
            (
                80,
                "Thinking About Funding",
                "With solid traction, investors pay attention. Weigh your runway and \
                 growth targets before taking outside capital.",
            ),
            (
                100,
                "Managing Risk and Runway",
                "You're scaling now. Grow aggressively but watch your cash reserves. \
                 One misstep with burn rate can end the journey.",
            ),
        ];
        Self {
            enabled: true,
            thresholds: ladder
                .iter()
                .map(|&(k, title, text)| MilestoneDef {
                    threshold: Decimal::new(k * 1000, 0),
                    title: title.to_string(),
                    text: text.to_string(),
                })
                .collect(),
        }
    }
}

impl Default for MvpConfig {
    fn default() -> Self {
        Self {
            unlock_at: 1000.0,
            cost: Decimal::new(5000, 0),
            revenue_per_unit: Decimal::new(10, 0),
        }
    }
}

impl Default for HoldingConfig {
    fn default() -> Self {
        Self {
            requires_round: RoundId::from("series_a"),
            cost: Decimal::new(10_000, 0),
            exit_tax_rate: 0.05,
        }
    }
}

fn upgrade(id: &str, name: &str, cost: i64, unlock_at: f64) -> UpgradeDef {
    UpgradeDef {
        id: UpgradeId::from(id),
        name: name.to_string(),
        base_cost: Decimal::new(cost, 0),
        unlock_at,
        code_per_sec: 0.0,
        burn_per_sec: 0.0,
        hype_boost: 0.0,
        burn_reduction: 0.0,
        cost_growth: default_cost_growth(),
    }
}

/// Default automation/staffing catalog.
pub fn default_upgrades() -> Vec<UpgradeDef> {
    vec![
        UpgradeDef {
            code_per_sec: 1.0,
            ..upgrade("autocoder1", "AutoCoder Mk1", 100, 50.0)
        },
        UpgradeDef {
            code_per_sec: 5.0,
            ..upgrade("autocoder2", "AutoCoder Mk2", 500, 200.0)
        },
        UpgradeDef {
            code_per_sec: 25.0,
            ..upgrade("megacoder", "MegaCoder", 2500, 1000.0)
        },
        UpgradeDef {
            code_per_sec: 2.0,
            burn_per_sec: 1.0,
            ..upgrade("intern", "Intern", 200, 100.0)
        },
        UpgradeDef {
            code_per_sec: 10.0,
            burn_per_sec: 5.0,
            ..upgrade("developer", "Senior Developer", 1000, 300.0)
        },
        UpgradeDef {
            hype_boost: 0.25,
            ..upgrade("growth", "Growth Hacker", 1500, 500.0)
        },
        UpgradeDef {
            burn_reduction: 0.25,
            ..upgrade("bnp", "BNP Professional Account", 750, 0.0)
        },
    ]
}

/// Default funding ladder.
pub fn default_funding_rounds() -> Vec<FundingRoundDef> {
    vec![
        FundingRoundDef {
            id: RoundId::from("seed"),
            name: "Seed".to_string(),
            valuation_threshold: Decimal::new(1_000_000, 0),
            cash_injection: Decimal::new(500_000, 0),
            equity_cost: 15.0,
            hype_multiplier: 1.0,
            advances_to: Some(Stage::Market),
        },
        FundingRoundDef {
            id: RoundId::from("series_a"),
            name: "Series A".to_string(),
            valuation_threshold: Decimal::new(10_000_000, 0),
            cash_injection: Decimal::new(2_000_000, 0),
            equity_cost: 20.0,
            hype_multiplier: 2.0,
            advances_to: Some(Stage::Scale),
        },
        FundingRoundDef {
            id: RoundId::from("series_b"),
            name: "Series B".to_string(),
            valuation_threshold: Decimal::new(100_000_000, 0),
            cash_injection: Decimal::new(20_000_000, 0),
            equity_cost: 10.0,
            hype_multiplier: 1.0,
            advances_to: None,
        },
    ]
}

impl GameConfig {
    /// Ticks executed per simulated second.
    pub fn ticks_per_second(&self) -> f64 {
        1000.0 / self.tick_interval_ms.max(1) as f64
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn upgrade_def(&self, id: &UpgradeId) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|u| &u.id == id)
    }

    pub fn round_def(&self, id: &RoundId) -> Option<&FundingRoundDef> {
        self.funding_rounds.iter().find(|r| &r.id == id)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Semantic problems in an otherwise well-formed configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("tick interval must be > 0 ms")]
    ZeroTickInterval,
    #[error("log capacity must be > 0")]
    ZeroLogCapacity,
    #[error("{0} must be finite and > 0")]
    NonPositive(&'static str),
    #[error("{0} must be finite and >= 0")]
    Negative(&'static str),
    #[error("{0}: lower bound exceeds upper bound")]
    InvertedBounds(&'static str),
    #[error("{0} must lie within [0, 1]")]
    OutOfUnitRange(&'static str),
    #[error("{0} must be strictly ascending")]
    NotAscending(&'static str),
    #[error("initial {0} lies outside its configured bounds")]
    InitialOutOfBounds(&'static str),
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("unknown funding round: {0}")]
    UnknownRound(String),
}

fn positive(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositive(field))
    }
}

fn non_negative(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Negative(field))
    }
}

fn unit_range(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfUnitRange(field))
    }
}

fn positive_money(value: Decimal, field: &'static str) -> Result<(), ValidationError> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::NonPositive(field))
    }
}

/// Validate a whole configuration, including cross-references.
pub fn validate_config(config: &GameConfig) -> Result<(), ValidationError> {
    if config.tick_interval_ms == 0 {
        return Err(ValidationError::ZeroTickInterval);
    }
    if config.log_capacity == 0 {
        return Err(ValidationError::ZeroLogCapacity);
    }

    let init = &config.initial;
    non_negative(init.resource_stock, "initial.resource_stock")?;
    if init.cash < Decimal::ZERO {
        return Err(ValidationError::Negative("initial.cash"));
    }
    if init.marketing_level == 0 {
        return Err(ValidationError::NonPositive("initial.marketing_level"));
    }
    if !(init.equity_percent.is_finite() && (0.0..=100.0).contains(&init.equity_percent)) {
        return Err(ValidationError::InitialOutOfBounds("equity_percent"));
    }

    positive(
        config.production.resource_per_unit,
        "production.resource_per_unit",
    )?;

    let market = &config.market;
    positive(market.base_demand, "market.base_demand")?;
    positive(market.marketing_growth, "market.marketing_growth")?;
    positive_money(market.price_floor, "market.price_floor")?;
    positive_money(market.price_step, "market.price_step")?;
    positive_money(market.marketing_base_cost, "market.marketing_base_cost")?;
    if market.price_floor > market.price_ceiling {
        return Err(ValidationError::InvertedBounds("market.price"));
    }
    if init.unit_price < market.price_floor || init.unit_price > market.price_ceiling {
        return Err(ValidationError::InitialOutOfBounds("unit_price"));
    }

    let rm = &config.resource_market;
    positive_money(rm.cost_floor, "resource_market.cost_floor")?;
    if rm.cost_floor > rm.cost_ceiling {
        return Err(ValidationError::InvertedBounds("resource_market.cost"));
    }
    unit_range(rm.walk_probability, "resource_market.walk_probability")?;
    non_negative(rm.walk_step, "resource_market.walk_step")?;
    if init.resource_unit_cost < rm.cost_floor || init.resource_unit_cost > rm.cost_ceiling {
        return Err(ValidationError::InitialOutOfBounds("resource_unit_cost"));
    }

    non_negative(config.stages.market_at, "stages.market_at")?;
    if !(config.stages.scale_at > config.stages.market_at) {
        return Err(ValidationError::NotAscending("stages"));
    }

    positive_money(config.victory.cash_threshold, "victory.cash_threshold")?;
    positive_money(
        config.victory.valuation_threshold,
        "victory.valuation_threshold",
    )?;

    non_negative(
        config.valuation.revenue_multiple_secs,
        "valuation.revenue_multiple_secs",
    )?;
    positive(config.valuation.exit_multiplier, "valuation.exit_multiplier")?;
    unit_range(config.valuation.exit_tax_rate, "valuation.exit_tax_rate")?;

    let thresholds = &config.milestones.thresholds;
    if thresholds
        .windows(2)
        .any(|w| w[0].threshold >= w[1].threshold)
    {
        return Err(ValidationError::NotAscending("milestones.thresholds"));
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for u in &config.upgrades {
        if !seen.insert(u.id.0.as_str()) {
            return Err(ValidationError::DuplicateId(u.id.0.clone()));
        }
        positive_money(u.base_cost, "upgrades.base_cost")?;
        non_negative(u.unlock_at, "upgrades.unlock_at")?;
        non_negative(u.code_per_sec, "upgrades.code_per_sec")?;
        non_negative(u.burn_per_sec, "upgrades.burn_per_sec")?;
        non_negative(u.hype_boost, "upgrades.hype_boost")?;
        if !(u.burn_reduction.is_finite() && (0.0..1.0).contains(&u.burn_reduction)) {
            return Err(ValidationError::OutOfUnitRange("upgrades.burn_reduction"));
        }
        positive(u.cost_growth, "upgrades.cost_growth")?;
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for r in &config.funding_rounds {
        if !seen.insert(r.id.0.as_str()) {
            return Err(ValidationError::DuplicateId(r.id.0.clone()));
        }
        if r.cash_injection < Decimal::ZERO || r.valuation_threshold < Decimal::ZERO {
            return Err(ValidationError::Negative("funding_rounds"));
        }
        if !(r.equity_cost.is_finite() && (0.0..=100.0).contains(&r.equity_cost)) {
            return Err(ValidationError::InitialOutOfBounds("funding_rounds.equity_cost"));
        }
        positive(r.hype_multiplier, "funding_rounds.hype_multiplier")?;
    }

    non_negative(config.mvp.unlock_at, "mvp.unlock_at")?;
    if config.mvp.cost < Decimal::ZERO {
        return Err(ValidationError::Negative("mvp.cost"));
    }
    if config.mvp.revenue_per_unit < Decimal::ZERO {
        return Err(ValidationError::Negative("mvp.revenue_per_unit"));
    }

    if config.round_def(&config.holding.requires_round).is_none() {
        return Err(ValidationError::UnknownRound(
            config.holding.requires_round.0.clone(),
        ));
    }
    if config.holding.cost < Decimal::ZERO {
        return Err(ValidationError::Negative("holding.cost"));
    }
    unit_range(config.holding.exit_tax_rate, "holding.exit_tax_rate")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GameConfig::default();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.ticks_per_second(), 10.0);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = "
tick_interval_ms: 50
market:
  base_demand: 2.5
victory:
  metric: valuation
";
        let cfg = GameConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.tick_interval_ms, 50);
        assert_eq!(cfg.market.base_demand, 2.5);
        assert_eq!(cfg.market.marketing_growth, 1.1);
        assert_eq!(cfg.victory.metric, WinMetric::Valuation);
        assert_eq!(cfg.upgrades.len(), default_upgrades().len());
    }

    #[test]
    fn upgrade_catalog_from_yaml_uses_field_defaults() {
        let yaml = "
upgrades:
  - id: bot
    name: Bot
    base_cost: 10
    code_per_sec: 3
";
        let cfg = GameConfig::from_yaml_str(yaml).unwrap();
        let bot = cfg.upgrade_def(&UpgradeId::from("bot")).unwrap();
        assert_eq!(bot.cost_growth, 1.2);
        assert_eq!(bot.unlock_at, 0.0);
        assert_eq!(bot.base_cost, Decimal::new(10, 0));
    }

    #[test]
    fn rejects_inverted_resource_bounds() {
        let mut cfg = GameConfig::default();
        cfg.resource_market.cost_floor = Decimal::new(40, 0);
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::InvertedBounds("resource_market.cost"))
        );
    }

    #[test]
    fn rejects_duplicate_upgrade_ids() {
        let mut cfg = GameConfig::default();
        let dup = cfg.upgrades[0].clone();
        cfg.upgrades.push(dup);
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::DuplicateId("autocoder1".to_string()))
        );
    }

    #[test]
    fn rejects_unsorted_milestones() {
        let mut cfg = GameConfig::default();
        cfg.milestones.thresholds.swap(0, 1);
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::NotAscending("milestones.thresholds"))
        );
    }

    #[test]
    fn rejects_holding_tied_to_unknown_round() {
        let mut cfg = GameConfig::default();
        cfg.holding.requires_round = RoundId::from("series_z");
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::UnknownRound(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let mut cfg = GameConfig::default();
        cfg.resource_market.walk_probability = 1.5;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn funding_ladder_matches_the_cap_table() {
        let cfg = GameConfig::default();
        let round = |id: &str| cfg.round_def(&RoundId::from(id)).unwrap();
        assert_eq!(round("seed").cash_injection, Decimal::new(500_000, 0));
        assert_eq!(round("seed").equity_cost, 15.0);
        assert_eq!(round("series_a").cash_injection, Decimal::new(2_000_000, 0));
        assert_eq!(round("series_a").hype_multiplier, 2.0);
        assert_eq!(round("series_b").valuation_threshold, Decimal::new(100_000_000, 0));
        assert_eq!(round("series_b").equity_cost, 10.0);
        assert_eq!(cfg.mvp.revenue_per_unit, Decimal::new(10, 0));
    }

    #[test]
    fn milestones_carry_narrative_text() {
        let cfg = GameConfig::default();
        assert!(cfg.milestones.thresholds.iter().all(|m| !m.text.is_empty()));
        let yaml = "
milestones:
  thresholds:
    - threshold: 50
      title: Lemonade
";
        let cfg = GameConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.milestones.thresholds[0].text, "");
    }

    #[test]
    fn invalid_yaml_surfaces_parse_error() {
        let err = GameConfig::from_yaml_str("tick_interval_ms: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
        let err = GameConfig::from_yaml_str("tick_interval_ms: 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ValidationError::ZeroTickInterval)
        ));
    }
}
