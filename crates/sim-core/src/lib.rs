#![deny(warnings)]

//! Core domain models for The Unicorn Run.
//!
//! This crate defines the serializable session state, the tunable game
//! configuration with its validation, and the action contract shared by the
//! engine, the autopilot and any presentation layer.

pub mod action;
pub mod config;
pub mod log;
pub mod state;

pub use action::{Action, ActionOutcome, PriceDirection, Rejection};
pub use config::{
    validate_config, ConfigError, FundingRoundDef, GameConfig, HoldingConfig, InitialConditions,
    MarketConfig, MilestoneConfig, MilestoneDef, MvpConfig, ProductionConfig,
    ResourceMarketConfig, StageThresholds, UpgradeDef, ValidationError, ValuationConfig,
    VictoryConfig, WinMetric,
};
pub use log::EventLog;
pub use state::{ExitSummary, OwnedUpgrade, RoundId, SimulationState, Stage, UpgradeId};
