#![deny(warnings)]

//! Runtime for The Unicorn Run.
//!
//! Ticks run as a chained single-threaded `bevy_ecs` schedule over the
//! session state; player actions go through the same engine between ticks.
//! `Session` adds the Tokio wall-clock driver and a snapshot channel for
//! presentation layers.

pub mod actions;
pub mod engine;
pub mod evaluator;
pub mod scheduler;
pub mod snapshot;
pub mod tick;

pub use engine::Engine;
pub use evaluator::{assess, Assessment};
pub use scheduler::{Session, SharedEngine, TickScheduler};
pub use snapshot::{SchedulerState, SimSnapshot, UpgradeView};
