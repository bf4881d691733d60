//! Read-only views handed to the presentation layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{GameConfig, MilestoneDef, SimulationState, UpgradeId};
use sim_econ::{marketing_upgrade_cost, runway_secs};

/// Lifecycle of the tick driver, derived from the session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulerState {
    Running,
    /// A milestone awaits acknowledgement; ticks are skipped.
    Paused,
    /// Bankrupt, victorious or exited. Only a restart leaves this state.
    Halted,
}

impl SchedulerState {
    pub fn of(state: &SimulationState) -> Self {
        if state.is_terminal() {
            SchedulerState::Halted
        } else if state.pending_milestone.is_some() {
            SchedulerState::Paused
        } else {
            SchedulerState::Running
        }
    }
}

/// Catalog entry joined with ownership and availability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeView {
    pub id: UpgradeId,
    pub name: String,
    pub owned: u32,
    pub cost: Decimal,
    pub unlocked: bool,
    pub affordable: bool,
}

/// Immutable picture of a session after a tick or an action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub scheduler: SchedulerState,
    /// Automated production, units per second.
    pub production_rate: f64,
    /// Cash outflow, per second.
    pub burn_rate: f64,
    pub runway_secs: Option<f64>,
    pub marketing_cost: Decimal,
    /// Milestone awaiting acknowledgement, with its narrative.
    pub pending_milestone: Option<MilestoneDef>,
    pub upgrades: Vec<UpgradeView>,
    pub state: SimulationState,
}

impl SimSnapshot {
    pub fn capture(state: &SimulationState, config: &GameConfig) -> Self {
        let burn_rate = state.burn_rate(config);
        let upgrades = state
            .upgrades
            .iter()
            .filter_map(|owned| {
                config.upgrade_def(&owned.id).map(|def| UpgradeView {
                    id: owned.id.clone(),
                    name: def.name.clone(),
                    owned: owned.owned,
                    cost: owned.next_cost,
                    unlocked: state.cumulative_produced >= def.unlock_at,
                    affordable: state.cash >= owned.next_cost,
                })
            })
            .collect();
        Self {
            scheduler: SchedulerState::of(state),
            production_rate: state.production_rate(config),
            burn_rate,
            runway_secs: runway_secs(state.cash, burn_rate),
            marketing_cost: marketing_upgrade_cost(
                state.marketing_level,
                config.market.marketing_base_cost,
            ),
            pending_milestone: state
                .pending_milestone
                .and_then(|i| config.milestones.thresholds.get(i))
                .cloned(),
            upgrades,
            state: state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_state_tracks_flags() {
        let cfg = GameConfig::default();
        let mut s = SimulationState::new(&cfg);
        assert_eq!(SchedulerState::of(&s), SchedulerState::Running);
        s.pending_milestone = Some(0);
        assert_eq!(SchedulerState::of(&s), SchedulerState::Paused);
        s.is_bankrupt = true;
        assert_eq!(SchedulerState::of(&s), SchedulerState::Halted);
    }

    #[test]
    fn capture_reports_availability() {
        let cfg = GameConfig::default();
        let mut s = SimulationState::new(&cfg);
        s.cash = Decimal::new(150, 0);
        s.cumulative_produced = 60.0;
        s.pending_milestone = Some(1);
        let snap = SimSnapshot::capture(&s, &cfg);
        let auto = &snap.upgrades[0];
        assert!(auto.unlocked && auto.affordable);
        let mega = snap
            .upgrades
            .iter()
            .find(|u| u.id == UpgradeId::from("megacoder"))
            .unwrap();
        assert!(!mega.unlocked && !mega.affordable);
        assert_eq!(snap.marketing_cost, Decimal::new(100, 0));
        let milestone = snap.pending_milestone.unwrap();
        assert_eq!(milestone.title, "Early Validation");
        assert!(milestone.text.contains("consistent demand"));
        assert_eq!(snap.runway_secs, None);
    }
}
