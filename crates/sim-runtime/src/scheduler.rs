//! Wall-clock driver: a Tokio task that ticks a shared engine at the
//! configured interval and publishes a snapshot after every tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sim_core::{Action, ActionOutcome, GameConfig, ValidationError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::engine::Engine;
use crate::snapshot::{SchedulerState, SimSnapshot};

/// Engine shared between the tick task and action dispatch.
pub type SharedEngine = Arc<Mutex<Engine>>;

fn lock(engine: &Mutex<Engine>) -> MutexGuard<'_, Engine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One tick under the lock: the snapshot if the session advanced, and
/// whether it is halted now. An action can halt the session between ticks,
/// so the flag is reported even when nothing advanced.
fn step(engine: &Mutex<Engine>) -> (Option<SimSnapshot>, bool) {
    let mut engine = lock(engine);
    let advanced = engine.tick();
    let halted = engine.scheduler_state() == SchedulerState::Halted;
    (advanced.then(|| engine.snapshot()), halted)
}

/// Handle to a running tick task. Dropping it stops the task.
pub struct TickScheduler {
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
}

impl TickScheduler {
    /// Spawn the tick loop. Must be called within a Tokio runtime.
    ///
    /// The loop stops on its own once the session halts; a paused session
    /// keeps the timer running but skips the ticks.
    pub fn spawn(
        engine: SharedEngine,
        period: Duration,
        snapshots: Arc<watch::Sender<SimSnapshot>>,
    ) -> Self {
        let cancel = Arc::new(Notify::new());
        let stop = Arc::clone(&cancel);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let (snapshot, halted) = step(&engine);
                        if let Some(snapshot) = snapshot {
                            snapshots.send_replace(snapshot);
                        }
                        if halted {
                            info!("session halted; tick loop stopped");
                            break;
                        }
                    }
                    _ = stop.notified() => {
                        debug!("tick loop cancelled");
                        break;
                    }
                }
            }
        });
        Self { cancel, task }
    }

    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A live session: engine, tick task and snapshot channel.
///
/// Example:
/// let mut session = Session::start(GameConfig::default())?;
/// let mut updates = session.subscribe();
/// session.dispatch(Action::ProduceOne);
pub struct Session {
    engine: SharedEngine,
    snapshots: Arc<watch::Sender<SimSnapshot>>,
    scheduler: Option<TickScheduler>,
}

impl Session {
    /// Build an engine from `config` and start ticking. Must be called
    /// within a Tokio runtime.
    pub fn start(config: GameConfig) -> Result<Self, ValidationError> {
        Ok(Self::from_engine(Engine::new(config)?))
    }

    pub fn from_engine(engine: Engine) -> Self {
        let (tx, _rx) = watch::channel(engine.snapshot());
        let mut session = Self {
            engine: Arc::new(Mutex::new(engine)),
            snapshots: Arc::new(tx),
            scheduler: None,
        };
        session.arm();
        session
    }

    fn arm(&mut self) {
        if let Some(old) = self.scheduler.take() {
            old.cancel();
        }
        let period = lock(&self.engine).config().tick_interval();
        self.scheduler = Some(TickScheduler::spawn(
            Arc::clone(&self.engine),
            period,
            Arc::clone(&self.snapshots),
        ));
    }

    /// Apply an action between ticks and publish the result. A restart
    /// re-arms the tick loop.
    pub fn dispatch(&mut self, action: Action) -> ActionOutcome {
        let (outcome, snapshot) = {
            let mut engine = lock(&self.engine);
            let outcome = engine.apply(&action);
            (outcome, engine.snapshot())
        };
        self.snapshots.send_replace(snapshot);
        if outcome.is_applied() && matches!(action, Action::RestartSession) {
            self.arm();
        }
        outcome
    }

    pub fn subscribe(&self) -> watch::Receiver<SimSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SimSnapshot {
        lock(&self.engine).snapshot()
    }

    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }

    /// Whether the tick loop is still alive.
    pub fn is_ticking(&self) -> bool {
        self.scheduler.as_ref().is_some_and(|s| !s.is_finished())
    }

    pub fn shutdown(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.cancel();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sim_core::SimulationState;

    fn quiet_config() -> GameConfig {
        let mut cfg = GameConfig::default();
        cfg.milestones.enabled = false;
        cfg
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_the_wall_clock() {
        let session = Session::start(quiet_config()).unwrap();
        let mut rx = session.subscribe();
        tokio::time::sleep(Duration::from_millis(1_050)).await;
        let tick = session.snapshot().state.tick;
        assert!((9..=11).contains(&tick), "tick = {tick}");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state.tick, tick);
        assert!(session.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn actions_land_between_ticks() {
        let mut session = Session::start(quiet_config()).unwrap();
        for _ in 0..10 {
            assert!(session.dispatch(Action::ProduceOne).is_applied());
        }
        let rx = session.subscribe();
        assert_eq!(rx.borrow().state.product_inventory, 10.0);
        tokio::time::sleep(Duration::from_millis(1_050)).await;
        let s = session.snapshot().state;
        assert!(s.product_inventory < 10.0);
        assert!(s.cash > Decimal::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn halting_stops_the_loop_and_restart_rearms_it() {
        let cfg = quiet_config();
        let mut state = SimulationState::new(&cfg);
        state.cash = Decimal::new(99_999_995, 2);
        state.product_inventory = 100.0;
        state.unit_price = Decimal::ONE;
        let engine = Engine::with_state(cfg, state).unwrap();
        let mut session = Session::from_engine(engine);
        tokio::time::sleep(Duration::from_millis(500)).await;
        let halted = session.snapshot();
        assert_eq!(halted.scheduler, SchedulerState::Halted);
        assert!(halted.state.is_victory);
        assert!(!session.is_ticking());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(session.snapshot().state.tick, halted.state.tick);

        assert!(session.dispatch(Action::RestartSession).is_applied());
        assert_eq!(session.snapshot().state.tick, 0);
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(session.is_ticking());
        assert!(session.snapshot().state.tick >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exit_between_ticks_stops_the_loop() {
        let mut session = Session::start(quiet_config()).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(session.dispatch(Action::TriggerExit).is_applied());
        let rx = session.subscribe();
        assert_eq!(rx.borrow().scheduler, SchedulerState::Halted);
        let tick = session.snapshot().state.tick;
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!session.is_ticking());
        assert_eq!(session.snapshot().state.tick, tick);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_ticking() {
        let mut session = Session::start(quiet_config()).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        session.shutdown();
        let tick = session.snapshot().state.tick;
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(session.snapshot().state.tick, tick);
        assert!(!session.is_ticking());
    }
}
