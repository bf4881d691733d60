#![deny(warnings)]

//! Headless CLI: plays a session with the autopilot, either in virtual time
//! or against the wall clock, and prints the log and KPIs.

use std::time::Duration;

use anyhow::{Context, Result};
use sim_ai::{Autopilot, AutopilotConfig};
use sim_core::{GameConfig, SimulationState};
use sim_runtime::{Engine, SchedulerState, Session, SimSnapshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    autopilot: Option<String>,
    seconds: Option<u64>,
    seed: Option<u64>,
    realtime: bool,
    json: bool,
    /// Debugging aid: start from a state dumped with `--save`.
    restore: Option<String>,
    /// Debugging aid: dump the final state for a later `--restore`.
    save: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--autopilot" => args.autopilot = it.next(),
            "--seconds" => args.seconds = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--realtime" => args.realtime = true,
            "--json" => args.json = true,
            "--restore" => args.restore = it.next(),
            "--save" => args.save = it.next(),
            _ => {}
        }
    }
    args
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut cfg = match &args.config {
        Some(path) => GameConfig::from_file(path).with_context(|| format!("load config {path}"))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.rng_seed = seed;
    }
    Ok(cfg)
}

fn build_engine(cfg: GameConfig, restore: Option<&str>) -> Result<Engine> {
    let engine = match restore {
        Some(path) => {
            let text =
                std::fs::read_to_string(path).with_context(|| format!("read state {path}"))?;
            let state: SimulationState =
                serde_json::from_str(&text).with_context(|| format!("parse state {path}"))?;
            Engine::with_state(cfg, state)?
        }
        None => Engine::new(cfg)?,
    };
    Ok(engine)
}

/// Virtual time: one autopilot decision per tick, as fast as possible.
fn run_headless(mut engine: Engine, pilot: &Autopilot, seconds: u64) -> SimSnapshot {
    let period = engine.config().tick_interval().as_millis().max(1);
    let ticks = Duration::from_secs(seconds).as_millis() / period;
    for _ in 0..ticks {
        if let Some(action) = pilot.decide(engine.state(), engine.config()) {
            engine.apply(&action);
        }
        if !engine.tick() && engine.state().is_terminal() {
            break;
        }
    }
    engine.snapshot()
}

/// Wall clock: the session ticks on its own; the autopilot reacts to each
/// published snapshot once per tick.
async fn run_realtime(engine: Engine, pilot: &Autopilot, seconds: u64) -> SimSnapshot {
    let cfg = engine.config().clone();
    let mut session = Session::from_engine(engine);
    let mut updates = session.subscribe();
    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);
    let mut acted_on: Option<u64> = None;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.scheduler == SchedulerState::Halted {
                    break;
                }
                let tick = snapshot.state.tick;
                if acted_on == Some(tick) && snapshot.scheduler == SchedulerState::Running {
                    continue;
                }
                acted_on = Some(tick);
                if tick % cfg.ticks_per_second().max(1.0) as u64 == 0 {
                    let s = &snapshot.state;
                    info!(tick, cash = %s.cash, stage = %s.stage, "progress");
                }
                if let Some(action) = pilot.decide(&snapshot.state, &cfg) {
                    session.dispatch(action);
                }
            }
        }
    }
    let snapshot = session.snapshot();
    session.shutdown();
    snapshot
}

fn print_report(snapshot: &SimSnapshot) {
    let s = &snapshot.state;
    for line in s.log.entries() {
        println!("{line}");
    }
    println!(
        "KPI | tick: {} | stage: {} | cash: ${} | valuation: ${} | produced: {:.0} | inventory: {:.0} | price: ${} | demand: {:.2}/s | rate: {:.1}/s | burn: {:.1}/s | equity: {:.1}% | status: {:?}",
        s.tick,
        s.stage,
        s.cash.round_dp(2),
        s.valuation,
        s.cumulative_produced,
        s.product_inventory,
        s.unit_price,
        s.demand,
        snapshot.production_rate,
        snapshot.burn_rate,
        s.equity_percent,
        snapshot.scheduler
    );
    if let Some(exit) = &s.exit {
        println!(
            "EXIT | valuation: ${} | equity: {:.1}% | tax: {:.0}% | payout: ${}",
            exit.valuation,
            exit.equity_percent,
            exit.tax_rate * 100.0,
            exit.payout
        );
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    info!(?args, "starting unicorn-run");

    let cfg = load_config(&args)?;
    let pilot = match &args.autopilot {
        Some(path) => Autopilot::new(AutopilotConfig::from_file(path)?),
        None => Autopilot::default(),
    };
    let engine = build_engine(cfg, args.restore.as_deref())?;
    let seconds = args.seconds.unwrap_or(600);

    let snapshot = if args.realtime {
        let rt = tokio::runtime::Runtime::new().context("start tokio runtime")?;
        rt.block_on(run_realtime(engine, &pilot, seconds))
    } else {
        run_headless(engine, &pilot, seconds)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_report(&snapshot);
    }
    if let Some(path) = &args.save {
        let text = serde_json::to_string_pretty(&snapshot.state)?;
        std::fs::write(path, text).with_context(|| format!("write state {path}"))?;
        info!(path = %path, "state dumped");
    }
    Ok(())
}
