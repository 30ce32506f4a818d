//! sim-server: runs the world simulation in real time.
//!
//! Usage:
//!   sim-server --config data/sim_config.json --db world.db
//!   sim-server --seed 7 --tick-interval 0.5 --owner 3
//!
//! Every committed event is written to stdout as one JSON line. With
//! `--owner`, only world-wide events and that owner's events are shown.
//! Ctrl-C stops the loop between passes.

use anyhow::Result;
use claim_core::{
    config::SimConfig,
    engine::SimEngine,
    event::SimEvent,
    event_bus::{EventBus, Subscription},
    scheduler::TickScheduler,
    store::SimStore,
    types::OwnerId,
};
use std::env;
use std::io::{self, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match arg_value(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.tick_interval_secs = parse_arg(&args, "--tick-interval", config.tick_interval_secs);
    let owner: Option<OwnerId> = arg_value(&args, "--owner").and_then(|v| v.parse().ok());
    let db = arg_value(&args, "--db").unwrap_or(":memory:");

    // stdout carries events only.
    eprintln!("claim sim-server");
    eprintln!("  seed:      {}", config.seed);
    eprintln!("  interval:  {}s", config.tick_interval_secs);
    eprintln!("  payroll:   every {}s", config.payroll_interval_secs);
    eprintln!("  db:        {db}");
    if let Some(owner) = owner {
        eprintln!("  owner:     {owner}");
    }
    eprintln!();

    let store = SimStore::open(db)?;
    store.migrate()?;

    let bus = Arc::new(EventBus::new(config.bus_capacity));
    let subscription = bus.subscribe();
    let subscriber_id = subscription.id();

    let engine = SimEngine::build(config, store)?;
    let handle = TickScheduler::new(engine, Arc::clone(&bus)).spawn();
    let printer = tokio::spawn(print_events(subscription, owner));

    tokio::signal::ctrl_c().await?;
    log::info!("interrupt received, stopping after the current pass");

    let engine = handle.shutdown().await?;
    bus.unsubscribe(subscriber_id);
    printer.await?;

    eprintln!("stopped at tick {}", engine.current_tick());
    Ok(())
}

/// Drain the subscription to stdout until it closes.
async fn print_events(mut subscription: Subscription, owner: Option<OwnerId>) {
    while let Some(event) = next_event(&mut subscription, owner).await {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("cannot encode {}: {e}", event.type_name());
                continue;
            }
        };
        let mut out = io::stdout().lock();
        if writeln!(out, "{line}").and_then(|_| out.flush()).is_err() {
            // Reader went away.
            break;
        }
    }
}

async fn next_event(subscription: &mut Subscription, owner: Option<OwnerId>) -> Option<SimEvent> {
    match owner {
        Some(owner) => subscription.recv_for(owner).await,
        None => subscription.recv().await,
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
