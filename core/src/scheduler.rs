//! Real-time tick loop.
//!
//! One task owns the engine and runs one pass per interval:
//!   pass → commit → publish events → refresh snapshot → sleep.
//!
//! The sleep is `interval − time spent`, or nothing when the pass
//! overran. Missed ticks are never caught up and dt stays fixed.
//! Shutdown is observed only while sleeping, so a pass is never cut off
//! half way.
//!
//! A pass does blocking SQLite work. On a multi-thread runtime it runs
//! under `block_in_place` so other tasks keep their worker; on a
//! current-thread runtime it runs inline and other tasks wait for it.

use crate::{
    engine::SimEngine,
    event_bus::EventBus,
    snapshot::WorldSnapshot,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    runtime::{Handle, RuntimeFlavor},
    sync::watch,
    task::{self, JoinError, JoinHandle},
    time::{self, Instant},
};

pub struct TickScheduler {
    engine:      SimEngine,
    bus:         Arc<EventBus>,
    interval:    Duration,
    snapshot_tx: watch::Sender<WorldSnapshot>,
}

impl TickScheduler {
    pub fn new(engine: SimEngine, bus: Arc<EventBus>) -> Self {
        let interval = engine.config().tick_interval();
        let (snapshot_tx, _) = watch::channel(engine.snapshot());
        Self { engine, bus, interval, snapshot_tx }
    }

    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Latest committed view of the world, refreshed after every pass.
    pub fn snapshots(&self) -> watch::Receiver<WorldSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn engine(&self) -> &SimEngine {
        &self.engine
    }

    /// Run one pass and publish its events. A failed pass is logged and
    /// publishes nothing. Returns whether the pass committed.
    pub fn run_pass(&mut self) -> bool {
        match self.engine.tick() {
            Ok(events) => {
                for event in &events {
                    self.bus.publish(event);
                }
                self.snapshot_tx.send_replace(self.engine.snapshot());
                true
            }
            Err(e) => {
                log::error!("tick={} pass abandoned: {e}", self.engine.current_tick());
                false
            }
        }
    }

    /// `run_pass`, moved off the async worker when the runtime allows it.
    fn run_pass_blocking(&mut self) -> bool {
        match Handle::current().runtime_flavor() {
            RuntimeFlavor::MultiThread => task::block_in_place(|| self.run_pass()),
            _ => self.run_pass(),
        }
    }

    /// Tick until `shutdown` turns true (or its sender is dropped), then
    /// hand the engine back.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SimEngine {
        log::info!(
            "scheduler started (interval={:.3}s, subscribers={})",
            self.interval.as_secs_f64(),
            self.bus.subscriber_count()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let started = Instant::now();
            self.run_pass_blocking();
            let spent = started.elapsed();

            let remaining = self.interval.saturating_sub(spent);
            if remaining.is_zero() {
                log::warn!(
                    "tick={} overran interval ({:.3}s > {:.3}s), starting next pass now",
                    self.engine.current_tick(),
                    spent.as_secs_f64(),
                    self.interval.as_secs_f64()
                );
                // Let other tasks on this runtime make progress.
                task::yield_now().await;
                continue;
            }

            if sleep_or_shutdown(remaining, &mut shutdown).await {
                break;
            }
        }

        log::info!(
            "scheduler stopped at tick={} ({:.0}s simulated)",
            self.engine.current_tick(),
            self.engine.clock.simulated_secs()
        );
        self.engine
    }

    /// Spawn the loop on the current runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let snapshots = self.snapshots();
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, snapshots, task }
    }
}

/// Sleep for `duration`. Returns true if shutdown was requested first.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = time::sleep(duration);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
        }
    }
}

pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    snapshots:   watch::Receiver<WorldSnapshot>,
    task:        JoinHandle<SimEngine>,
}

impl SchedulerHandle {
    pub fn snapshots(&self) -> watch::Receiver<WorldSnapshot> {
        self.snapshots.clone()
    }

    /// Ask the loop to stop after the current pass and wait for it.
    pub async fn shutdown(self) -> Result<SimEngine, JoinError> {
        self.shutdown_tx.send_replace(true);
        self.task.await
    }
}
