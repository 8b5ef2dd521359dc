//! Cycle scheduler
//!
//! Runs the aggregation cycle at startup and then on a fixed interval, and
//! serves manual refreshes. At most one cycle runs at a time: a manual
//! refresh that arrives mid-cycle waits for it and then runs its own, while
//! timer ticks that fall due mid-cycle are skipped.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cycle::{AggregationCycle, CycleReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    pub state: SchedulerState,
    pub cycles_run: u64,
    pub cycles_accepted: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// Counters updated by whichever task ran the cycle
#[derive(Debug, Default)]
struct CycleCounters {
    running: AtomicBool,
    cycles_run: AtomicU64,
    cycles_accepted: AtomicU64,
    last_cycle_at: RwLock<Option<DateTime<Utc>>>,
}

impl CycleCounters {
    fn record(&self, report: &CycleReport) {
        self.cycles_run.fetch_add(1, Ordering::SeqCst);
        if report.accepted {
            self.cycles_accepted.fetch_add(1, Ordering::SeqCst);
        }
        *self.last_cycle_at.write() = Some(report.finished_at);
    }
}

pub struct Scheduler {
    cycle: Arc<AggregationCycle>,
    interval: Duration,
    /// Held by the task running a cycle, for as long as the cycle runs
    cycle_lock: Arc<Mutex<()>>,
    counters: Arc<CycleCounters>,
}

impl Scheduler {
    pub fn new(cycle: Arc<AggregationCycle>, interval: Duration) -> Self {
        Self {
            cycle,
            interval,
            cycle_lock: Arc::new(Mutex::new(())),
            counters: Arc::new(CycleCounters::default()),
        }
    }

    pub fn cycle(&self) -> &Arc<AggregationCycle> {
        &self.cycle
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        if self.counters.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            state: self.state(),
            cycles_run: self.counters.cycles_run.load(Ordering::SeqCst),
            cycles_accepted: self.counters.cycles_accepted.load(Ordering::SeqCst),
            last_cycle_at: *self.counters.last_cycle_at.read(),
        }
    }

    /// Manual trigger: queue behind any in-flight cycle, then run one
    pub async fn refresh(&self) -> CycleReport {
        if self.state() == SchedulerState::Running {
            debug!("Refresh requested while a cycle is running, queueing");
        }
        let guard = Arc::clone(&self.cycle_lock).lock_owned().await;
        self.execute(guard).await
    }

    /// Timer trigger: run unless a cycle is already in flight
    pub async fn try_run_scheduled(&self) -> Option<CycleReport> {
        match Arc::clone(&self.cycle_lock).try_lock_owned() {
            Ok(guard) => Some(self.execute(guard).await),
            Err(_) => {
                debug!("Scheduled cycle skipped, previous cycle still running");
                None
            }
        }
    }

    /// Run one cycle on its own task, which owns `guard` until it finishes.
    ///
    /// Dropping the caller does not stop the cycle or release the lock
    /// early, so a later trigger still waits for it.
    async fn execute(&self, guard: OwnedMutexGuard<()>) -> CycleReport {
        let cycle = Arc::clone(&self.cycle);
        let counters = Arc::clone(&self.counters);
        let started_at = Utc::now();
        let timer = Instant::now();

        let task = tokio::spawn(async move {
            let _guard = guard;
            counters.running.store(true, Ordering::SeqCst);
            let report = cycle.run_guarded().await;
            counters.running.store(false, Ordering::SeqCst);
            counters.record(&report);

            info!(
                "Cycle finished in {:?}: accepted={}, resolved={}, failed={}",
                report.duration,
                report.accepted,
                report.resolved_count(),
                report.failed.len()
            );
            report
        });

        match task.await {
            Ok(report) => report,
            Err(e) => {
                error!("Cycle task ended abnormally: {}", e);
                CycleReport::faulted(started_at, timer.elapsed(), e.to_string())
            }
        }
    }

    /// Drive scheduled cycles until `shutdown` is cancelled.
    ///
    /// The first tick completes immediately, so the first cycle runs at
    /// startup.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!("Starting scheduler with {:?} refresh interval", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.try_run_scheduled().await;
                }
            }
        }
    }
}
