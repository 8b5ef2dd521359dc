//! Business logic services for the Mining Monitor
//!
//! This crate provides:
//! - Per-host request pacing
//! - Fallback resolution across ordered source chains
//! - The aggregation cycle with delta and alert computation
//! - The snapshot store read by the HTTP API
//! - The cycle scheduler

pub mod config;
pub mod cycle;
pub mod rate_limiter;
pub mod resolver;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod testutil;

pub use config::MonitorConfig;
pub use cycle::{apply_delta, AggregationCycle, CycleReport};
pub use rate_limiter::{HostPacers, RateLimiter, RateLimiterStats};
pub use resolver::{CandidateFailure, FallbackResolver, PacedSource, ResolveError};
pub use scheduler::{Scheduler, SchedulerState, SchedulerStats};
pub use store::{SnapshotStore, ALERT_RING_CAPACITY, RECENT_ALERTS_LIMIT};
