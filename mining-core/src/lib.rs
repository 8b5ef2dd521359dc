//! Core types for the Mining Monitor
//!
//! This crate defines the shared data structures used across the monitor,
//! including coin records, difficulty alerts, the published snapshot and
//! the static coin table.

pub mod coin;
pub mod error;
pub mod record;
pub mod units;

pub use coin::{CoinSpec, COIN_TABLE, DEFAULT_TRACKED};
pub use error::{MonitorError, MonitorResult};
pub use record::{Alert, CoinRecord, Snapshot};
pub use units::{hashes_to_exahash, parse_hashrate, parse_number, percent_change, HashrateUnit};
