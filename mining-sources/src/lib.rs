//! Data provider clients for the Mining Monitor
//!
//! This crate provides adapters for fetching mining metrics from:
//! - Blockchain.info: BTC difficulty and hashrate (primary for BTC)
//! - mempool.space: BTC difficulty and hashrate (secondary)
//! - Blockchair: stats for every tracked coin
//! - BitInfoCharts: scraped HTML pages (last resort)
//! - CoinGecko: USD prices, with a static fallback table

pub mod adapter;
pub mod bitinfocharts;
pub mod blockchain_info;
pub mod blockchair;
pub mod coingecko;
pub mod error;
pub mod kind;
pub mod mempool_space;
pub mod registry;
pub mod static_source;

pub use adapter::{build_http_client, PriceSource, PriceTable, SourceAdapter, DEFAULT_REQUEST_TIMEOUT};
pub use bitinfocharts::BitInfoChartsScraper;
pub use blockchain_info::BlockchainInfoClient;
pub use blockchair::BlockchairClient;
pub use coingecko::{fallback_prices, CoinGeckoClient};
pub use error::SourceError;
pub use kind::SourceKind;
pub use mempool_space::MempoolSpaceClient;
pub use registry::SourceRegistry;
pub use static_source::StaticSource;
