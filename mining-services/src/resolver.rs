//! Fallback resolution of one coin across an ordered chain of sources

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use mining_core::{CoinRecord, CoinSpec};
use mining_sources::{SourceAdapter, SourceError, SourceRegistry};

use crate::config::MonitorConfig;
use crate::rate_limiter::{HostPacers, RateLimiter};

/// An adapter plus the pacer for its host
#[derive(Clone)]
pub struct PacedSource {
    adapter: Arc<dyn SourceAdapter>,
    pacer: Option<Arc<RateLimiter>>,
}

impl PacedSource {
    /// Attach the shared pacer for the adapter's host (unless it opts out)
    pub fn new(adapter: Arc<dyn SourceAdapter>, pacers: &HostPacers) -> Self {
        let pacer = adapter.paced().then(|| pacers.for_host(adapter.host()));
        Self { adapter, pacer }
    }

    pub fn unpaced(adapter: Arc<dyn SourceAdapter>) -> Self {
        Self { adapter, pacer: None }
    }

    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    pub fn label(&self) -> &str {
        self.adapter.label()
    }

    async fn fetch(&self, coin: &CoinSpec) -> Result<CoinRecord, SourceError> {
        if !self.adapter.supports(coin) {
            return Err(SourceError::Unsupported(coin.id.to_string()));
        }
        if let Some(pacer) = &self.pacer {
            pacer.acquire().await;
        }
        self.adapter.fetch(coin).await
    }
}

/// One candidate's failure within a chain
#[derive(Debug)]
pub struct CandidateFailure {
    pub source: String,
    pub error: SourceError,
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

fn summarize(failures: &[CandidateFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No sources configured for {coin}")]
    EmptyChain { coin: String },

    #[error("All sources failed for {coin}: {}", summarize(.failures))]
    Exhausted {
        coin: String,
        failures: Vec<CandidateFailure>,
    },
}

/// Per-coin fallback chains.
///
/// The first candidate that succeeds wins and its record is returned whole;
/// values from different sources are never merged.
#[derive(Clone, Default)]
pub struct FallbackResolver {
    chains: HashMap<String, Vec<PacedSource>>,
}

impl FallbackResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every tracked coin's chain from the registry
    pub fn from_config(config: &MonitorConfig, registry: &SourceRegistry, pacers: &HostPacers) -> Self {
        let mut resolver = Self::new();
        for coin in &config.tracked {
            let chain = registry
                .chain(&config.chain_for(coin.id))
                .into_iter()
                .map(|adapter| PacedSource::new(adapter, pacers))
                .collect();
            resolver = resolver.with_chain(coin.id, chain);
        }
        resolver
    }

    pub fn with_chain(mut self, coin_id: &str, chain: Vec<PacedSource>) -> Self {
        self.chains.insert(coin_id.to_string(), chain);
        self
    }

    /// Source labels for a coin, in order
    pub fn chain_labels(&self, coin_id: &str) -> Vec<&str> {
        self.chains
            .get(coin_id)
            .map(|chain| chain.iter().map(|s| s.label()).collect())
            .unwrap_or_default()
    }

    pub async fn resolve(&self, coin: &CoinSpec) -> Result<CoinRecord, ResolveError> {
        let chain = match self.chains.get(coin.id) {
            Some(chain) if !chain.is_empty() => chain,
            _ => {
                return Err(ResolveError::EmptyChain {
                    coin: coin.id.to_string(),
                })
            }
        };

        let mut failures = Vec::new();
        for source in chain {
            debug!("Resolving {} via {}", coin.id, source.name());
            match source.fetch(coin).await {
                Ok(record) => return Ok(record),
                Err(error) => {
                    warn!("{} failed for {}: {}", source.name(), coin.id, error);
                    failures.push(CandidateFailure {
                        source: source.name().to_string(),
                        error,
                    });
                }
            }
        }

        Err(ResolveError::Exhausted {
            coin: coin.id.to_string(),
            failures,
        })
    }
}
