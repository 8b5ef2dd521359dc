//! In-process stand-ins for providers

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mining_core::{CoinRecord, CoinSpec};
use mining_sources::{fallback_prices, PriceSource, PriceTable, SourceAdapter, SourceError};

pub(crate) fn coin(id: &str) -> &'static CoinSpec {
    CoinSpec::lookup(id).unwrap()
}

#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Ok { difficulty: f64, hashrate: f64 },
    Fail(u16),
    /// Succeed with a record for a different coin
    WrongCoin(&'static str),
    Panic,
}

/// Adapter whose answers are queued per coin.
///
/// Each fetch pops the next outcome for the coin; the last one repeats.
/// Coins with no script are unsupported.
pub(crate) struct ScriptedSource {
    name: String,
    label: String,
    script: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: format!("{} label", name),
            script: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn then(self, coin_id: &str, outcome: Outcome) -> Self {
        self.script
            .lock()
            .entry(coin_id.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub(crate) fn succeeds(self, coin_id: &str, difficulty: f64, hashrate: f64) -> Self {
        self.then(coin_id, Outcome::Ok { difficulty, hashrate })
    }

    pub(crate) fn fails(self, coin_id: &str, status: u16) -> Self {
        self.then(coin_id, Outcome::Fail(status))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, coin_id: &str) -> Option<Outcome> {
        let mut script = self.script.lock();
        let queue = script.get_mut(coin_id)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl SourceAdapter for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn host(&self) -> &str {
        &self.name
    }

    fn supports(&self, coin: &CoinSpec) -> bool {
        self.script.lock().contains_key(coin.id)
    }

    async fn fetch(&self, coin: &CoinSpec) -> Result<CoinRecord, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.next_outcome(coin.id) {
            Some(Outcome::Ok { difficulty, hashrate }) => {
                Ok(CoinRecord::fetched(coin, difficulty, hashrate, self.label.clone()))
            }
            Some(Outcome::Fail(status)) => Err(SourceError::Http(status)),
            Some(Outcome::WrongCoin(other)) => {
                let other = CoinSpec::lookup(other).unwrap();
                Ok(CoinRecord::fetched(other, 1.0, 1.0, self.label.clone()))
            }
            Some(Outcome::Panic) => panic!("scripted panic for {}", coin.id),
            None => Err(SourceError::Unsupported(coin.id.to_string())),
        }
    }
}

/// Price source returning fixed quotes, or the fallback table when down
pub(crate) struct ScriptedPrices {
    quotes: Option<HashMap<String, f64>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedPrices {
    pub(crate) fn up(quotes: &[(&str, f64)]) -> Self {
        Self::build(Some(quotes.iter().map(|(id, p)| (id.to_string(), *p)).collect()))
    }

    pub(crate) fn down() -> Self {
        Self::build(None)
    }

    fn build(quotes: Option<HashMap<String, f64>>) -> Self {
        Self {
            quotes,
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `fetch_prices` calls seen
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for ScriptedPrices {
    fn label(&self) -> &str {
        "scripted prices"
    }

    async fn fetch_prices(&self, coins: &[&'static CoinSpec]) -> PriceTable {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.quotes {
            Some(quotes) => PriceTable::observed(quotes.clone()),
            None => fallback_prices(coins),
        }
    }
}
