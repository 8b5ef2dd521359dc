//! Per-host request pacing
//!
//! Free-tier providers throttle bursts. Every call to a host first takes a
//! slot from that host's limiter, so two coins resolved concurrently against
//! Blockchair still arrive at least one pacing interval apart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Default spacing between two calls to the same host
pub const DEFAULT_PACING_INTERVAL_MS: u64 = 1000;

/// Enforces a minimum spacing between requests to one host.
///
/// Callers reserve a slot while holding the lock and sleep after releasing
/// it, so concurrent callers each get a distinct slot instead of all waking
/// at the same instant.
#[derive(Debug)]
pub struct RateLimiter {
    /// Next free slot, in millis since `epoch`
    next_slot_ms: Mutex<u64>,
    epoch: Instant,
    min_interval: Duration,
    host: String,
    total_requests: AtomicU64,
    waited_requests: AtomicU64,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, host: &str) -> Self {
        Self {
            next_slot_ms: Mutex::new(0),
            epoch: Instant::now(),
            min_interval,
            host: host.to_string(),
            total_requests: AtomicU64::new(0),
            waited_requests: AtomicU64::new(0),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        Instant::now().duration_since(self.epoch).as_millis() as u64
    }

    /// Wait until this caller's reserved slot comes up
    pub async fn acquire(&self) {
        let request_num = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;
        let interval_ms = self.min_interval.as_millis() as u64;

        let slot_ms = {
            let mut next_slot = self.next_slot_ms.lock().await;
            let now_ms = self.elapsed_ms();
            let slot = (*next_slot).max(now_ms);
            *next_slot = slot + interval_ms;
            slot
        };

        let target = self.epoch + Duration::from_millis(slot_ms);
        let wait = target.saturating_duration_since(Instant::now());
        if wait.is_zero() {
            return;
        }

        self.waited_requests.fetch_add(1, Ordering::Relaxed);
        debug!(
            "[Pacer:{}] #{} waiting {:?} for its slot",
            self.host, request_num, wait
        );
        tokio::time::sleep_until(target).await;
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            host: self.host.clone(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            waited_requests: self.waited_requests.load(Ordering::Relaxed),
            min_interval_ms: self.min_interval.as_millis() as u64,
        }
    }
}

/// Usage counters for one host
#[derive(Debug, Clone)]
pub struct RateLimiterStats {
    pub host: String,
    pub total_requests: u64,
    pub waited_requests: u64,
    pub min_interval_ms: u64,
}

/// One limiter per upstream host, created on first use
#[derive(Debug)]
pub struct HostPacers {
    interval: Duration,
    limiters: SyncMutex<HashMap<String, Arc<RateLimiter>>>,
}

impl HostPacers {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            limiters: SyncMutex::new(HashMap::new()),
        }
    }

    /// The shared limiter for `host`
    pub fn for_host(&self, host: &str) -> Arc<RateLimiter> {
        let mut limiters = self.limiters.lock();
        limiters
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::new(self.interval, host)))
            .clone()
    }

    pub fn stats(&self) -> Vec<RateLimiterStats> {
        let mut stats: Vec<_> = self.limiters.lock().values().map(|l| l.stats()).collect();
        stats.sort_by(|a, b| a.host.cmp(&b.host));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(100), "api.example.com");

        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();

        assert!(elapsed.as_millis() < 20, "First request took {:?}", elapsed);
        assert_eq!(limiter.stats().waited_requests, 0);
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let limiter = RateLimiter::new(Duration::from_millis(100), "api.example.com");
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        let elapsed = start.elapsed();

        assert!(elapsed.as_millis() >= 90, "Only waited {:?}", elapsed);
        assert!(elapsed.as_millis() < 150, "Waited too long: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_concurrent_callers_get_distinct_slots() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(50), "api.example.com"));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    start.elapsed()
                })
            })
            .collect();

        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();

        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap.as_millis() >= 40, "Gap was only {:?}", gap);
        }

        let stats = limiter.stats();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.waited_requests, 3);
    }

    #[tokio::test]
    async fn test_host_pacers_share_per_host() {
        let pacers = HostPacers::new(Duration::from_millis(10));
        let a = pacers.for_host("api.blockchair.com");
        let b = pacers.for_host("api.blockchair.com");
        let c = pacers.for_host("blockchain.info");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pacers.stats().len(), 2);
    }
}
