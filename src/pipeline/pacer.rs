use crate::config::CONFIG;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::time::Duration;

/// Fixed-interval limiter for the per-URL provider loops. One call is
/// released per interval with no burst, which makes the throughput contract
/// testable without touching the network code.
pub struct Pacer {
    limiter: DefaultDirectRateLimiter,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        let quota = Quota::with_period(interval).expect("pacer interval must be non-zero");
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    pub fn from_config() -> Self {
        Self::new(Duration::from_millis(CONFIG.call_interval_ms.max(1)))
    }

    pub async fn ready(&self) {
        self.limiter.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn three_acquisitions_span_at_least_two_intervals() {
        let pacer = Pacer::new(Duration::from_millis(50));
        let started = Instant::now();
        pacer.ready().await;
        pacer.ready().await;
        pacer.ready().await;
        assert!(started.elapsed() >= Duration::from_millis(95));
    }

    #[tokio::test]
    async fn first_acquisition_is_immediate() {
        let pacer = Pacer::new(Duration::from_secs(60));
        let started = Instant::now();
        pacer.ready().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
