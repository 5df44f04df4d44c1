use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Time source for everything that waits: the rate limiter and retry backoff.
///
/// Production code uses [`SystemClock`]; tests inject a clock that records
/// sleeps and advances virtual time instead of blocking.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
