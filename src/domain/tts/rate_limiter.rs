use crate::domain::shared::Clock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Admits at most `max_calls` remote calls in any trailing 60-second window.
///
/// Admission timestamps live in a FIFO that is pruned on every reservation.
/// The limiter is driven through `&mut self`; callers that want to share it
/// across tasks must wrap it in a lock.
pub struct RateLimiter {
    max_calls: usize,
    window: VecDeque<Instant>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window: VecDeque::with_capacity(max_calls + 1),
            clock,
        }
    }

    /// Wait until a call may be issued, then record its admission.
    ///
    /// Returns how long the caller was suspended.
    pub async fn reserve_slot(&mut self) -> Duration {
        let now = self.clock.now();
        self.prune(now);

        let mut waited = Duration::ZERO;
        if self.window.len() >= self.max_calls {
            if let Some(&oldest) = self.window.front() {
                let wait = (oldest + WINDOW).saturating_duration_since(now);
                if !wait.is_zero() {
                    tracing::info!(
                        wait_secs = format!("{:.1}", wait.as_secs_f64()),
                        calls_in_window = self.window.len(),
                        max_calls = self.max_calls,
                        "Rate limit reached, waiting"
                    );
                    self.clock.sleep(wait).await;
                    waited = wait;
                }
            }
        }

        self.window.push_back(self.clock.now());
        waited
    }

    /// Number of admissions still inside the window as of the last reservation
    pub fn admitted_in_window(&self) -> usize {
        self.window.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.window.front() {
            if now.saturating_duration_since(oldest) >= WINDOW {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}
