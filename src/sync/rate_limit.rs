//! Outbound request pacing
//!
//! Single-slot token gate: one token is pre-loaded, a background ticker
//! refills the slot once per interval and drops refills while it is full.
//! There is never more than one pending token, so callers are spaced at
//! least one interval apart after the first.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::AppError;

/// Process-wide rate limiter for upstream requests
///
/// Must be constructed inside a Tokio runtime since it spawns its ticker.
pub struct RateLimiter {
    slot: Arc<Semaphore>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    interval: Duration,
}

impl RateLimiter {
    /// Create a limiter issuing at most one token per `interval`
    ///
    /// # Arguments
    /// * `interval` - Minimum spacing between tokens, must be non-zero
    pub fn new(interval: Duration) -> Self {
        // Tokio rejects a zero period
        let interval = interval.max(Duration::from_millis(1));
        let slot = Arc::new(Semaphore::new(1));

        let ticker = {
            let slot = slot.clone();
            tokio::spawn(async move {
                let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    ticks.tick().await;
                    if slot.is_closed() {
                        break;
                    }
                    // Refill only an empty slot
                    if slot.available_permits() == 0 {
                        slot.add_permits(1);
                    }
                }
            })
        };

        Self {
            slot,
            ticker: Mutex::new(Some(ticker)),
            interval,
        }
    }

    /// Configured token interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until a token is available and consume it
    ///
    /// # Errors
    /// `AppError::RateLimiterClosed` once `close()` has been called.
    pub async fn wait(&self) -> Result<(), AppError> {
        let permit = self
            .slot
            .acquire()
            .await
            .map_err(|_| AppError::RateLimiterClosed)?;
        permit.forget();
        Ok(())
    }

    /// Consume a token if one is pending, without blocking
    pub fn allow(&self) -> bool {
        match self.slot.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    /// Stop issuing tokens
    ///
    /// Pending waiters and later calls to `wait()` fail with
    /// `AppError::RateLimiterClosed`. Calling it twice is a no-op.
    pub fn close(&self) {
        self.slot.close();
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
                tracing::debug!("Rate limiter ticker stopped");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.close();
    }
}
