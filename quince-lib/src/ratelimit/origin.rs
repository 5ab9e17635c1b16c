use std::num::NonZeroU32;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use tokio::sync::{Semaphore, SemaphorePermit};

use super::{OriginKey, ThrottleConfig};

/// Per-origin throttling state: a token bucket enforcing the minimum
/// spacing between requests and a semaphore bounding how many may be in
/// flight at once.
///
/// Instances are created lazily by [`OriginPool`](super::OriginPool) on the
/// first request to an origin and shared by every later request to it.
/// Different origins never throttle each other.
#[derive(Debug)]
pub struct Origin {
    /// The origin this instance throttles
    pub key: OriginKey,

    /// Enforces the minimum interval between granted admissions.
    /// `None` when the configured delay is zero, since a zero-period quota
    /// is rejected by governor and means no spacing requirement anyway.
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,

    /// Bounds concurrent in-flight requests to this origin
    gate: Semaphore,
}

impl Origin {
    /// Create the throttling state for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the burst size cannot be set to 1 (should never happen)
    #[must_use]
    pub(crate) fn new(key: OriginKey, config: &ThrottleConfig) -> Self {
        let limiter = Quota::with_period(config.request_delay).map(|quota| {
            let quota = quota.allow_burst(NonZeroU32::new(1).unwrap());
            RateLimiter::direct(quota)
        });

        Self {
            key,
            limiter,
            gate: Semaphore::new(config.concurrent_requests),
        }
    }

    /// Wait until this origin's minimum request spacing allows another
    /// request. The first call for a fresh origin returns immediately.
    pub async fn wait_turn(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Wait for an in-flight slot on this origin.
    ///
    /// The returned permit is held for the whole network exchange and
    /// released on drop, which covers every exit path including errors
    /// and cancellation.
    pub async fn enter(&self) -> SemaphorePermit<'_> {
        self.gate
            .acquire()
            .await
            // SAFETY: this should not panic as we never close the semaphore
            .expect("Semaphore was closed unexpectedly")
    }

    /// The number of currently free in-flight slots
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }
}
