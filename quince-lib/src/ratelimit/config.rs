use std::time::Duration;

/// Default minimum delay between consecutive requests to the same origin,
/// 100 milliseconds.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Default number of simultaneous in-flight requests allowed per origin, 5.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 5;

/// Throttling applied to every origin: a minimum spacing between
/// consecutive requests plus a bound on simultaneous in-flight requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Minimum delay between consecutive requests to one origin
    pub request_delay: Duration,

    /// Maximum simultaneous in-flight requests per origin
    pub concurrent_requests: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            request_delay: DEFAULT_REQUEST_DELAY,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ThrottleConfig::default();
        assert_eq!(config.request_delay, Duration::from_millis(100));
        assert_eq!(config.concurrent_requests, 5);
    }
}
