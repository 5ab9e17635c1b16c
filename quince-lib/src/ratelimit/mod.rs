//! Per-origin rate limiting and concurrency control.
//!
//! Every request is keyed by its [`OriginKey`], the `host[:port]` authority
//! of the URL. The first request to an origin lazily creates an [`Origin`]
//! holding a token-bucket limiter that enforces the minimum spacing between
//! consecutive requests, and a semaphore bounding how many requests may be
//! in flight at once. Different origins never throttle each other.

mod config;
mod key;
mod origin;
mod pool;

pub use config::{ThrottleConfig, DEFAULT_CONCURRENT_REQUESTS, DEFAULT_REQUEST_DELAY};
pub use key::OriginKey;
pub use origin::Origin;
pub(crate) use pool::OriginPool;
