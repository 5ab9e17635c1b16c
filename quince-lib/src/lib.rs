//! `quince` is a library for polite web fetching: requests to the same
//! origin are spaced by a minimum delay and bounded in concurrency, and
//! fetched bodies can be persisted to a durable on-disk cache under
//! caller-chosen logical names.
//!
//! "Hello world" example:
//! ```no_run
//! use quince_lib::{ContextBuilder, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = ContextBuilder::default().context();
//!     let body = ctx.get("https://example.com").name("home").send().await?;
//!     println!("{}", body.text().unwrap_or_default());
//!     ctx.close()?;
//!     Ok(())
//! }
//! ```
//!
//! For more specific use-cases, configure the context through its builder,
//! which grants full flexibility over throttling, redirects, headers, and
//! the cache location:
//!
//! ```no_run
//! use std::time::Duration;
//! use quince_lib::{ContextBuilder, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = ContextBuilder::builder()
//!         .request_delay(Duration::from_millis(500))
//!         .concurrent_requests(2_usize)
//!         .build()
//!         .context();
//!     let page = ctx
//!         .get("https://example.com/search")
//!         .query("q", "quince")
//!         .name("search")
//!         .send()
//!         .await?;
//!     assert!(page.is_text());
//!     ctx.close()?;
//!     Ok(())
//! }
//! ```

mod cache;
mod context;
mod session;
mod types;

pub mod ratelimit;

pub use cache::{Cache, INDEX_FILE};
pub use context::{
    Context, ContextBuilder, Fetch, DEFAULT_CACHE_DIR_NAME, DEFAULT_MAX_REDIRECTS,
};
pub use ratelimit::{OriginKey, DEFAULT_CONCURRENT_REQUESTS, DEFAULT_REQUEST_DELAY};
pub use reqwest::Method;
pub use session::DEFAULT_USER_AGENT;
pub use types::*;
