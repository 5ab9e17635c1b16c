//! The shared connection pool.
//!
//! One `reqwest` client serves every fetch for the lifetime of a
//! [`Context`](crate::Context). It is built lazily on the first request and
//! closed exactly once at teardown; a closed session refuses further
//! requests. Redirects are disabled on the client itself because the
//! orchestrator follows them manually, which lets the redirect policy
//! differ per call on a single shared pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use http::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio::sync::OnceCell;

use crate::{ErrorKind, Result};

/// Default user agent, `quince/<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("quince/", env!("CARGO_PKG_VERSION"));

/// A timeout for only the connect phase of the client.
const CONNECT_TIMEOUT: u64 = 10;
/// TCP keepalive
/// See <https://tldp.org/HOWTO/TCP-Keepalive-HOWTO/overview.html> for more info
const TCP_KEEPALIVE: u64 = 60;

#[derive(Debug)]
pub(crate) struct Session {
    /// The shared client, created on first use
    client: OnceCell<reqwest::Client>,

    /// Instance-level default headers baked into the client
    default_headers: HeaderMap,

    /// Once set, no more requests may be issued
    closed: AtomicBool,
}

impl Session {
    pub(crate) fn new(default_headers: HeaderMap) -> Self {
        Self {
            client: OnceCell::new(),
            default_headers,
            closed: AtomicBool::new(false),
        }
    }

    /// The shared client, built on first use.
    ///
    /// Instance headers become the client's default headers, so per-request
    /// headers override them key by key.
    pub(crate) async fn client(&self) -> Result<&reqwest::Client> {
        if self.is_closed() {
            return Err(ErrorKind::SessionClosed);
        }

        self.client
            .get_or_try_init(|| async {
                log::debug!("session: creating shared client");
                let mut headers = self.default_headers.clone();
                headers
                    .entry(USER_AGENT)
                    .or_insert_with(|| HeaderValue::from_static(DEFAULT_USER_AGENT));

                reqwest::ClientBuilder::new()
                    .gzip(true)
                    .default_headers(headers)
                    .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
                    .tcp_keepalive(Duration::from_secs(TCP_KEEPALIVE))
                    .redirect(reqwest::redirect::Policy::none())
                    .build()
                    .map_err(ErrorKind::BuildRequestClient)
            })
            .await
    }

    /// Mark the session closed. Returns whether this call was the one that
    /// performed the close.
    pub(crate) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_session_refuses_clients() {
        let session = Session::new(HeaderMap::new());
        assert!(session.client().await.is_ok());

        session.close();
        assert!(matches!(
            session.client().await,
            Err(ErrorKind::SessionClosed)
        ));
    }

    #[test]
    fn test_close_happens_once() {
        let session = Session::new(HeaderMap::new());
        assert!(session.close());
        assert!(!session.close());
        assert!(session.is_closed());
    }
}
