//! The fetch orchestrator.
//!
//! A [`Context`] composes the per-origin rate limiter, the per-origin
//! concurrency gate, the shared connection pool, and the content cache to
//! serve a single logical fetch: wait for the origin's turn, take an
//! in-flight slot, perform the exchange, and optionally persist the body
//! under a caller-chosen logical name.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use reqwest::Method;
use typed_builder::TypedBuilder;
use url::Url;

use crate::cache::{sanitize_ext, Cache};
use crate::ratelimit::{
    OriginKey, OriginPool, ThrottleConfig, DEFAULT_CONCURRENT_REQUESTS, DEFAULT_REQUEST_DELAY,
};
use crate::session::Session;
use crate::{Body, ErrorKind, Result};

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = ".cache";

/// Redirect limit used when neither the call nor the context sets one, 10
/// (the underlying transport default).
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Builder for [`Context`].
///
/// All knobs are frozen once [`context`](ContextBuilder::context) is
/// called; configuration is instance-scoped and never mutated afterwards.
///
/// See crate-level documentation for a usage example.
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default, setter(into)))]
pub struct ContextBuilder {
    /// Minimum delay between consecutive requests to one origin.
    #[builder(default = DEFAULT_REQUEST_DELAY)]
    request_delay: Duration,

    /// Maximum simultaneous in-flight requests per origin.
    #[builder(default = DEFAULT_CONCURRENT_REQUESTS)]
    concurrent_requests: usize,

    /// Whether redirects are followed when a call does not say otherwise.
    /// `None` defers to the transport default (follow).
    allow_redirects: Option<bool>,

    /// Redirect limit applied when a call sets none.
    max_redirects: Option<usize>,

    /// Default headers sent with every request; per-call headers take
    /// precedence key by key.
    headers: HeaderMap,

    /// Response timeout applied when a call sets none.
    timeout: Option<Duration>,

    /// Directory for the content cache. Defaults to `./.cache`.
    cache_dir: Option<PathBuf>,
}

impl Default for ContextBuilder {
    #[must_use]
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ContextBuilder {
    /// Instantiate a [`Context`].
    #[must_use]
    pub fn context(self) -> Context {
        Context {
            allow_redirects: self.allow_redirects,
            max_redirects: self.max_redirects,
            timeout: self.timeout,
            cache_dir: self
                .cache_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR_NAME)),
            session: Session::new(self.headers),
            origins: OriginPool::new(ThrottleConfig {
                request_delay: self.request_delay,
                concurrent_requests: self.concurrent_requests,
            }),
            cache: Mutex::new(None),
        }
    }
}

/// Serves many concurrent logical fetches over one shared connection pool,
/// spacing and bounding requests per origin and persisting named results
/// into the content cache.
///
/// A `Context` is created once per logical run (see [`ContextBuilder`]),
/// shared by reference across tasks, and torn down exactly once with
/// [`close`](Context::close).
#[derive(Debug)]
pub struct Context {
    /// Instance-level redirect policy; `None` defers to the transport default
    allow_redirects: Option<bool>,

    /// Instance-level redirect limit
    max_redirects: Option<usize>,

    /// Instance-level response timeout
    timeout: Option<Duration>,

    /// Where the cache lives when opened lazily
    cache_dir: PathBuf,

    /// The shared connection pool
    session: Session,

    /// Lazily created per-origin throttling state
    origins: OriginPool,

    /// The content cache, opened on first access
    cache: Mutex<Option<Cache>>,
}

impl Context {
    /// Start a fetch with an explicit HTTP method.
    pub fn request<U: Into<String>>(&self, method: Method, url: U) -> Fetch<'_> {
        Fetch::new(self, method, url.into())
    }

    /// Start a GET fetch.
    pub fn get<U: Into<String>>(&self, url: U) -> Fetch<'_> {
        self.request(Method::GET, url)
    }

    /// Start a POST fetch.
    pub fn post<U: Into<String>>(&self, url: U) -> Fetch<'_> {
        self.request(Method::POST, url)
    }

    /// Read a previously cached body by its logical name.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the cache cannot be opened or the name is
    /// unknown.
    ///
    /// # Panics
    ///
    /// Panics if the cache mutex is poisoned
    pub fn load(&self, name: &str) -> Result<Body> {
        self.with_cache(|cache| cache.get(name))
    }

    /// Open (or re-open) the content cache at an explicit directory,
    /// replacing the lazily opened one.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the directory cannot be opened as a cache root.
    ///
    /// # Panics
    ///
    /// Panics if the cache mutex is poisoned
    pub fn open_cache<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let cache = Cache::open(dir)?;
        *self.cache.lock().unwrap() = Some(cache);
        Ok(())
    }

    /// Tear the context down: close the connection pool first, then save
    /// the cache index.
    ///
    /// The teardown runs once; later calls are no-ops. Any fetch issued
    /// after `close` fails with [`ErrorKind::SessionClosed`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the index cannot be persisted.
    ///
    /// # Panics
    ///
    /// Panics if the cache mutex is poisoned
    pub fn close(&self) -> Result<()> {
        if !self.session.close() {
            log::debug!("context: already closed");
            return Ok(());
        }
        log::debug!("context: closing");
        self.with_cache(|cache| cache.save())
    }

    /// Run `f` against the cache, opening it at the configured directory
    /// on first access.
    fn with_cache<T>(&self, f: impl FnOnce(&mut Cache) -> Result<T>) -> Result<T> {
        let mut guard = self.cache.lock().unwrap();
        if guard.is_none() {
            *guard = Some(Cache::open(&self.cache_dir)?);
        }
        f(guard.as_mut().expect("cache was just opened"))
    }

    /// The full fetch pipeline for one logical request.
    async fn execute(&self, fetch: Fetch<'_>) -> Result<Body> {
        let Fetch {
            method,
            url,
            query,
            name,
            headers,
            allow_redirects,
            max_redirects,
            timeout,
            body,
            ..
        } = fetch;

        let mut url = Url::parse(&url)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(&query);
        }

        let origin = self.origins.get_or_create(OriginKey::try_from(&url)?);
        origin.wait_turn().await;
        // Held until the body is fully consumed or the attempt fails;
        // dropping the permit on cancellation frees the slot.
        let _slot = origin.enter().await;

        let client = self.session.client().await?;

        let follow = allow_redirects.or(self.allow_redirects).unwrap_or(true);
        let max_redirects = max_redirects
            .or(self.max_redirects)
            .unwrap_or(DEFAULT_MAX_REDIRECTS);
        let timeout = timeout.or(self.timeout);

        let mut method = method;
        let mut body = body;
        let mut redirects = 0_usize;

        let response = loop {
            let mut request = client
                .request(method.clone(), url.clone())
                .headers(headers.clone());
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }
            if let Some(body) = &body {
                request = request.body(body.clone());
            }

            let response = request.send().await.map_err(ErrorKind::NetworkRequest)?;

            if !(follow && response.status().is_redirection()) {
                break response;
            }
            let Some(next) = redirect_target(&response) else {
                // A redirect without a usable Location is final
                break response;
            };
            if redirects >= max_redirects {
                return Err(ErrorKind::TooManyRedirects(url));
            }
            redirects += 1;

            // 303 rewrites to a body-less GET; so do the legacy 301/302
            // when the original request carried a body
            if response.status() == StatusCode::SEE_OTHER
                || (matches!(
                    response.status(),
                    StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND
                ) && body.is_some())
            {
                method = Method::GET;
                body = None;
            }
            log::debug!("fetch: redirected to [{next}]");
            url = next;
        };

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            return Err(ErrorKind::HttpStatus {
                status,
                url: final_url,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(ErrorKind::ReadResponseBody)?
            .to_vec();

        if let Some(name) = &name {
            let ext = storage_ext(&final_url, &content_type);
            self.with_cache(|cache| {
                cache.set(name, final_url.as_str(), &ext, &content_type, &bytes)
            })?;
        }

        Body::from_bytes(&content_type, bytes)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if !self.session.is_closed() {
            log::warn!("context dropped without close(); unsaved index entries are lost");
        }
    }
}

/// A single logical fetch, under construction.
///
/// Created by [`Context::get`], [`Context::post`] or [`Context::request`]
/// and finished with [`send`](Fetch::send). Per-call options override the
/// context-level defaults.
#[derive(Debug)]
#[must_use = "a fetch does nothing until sent"]
pub struct Fetch<'a> {
    ctx: &'a Context,
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    name: Option<String>,
    headers: HeaderMap,
    allow_redirects: Option<bool>,
    max_redirects: Option<usize>,
    timeout: Option<Duration>,
    body: Option<Vec<u8>>,
}

impl<'a> Fetch<'a> {
    fn new(ctx: &'a Context, method: Method, url: String) -> Self {
        Self {
            ctx,
            method,
            url,
            query: Vec::new(),
            name: None,
            headers: HeaderMap::new(),
            allow_redirects: None,
            max_redirects: None,
            timeout: None,
            body: None,
        }
    }

    /// Append one query parameter to the URL.
    pub fn query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Persist the fetched body into the content cache under this logical
    /// name. Replaces any prior entry for the name; the last successful
    /// fetch wins.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set one header for this call, overriding any instance-level default
    /// with the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Merge a whole header map into this call's headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Follow redirects for this call, overriding the instance default.
    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = Some(allow);
        self
    }

    /// Redirect limit for this call, overriding the instance default.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Response timeout for this call, overriding the instance default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Raw request body for this call.
    pub fn body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Perform the fetch.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the URL is invalid, the session is closed, the
    /// transport fails, the final status is not 2xx, the redirect limit is
    /// exceeded, a textual body is not valid UTF-8, or the cache store
    /// fails.
    pub async fn send(self) -> Result<Body> {
        self.ctx.execute(self).await
    }
}

/// The target of a redirect response, resolved against the current URL.
fn redirect_target(response: &reqwest::Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    response.url().join(location).ok()
}

/// Derive the storage extension for a fetched resource: the URL path's
/// trailing suffix when it sanitizes to 1-4 alphanumeric characters,
/// otherwise a guess from the content type, otherwise empty.
fn storage_ext(url: &Url, content_type: &str) -> String {
    let last_segment = url.path().rsplit('/').next().unwrap_or_default();
    let ext = match last_segment.rsplit_once('.') {
        // A bare leading dot is a hidden name, not an extension
        Some((stem, suffix)) if !stem.is_empty() => sanitize_ext(suffix),
        _ => String::new(),
    };
    if !ext.is_empty() {
        return ext;
    }
    ext_for_content_type(content_type)
        .unwrap_or_default()
        .to_string()
}

/// Map a content type to a conventional file extension. Only the essence
/// is considered; parameters like `;charset=` are ignored.
fn ext_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    match essence.as_str() {
        "text/html" => Some("html"),
        "text/plain" => Some("txt"),
        "text/css" => Some("css"),
        "text/csv" => Some("csv"),
        "text/markdown" => Some("md"),
        "text/javascript" | "application/javascript" => Some("js"),
        "text/xml" | "application/xml" => Some("xml"),
        "application/json" => Some("json"),
        "application/pdf" => Some("pdf"),
        "application/zip" => Some("zip"),
        "application/gzip" => Some("gz"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some("ico"),
        "audio/mpeg" => Some("mp3"),
        "video/mp4" => Some("mp4"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_storage_ext_from_url_suffix() {
        assert_eq!(storage_ext(&url("http://x/y.htm"), "text/html"), "htm");
        assert_eq!(storage_ext(&url("http://x/a/b/c.json"), ""), "json");
        // Sanitized and truncated uniformly
        assert_eq!(storage_ext(&url("http://x/y.hypertext"), ""), "hype");
    }

    #[test]
    fn test_storage_ext_falls_back_to_content_type() {
        assert_eq!(storage_ext(&url("http://x/page"), "text/html"), "html");
        assert_eq!(
            storage_ext(&url("http://x/data"), "application/json; charset=utf-8"),
            "json"
        );
        assert_eq!(storage_ext(&url("http://x/"), "image/png"), "png");
    }

    #[test]
    fn test_storage_ext_empty_when_nothing_matches() {
        assert_eq!(storage_ext(&url("http://x/blob"), "application/x-custom"), "");
        assert_eq!(storage_ext(&url("http://x/blob"), ""), "");
    }

    #[test]
    fn test_storage_ext_ignores_hidden_names_and_dot_dirs() {
        // ".hidden" carries no extension
        assert_eq!(storage_ext(&url("http://x/.hidden"), ""), "");
        // A dot in a parent directory does not leak into the extension
        assert_eq!(storage_ext(&url("http://x/v1.2/data"), ""), "");
    }

    #[test]
    fn test_ext_for_content_type() {
        assert_eq!(ext_for_content_type("text/html"), Some("html"));
        assert_eq!(ext_for_content_type("TEXT/HTML"), Some("html"));
        assert_eq!(
            ext_for_content_type("application/json; charset=utf-8"),
            Some("json")
        );
        assert_eq!(ext_for_content_type("application/x-unknown"), None);
    }

    #[test]
    fn test_builder_defaults() {
        let ctx = ContextBuilder::default().context();
        assert_eq!(ctx.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR_NAME));
        assert_eq!(ctx.allow_redirects, None);
        assert_eq!(ctx.max_redirects, None);
    }
}
