use std::path::PathBuf;
use std::string::FromUtf8Error;

use http::StatusCode;
use thiserror::Error;
use url::Url;

/// Possible errors when interacting with `quince_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The configured cache root exists but is not a directory
    #[error("cache root `{0}` exists and is not a directory")]
    CacheDir(PathBuf),

    /// The given logical name has no cache entry
    #[error("no cache entry for `{0}`")]
    NotFound(String),

    /// The server answered with a non-success status code
    #[error("`{url}` returned unexpected status: {status}")]
    HttpStatus {
        /// Status code of the final response
        status: StatusCode,
        /// URL the response came from
        url: Url,
    },

    /// Network error while trying to connect to an endpoint via reqwest
    #[error("Network error while trying to connect to an endpoint via reqwest")]
    NetworkRequest(#[source] reqwest::Error),

    /// Error while reading the response body
    #[error("Error while reading the response body")]
    ReadResponseBody(#[source] reqwest::Error),

    /// The shared request client could not be built
    #[error("The request client could not be built")]
    BuildRequestClient(#[source] reqwest::Error),

    /// The cache index file could not be parsed
    #[error("Failed to parse the cache index: {0}")]
    ParseIndex(#[from] serde_json::Error),

    /// Any form of I/O error occurred while accessing a given path.
    #[error("Failed to access path: `{path}`, reason: {reason}",
        path = match .0 {
            Some(p) => p.to_str().unwrap_or("<MALFORMED PATH>"),
            None => "<MALFORMED PATH>",
        },
        reason = .1)]
    IoError(Option<PathBuf>, #[source] std::io::Error),

    /// A textual response body was not valid UTF-8
    #[error("Attempted to interpret an invalid sequence of bytes as a string")]
    Utf8(#[from] FromUtf8Error),

    /// The given header value could not be parsed
    #[error("Header could not be parsed.")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// The given string cannot be parsed into a valid URL
    #[error("Cannot parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// A URL with no host cannot be keyed for rate limiting
    #[error("URL is missing a host")]
    InvalidUrlHost,

    /// The redirect limit was exceeded before reaching a final response
    #[error("Too many redirects while fetching `{0}`")]
    TooManyRedirects(Url),

    /// The session was closed; no more requests may be issued
    #[error("Session is closed, no more requests can be issued")]
    SessionClosed,
}

impl From<std::io::Error> for ErrorKind {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(None, e)
    }
}

impl From<(PathBuf, std::io::Error)> for ErrorKind {
    fn from(value: (PathBuf, std::io::Error)) -> Self {
        Self::IoError(Some(value.0), value.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message() {
        let err = ErrorKind::HttpStatus {
            status: StatusCode::NOT_FOUND,
            url: Url::parse("http://example.com/missing").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "`http://example.com/missing` returned unexpected status: 404 Not Found"
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            ErrorKind::NotFound("home".to_string()).to_string(),
            "no cache entry for `home`"
        );
    }
}
