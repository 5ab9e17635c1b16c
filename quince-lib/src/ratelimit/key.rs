use std::fmt;

use url::Url;

use crate::{ErrorKind, Result};

/// A type-safe representation of a network origin (`host[:port]`) used as
/// the partition key for rate limiting and concurrency bounding.
///
/// Hostnames are lowercased so lookups stay consistent, and a non-default
/// port is part of the key: `example.com:8080` is throttled independently
/// of `example.com`.
///
/// # Examples
///
/// ```
/// use quince_lib::OriginKey;
/// use url::Url;
///
/// let url = Url::parse("https://api.example.com/v1/items").unwrap();
/// let origin = OriginKey::try_from(&url).unwrap();
/// assert_eq!(origin.as_str(), "api.example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginKey(String);

impl OriginKey {
    /// The origin as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&Url> for OriginKey {
    type Error = ErrorKind;

    fn try_from(url: &Url) -> Result<Self> {
        let host = url.host_str().ok_or(ErrorKind::InvalidUrlHost)?;

        // Default ports are already elided by the Url parser, so the key
        // only carries a port when it deviates from the scheme default.
        let key = match url.port() {
            Some(port) => format!("{}:{port}", host.to_lowercase()),
            None => host.to_lowercase(),
        };
        Ok(OriginKey(key))
    }
}

impl fmt::Display for OriginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OriginKey {
    fn from(origin: &str) -> Self {
        OriginKey(origin.to_lowercase())
    }
}
