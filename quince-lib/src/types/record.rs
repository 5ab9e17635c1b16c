use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single entry of the cache index, mapping a logical name to the on-disk
/// content file it owns.
///
/// Records are persisted as the 5-element JSON array
/// `[name, url, ext, content_type, filename]`. This format is kept simple on
/// purpose because the index gets read by external tools and might need to
/// be edited by humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    /// Caller-chosen logical name, unique within an index
    pub name: String,
    /// Source URL the body was fetched from
    pub url: String,
    /// Storage extension, possibly empty
    pub ext: String,
    /// Content type as reported by the server, stored verbatim
    pub content_type: String,
    /// Opaque storage filename, unique within the cache root
    pub filename: String,
}

impl Serialize for CacheRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            &self.name,
            &self.url,
            &self.ext,
            &self.content_type,
            &self.filename,
        )
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CacheRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (name, url, ext, content_type, filename) =
            <(String, String, String, String, String)>::deserialize(deserializer)?;
        Ok(Self {
            name,
            url,
            ext,
            content_type,
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> CacheRecord {
        CacheRecord {
            name: "home".to_string(),
            url: "http://x/y.htm".to_string(),
            ext: "htm".to_string(),
            content_type: "text/html".to_string(),
            filename: "deadbeef.htm".to_string(),
        }
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&record()).unwrap();
        assert_eq!(
            json,
            r#"["home","http://x/y.htm","htm","text/html","deadbeef.htm"]"#
        );
    }

    #[test]
    fn test_round_trip() {
        let json = serde_json::to_string(&record()).unwrap();
        let back: CacheRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record());
    }

    #[test]
    fn test_rejects_malformed_entry() {
        let result = serde_json::from_str::<CacheRecord>(r#"["home","http://x"]"#);
        assert!(result.is_err());
    }
}
