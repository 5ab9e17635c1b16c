//! Durable on-disk store for fetched bodies, addressed by logical name.
//!
//! The cache is a flat directory of opaque-named content files plus a JSON
//! index (`index.json`) mapping each logical name to its [`CacheRecord`].
//! The index is loaded once at open and rewritten wholesale on save; saves
//! go through a temporary file and an atomic rename, so a crash mid-save
//! never leaves a half-written index behind.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Body, CacheRecord, ErrorKind, Result};

/// Name of the JSON index file inside the cache root
pub const INDEX_FILE: &str = "index.json";

/// Maximum length of a storage extension after sanitizing
const MAX_EXT_LEN: usize = 4;

/// The content cache, owning its root directory and in-memory index.
///
/// The cache is a single-writer resource: the fetch orchestrator owns the
/// only mutable handle. External tools read `index.json` and the content
/// files directly and must tolerate a snapshot that predates unsaved
/// in-memory updates.
#[derive(Debug)]
pub struct Cache {
    /// Directory holding the index and all content files
    root: PathBuf,

    /// In-memory index, keyed by logical name
    pages: HashMap<String, CacheRecord>,
}

impl Cache {
    /// Open a cache rooted at `root`.
    ///
    /// The directory is created if missing. An absent index file means an
    /// empty cache; a present one is parsed as a JSON array of records.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if `root` exists as a non-directory, if the
    /// directory cannot be created, or if the index file is unreadable or
    /// corrupt.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.exists() && !root.is_dir() {
            return Err(ErrorKind::CacheDir(root));
        }
        fs::create_dir_all(&root).map_err(|e| ErrorKind::IoError(Some(root.clone()), e))?;

        let index = root.join(INDEX_FILE);
        let pages = if index.is_file() {
            log::debug!("cache: loading index from [{}]", index.display());
            let raw = fs::read(&index).map_err(|e| ErrorKind::IoError(Some(index.clone()), e))?;
            let records: Vec<CacheRecord> = serde_json::from_slice(&raw)?;
            records
                .into_iter()
                .map(|rec| (rec.name.clone(), rec))
                .collect()
        } else {
            log::debug!("cache: empty index [{}]", index.display());
            HashMap::new()
        };

        Ok(Self { root, pages })
    }

    /// The directory this cache stores its files in
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `body` under `name`, replacing any prior entry for that name.
    ///
    /// The body lands in a fresh opaque file first and the index entry is
    /// swapped afterwards, so a failed write leaves the prior entry intact.
    /// The superseded content file is deleted best-effort; a stale orphan
    /// is acceptable, losing the new body is not.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the new content file cannot be written.
    pub fn set(
        &mut self,
        name: &str,
        url: &str,
        ext: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<()> {
        log::debug!("cache: setting [{name}] from [{url}]");

        // A destroyed cache comes back to life on the next set
        fs::create_dir_all(&self.root).map_err(|e| ErrorKind::IoError(Some(self.root.clone()), e))?;

        let mut filename = uuid::Uuid::new_v4().simple().to_string();
        let ext = sanitize_ext(ext);
        if !ext.is_empty() {
            filename.push('.');
            filename.push_str(&ext);
        }

        let path = self.root.join(&filename);
        fs::write(&path, body).map_err(|e| ErrorKind::IoError(Some(path), e))?;

        if let Some(prior) = self.pages.get(name) {
            let old = self.root.join(&prior.filename);
            if let Err(e) = fs::remove_file(&old) {
                log::warn!("cache: failed to delete old file [{}]: {e}", old.display());
            }
        }

        self.pages.insert(
            name.to_string(),
            CacheRecord {
                name: name.to_string(),
                url: url.to_string(),
                ext,
                content_type: content_type.to_string(),
                filename,
            },
        );
        Ok(())
    }

    /// Read the body stored under `name`.
    ///
    /// Bodies with a `text/*` content type come back as [`Body::Text`],
    /// everything else as [`Body::Bytes`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if `name` is unknown, the content file cannot be
    /// read, or a textual body is not valid UTF-8.
    pub fn get(&self, name: &str) -> Result<Body> {
        let rec = self.record(name)?;
        let path = self.root.join(&rec.filename);
        let bytes = fs::read(&path).map_err(|e| ErrorKind::IoError(Some(path), e))?;
        Body::from_bytes(&rec.content_type, bytes)
    }

    /// All logical names currently indexed, in no particular order
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.pages.keys().cloned().collect()
    }

    /// The on-disk location of the content file for `name`, without
    /// reading the body.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if `name` is unknown.
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(&self.record(name)?.filename))
    }

    /// The stored content type for `name`, verbatim as the server
    /// reported it.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if `name` is unknown.
    pub fn content_type(&self, name: &str) -> Result<&str> {
        Ok(&self.record(name)?.content_type)
    }

    /// The full index record for `name`.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if `name` is unknown.
    pub fn record(&self, name: &str) -> Result<&CacheRecord> {
        self.pages
            .get(name)
            .ok_or_else(|| ErrorKind::NotFound(name.to_string()))
    }

    /// Persist the index as one JSON array.
    ///
    /// The document is written to a temporary file in the same directory
    /// and renamed over `index.json`, so readers never observe a partially
    /// written index.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the index cannot be serialized or written.
    pub fn save(&self) -> Result<()> {
        log::debug!("cache: saving");
        let records: Vec<&CacheRecord> = self.pages.values().collect();
        let raw = serde_json::to_vec(&records)?;

        let index = self.root.join(INDEX_FILE);
        let tmp = self.root.join(format!("{INDEX_FILE}.tmp"));
        fs::write(&tmp, raw).map_err(|e| ErrorKind::IoError(Some(tmp.clone()), e))?;
        fs::rename(&tmp, &index).map_err(|e| ErrorKind::IoError(Some(index), e))?;
        Ok(())
    }

    /// Delete the whole cache directory tree and reset the in-memory index.
    ///
    /// A later [`set`](Self::set) recreates the directory.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the directory tree cannot be removed.
    pub fn destroy(&mut self) -> Result<()> {
        log::debug!("cache: destroying [{}]", self.root.display());
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .map_err(|e| ErrorKind::IoError(Some(self.root.clone()), e))?;
        }
        self.pages.clear();
        Ok(())
    }
}

/// Strip everything but ASCII alphanumerics from an extension and cap its
/// length at four characters. Collisions after truncation are acceptable;
/// file uniqueness comes from the opaque id, not the extension.
pub(crate) fn sanitize_ext(ext: &str) -> String {
    ext.chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXT_LEN)
        .collect()
}
