//! Credential holder for the access/refresh token pair.
//!
//! The client reads credentials fresh on every request and only the
//! refresh routine writes them, so the store's contract is small: a
//! `write` followed by a `read` in the same task must observe the new
//! pair, and the pair is always replaced as a unit.

use std::path::PathBuf;
use std::sync::RwLock;

use blood_orange_core::{StoredTokenPair, TokenPair};
use thiserror::Error;

/// Errors reading or writing the credential store.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    /// Filesystem error on the backing file.
    #[error("credential I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored form could not be serialized.
    #[error("credential serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A readable/writable holder for the current [`TokenPair`].
///
/// Replacing the pair is atomic from the caller's view: no reader ever
/// observes a partially-updated pair.
pub trait CredentialStore: Send + Sync {
    /// Current pair, if any.
    fn read(&self) -> Option<TokenPair>;

    /// Replace the pair as a unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn write(&self, pair: TokenPair) -> Result<(), CredentialStoreError>;

    /// Drop the pair (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be cleared.
    fn clear(&self) -> Result<(), CredentialStoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local credential holder. The default for tests and for
/// embedding the client in a host that manages its own persistence.
#[derive(Default)]
pub struct MemoryCredentialStore {
    pair: RwLock<Option<TokenPair>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct pre-populated, for composition roots that already hold
    /// a pair.
    #[must_use]
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            pair: RwLock::new(Some(pair)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Option<TokenPair> {
        self.pair.read().map_or(None, |guard| guard.clone())
    }

    fn write(&self, pair: TokenPair) -> Result<(), CredentialStoreError> {
        if let Ok(mut guard) = self.pair.write() {
            *guard = Some(pair);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        if let Ok(mut guard) = self.pair.write() {
            *guard = None;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed store
// ─────────────────────────────────────────────────────────────────────────────

/// Credential holder backed by a JSON file (the CLI's durable session).
///
/// Writes go to a sibling temp file first and are renamed into place so
/// a crash mid-write never leaves a torn pair. An unreadable or corrupt
/// file reads as "no credentials" rather than an error: the session is
/// simply unauthenticated and the next login rewrites the file.
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes writers and makes write-then-read within one task
    // observe the new value without re-reading the file mid-rename.
    cached: RwLock<Option<TokenPair>>,
}

impl FileCredentialStore {
    /// Open a store at `path`, loading any existing pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialStoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let cached = RwLock::new(load_pair(&path));
        Ok(Self { path, cached })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

fn load_pair(path: &std::path::Path) -> Option<TokenPair> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read credentials file");
            return None;
        }
    };

    match serde_json::from_str::<StoredTokenPair>(&contents) {
        Ok(stored) => TokenPair::try_from(stored)
            .inspect_err(|err| {
                tracing::warn!(path = %path.display(), error = %err, "discarding incomplete credentials file");
            })
            .ok(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "discarding corrupt credentials file");
            None
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn read(&self) -> Option<TokenPair> {
        self.cached.read().map_or(None, |guard| guard.clone())
    }

    fn write(&self, pair: TokenPair) -> Result<(), CredentialStoreError> {
        let serialized = serde_json::to_string_pretty(&pair.to_stored())?;

        let mut guard = self
            .cached
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.path)?;

        *guard = Some(pair);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        let mut guard = self
            .cached
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        *guard = None;
        Ok(())
    }
}
