//! Cache gateway
//!
//! Thin contract over the external artifact cache: save a set of workspace
//! files under a key, restore them later by exact key or by prefix fallback.
//! Absence on restore is a signal, not an error; the orchestrator decides
//! what it means.

mod disk;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use disk::DiskCacheStore;

/// Errors from cache store operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid cache metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("cache entry {key} failed integrity check (expected {expected}, got {actual})")]
    IntegrityMismatch {
        key: String,
        expected: String,
        actual: String,
    },
}

/// Contract mirroring the external cache store.
pub trait CacheStore {
    /// Whether the cache backend is usable in this environment.
    fn is_feature_available(&self) -> bool;

    /// Save the given workspace-relative `paths` under `key`.
    ///
    /// Returns the key the entry was stored under.
    fn save(&self, workspace: &Path, paths: &[PathBuf], key: &str) -> Result<String, CacheError>;

    /// Restore a previously saved entry.
    ///
    /// Attempts the exact `key` first, then each prefix in
    /// `fallback_prefixes` in order, returning the first match. On a match
    /// the cached files are materialized into the workspace at their
    /// recorded relative paths and the matched key is returned. `None` means
    /// no entry in the key family exists.
    fn restore(
        &self,
        workspace: &Path,
        paths: &[PathBuf],
        key: &str,
        fallback_prefixes: &[String],
    ) -> Result<Option<String>, CacheError>;
}
