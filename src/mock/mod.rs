//! Mock cache store
//!
//! Configurable test double for the cache gateway: records every save and
//! restore call, serves scripted restore results, and injects failures for
//! exercising error paths. Used by unit and integration tests; never by the
//! shipped binary.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::{CacheError, CacheStore};

/// A recorded `save` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveCall {
    pub key: String,
    pub paths: Vec<PathBuf>,
}

/// A recorded `restore` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreCall {
    pub key: String,
    pub fallback_prefixes: Vec<String>,
}

/// Scripted behavior for `restore`.
#[derive(Debug, Clone, Default)]
pub enum RestoreScript {
    /// No entry in the key family.
    #[default]
    Absent,
    /// Match under `key`, materializing `files` into the workspace.
    Match {
        key: String,
        files: Vec<(PathBuf, Vec<u8>)>,
    },
}

/// Mock cache store with scripted behavior and failure injection.
#[derive(Debug, Default)]
pub struct MockCacheStore {
    feature_unavailable: bool,
    fail_save: bool,
    fail_restore: bool,
    restore_script: RestoreScript,
    saves: RefCell<Vec<SaveCall>>,
    restores: RefCell<Vec<RestoreCall>>,
}

impl MockCacheStore {
    /// A store with the feature available and nothing cached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the cache feature as unavailable.
    pub fn with_feature_unavailable(mut self) -> Self {
        self.feature_unavailable = true;
        self
    }

    /// Script a restore match: `key` is returned and `files` (relative path,
    /// contents) are written into the workspace.
    pub fn with_restore(mut self, key: &str, files: Vec<(PathBuf, Vec<u8>)>) -> Self {
        self.restore_script = RestoreScript::Match {
            key: key.to_string(),
            files,
        };
        self
    }

    /// Inject a save failure.
    pub fn with_save_failure(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Inject a restore failure.
    pub fn with_restore_failure(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    /// Every save call recorded so far.
    pub fn saves(&self) -> Vec<SaveCall> {
        self.saves.borrow().clone()
    }

    /// Every restore call recorded so far.
    pub fn restores(&self) -> Vec<RestoreCall> {
        self.restores.borrow().clone()
    }

    fn injected(message: &str) -> CacheError {
        CacheError::Io(std::io::Error::new(std::io::ErrorKind::Other, message))
    }
}

impl CacheStore for MockCacheStore {
    fn is_feature_available(&self) -> bool {
        !self.feature_unavailable
    }

    fn save(&self, _workspace: &Path, paths: &[PathBuf], key: &str) -> Result<String, CacheError> {
        self.saves.borrow_mut().push(SaveCall {
            key: key.to_string(),
            paths: paths.to_vec(),
        });
        if self.fail_save {
            return Err(Self::injected("injected save failure"));
        }
        Ok(key.to_string())
    }

    fn restore(
        &self,
        workspace: &Path,
        _paths: &[PathBuf],
        key: &str,
        fallback_prefixes: &[String],
    ) -> Result<Option<String>, CacheError> {
        self.restores.borrow_mut().push(RestoreCall {
            key: key.to_string(),
            fallback_prefixes: fallback_prefixes.to_vec(),
        });
        if self.fail_restore {
            return Err(Self::injected("injected restore failure"));
        }

        match &self.restore_script {
            RestoreScript::Absent => Ok(None),
            RestoreScript::Match { key, files } => {
                for (path, contents) in files {
                    let target = workspace.join(path);
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&target, contents)?;
                }
                Ok(Some(key.clone()))
            }
        }
    }
}
