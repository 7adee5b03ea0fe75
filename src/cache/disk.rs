//! Directory-backed cache store
//!
//! One tar archive per key plus a JSON metadata sidecar carrying the
//! archive's SHA-256 digest, verified before any restore unpacks into the
//! workspace. Prefix fallback scans the recorded keys and picks the newest
//! family member.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{CacheError, CacheStore};

/// Metadata sidecar for one cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMetadata {
    /// The key this entry was saved under (unsanitized).
    key: String,
    /// When the entry was written.
    created_at: DateTime<Utc>,
    /// SHA-256 of the tar archive, hex-encoded.
    archive_sha256: String,
    /// Workspace-relative paths stored in the archive.
    paths: Vec<String>,
}

/// Cache store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct DiskCacheStore {
    root: PathBuf,
}

impl DiskCacheStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_stem(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    fn archive_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.tar"))
    }

    fn metadata_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.json"))
    }

    /// Read every entry's metadata, skipping unreadable sidecars.
    fn read_entries(&self) -> Result<Vec<(EntryMetadata, PathBuf)>, CacheError> {
        let mut entries = Vec::new();
        for item in fs::read_dir(&self.root)? {
            let item = item?;
            let path = item.path();
            if path.extension().map(|e| e == "json") != Some(true) {
                continue;
            }
            let contents = fs::read_to_string(&path)?;
            let meta: EntryMetadata = match serde_json::from_str(&contents) {
                Ok(meta) => meta,
                Err(err) => {
                    eprintln!("[cache] ignoring unreadable entry {}: {}", path.display(), err);
                    continue;
                }
            };
            let tar_path = path.with_extension("tar");
            if tar_path.exists() {
                entries.push((meta, tar_path));
            }
        }
        Ok(entries)
    }

    fn verify_and_unpack(
        &self,
        workspace: &Path,
        meta: &EntryMetadata,
        tar_path: &Path,
    ) -> Result<(), CacheError> {
        let bytes = fs::read(tar_path)?;
        let actual = hex::encode(Sha256::digest(&bytes));
        if actual != meta.archive_sha256 {
            return Err(CacheError::IntegrityMismatch {
                key: meta.key.clone(),
                expected: meta.archive_sha256.clone(),
                actual,
            });
        }

        let mut archive = tar::Archive::new(File::open(tar_path)?);
        archive.unpack(workspace)?;
        Ok(())
    }
}

impl CacheStore for DiskCacheStore {
    fn is_feature_available(&self) -> bool {
        fs::create_dir_all(&self.root).is_ok()
    }

    fn save(&self, workspace: &Path, paths: &[PathBuf], key: &str) -> Result<String, CacheError> {
        fs::create_dir_all(&self.root)?;

        let mut builder = tar::Builder::new(Vec::new());
        for path in paths {
            builder.append_path_with_name(workspace.join(path), path)?;
        }
        let bytes = builder.into_inner()?;

        let meta = EntryMetadata {
            key: key.to_string(),
            created_at: Utc::now(),
            archive_sha256: hex::encode(Sha256::digest(&bytes)),
            paths: paths.iter().map(|p| p.display().to_string()).collect(),
        };

        let stem = Self::entry_stem(key);
        fs::write(self.archive_path(&stem), &bytes)?;
        fs::write(
            self.metadata_path(&stem),
            serde_json::to_string_pretty(&meta)?,
        )?;

        Ok(key.to_string())
    }

    fn restore(
        &self,
        workspace: &Path,
        _paths: &[PathBuf],
        key: &str,
        fallback_prefixes: &[String],
    ) -> Result<Option<String>, CacheError> {
        if !self.root.is_dir() {
            return Ok(None);
        }

        let entries = self.read_entries()?;

        let exact = entries.iter().find(|(meta, _)| meta.key == key);
        let chosen = match exact {
            Some(entry) => Some(entry),
            None => fallback_prefixes.iter().find_map(|prefix| {
                entries
                    .iter()
                    .filter(|(meta, _)| meta.key.starts_with(prefix.as_str()))
                    .max_by(|(a, _), (b, _)| {
                        a.created_at
                            .cmp(&b.created_at)
                            .then_with(|| a.key.cmp(&b.key))
                    })
            }),
        };

        match chosen {
            Some((meta, tar_path)) => {
                self.verify_and_unpack(workspace, meta, tar_path)?;
                Ok(Some(meta.key.clone()))
            }
            None => Ok(None),
        }
    }
}
