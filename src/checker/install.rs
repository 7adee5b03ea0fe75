//! Checker installation
//!
//! Fetches a pinned release of japi-compliance-checker into the tool
//! directory and marks its entry script executable. Installation is skipped
//! when the entry script is already present.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Upstream repository of the compatibility checker.
pub const CHECKER_REPO_URL: &str = "https://github.com/lvc/japi-compliance-checker";

/// Pinned release tag.
pub const CHECKER_RELEASE_TAG: &str = "2.4";

/// Entry script inside the checkout.
pub const CHECKER_ENTRY_SCRIPT: &str = "japi-compliance-checker.pl";

/// Errors from checker installation.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("cannot run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git clone failed: {0}")]
    CloneFailed(String),

    #[error("checkout has no entry script at {0}")]
    EntryMissing(PathBuf),

    #[error("cannot prepare tool directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Ensure the checker is installed, returning the entry script path.
pub fn ensure_installed(tool_dir: &Path, verbose: bool) -> Result<PathBuf, InstallError> {
    let entry = tool_dir.join(CHECKER_ENTRY_SCRIPT);
    if entry.exists() {
        if verbose {
            eprintln!("[gate] using installed checker at {}", entry.display());
        }
        return Ok(entry);
    }

    if let Some(parent) = tool_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    if verbose {
        eprintln!(
            "[gate] installing japi-compliance-checker {} into {}",
            CHECKER_RELEASE_TAG,
            tool_dir.display()
        );
    }

    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--branch", CHECKER_RELEASE_TAG])
        .arg(CHECKER_REPO_URL)
        .arg(tool_dir)
        .output()
        .map_err(InstallError::Spawn)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(InstallError::CloneFailed(stderr));
    }

    if !entry.exists() {
        return Err(InstallError::EntryMissing(entry));
    }

    mark_executable(&entry)?;
    Ok(entry)
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_entry_script_skips_installation() {
        let dir = TempDir::new().unwrap();
        let tool_dir = dir.path().join("tool");
        fs::create_dir_all(&tool_dir).unwrap();
        let entry = tool_dir.join(CHECKER_ENTRY_SCRIPT);
        fs::write(&entry, "#!/usr/bin/perl\n").unwrap();

        let installed = ensure_installed(&tool_dir, false).unwrap();
        assert_eq!(installed, entry);
    }
}
