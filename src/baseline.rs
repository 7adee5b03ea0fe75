//! Baseline naming
//!
//! Maps an artifact path plus a branch reference to the name that artifact
//! uses as a stored baseline: the extension is replaced with
//! `-<ref>.<extension>`. The mapping is injective for distinct
//! `(path, ref)` pairs sharing an extension, so renamed files never collide
//! when multiple artifacts are processed in one run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Derive the baseline name for `path` under branch reference `reference`.
///
/// `target/app.jar` with ref `main` becomes `target/app-main.jar`. Pure
/// function, no filesystem access.
pub fn baseline_name(path: &Path, reference: &str) -> PathBuf {
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => path.with_file_name(format!(
            "{}-{}.{}",
            stem.to_string_lossy(),
            reference,
            ext.to_string_lossy()
        )),
        _ => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            path.with_file_name(format!("{name}-{reference}"))
        }
    }
}

/// Rename the workspace file at `path` to its baseline name.
///
/// Frees the original filename for the baseline about to be restored there.
/// Returns the new workspace-relative path.
pub fn rename_to_baseline(workspace: &Path, path: &Path, reference: &str) -> io::Result<PathBuf> {
    let renamed = baseline_name(path, reference);
    fs::rename(workspace.join(path), workspace.join(&renamed))?;
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_baseline_name_replaces_extension() {
        assert_eq!(
            baseline_name(Path::new("target/app.jar"), "main"),
            PathBuf::from("target/app-main.jar")
        );
    }

    #[test]
    fn test_baseline_name_keeps_parent_directory() {
        assert_eq!(
            baseline_name(Path::new("build/libs/core-1.2.jar"), "develop"),
            PathBuf::from("build/libs/core-1.2-develop.jar")
        );
    }

    #[test]
    fn test_baseline_name_injective_over_refs() {
        let path = Path::new("target/app.jar");
        let a = baseline_name(path, "main");
        let b = baseline_name(path, "develop");
        assert_ne!(a, b);
    }

    #[test]
    fn test_baseline_name_injective_over_paths() {
        let a = baseline_name(Path::new("target/app.jar"), "main");
        let b = baseline_name(Path::new("target/lib.jar"), "main");
        assert_ne!(a, b);
    }

    #[test]
    fn test_baseline_name_round_trips() {
        let original = Path::new("target/app.jar");
        let named = baseline_name(original, "main");

        // Strip the `-main` suffix and restore the extension.
        let stem = named.file_stem().unwrap().to_string_lossy().into_owned();
        let recovered = named.with_file_name(format!(
            "{}.jar",
            stem.strip_suffix("-main").unwrap()
        ));
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_baseline_name_without_extension() {
        assert_eq!(
            baseline_name(Path::new("target/app"), "main"),
            PathBuf::from("target/app-main")
        );
    }

    #[test]
    fn test_rename_to_baseline_moves_the_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/app.jar"), b"current").unwrap();

        let renamed =
            rename_to_baseline(dir.path(), Path::new("target/app.jar"), "main").unwrap();

        assert_eq!(renamed, PathBuf::from("target/app-main.jar"));
        assert!(!dir.path().join("target/app.jar").exists());
        assert_eq!(
            std::fs::read(dir.path().join("target/app-main.jar")).unwrap(),
            b"current"
        );
    }

    #[test]
    fn test_rename_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(rename_to_baseline(dir.path(), Path::new("absent.jar"), "main").is_err());
    }
}
