//! Artifact resolution and eligibility filtering
//!
//! Expands the configured glob pattern into concrete workspace-relative
//! paths, then drops anything that is not an eligible build artifact:
//! non-jar files, source bundles, and javadoc bundles.

use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use thiserror::Error;
use walkdir::WalkDir;

/// File extension of eligible build artifacts.
pub const ARTIFACT_EXTENSION: &str = "jar";

/// Suffix marking a source bundle.
pub const SOURCES_SUFFIX: &str = "-sources.jar";

/// Suffix marking a documentation bundle.
pub const JAVADOC_SUFFIX: &str = "-javadoc.jar";

/// Errors from glob resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("cannot walk workspace: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Why a resolved path was dropped from the artifact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAnArtifact,
    SourcesBundle,
    JavadocBundle,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotAnArtifact => write!(f, "not a .{} artifact", ARTIFACT_EXTENSION),
            SkipReason::SourcesBundle => write!(f, "sources bundle"),
            SkipReason::JavadocBundle => write!(f, "javadoc bundle"),
        }
    }
}

/// Result of the eligibility filter.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Paths that survived the filter, in resolution order.
    pub eligible: Vec<PathBuf>,
    /// Dropped paths with the reason each was dropped.
    pub skipped: Vec<(PathBuf, SkipReason)>,
}

/// Expand `pattern` against the workspace.
///
/// Returns existing regular files as workspace-relative paths. Order is
/// enumeration order, stable within one run; callers must not depend on it
/// beyond that. Shell semantics: `*` does not cross directory separators,
/// `**` recurses.
pub fn resolve(workspace: &Path, pattern: &str) -> Result<Vec<PathBuf>, ResolveError> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    let mut paths = Vec::new();
    for entry in WalkDir::new(workspace).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(workspace).unwrap_or(entry.path());
        if matcher.is_match(relative) {
            paths.push(relative.to_path_buf());
        }
    }
    Ok(paths)
}

/// Drop ineligible paths, logging each skip with its reason.
pub fn filter_eligible(paths: Vec<PathBuf>) -> FilterOutcome {
    let mut eligible = Vec::new();
    let mut skipped = Vec::new();

    for path in paths {
        match eligibility(&path) {
            None => eligible.push(path),
            Some(reason) => {
                eprintln!("[gate] skipping {}: {}", path.display(), reason);
                skipped.push((path, reason));
            }
        }
    }

    FilterOutcome { eligible, skipped }
}

fn eligibility(path: &Path) -> Option<SkipReason> {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return Some(SkipReason::NotAnArtifact),
    };

    if name.ends_with(SOURCES_SUFFIX) {
        Some(SkipReason::SourcesBundle)
    } else if name.ends_with(JAVADOC_SUFFIX) {
        Some(SkipReason::JavadocBundle)
    } else if path.extension().map(|e| e == ARTIFACT_EXTENSION) != Some(true) {
        Some(SkipReason::NotAnArtifact)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_filter_keeps_plain_jars() {
        let outcome = filter_eligible(paths(&["target/app.jar", "target/lib.jar"]));
        assert_eq!(outcome.eligible, paths(&["target/app.jar", "target/lib.jar"]));
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_filter_drops_wrong_extension() {
        let outcome = filter_eligible(paths(&["target/app.jar", "target/notes.txt"]));
        assert_eq!(outcome.eligible, paths(&["target/app.jar"]));
        assert_eq!(
            outcome.skipped,
            vec![(PathBuf::from("target/notes.txt"), SkipReason::NotAnArtifact)]
        );
    }

    #[test]
    fn test_filter_drops_sources_bundle() {
        let outcome = filter_eligible(paths(&["target/app-sources.jar"]));
        assert!(outcome.eligible.is_empty());
        assert_eq!(outcome.skipped[0].1, SkipReason::SourcesBundle);
    }

    #[test]
    fn test_filter_drops_javadoc_bundle() {
        let outcome = filter_eligible(paths(&["target/app-javadoc.jar"]));
        assert!(outcome.eligible.is_empty());
        assert_eq!(outcome.skipped[0].1, SkipReason::JavadocBundle);
    }

    #[test]
    fn test_filter_drops_only_ineligible_paths() {
        let outcome = filter_eligible(paths(&[
            "a.jar",
            "a-sources.jar",
            "a-javadoc.jar",
            "a.war",
            "b.jar",
        ]));
        assert_eq!(outcome.eligible, paths(&["a.jar", "b.jar"]));
        assert_eq!(outcome.skipped.len(), 3);
    }

    #[test]
    fn test_resolve_matches_pattern_relative_to_workspace() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/app.jar"), b"jar").unwrap();
        fs::write(dir.path().join("target/app.txt"), b"txt").unwrap();
        fs::write(dir.path().join("top.jar"), b"jar").unwrap();

        let found = resolve(dir.path(), "target/*.jar").unwrap();
        assert_eq!(found, paths(&["target/app.jar"]));
    }

    #[test]
    fn test_resolve_star_does_not_recurse() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("target/sub")).unwrap();
        fs::write(dir.path().join("target/app.jar"), b"jar").unwrap();
        fs::write(dir.path().join("target/sub/deep.jar"), b"jar").unwrap();

        let shallow = resolve(dir.path(), "target/*.jar").unwrap();
        assert_eq!(shallow, paths(&["target/app.jar"]));

        let deep = resolve(dir.path(), "target/**/*.jar").unwrap();
        assert!(deep.contains(&PathBuf::from("target/sub/deep.jar")));
    }

    #[test]
    fn test_resolve_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            resolve(dir.path(), "target/[.jar"),
            Err(ResolveError::Pattern(_))
        ));
    }
}
