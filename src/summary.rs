//! Machine-readable run summary (compat_summary.json)
//!
//! Written after the compare loop so downstream tooling can consume the
//! per-artifact outcomes without scraping the run log. Advisory output: a
//! write failure is logged, never fatal.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checker::CheckOutcome;

/// Schema version for compat_summary.json
pub const COMPAT_SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for compat_summary.json
pub const COMPAT_SUMMARY_SCHEMA_ID: &str = "japicc-gate/compat_summary@1";

/// Outcome of one artifact's compatibility check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactReport {
    /// Original artifact path (holds the restored baseline during the check).
    pub artifact: String,
    /// Renamed current-build file the baseline was compared against.
    pub current: String,
    /// Classified checker outcome.
    pub outcome: CheckOutcome,
    /// Whether this artifact passed.
    pub passed: bool,
}

impl ArtifactReport {
    pub fn new(artifact: &Path, current: &Path, outcome: CheckOutcome) -> Self {
        let passed = !outcome.is_failure();
        Self {
            artifact: artifact.display().to_string(),
            current: current.display().to_string(),
            outcome,
            passed,
        }
    }
}

/// Run summary for one comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatSummary {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// Run identifier
    pub run_id: String,

    /// When the summary was created
    pub created_at: DateTime<Utc>,

    /// Trigger event name
    pub event: String,

    /// Cache key the baseline was restored from
    pub restored_key: String,

    /// Artifacts checked
    pub files_checked: usize,

    /// Artifacts that failed
    pub files_failed: usize,

    /// Per-artifact outcomes in check order
    pub results: Vec<ArtifactReport>,

    /// Human-readable summary
    pub human_summary: String,
}

impl CompatSummary {
    /// Aggregate per-artifact reports into a run summary.
    pub fn from_results(
        run_id: String,
        event: String,
        restored_key: String,
        results: Vec<ArtifactReport>,
    ) -> Self {
        let files_checked = results.len();
        let files_failed = results.iter().filter(|r| !r.passed).count();
        let human_summary = generate_human_summary(files_checked, files_failed);

        Self {
            schema_version: COMPAT_SUMMARY_SCHEMA_VERSION,
            schema_id: COMPAT_SUMMARY_SCHEMA_ID.to_string(),
            run_id,
            created_at: Utc::now(),
            event,
            restored_key,
            files_checked,
            files_failed,
            results,
            human_summary,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }

    /// Load from file
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))
    }
}

/// Summary line for the final message; grammatically singular when one file
/// is involved.
pub fn generate_human_summary(checked: usize, failed: usize) -> String {
    if failed == 0 {
        format!(
            "{} file{} passed API compliance checks",
            checked,
            if checked == 1 { "" } else { "s" }
        )
    } else {
        format!(
            "{} file{} failed API compliance checks",
            failed,
            if failed == 1 { "" } else { "s" }
        )
    }
}
