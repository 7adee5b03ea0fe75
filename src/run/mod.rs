//! Run orchestration
//!
//! The event-driven control flow tying the gate together:
//! `Init -> Resolving -> {Publishing | Comparing} -> Finished`. Publishing
//! saves the current artifacts as a future baseline; comparing restores the
//! target branch's baseline and drives the checker once per artifact,
//! tallying failures. Artifacts are processed strictly one at a time in
//! resolver order, and nothing is retried.

use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;
use ulid::Ulid;

use crate::artifact::{self, ResolveError};
use crate::baseline;
use crate::cache::{CacheError, CacheStore};
use crate::checker::{self, CheckOutcome, CompatChecker, InstallError};
use crate::config::GateConfig;
use crate::context::{RunContext, TriggerEvent};
use crate::summary::{generate_human_summary, ArtifactReport, CompatSummary};

/// Fatal run errors. Messages are the step's observable failure output.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Cache feature unavailable")]
    CacheUnavailable,

    #[error("No valid paths.")]
    NoValidPaths,

    #[error("Unexpected event: {0}")]
    UnexpectedEvent(String),

    #[error("Original not cached")]
    OriginalNotCached,

    #[error("Failed to install japi-compliance-checker")]
    Install(#[source] InstallError),

    #[error("{n} file{s} failed API compliance checks", n = .0, s = plural(.0))]
    ComplianceFailures(usize),

    #[error("failed to rename {path}: {source}")]
    Rename {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 {
        ""
    } else {
        "s"
    }
}

impl RunError {
    /// Stable process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Rename { .. } => 1,
            RunError::CacheUnavailable => 2,
            RunError::NoValidPaths => 10,
            RunError::UnexpectedEvent(_) => 11,
            RunError::Resolve(_) => 12,
            RunError::OriginalNotCached => 20,
            RunError::Cache(_) => 21,
            RunError::Install(_) => 30,
            RunError::ComplianceFailures(_) => 40,
        }
    }
}

/// Result type for run operations.
pub type RunResult<T> = Result<T, RunError>;

/// What a finished run did.
#[derive(Debug)]
pub enum RunMode {
    /// Artifacts were saved as a future baseline.
    Published { key: String },
    /// Artifacts were compared against a restored baseline.
    Compared {
        restored_key: String,
        results: Vec<ArtifactReport>,
    },
}

/// Report of a successfully finished run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub mode: RunMode,
}

/// Compose a cache key from the configured prefix and an identifier.
pub fn cache_key(prefix: &str, identifier: &str) -> String {
    format!("{prefix}-{identifier}")
}

/// One gate run over an immutable context.
pub struct Run<'a> {
    ctx: &'a RunContext,
    config: &'a GateConfig,
    store: &'a dyn CacheStore,
}

impl<'a> Run<'a> {
    pub fn new(ctx: &'a RunContext, config: &'a GateConfig, store: &'a dyn CacheStore) -> Self {
        Self { ctx, config, store }
    }

    /// Execute the run to completion.
    pub fn execute(&self) -> RunResult<RunReport> {
        // Checked before any other work.
        if !self.store.is_feature_available() {
            return Err(RunError::CacheUnavailable);
        }

        let run_id = Ulid::new().to_string();
        let eligible = self.resolve_artifacts()?;

        match &self.ctx.event {
            TriggerEvent::Push { head_sha } => self.publish(run_id, &eligible, head_sha.clone()),
            TriggerEvent::ScheduledRun | TriggerEvent::ManualDispatch => {
                let identifier = Utc::now().timestamp_millis().to_string();
                self.publish(run_id, &eligible, identifier)
            }
            TriggerEvent::PullRequestUpdate { base_ref, base_sha } => {
                self.compare(run_id, &eligible, base_ref, base_sha)
            }
            TriggerEvent::Other(name) => Err(RunError::UnexpectedEvent(name.clone())),
        }
    }

    fn resolve_artifacts(&self) -> RunResult<Vec<PathBuf>> {
        let resolved = artifact::resolve(&self.ctx.workspace, &self.config.file)?;
        let outcome = artifact::filter_eligible(resolved);

        if outcome.eligible.is_empty() {
            return Err(RunError::NoValidPaths);
        }
        if self.config.verbose {
            eprintln!(
                "[gate] {} eligible artifact(s), {} skipped",
                outcome.eligible.len(),
                outcome.skipped.len()
            );
        }
        Ok(outcome.eligible)
    }

    /// Save the eligible artifacts as a future baseline. Publishing never
    /// runs a comparison in the same invocation.
    fn publish(
        &self,
        run_id: String,
        eligible: &[PathBuf],
        identifier: String,
    ) -> RunResult<RunReport> {
        let key = cache_key(&self.config.key, &identifier);
        let saved = self.store.save(&self.ctx.workspace, eligible, &key)?;
        eprintln!("[cache] saved baseline as {saved}");

        Ok(RunReport {
            run_id,
            mode: RunMode::Published { key: saved },
        })
    }

    /// Restore the base branch's baseline and check every artifact against
    /// it, one at a time, tallying failures.
    fn compare(
        &self,
        run_id: String,
        eligible: &[PathBuf],
        base_ref: &str,
        base_sha: &str,
    ) -> RunResult<RunReport> {
        let workspace = &self.ctx.workspace;

        // Move every current artifact aside first; restore materializes the
        // baselines at the original paths.
        let mut pairs = Vec::with_capacity(eligible.len());
        for path in eligible {
            let renamed = baseline::rename_to_baseline(workspace, path, base_ref).map_err(
                |source| RunError::Rename {
                    path: path.display().to_string(),
                    source,
                },
            )?;
            if self.config.verbose {
                eprintln!("[gate] moved {} -> {}", path.display(), renamed.display());
            }
            pairs.push((path.clone(), renamed));
        }

        let key = cache_key(&self.config.key, base_sha);
        let restored_key = self
            .store
            .restore(workspace, eligible, &key, &[self.config.key.clone()])?
            .ok_or(RunError::OriginalNotCached)?;
        eprintln!("[cache] restored baseline from {restored_key}");

        let tool = match &self.config.checker {
            Some(path) => path.clone(),
            None => checker::ensure_installed(&self.config.tool_dir, self.config.verbose)
                .map_err(|err| {
                    eprintln!("[gate] {err}");
                    RunError::Install(err)
                })?,
        };
        let compat_checker = CompatChecker::new(tool);

        let mut results = Vec::with_capacity(pairs.len());
        let mut failed = 0usize;
        for (artifact_path, current) in &pairs {
            let outcome = match compat_checker
                .check(&workspace.join(current), &workspace.join(artifact_path))
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    // Tool never produced an exit code; tallied, not fatal.
                    eprintln!("[checker] {}: {err}", artifact_path.display());
                    CheckOutcome::ToolError {
                        code: -1,
                        description: err.to_string(),
                    }
                }
            };

            if outcome.is_failure() {
                failed += 1;
                eprintln!("[checker] {}: {outcome}", artifact_path.display());
            } else if self.config.verbose {
                eprintln!("[checker] {}: {outcome}", artifact_path.display());
            }

            results.push(ArtifactReport::new(artifact_path, current, outcome));
        }

        self.write_summary(&run_id, &restored_key, results.clone());
        eprintln!("[gate] {}", generate_human_summary(results.len(), failed));

        if failed > 0 {
            return Err(RunError::ComplianceFailures(failed));
        }
        Ok(RunReport {
            run_id,
            mode: RunMode::Compared {
                restored_key,
                results,
            },
        })
    }

    /// Advisory output; failure to write is logged, never fatal.
    fn write_summary(&self, run_id: &str, restored_key: &str, results: Vec<ArtifactReport>) {
        let reports_dir = if self.config.reports_dir.is_absolute() {
            self.config.reports_dir.clone()
        } else {
            self.ctx.workspace.join(&self.config.reports_dir)
        };

        let summary = CompatSummary::from_results(
            run_id.to_string(),
            self.ctx.event.name().to_string(),
            restored_key.to_string(),
            results,
        );

        let write = std::fs::create_dir_all(&reports_dir)
            .and_then(|_| summary.write_to_file(&reports_dir.join("compat_summary.json")));
        if let Err(err) = write {
            eprintln!("[gate] could not write compat_summary.json: {err}");
        } else if self.config.verbose {
            eprintln!(
                "[gate] wrote {}",
                reports_dir.join("compat_summary.json").display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_composition() {
        assert_eq!(cache_key("k", "abc123"), "k-abc123");
        assert_eq!(cache_key("compat", "deadbeef"), "compat-deadbeef");
    }

    #[test]
    fn test_failure_message_singular() {
        assert_eq!(
            RunError::ComplianceFailures(1).to_string(),
            "1 file failed API compliance checks"
        );
    }

    #[test]
    fn test_failure_message_plural() {
        assert_eq!(
            RunError::ComplianceFailures(2).to_string(),
            "2 files failed API compliance checks"
        );
        assert_eq!(
            RunError::ComplianceFailures(10).to_string(),
            "10 files failed API compliance checks"
        );
    }

    #[test]
    fn test_observable_failure_messages() {
        assert_eq!(
            RunError::CacheUnavailable.to_string(),
            "Cache feature unavailable"
        );
        assert_eq!(RunError::NoValidPaths.to_string(), "No valid paths.");
        assert_eq!(
            RunError::UnexpectedEvent("deployment".to_string()).to_string(),
            "Unexpected event: deployment"
        );
        assert_eq!(
            RunError::OriginalNotCached.to_string(),
            "Original not cached"
        );
    }

    #[test]
    fn test_exit_codes_are_distinct_per_tier() {
        assert_eq!(RunError::CacheUnavailable.exit_code(), 2);
        assert_eq!(RunError::NoValidPaths.exit_code(), 10);
        assert_eq!(
            RunError::UnexpectedEvent("x".to_string()).exit_code(),
            11
        );
        assert_eq!(RunError::OriginalNotCached.exit_code(), 20);
        assert_eq!(RunError::ComplianceFailures(1).exit_code(), 40);
    }
}
