//! Pipeline trigger context
//!
//! Captures the CI event that started this run into an immutable snapshot,
//! read once at startup and passed explicitly to every component. Nothing
//! downstream reads the pipeline environment directly, so tests can run the
//! gate against synthetic contexts.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Errors from reading the pipeline context.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("missing pipeline variable {0}")]
    MissingVar(&'static str),

    #[error("cannot read event payload {path}: {source}")]
    PayloadRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed event payload: {0}")]
    PayloadParse(#[from] serde_json::Error),

    #[error("event payload has no pull_request section")]
    MissingPullRequest,
}

/// The kind of pipeline activation that started this run.
///
/// Closed variant set: every recognized event has its own case, and anything
/// the host pipeline introduces later lands in `Other` so the orchestrator
/// can reject it explicitly instead of silently misrouting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Direct push to a branch; carries the head commit SHA.
    Push { head_sha: String },
    /// Scheduled (cron) pipeline run.
    ScheduledRun,
    /// Manually dispatched pipeline run.
    ManualDispatch,
    /// Pull-request opened or updated; carries the base branch metadata.
    PullRequestUpdate { base_ref: String, base_sha: String },
    /// Any event kind this gate does not handle.
    Other(String),
}

/// Event payload subset the gate cares about.
#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestSection>,
}

#[derive(Debug, Deserialize)]
struct PullRequestSection {
    base: BaseBranch,
}

#[derive(Debug, Deserialize)]
struct BaseBranch {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: String,
}

impl TriggerEvent {
    /// Classify a raw event name plus the context it needs.
    ///
    /// `head_sha` is required for push events; `payload` (the raw event JSON)
    /// is required for pull-request events.
    pub fn from_parts(
        event_name: &str,
        head_sha: Option<&str>,
        payload: Option<&str>,
    ) -> Result<Self, ContextError> {
        match event_name {
            "push" => {
                let head_sha = head_sha.ok_or(ContextError::MissingVar("GITHUB_SHA"))?;
                Ok(TriggerEvent::Push {
                    head_sha: head_sha.to_string(),
                })
            }
            "schedule" => Ok(TriggerEvent::ScheduledRun),
            "workflow_dispatch" => Ok(TriggerEvent::ManualDispatch),
            "pull_request" => {
                let raw = payload.ok_or(ContextError::MissingVar("GITHUB_EVENT_PATH"))?;
                let payload: EventPayload = serde_json::from_str(raw)?;
                let pr = payload
                    .pull_request
                    .ok_or(ContextError::MissingPullRequest)?;
                Ok(TriggerEvent::PullRequestUpdate {
                    base_ref: pr.base.ref_name,
                    base_sha: pr.base.sha,
                })
            }
            other => Ok(TriggerEvent::Other(other.to_string())),
        }
    }

    /// The pipeline-facing event name.
    pub fn name(&self) -> &str {
        match self {
            TriggerEvent::Push { .. } => "push",
            TriggerEvent::ScheduledRun => "schedule",
            TriggerEvent::ManualDispatch => "workflow_dispatch",
            TriggerEvent::PullRequestUpdate { .. } => "pull_request",
            TriggerEvent::Other(name) => name,
        }
    }
}

/// Immutable per-run context.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The trigger event that started this run.
    pub event: TriggerEvent,
    /// Pipeline workspace root; all artifact paths are relative to this.
    pub workspace: PathBuf,
}

impl RunContext {
    /// Build a context from explicit parts (used by tests).
    pub fn new(event: TriggerEvent, workspace: PathBuf) -> Self {
        Self { event, workspace }
    }

    /// Capture the context from the pipeline environment.
    ///
    /// Reads `GITHUB_EVENT_NAME`, `GITHUB_SHA`, `GITHUB_EVENT_PATH` and
    /// `GITHUB_WORKSPACE` (falling back to the current directory).
    pub fn from_env() -> Result<Self, ContextError> {
        let event_name = env::var("GITHUB_EVENT_NAME")
            .map_err(|_| ContextError::MissingVar("GITHUB_EVENT_NAME"))?;
        let head_sha = env::var("GITHUB_SHA").ok();

        let payload = match env::var("GITHUB_EVENT_PATH") {
            Ok(path) => Some(
                fs::read_to_string(&path)
                    .map_err(|source| ContextError::PayloadRead { path, source })?,
            ),
            Err(_) => None,
        };

        let event = TriggerEvent::from_parts(&event_name, head_sha.as_deref(), payload.as_deref())?;

        let workspace = env::var("GITHUB_WORKSPACE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Ok(Self { event, workspace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PR_PAYLOAD: &str = r#"{
        "action": "synchronize",
        "pull_request": {
            "number": 42,
            "base": { "ref": "main", "sha": "deadbeef" },
            "head": { "ref": "feature", "sha": "cafebabe" }
        }
    }"#;

    #[test]
    fn test_push_event_carries_head_sha() {
        let event = TriggerEvent::from_parts("push", Some("abc123"), None).unwrap();
        assert_eq!(
            event,
            TriggerEvent::Push {
                head_sha: "abc123".to_string()
            }
        );
        assert_eq!(event.name(), "push");
    }

    #[test]
    fn test_push_without_sha_is_an_error() {
        let err = TriggerEvent::from_parts("push", None, None).unwrap_err();
        assert!(matches!(err, ContextError::MissingVar("GITHUB_SHA")));
    }

    #[test]
    fn test_schedule_and_dispatch() {
        assert_eq!(
            TriggerEvent::from_parts("schedule", None, None).unwrap(),
            TriggerEvent::ScheduledRun
        );
        assert_eq!(
            TriggerEvent::from_parts("workflow_dispatch", None, None).unwrap(),
            TriggerEvent::ManualDispatch
        );
    }

    #[test]
    fn test_pull_request_reads_base_from_payload() {
        let event = TriggerEvent::from_parts("pull_request", None, Some(PR_PAYLOAD)).unwrap();
        assert_eq!(
            event,
            TriggerEvent::PullRequestUpdate {
                base_ref: "main".to_string(),
                base_sha: "deadbeef".to_string(),
            }
        );
    }

    #[test]
    fn test_pull_request_without_payload_is_an_error() {
        let err = TriggerEvent::from_parts("pull_request", None, None).unwrap_err();
        assert!(matches!(err, ContextError::MissingVar("GITHUB_EVENT_PATH")));
    }

    #[test]
    fn test_pull_request_payload_missing_section() {
        let err =
            TriggerEvent::from_parts("pull_request", None, Some(r#"{"action": "x"}"#)).unwrap_err();
        assert!(matches!(err, ContextError::MissingPullRequest));
    }

    #[test]
    fn test_unknown_event_maps_to_other() {
        let event = TriggerEvent::from_parts("deployment", None, None).unwrap();
        assert_eq!(event, TriggerEvent::Other("deployment".to_string()));
        assert_eq!(event.name(), "deployment");
    }
}
