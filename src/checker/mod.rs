//! Compatibility runner
//!
//! Invokes the external API-compatibility checker once per artifact pair,
//! streams its combined output to the run log as it arrives, and classifies
//! the exit code into a [`CheckOutcome`].

pub mod install;

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::process::{spawn_streamed, ProcessError, StreamSource};

pub use install::{ensure_installed, InstallError, CHECKER_RELEASE_TAG, CHECKER_REPO_URL};

/// Errors from driving the checker subprocess.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("checker process error: {0}")]
    Process(#[from] ProcessError),
}

/// Per-artifact result of one compatibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Exit code 0: the APIs are compatible.
    Compatible,
    /// Exit code 1: the checker found incompatible changes.
    Incompatible,
    /// Any other exit: the tool itself failed.
    ToolError { code: i32, description: String },
}

impl CheckOutcome {
    /// Classify a checker exit code.
    ///
    /// The documented codes map exactly; anything else is reported verbatim
    /// as an unknown code.
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => CheckOutcome::Compatible,
            1 => CheckOutcome::Incompatible,
            2 => Self::tool_error(code, "generic execution failure"),
            3 => Self::tool_error(code, "required system command missing"),
            4 => Self::tool_error(code, "cannot access input files"),
            7 => Self::tool_error(code, "invalid API dump input"),
            8 => Self::tool_error(code, "unsupported API dump version"),
            9 => Self::tool_error(code, "required module not found"),
            other => Self::tool_error(other, format!("Unknown exit code {other}")),
        }
    }

    fn tool_error(code: i32, description: impl Into<String>) -> Self {
        CheckOutcome::ToolError {
            code,
            description: description.into(),
        }
    }

    /// Whether this outcome counts toward the run's failure tally.
    pub fn is_failure(&self) -> bool {
        !matches!(self, CheckOutcome::Compatible)
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckOutcome::Compatible => write!(f, "compatible"),
            CheckOutcome::Incompatible => write!(f, "incompatible"),
            CheckOutcome::ToolError { description, .. } => write!(f, "{description}"),
        }
    }
}

/// Drives the external checker binary.
#[derive(Debug, Clone)]
pub struct CompatChecker {
    tool: PathBuf,
}

impl CompatChecker {
    /// Wrap an installed checker entry script.
    pub fn new(tool: PathBuf) -> Self {
        Self { tool }
    }

    /// Check one artifact pair: `<checker> "<current>" "<baseline>"`.
    ///
    /// Checker output is echoed to the run log line-by-line as it arrives;
    /// the exit code is classified only after both streams have drained.
    pub fn check(&self, current: &Path, baseline: &Path) -> Result<CheckOutcome, CheckerError> {
        let mut command = Command::new(&self.tool);
        command.arg(current).arg(baseline);

        let mut child = spawn_streamed(command)?;
        for line in child.by_ref() {
            match line.source {
                StreamSource::Stdout => println!("{}", line.text),
                StreamSource::Stderr => eprintln!("{}", line.text),
            }
        }
        let status = child.finish()?;

        match status.code() {
            Some(code) => Ok(CheckOutcome::from_exit_code(code)),
            None => Ok(CheckOutcome::ToolError {
                code: -1,
                description: termination_description(&status),
            }),
        }
    }
}

#[cfg(unix)]
fn termination_description(status: &std::process::ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("terminated by signal {signal}"),
        None => "terminated without exit code".to_string(),
    }
}

#[cfg(not(unix))]
fn termination_description(_status: &std::process::ExitStatus) -> String {
    "terminated without exit code".to_string()
}
