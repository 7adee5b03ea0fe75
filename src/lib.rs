//! japicc-gate - Binary API compatibility gate for CI pipelines
//!
//! This crate implements a pipeline step that publishes build artifacts as
//! baselines on target-branch builds, and diffs pull-request artifacts
//! against the cached baseline with the external japi-compliance-checker
//! tool.

pub mod artifact;
pub mod baseline;
pub mod cache;
pub mod checker;
pub mod config;
pub mod context;
pub mod mock;
pub mod process;
pub mod run;
pub mod summary;

pub use cache::{CacheStore, DiskCacheStore};
pub use checker::{CheckOutcome, CompatChecker};
pub use config::{CliOverrides, GateConfig};
pub use context::{RunContext, TriggerEvent};
pub use run::{Run, RunError, RunMode, RunReport};
