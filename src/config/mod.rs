//! Gate configuration
//!
//! Implements the layered configuration merge:
//! 1. Built-in defaults
//! 2. Repo config file (.japicc-gate.toml)
//! 3. Pipeline-provided inputs (INPUT_KEY, INPUT_FILE environment)
//! 4. CLI flags
//!
//! `key` (cache key prefix) and `file` (artifact glob) are required and must
//! be supplied by at least one layer.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default repo config location.
pub const DEFAULT_CONFIG_PATH: &str = ".japicc-gate.toml";

/// Default reports directory, relative to the workspace.
pub const DEFAULT_REPORTS_DIR: &str = "compat_reports";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Repo config file contents; every field optional so later layers can fill
/// in what the file leaves out.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Cache key prefix.
    pub key: Option<String>,
    /// Glob pattern selecting artifact paths.
    pub file: Option<String>,
    /// Cache store root directory.
    pub cache_dir: Option<PathBuf>,
    /// Explicit checker entry script (skips installation).
    pub checker: Option<PathBuf>,
    /// Directory the checker tool is installed into.
    pub tool_dir: Option<PathBuf>,
    /// Directory compatibility reports are written to.
    pub reports_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Inputs supplied by the pipeline environment.
#[derive(Debug, Clone, Default)]
pub struct EnvInputs {
    pub key: Option<String>,
    pub file: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

impl EnvInputs {
    /// Read the pipeline input environment.
    pub fn from_env() -> Self {
        Self {
            key: env::var("INPUT_KEY").ok().filter(|v| !v.is_empty()),
            file: env::var("INPUT_FILE").ok().filter(|v| !v.is_empty()),
            cache_dir: env::var("JAPICC_GATE_CACHE_DIR").ok().map(PathBuf::from),
        }
    }
}

/// CLI-provided overrides (the highest-precedence layer).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub key: Option<String>,
    pub file: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub checker: Option<PathBuf>,
    pub reports_dir: Option<PathBuf>,
    pub verbose: bool,
}

/// Effective gate configuration after the merge.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Cache key prefix; keys sharing it form the restore fallback family.
    pub key: String,
    /// Glob pattern selecting artifact paths, workspace-relative.
    pub file: String,
    /// Cache store root directory.
    pub cache_dir: PathBuf,
    /// Explicit checker entry script; when set, installation is skipped.
    pub checker: Option<PathBuf>,
    /// Directory the checker tool is installed into.
    pub tool_dir: PathBuf,
    /// Directory compatibility reports are written to (workspace-relative
    /// unless absolute).
    pub reports_dir: PathBuf,
    /// Verbose progress logging.
    pub verbose: bool,
}

impl GateConfig {
    /// Merge the configuration layers in precedence order.
    pub fn resolve(
        file: FileConfig,
        env: EnvInputs,
        cli: CliOverrides,
    ) -> Result<Self, ConfigError> {
        let key = cli
            .key
            .or(env.key)
            .or(file.key)
            .ok_or(ConfigError::MissingInput("key"))?;
        let pattern = cli
            .file
            .or(env.file)
            .or(file.file)
            .ok_or(ConfigError::MissingInput("file"))?;

        let cache_dir = cli
            .cache_dir
            .or(env.cache_dir)
            .or(file.cache_dir)
            .unwrap_or_else(default_cache_dir);
        let tool_dir = file.tool_dir.unwrap_or_else(|| cache_dir.join("tool"));
        let reports_dir = cli
            .reports_dir
            .or(file.reports_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR));
        let checker = cli.checker.or(file.checker);

        Ok(Self {
            key,
            file: pattern,
            cache_dir,
            checker,
            tool_dir,
            reports_dir,
            verbose: cli.verbose,
        })
    }

    /// Load the full configuration: repo config file (explicit path or the
    /// default location when present), pipeline environment, CLI overrides.
    pub fn load(config_path: Option<&Path>, cli: CliOverrides) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => FileConfig::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    FileConfig::from_file(default)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Self::resolve(file, EnvInputs::from_env(), cli)
    }
}

fn default_cache_dir() -> PathBuf {
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".cache/japicc-gate"),
        Err(_) => PathBuf::from("/tmp/japicc-gate"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_layer(key: Option<&str>, file: Option<&str>) -> FileConfig {
        FileConfig {
            key: key.map(String::from),
            file: file.map(String::from),
            ..FileConfig::default()
        }
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let err = GateConfig::resolve(
            file_layer(None, Some("target/*.jar")),
            EnvInputs::default(),
            CliOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput("key")));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = GateConfig::resolve(
            file_layer(Some("compat"), None),
            EnvInputs::default(),
            CliOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput("file")));
    }

    #[test]
    fn test_file_layer_alone_suffices() {
        let config = GateConfig::resolve(
            file_layer(Some("compat"), Some("target/*.jar")),
            EnvInputs::default(),
            CliOverrides::default(),
        )
        .unwrap();
        assert_eq!(config.key, "compat");
        assert_eq!(config.file, "target/*.jar");
        assert_eq!(config.reports_dir, PathBuf::from(DEFAULT_REPORTS_DIR));
        assert_eq!(config.tool_dir, config.cache_dir.join("tool"));
    }

    #[test]
    fn test_env_overrides_file() {
        let env = EnvInputs {
            key: Some("from-env".to_string()),
            ..EnvInputs::default()
        };
        let config = GateConfig::resolve(
            file_layer(Some("from-file"), Some("target/*.jar")),
            env,
            CliOverrides::default(),
        )
        .unwrap();
        assert_eq!(config.key, "from-env");
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = EnvInputs {
            key: Some("from-env".to_string()),
            file: Some("env/*.jar".to_string()),
            ..EnvInputs::default()
        };
        let cli = CliOverrides {
            key: Some("from-cli".to_string()),
            ..CliOverrides::default()
        };
        let config = GateConfig::resolve(FileConfig::default(), env, cli).unwrap();
        assert_eq!(config.key, "from-cli");
        assert_eq!(config.file, "env/*.jar");
    }

    #[test]
    fn test_file_config_parses_toml() {
        let parsed: FileConfig = toml::from_str(
            r#"
            key = "compat"
            file = "build/libs/*.jar"
            reports_dir = "reports"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.key.as_deref(), Some("compat"));
        assert_eq!(parsed.file.as_deref(), Some("build/libs/*.jar"));
        assert_eq!(parsed.reports_dir, Some(PathBuf::from("reports")));
    }
}
