//! Configuration loading for Callgate.
//!
//! ```toml
//! [invoker]
//! max_payload_bytes = 1048576
//! validate_arguments = true
//!
//! [policy]
//! allow = ["greet", "report_*"]
//! deny = ["${CALLGATE_DENY}"]
//! ```
//!
//! A missing file is not an error: every section falls back to its defaults.

use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};

/// Default upper bound for each input payload (1 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

// Default value function for serde (bool::default() is false, so only true needs a fn)
pub(crate) const fn default_true() -> bool {
    true
}

const fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallgateConfig {
    pub invoker: Option<InvokerConfig>,
    pub policy: Option<PolicyConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvokerConfig {
    /// Largest accepted environment or arguments payload, in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Validate arguments against the callable's schema before calling it.
    #[serde(default = "default_true")]
    pub validate_arguments: bool,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            validate_arguments: true,
        }
    }
}

/// Glob patterns over function names.
///
/// Deny wins over allow. An empty `allow` admits every registered name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

impl PolicyConfig {
    /// Patterns with `${VAR}` references expanded. Patterns that expand to
    /// nothing are dropped.
    #[must_use]
    pub fn expanded(&self) -> Self {
        fn expand_all(patterns: &[String]) -> Vec<String> {
            patterns
                .iter()
                .map(|p| expand_env_vars(p))
                .filter(|p| !p.trim().is_empty())
                .collect()
        }
        Self {
            allow: expand_all(&self.allow),
            deny: expand_all(&self.deny),
        }
    }
}

/// Replace `${VAR}` with the value of the environment variable (empty if unset).
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl CallgateConfig {
    /// Load from the default location (`~/.callgate/config.toml`).
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from an explicit path. `Ok(None)` if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match Self::parse(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn invoker(&self) -> InvokerConfig {
        self.invoker.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn policy(&self) -> PolicyConfig {
        self.policy
            .as_ref()
            .map(PolicyConfig::expanded)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".callgate").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // expand_env_vars tests

    #[test]
    fn expand_env_vars_no_vars() {
        let result = expand_env_vars("hello world");
        assert_eq!(result, "hello world");
    }

    #[test]
    fn expand_env_vars_single_var() {
        unsafe {
            std::env::set_var("CALLGATE_TEST_CONFIG_VAR", "replaced");
        }
        let result = expand_env_vars("prefix ${CALLGATE_TEST_CONFIG_VAR} suffix");
        assert_eq!(result, "prefix replaced suffix");
        unsafe {
            std::env::remove_var("CALLGATE_TEST_CONFIG_VAR");
        }
    }

    #[test]
    fn expand_env_vars_missing_var_becomes_empty() {
        unsafe {
            std::env::remove_var("CALLGATE_MISSING_VAR_FOR_TEST");
        }
        let result = expand_env_vars("before ${CALLGATE_MISSING_VAR_FOR_TEST} after");
        assert_eq!(result, "before  after");
    }

    #[test]
    fn expand_env_vars_unclosed_brace_preserved() {
        let result = expand_env_vars("test ${UNCLOSED");
        assert_eq!(result, "test ${UNCLOSED");
    }

    #[test]
    fn expand_env_vars_empty_var_name_dropped() {
        let result = expand_env_vars("test ${} more");
        assert_eq!(result, "test  more");
    }

    // parsing

    #[test]
    fn empty_config_uses_defaults() {
        let config = CallgateConfig::parse("").unwrap();
        let invoker = config.invoker();
        assert_eq!(invoker.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
        assert!(invoker.validate_arguments);
        let policy = config.policy();
        assert!(policy.allow.is_empty());
        assert!(policy.deny.is_empty());
    }

    #[test]
    fn parses_invoker_and_policy_sections() {
        let config = CallgateConfig::parse(
            r#"
            [invoker]
            max_payload_bytes = 64
            validate_arguments = false

            [policy]
            allow = ["greet", "report_*"]
            deny = ["report_secret"]
            "#,
        )
        .unwrap();
        let invoker = config.invoker();
        assert_eq!(invoker.max_payload_bytes, 64);
        assert!(!invoker.validate_arguments);
        let policy = config.policy();
        assert_eq!(policy.allow, ["greet", "report_*"]);
        assert_eq!(policy.deny, ["report_secret"]);
    }

    #[test]
    fn partial_invoker_section_keeps_other_defaults() {
        let config = CallgateConfig::parse("[invoker]\nmax_payload_bytes = 10\n").unwrap();
        assert!(config.invoker().validate_arguments);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CallgateConfig::parse("[invoker]\ntimeout_ms = 5\n").is_err());
    }

    #[test]
    fn policy_patterns_expanding_to_nothing_are_dropped() {
        unsafe {
            std::env::remove_var("CALLGATE_UNSET_DENY");
        }
        let config = CallgateConfig::parse("[policy]\ndeny = [\"${CALLGATE_UNSET_DENY}\"]\n")
            .unwrap();
        assert!(config.policy().deny.is_empty());
    }

    #[test]
    fn load_from_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = CallgateConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[invoker\n").unwrap();
        let err = CallgateConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), &path);
    }
}
