//! Allow/deny gate over function names.

use callgate_config::PolicyConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};

#[derive(Debug, thiserror::Error)]
#[error("Invalid policy pattern '{pattern}': {source}")]
pub struct PolicyError {
    pattern: String,
    #[source]
    source: globset::Error,
}

/// Decides which registered names may be invoked.
///
/// Deny wins over allow. With no allow patterns every name not denied is
/// admitted, so the registry itself is the allow-list.
#[derive(Debug, Clone)]
pub struct InvocationPolicy {
    allow: Option<GlobSet>,
    deny: GlobSet,
}

impl Default for InvocationPolicy {
    fn default() -> Self {
        Self {
            allow: None,
            deny: GlobSet::empty(),
        }
    }
}

impl InvocationPolicy {
    /// Admit every registered name.
    #[must_use]
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn new(allow: &[String], deny: &[String]) -> Result<Self, PolicyError> {
        let allow = if allow.is_empty() {
            None
        } else {
            Some(build_set(allow)?)
        };
        Ok(Self {
            allow,
            deny: build_set(deny)?,
        })
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self, PolicyError> {
        Self::new(&config.allow, &config.deny)
    }

    #[must_use]
    pub fn permits(&self, name: &str) -> bool {
        if self.deny.is_match(name) {
            return false;
        }
        self.allow.as_ref().is_none_or(|allow| allow.is_match(name))
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet, PolicyError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|source| PolicyError {
            pattern: pat.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| PolicyError {
        pattern: patterns.join(", "),
        source,
    })
}
