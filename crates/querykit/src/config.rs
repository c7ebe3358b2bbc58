//! Builder defaults, loadable from environment variables.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};

use crate::sort::NullsPolicy;

/// Default tolerance for approximate number matches.
pub const DEFAULT_NUMBER_EPSILON: f64 = 0.01;

/// Defaults shared by the sort and filter builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentConfig {
    /// Column appended as a tie-breaker to every ordering (default: none).
    #[serde(default)]
    pub stable_key: Option<String>,

    /// NULL placement for sorts that don't pin it (default: smallest).
    #[serde(default)]
    pub nulls_policy: NullsPolicy,

    /// Tolerance used by number filters (default: 0.01).
    #[serde(
        default = "default_number_epsilon",
        deserialize_with = "deserialize_number_epsilon"
    )]
    pub number_epsilon: f64,
}

fn default_number_epsilon() -> f64 {
    DEFAULT_NUMBER_EPSILON
}

/// Epsilon must be finite and non-negative, or `BETWEEN` matches nothing.
fn check_number_epsilon(epsilon: f64) -> Result<f64, String> {
    if epsilon.is_finite() && epsilon >= 0.0 {
        Ok(epsilon)
    } else {
        Err(format!("number_epsilon must be a non-negative number, got {epsilon}"))
    }
}

fn deserialize_number_epsilon<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let epsilon = f64::deserialize(deserializer)?;
    check_number_epsilon(epsilon).map_err(serde::de::Error::custom)
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self {
            stable_key: None,
            nulls_policy: NullsPolicy::default(),
            number_epsilon: default_number_epsilon(),
        }
    }
}

impl FragmentConfig {
    /// Load configuration from environment variables.
    ///
    /// - `QUERYKIT_STABLE_SORT_KEY`: tie-breaker field, empty disables it
    /// - `QUERYKIT_NULLS_POLICY`: `smallest` or `database`
    /// - `QUERYKIT_NUMBER_EPSILON`: non-negative float
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a `.env` style file, with the process
    /// environment taking precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let vars: HashMap<String, String> = dotenvy::from_path_iter(path)
            .with_context(|| format!("failed to open {}", path.display()))?
            .collect::<Result<_, _>>()
            .with_context(|| format!("failed to parse {}", path.display()))?;

        Self::from_lookup(|key| env::var(key).ok().or_else(|| vars.get(key).cloned()))
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(key) = lookup("QUERYKIT_STABLE_SORT_KEY") {
            let key = key.trim();
            config.stable_key = (!key.is_empty()).then(|| key.to_string());
        }

        if let Some(policy) = lookup("QUERYKIT_NULLS_POLICY") {
            config.nulls_policy = policy
                .parse()
                .context("QUERYKIT_NULLS_POLICY must be 'smallest' or 'database'")?;
        }

        if let Some(epsilon) = lookup("QUERYKIT_NUMBER_EPSILON") {
            let epsilon: f64 = epsilon
                .trim()
                .parse()
                .context("QUERYKIT_NUMBER_EPSILON must be a valid float")?;
            config.number_epsilon = match check_number_epsilon(epsilon) {
                Ok(epsilon) => epsilon,
                Err(msg) => bail!("QUERYKIT_NUMBER_EPSILON: {msg}"),
            };
        }

        tracing::debug!(
            stable_key = ?config.stable_key,
            nulls_policy = ?config.nulls_policy,
            number_epsilon = config.number_epsilon,
            "loaded fragment config"
        );

        Ok(config)
    }
}
