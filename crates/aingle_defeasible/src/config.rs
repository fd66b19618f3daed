//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration options that control the behavior of an `Interpreter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of ground rules the grounder may produce.
    pub max_ground_rules: Option<usize>,
    /// If `true`, answers are cached per literal.
    pub memoize_answers: bool,
    /// If `true`, the dialectical trees built by the last query are kept for inspection.
    pub collect_trees: bool,
}

impl Default for EngineConfig {
    /// Provides the default configuration.
    ///
    /// By default:
    /// - `max_ground_rules` is `None` (no limit).
    /// - `memoize_answers` is `true`.
    /// - `collect_trees` is `false`.
    fn default() -> Self {
        Self {
            max_ground_rules: None,
            memoize_answers: true,
            collect_trees: false,
        }
    }
}

impl EngineConfig {
    /// Default configuration with a cap on the number of ground rules.
    ///
    /// # Arguments
    ///
    /// * `limit` - The maximum number of ground rules.
    pub fn bounded(limit: usize) -> Self {
        Self {
            max_ground_rules: Some(limit),
            ..Self::default()
        }
    }

    /// Returns the configuration with tree collection switched on or off.
    pub fn with_trees(mut self, collect: bool) -> Self {
        self.collect_trees = collect;
        self
    }

    /// Returns the configuration with answer memoization switched on or off.
    pub fn with_memoization(mut self, memoize: bool) -> Self {
        self.memoize_answers = memoize;
        self
    }

    /// Serializes the configuration to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }

    /// Deserializes a configuration from a JSON string.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }
}
