//! Engine configuration.
//!
//! Every field has a default so an empty JSON object or an empty environment
//! yields a usable configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mask::MAX_MASKS_PER_KIND;

/// Default number of history entries kept per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Default ceiling for either side of an offscreen render.
pub const DEFAULT_MAX_RENDER_DIMENSION: u32 = 16384;

/// Runtime limits for an editing session and its renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum entries retained by the edit history. Oldest are evicted first.
    pub history_limit: usize,
    /// Active masks allowed per mask kind. Never exceeds the uniform capacity.
    pub masks_per_kind: usize,
    /// Largest width or height accepted for a render target.
    pub max_render_dimension: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            masks_per_kind: MAX_MASKS_PER_KIND,
            max_render_dimension: DEFAULT_MAX_RENDER_DIMENSION,
        }
    }
}

impl EngineConfig {
    /// Build a configuration from `FOTIQ_*` environment variables.
    ///
    /// Missing or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            history_limit: env_or("FOTIQ_HISTORY_LIMIT", defaults.history_limit),
            masks_per_kind: env_or("FOTIQ_MASKS_PER_KIND", defaults.masks_per_kind),
            max_render_dimension: env_or(
                "FOTIQ_MAX_RENDER_DIMENSION",
                defaults.max_render_dimension,
            ),
        }
        .sanitized()
    }

    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Clamp fields into the ranges the engine can honor.
    pub fn sanitized(self) -> Self {
        Self {
            history_limit: self.history_limit.max(1),
            masks_per_kind: self.masks_per_kind.min(MAX_MASKS_PER_KIND),
            max_render_dimension: self.max_render_dimension.max(1),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.masks_per_kind, 3);
    }

    #[test]
    fn test_mask_capacity_cannot_exceed_uniform_arrays() {
        let config = EngineConfig::from_json(r#"{"masks_per_kind": 8}"#).unwrap();
        assert_eq!(config.masks_per_kind, MAX_MASKS_PER_KIND);
    }

    #[test]
    fn test_zero_history_limit_is_raised_to_one() {
        let config = EngineConfig::from_json(r#"{"history_limit": 0}"#).unwrap();
        assert_eq!(config.history_limit, 1);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(EngineConfig::from_json("{history").is_err());
    }
}
