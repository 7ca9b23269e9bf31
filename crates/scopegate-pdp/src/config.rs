//! Policy decision point configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the scope policy decision point.
///
/// # Example (TOML)
///
/// ```toml
/// [pdp]
/// matcher_cache_capacity = 64
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PdpConfig {
    /// Maximum number of compiled scope matchers kept in the matcher cache.
    ///
    /// Pattern strings recur across requests, so compiled regular expressions
    /// and structured paths are cached up to this bound. The bound only
    /// affects performance, never decision correctness.
    pub matcher_cache_capacity: usize,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            matcher_cache_capacity: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(PdpConfig::default().matcher_cache_capacity, 30);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: PdpConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.matcher_cache_capacity, 30);

        let config: PdpConfig =
            serde_json::from_str(r#"{"matcher_cache_capacity": 8}"#).unwrap();
        assert_eq!(config.matcher_cache_capacity, 8);
    }
}
