use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning knobs for a diff run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Wall-clock budget for content diffs, measured from construction.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    /// A candidate pair is rejected when `keep < diff_threshold * diff`.
    pub diff_threshold: f64,
    /// Budget for each individual tree alignment.
    #[serde(rename = "tree_align_timeout_ms", with = "millis")]
    pub tree_align_timeout: Duration,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            diff_threshold: 0.5,
            tree_align_timeout: Duration::from_millis(1000),
        }
    }
}

impl DiffConfig {
    /// Default configuration with a different overall timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DiffConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(1000));
        assert_eq!(config.diff_threshold, 0.5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: DiffConfig = toml::from_str("timeout_ms = 250").unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.diff_threshold, 0.5);
        assert_eq!(config.tree_align_timeout, Duration::from_millis(1000));
    }

    #[test]
    fn toml_round_trip() {
        let config = DiffConfig {
            diff_threshold: 0.75,
            ..DiffConfig::with_timeout(Duration::from_millis(5))
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("timeout_ms = 5"));
        assert_eq!(toml::from_str::<DiffConfig>(&text).unwrap(), config);
    }
}
