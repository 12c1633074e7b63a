//! Router configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Matching and loading knobs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouterConfig {
    /// Minimum score for a candidate to be kept
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Candidates this close to the top score make the match ambiguous
    #[serde(default = "default_ambiguity_epsilon")]
    pub ambiguity_epsilon: f64,

    /// Load referenced documents along with the body
    #[serde(default)]
    pub deep_context_load: bool,

    /// Prefix that marks an explicit invocation (`/code-review ...`)
    #[serde(default = "default_explicit_sigil")]
    pub explicit_sigil: String,

    /// Upper bound on alternatives returned (ambiguous candidates are always kept)
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,

    /// Per-reference read timeout in milliseconds
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Extra attempts for a reference read after a transient failure
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,

    /// Poll interval for the reload watcher; 0 disables it
    #[serde(default)]
    pub reload_interval_secs: u64,
}

fn default_match_threshold() -> f64 {
    0.15
}

fn default_ambiguity_epsilon() -> f64 {
    0.05
}

fn default_explicit_sigil() -> String {
    "/".to_string()
}

fn default_max_alternatives() -> usize {
    5
}

fn default_load_timeout_ms() -> u64 {
    5000
}

fn default_read_retries() -> u32 {
    1
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            ambiguity_epsilon: default_ambiguity_epsilon(),
            deep_context_load: false,
            explicit_sigil: default_explicit_sigil(),
            max_alternatives: default_max_alternatives(),
            load_timeout_ms: default_load_timeout_ms(),
            read_retries: default_read_retries(),
            reload_interval_secs: 0,
        }
    }
}

impl RouterConfig {
    /// Reject values the matcher cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "match_threshold",
                value: self.match_threshold,
            });
        }
        if !(self.ambiguity_epsilon >= 0.0 && self.ambiguity_epsilon.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "ambiguity_epsilon",
                value: self.ambiguity_epsilon,
            });
        }
        if self.explicit_sigil.trim().is_empty() {
            return Err(ConfigError::EmptySigil);
        }
        if self.explicit_sigil.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidSigil(self.explicit_sigil.clone()));
        }
        if self.load_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Per-read deadline for context loading
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// `None` when the watcher is disabled
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.match_threshold, 0.15);
        assert_eq!(config.ambiguity_epsilon, 0.05);
        assert!(!config.deep_context_load);
        assert_eq!(config.explicit_sigil, "/");
        assert_eq!(config.max_alternatives, 5);
        assert_eq!(config.load_timeout(), Duration::from_secs(5));
        assert_eq!(config.reload_interval(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RouterConfig = toml::from_str("match_threshold = 0.3\nreload_interval_secs = 2\n").unwrap();
        assert_eq!(config.match_threshold, 0.3);
        assert_eq!(config.explicit_sigil, "/");
        assert_eq!(config.read_retries, 1);
        assert_eq!(config.reload_interval(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = RouterConfig {
            match_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "match_threshold", .. })
        ));

        let config = RouterConfig {
            ambiguity_epsilon: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "ambiguity_epsilon", .. })
        ));

        let config = RouterConfig {
            explicit_sigil: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptySigil)));

        let config = RouterConfig {
            load_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }
}
