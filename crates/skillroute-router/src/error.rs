//! Error types for routing

use skillroute_skills::{LoadError, SkillError};
use thiserror::Error;

/// Invalid router configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric setting is outside its allowed range
    #[error("Configuration value '{field}' out of range: {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// The explicit invocation sigil is empty
    #[error("Explicit invocation sigil must not be empty")]
    EmptySigil,

    /// The explicit invocation sigil contains whitespace
    #[error("Explicit invocation sigil must not contain whitespace: {0:?}")]
    InvalidSigil(String),

    /// Reference reads would time out immediately
    #[error("load_timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Routing errors
#[derive(Debug, Error)]
pub enum RouteError {
    /// Explicit invocation named a skill that is not registered
    #[error("Unknown skill '{id}'{}", suggestion_hint(.suggestions))]
    UnknownSkill {
        /// Requested id
        id: String,
        /// Registered ids that look similar
        suggestions: Vec<String>,
    },

    /// Router configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lookup failure
    #[error(transparent)]
    Skill(#[from] SkillError),

    /// Registry (re)build failure
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The registry cannot be reloaded or the reload task died
    #[error("Registry reload failed: {0}")]
    Reload(String),
}

fn suggestion_hint(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_skill_message() {
        let err = RouteError::UnknownSkill {
            id: "docker".to_string(),
            suggestions: vec!["docker-deploy".to_string()],
        };
        assert_eq!(err.to_string(), "Unknown skill 'docker' (did you mean: docker-deploy?)");

        let err = RouteError::UnknownSkill {
            id: "zzz".to_string(),
            suggestions: vec![],
        };
        assert_eq!(err.to_string(), "Unknown skill 'zzz'");
    }
}
