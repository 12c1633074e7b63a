use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::SkillId;

// ============================================================================
// Matching
// ============================================================================

/// One scored skill for a single matching attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchCandidate {
    pub skill_id: SkillId,
    /// Normalized to 0.0..=1.0
    pub score: f64,
    /// Longest trigger phrase that fired, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_phrase: Option<String>,
    pub ambiguous: bool,
}

impl MatchCandidate {
    pub fn new(skill_id: impl Into<SkillId>, score: f64, matched_phrase: Option<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            score,
            matched_phrase,
            ambiguous: false,
        }
    }

    /// Candidate produced by an explicit invocation: full confidence, never ambiguous
    pub fn explicit(skill_id: impl Into<SkillId>) -> Self {
        Self::new(skill_id, 1.0, None)
    }
}

/// A request that names its skill directly, e.g. `/docker-deploy generate k8s manifests`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExplicitInvocation {
    pub skill_id: SkillId,
    pub args: String,
}

// ============================================================================
// Loaded content
// ============================================================================

/// Where a content block came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum ContentSource {
    Body,
    Reference(String),
}

/// A block of text handed to the calling agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentBlock {
    pub source: ContentSource,
    pub text: String,
}

impl ContentBlock {
    pub fn body(text: impl Into<String>) -> Self {
        Self {
            source: ContentSource::Body,
            text: text.into(),
        }
    }

    pub fn reference(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: ContentSource::Reference(path.into()),
            text: text.into(),
        }
    }
}

/// A declared auxiliary document that could not be loaded
///
/// This is a warning attached to the result, never a dispatch failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingReference {
    pub skill_id: SkillId,
    pub path: String,
    pub reason: String,
}

impl fmt::Display for MissingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skill '{}' references '{}' which could not be loaded: {}",
            self.skill_id, self.path, self.reason
        )
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// How the dispatch decision was reached
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// The utterance named the skill with the invocation sigil
    Explicit,
    /// Intent matching produced a single clear winner
    Matched,
    /// Two or more candidates scored within epsilon of the top; caller decides
    Ambiguous,
    /// Nothing cleared the threshold
    NoMatch,
}

/// Structured output returned to the calling agent, one per request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchResult {
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub mode: DispatchMode,
    pub selected_skill_id: Option<SkillId>,
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    pub loaded_content: Vec<ContentBlock>,
    pub alternatives: Vec<MatchCandidate>,
    pub warnings: Vec<MissingReference>,
}

impl DispatchResult {
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            created_at: Utc::now(),
            mode,
            selected_skill_id: None,
            confidence: None,
            args: None,
            loaded_content: Vec::new(),
            alternatives: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.mode == DispatchMode::Ambiguous
    }

    pub fn is_selected(&self) -> bool {
        self.selected_skill_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_candidate_is_certain() {
        let candidate = MatchCandidate::explicit("docker-deploy");
        assert_eq!(candidate.score, 1.0);
        assert!(!candidate.ambiguous);
        assert!(candidate.matched_phrase.is_none());
    }

    #[test]
    fn test_dispatch_result_serializes_mode_and_sources() {
        let mut result = DispatchResult::new(DispatchMode::NoMatch);
        result
            .loaded_content
            .push(ContentBlock::reference("references/cql.md", "syntax"));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["mode"], "no_match");
        assert_eq!(value["loaded_content"][0]["source"]["kind"], "reference");
        assert_eq!(value["loaded_content"][0]["source"]["path"], "references/cql.md");
        assert!(value.get("args").is_none());
        assert!(!result.is_selected());
    }

    #[test]
    fn test_missing_reference_display() {
        let warning = MissingReference {
            skill_id: "confluence-docs".into(),
            path: "references/cql_syntax.md".into(),
            reason: "not found".into(),
        };
        assert_eq!(
            warning.to_string(),
            "skill 'confluence-docs' references 'references/cql_syntax.md' which could not be loaded: not found"
        );
    }
}
