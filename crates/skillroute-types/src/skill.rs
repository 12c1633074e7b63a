use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Skill identifier (the `name` field of a manifest)
pub type SkillId = String;

/// Grouping label for a skill, informational only
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Engineering,
    Operations,
    Integrations,
    Documentation,
    Business,
    #[default]
    Uncategorized,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Engineering => "engineering",
            Category::Operations => "operations",
            Category::Integrations => "integrations",
            Category::Documentation => "documentation",
            Category::Business => "business",
            Category::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    /// Parse a category label; unknown labels are rejected so callers can
    /// decide whether to fall back to `Uncategorized`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "engineering" => Ok(Category::Engineering),
            "operations" => Ok(Category::Operations),
            "integrations" => Ok(Category::Integrations),
            "documentation" => Ok(Category::Documentation),
            "business" => Ok(Category::Business),
            "uncategorized" => Ok(Category::Uncategorized),
            _ => Err(()),
        }
    }
}

/// A fully parsed skill manifest
///
/// Built once when the registry is constructed and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub description: String,
    /// Lower-cased, normalized phrases, never empty
    pub trigger_phrases: Vec<String>,
    /// Markdown body after the front-matter, passed through untouched
    pub body: String,
    /// Relative paths declared in the body, in declaration order
    pub referenced_docs: Vec<String>,
    pub category: Category,
    /// Skill directory; referenced docs resolve against it
    pub root: PathBuf,
    pub manifest_path: PathBuf,
}

impl SkillDefinition {
    /// Concise one-line summary: "- {id}: {description}"
    pub fn to_summary(&self) -> String {
        format!("- {}: {}", self.id, self.description)
    }
}
