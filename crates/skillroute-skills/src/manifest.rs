//! SKILL.md parsing
//!
//! Each skill is a folder containing SKILL.md with YAML front-matter
//! followed by the Markdown body.

use regex::Regex;
use serde::Deserialize;
use skillroute_types::{Category, SkillDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::references::ReferenceExtractor;
use crate::text::{is_valid_slug, normalize};
use crate::triggers::TriggerExtractor;

/// File name of a skill manifest
pub const MANIFEST_FILE: &str = "SKILL.md";
/// Maximum recommended name length
const MAX_NAME_LENGTH: usize = 64;
/// Maximum recommended description length
const MAX_DESCRIPTION_LENGTH: usize = 1024;

/// Raw front-matter fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frontmatter {
    /// Skill name, becomes the id
    pub name: Option<String>,
    /// What the skill does and when to use it
    pub description: Option<String>,
    /// Optional grouping label
    pub category: Option<String>,
    /// Optional explicit trigger phrases
    #[serde(default)]
    pub triggers: Vec<String>,
}

/// Parses manifests into [`SkillDefinition`]s
///
/// All patterns are compiled once per registry build.
pub struct ManifestParser {
    frontmatter_re: Regex,
    triggers: TriggerExtractor,
    references: ReferenceExtractor,
}

impl ManifestParser {
    /// Compile the parser patterns
    pub fn new() -> Result<Self, LoadError> {
        let frontmatter_re = Regex::new(r"^\s*---[ \t]*\r?\n([\s\S]*?)\r?\n---[ \t]*(?:\r?\n([\s\S]*))?$")
            .map_err(|e| LoadError::Pattern(format!("front-matter regex: {}", e)))?;

        Ok(Self {
            frontmatter_re,
            triggers: TriggerExtractor::new()?,
            references: ReferenceExtractor::new()?,
        })
    }

    /// Split manifest text into (front-matter, body)
    ///
    /// A leading byte-order mark, as some editors write, is ignored.
    pub fn split<'a>(&self, content: &'a str) -> Option<(&'a str, &'a str)> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let captures = self.frontmatter_re.captures(content)?;
        let yaml = captures.get(1)?.as_str();
        let body = captures.get(2).map(|m| m.as_str()).unwrap_or("");
        Some((yaml, body))
    }

    /// Parse front-matter, falling back to flat `key: value` lines when the
    /// block is not valid YAML (e.g. an unquoted description containing a colon).
    pub fn parse_frontmatter(&self, yaml: &str) -> Result<Frontmatter, String> {
        match serde_yaml::from_str::<Frontmatter>(yaml) {
            Ok(frontmatter) => Ok(frontmatter),
            Err(yaml_err) => {
                let flat = parse_flat_frontmatter(yaml);
                if flat.name.is_some() {
                    debug!("Front-matter is not valid YAML ({}), using flat parse", yaml_err);
                    Ok(flat)
                } else {
                    Err(yaml_err.to_string())
                }
            }
        }
    }

    /// Extract relative reference paths declared in a body
    pub fn references(&self, body: &str) -> Vec<String> {
        self.references.extract(body)
    }

    /// Parse a complete manifest
    ///
    /// `category_hint` is used when the front-matter does not declare a category
    /// (typically the name of the directory grouping the skill).
    pub fn parse(
        &self,
        manifest_path: &Path,
        content: &str,
        category_hint: Option<Category>,
    ) -> Result<SkillDefinition, LoadError> {
        let (yaml, body) = self
            .split(content)
            .ok_or_else(|| LoadError::InvalidManifest {
                path: manifest_path.to_path_buf(),
                reason: "no valid YAML front-matter found".to_string(),
            })?;

        let frontmatter = self
            .parse_frontmatter(yaml)
            .map_err(|reason| LoadError::InvalidManifest {
                path: manifest_path.to_path_buf(),
                reason: format!("failed to parse front-matter: {}", reason),
            })?;

        let id = frontmatter
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| LoadError::MissingField {
                path: manifest_path.to_path_buf(),
                field: "name",
            })?
            .to_string();

        if !is_valid_slug(&id) {
            return Err(LoadError::InvalidName {
                path: manifest_path.to_path_buf(),
                name: id,
            });
        }

        if id.len() > MAX_NAME_LENGTH {
            warn!(
                "Skill name '{}' exceeds {} characters (was {})",
                id,
                MAX_NAME_LENGTH,
                id.len()
            );
        }

        let description = frontmatter
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if description.is_empty() {
            warn!("Skill '{}' has no description; it can only match on its name", id);
        } else if description.len() > MAX_DESCRIPTION_LENGTH {
            warn!(
                "Skill '{}' description exceeds {} characters (was {})",
                id,
                MAX_DESCRIPTION_LENGTH,
                description.len()
            );
        }

        let mut trigger_phrases = self.triggers.extract(&description, &frontmatter.triggers);
        if trigger_phrases.is_empty() {
            let fallback = normalize(&id);
            warn!(
                "Skill '{}' has no discoverable trigger phrases; falling back to '{}'",
                id, fallback
            );
            trigger_phrases.push(fallback);
        }

        let category = match frontmatter.category.as_deref() {
            Some(label) => label.parse().unwrap_or_else(|_| {
                warn!("Skill '{}' declares unknown category '{}'", id, label);
                category_hint.unwrap_or_default()
            }),
            None => category_hint.unwrap_or_default(),
        };

        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(SkillDefinition {
            id,
            description,
            trigger_phrases,
            referenced_docs: self.references(body),
            body: body.to_string(),
            category,
            root,
            manifest_path: manifest_path.to_path_buf(),
        })
    }
}

/// Category implied by the directory that groups a skill, e.g.
/// `skills/engineering/code-review/SKILL.md` -> engineering
pub fn category_from_path(manifest_path: &Path) -> Option<Category> {
    manifest_path
        .parent()?
        .parent()?
        .file_name()?
        .to_str()?
        .parse()
        .ok()
}

/// Line-based `key: value` parse for front-matter that YAML rejects
fn parse_flat_frontmatter(block: &str) -> Frontmatter {
    let mut frontmatter = Frontmatter::default();

    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
        match key.trim() {
            "name" => frontmatter.name = Some(value),
            "description" => frontmatter.description = Some(value),
            "category" => frontmatter.category = Some(value),
            _ => {}
        }
    }

    frontmatter
}
