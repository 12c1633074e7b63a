//! Authoring checks for a single skill directory
//!
//! Errors make a skill unloadable; warnings flag manifests that load but are
//! unlikely to be matched or followed well.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::manifest::{ManifestParser, MANIFEST_FILE};
use crate::text::is_valid_slug;

const MIN_DESCRIPTION_LENGTH: usize = 50;
const MIN_BODY_LENGTH: usize = 100;
const RECOMMENDED_SECTIONS: &[&str] = &["When to Use", "Workflow", "Example"];
const AUXILIARY_DIRS: &[&str] = &["scripts", "references", "assets"];
const WHEN_WORDS: &[&str] = &["when", "use", "should", "for"];

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The skill will not load
    Error,
    /// The skill loads but may be hard to match or follow
    Warning,
}

/// One finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// How serious the finding is
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
}

/// All findings for one skill directory
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Directory that was checked
    pub skill_path: PathBuf,
    /// Findings in check order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn new(skill_path: &Path) -> Self {
        Self {
            skill_path: skill_path.to_path_buf(),
            issues: Vec::new(),
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    /// Issues that make the skill unloadable
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Issues that do not block loading
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// No errors; in strict mode, no warnings either
    pub fn passed(&self, strict: bool) -> bool {
        self.errors().next().is_none() && (!strict || self.warnings().next().is_none())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validating skill: {}", self.skill_path.display())?;
        if self.issues.is_empty() {
            return writeln!(f, "No issues found");
        }
        for issue in &self.issues {
            let label = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            writeln!(f, "  - {}: {}", label, issue.message)?;
        }
        Ok(())
    }
}

/// Validate a skill directory
pub fn validate_skill_dir(skill_path: &Path) -> ValidationReport {
    let mut report = ValidationReport::new(skill_path);

    let manifest_path = skill_path.join(MANIFEST_FILE);
    let content = match std::fs::read_to_string(&manifest_path) {
        Ok(content) => content,
        Err(e) => {
            report.error(format!("{} could not be read: {}", MANIFEST_FILE, e));
            return report;
        }
    };

    let parser = match ManifestParser::new() {
        Ok(parser) => parser,
        Err(e) => {
            report.error(e.to_string());
            return report;
        }
    };

    let Some((yaml, body)) = parser.split(&content) else {
        report.error("No valid YAML front-matter found");
        return report;
    };

    let frontmatter = match parser.parse_frontmatter(yaml) {
        Ok(frontmatter) => frontmatter,
        Err(e) => {
            report.error(format!("Front-matter could not be parsed: {}", e));
            return report;
        }
    };

    match frontmatter.name.as_deref().map(str::trim) {
        None | Some("") => report.error("Missing required field 'name' in front-matter"),
        Some(name) if !is_valid_slug(name) => report.error(format!(
            "Invalid name format: {}. Use lowercase letters, numbers, and hyphens.",
            name
        )),
        Some(_) => {}
    }

    match frontmatter.description.as_deref().map(str::trim) {
        None | Some("") => report.error("Missing required field 'description' in front-matter"),
        Some(desc) => {
            if desc.len() < MIN_DESCRIPTION_LENGTH {
                report.warning(format!(
                    "Description too short ({} chars). Should be at least {} characters.",
                    desc.len(),
                    MIN_DESCRIPTION_LENGTH
                ));
            }
            if desc.contains("TODO") {
                report.warning("Description contains TODO placeholder");
            }
            let lower = desc.to_lowercase();
            if !WHEN_WORDS.iter().any(|w| lower.contains(w)) {
                report.warning("Description should explain when to use this skill");
            }
        }
    }

    if body.trim().len() < MIN_BODY_LENGTH {
        report.warning("SKILL.md body is too short. Add detailed instructions.");
    }
    if body.contains("TODO") {
        report.warning("SKILL.md body contains TODO placeholders");
    }

    let body_lower = body.to_lowercase();
    for section in RECOMMENDED_SECTIONS {
        if !body_lower.contains(&section.to_lowercase()) {
            report.warning(format!("Missing recommended section: '{}'", section));
        }
    }

    for reference in parser.references(body) {
        if !skill_path.join(&reference).is_file() {
            report.warning(format!("Referenced file does not exist: {}", reference));
        }
    }

    for subdir in AUXILIARY_DIRS {
        check_placeholders(&skill_path.join(subdir), subdir, &mut report);
    }

    report
}

fn check_placeholders(dir: &Path, label: &str, report: &mut ValidationReport) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name == ".gitkeep" {
            continue;
        }
        if let Ok(text) = std::fs::read_to_string(&file) {
            if text.contains("TODO") {
                report.warning(format!("File {}/{} contains TODO placeholders", label, name));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GOOD_BODY: &str = "\n# Code Review\n\n## When to Use This Skill\n\n- Reviewing pull requests\n\n## Workflow\n\n1. Read the diff\n2. Check tests\n\n## Examples\n\nAsk for a review of a change set and get structured feedback.\n";

    fn write_skill(dir: &Path, frontmatter: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), format!("---\n{}\n---\n{}", frontmatter, body)).unwrap();
    }

    #[test]
    fn test_valid_skill_passes_strict() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("code-review");
        write_skill(
            &dir,
            "name: code-review\ndescription: Reviews code changes. This skill should be used when the user asks to review a pull request.",
            GOOD_BODY,
        );

        let report = validate_skill_dir(&dir);
        assert!(report.issues.is_empty(), "{}", report);
        assert!(report.passed(true));
    }

    #[test]
    fn test_missing_manifest_is_error() {
        let tmp = TempDir::new().unwrap();
        let report = validate_skill_dir(tmp.path());
        assert_eq!(report.errors().count(), 1);
        assert!(!report.passed(false));
    }

    #[test]
    fn test_bad_name_and_missing_description() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "name: Bad_Name", GOOD_BODY);

        let report = validate_skill_dir(tmp.path());
        let errors: Vec<_> = report.errors().map(|i| i.message.as_str()).collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Invalid name format"));
        assert!(errors[1].contains("'description'"));
    }

    #[test]
    fn test_warnings_fail_only_in_strict_mode() {
        let tmp = TempDir::new().unwrap();
        write_skill(
            tmp.path(),
            "name: short\ndescription: TODO describe me",
            "Load `references/missing.md`.",
        );
        fs::create_dir_all(tmp.path().join("scripts")).unwrap();
        fs::write(tmp.path().join("scripts/run.py"), "# TODO implement").unwrap();

        let report = validate_skill_dir(tmp.path());
        let warnings: Vec<_> = report.warnings().map(|i| i.message.clone()).collect();
        assert!(warnings.iter().any(|w| w.starts_with("Description too short")));
        assert!(warnings.iter().any(|w| w == "Description contains TODO placeholder"));
        assert!(warnings.iter().any(|w| w == "Description should explain when to use this skill"));
        assert!(warnings.iter().any(|w| w.contains("body is too short")));
        assert!(warnings.iter().any(|w| w.contains("'Workflow'")));
        assert!(warnings.iter().any(|w| w == "Referenced file does not exist: references/missing.md"));
        assert!(warnings.iter().any(|w| w == "File scripts/run.py contains TODO placeholders"));

        assert!(report.passed(false));
        assert!(!report.passed(true));
    }
}
