//! Auxiliary document references declared in skill bodies
//!
//! Skills point at supplementary files with phrases such as
//! "Load `references/cql_syntax.md` for the query grammar" or
//! "Load references/templates.md when drafting". Only relative paths that stay
//! inside the skill directory are recorded.

use regex::Regex;
use std::path::{Component, Path};

use crate::error::LoadError;

/// Finds "load <path>" references in Markdown bodies
pub struct ReferenceExtractor {
    pattern: Regex,
}

impl ReferenceExtractor {
    /// Compile the reference pattern
    pub fn new() -> Result<Self, LoadError> {
        let pattern = Regex::new(
            r"(?i)\bload\s+(?:the\s+)?(?:`([^`\s]+)`|([A-Za-z0-9_.\-]+(?:/[A-Za-z0-9_.\-]+)+))",
        )
        .map_err(|e| LoadError::Pattern(format!("reference regex: {}", e)))?;

        Ok(Self { pattern })
    }

    /// Ordered, de-duplicated relative paths
    pub fn extract(&self, body: &str) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();

        for caps in self.pattern.captures_iter(body) {
            let Some(raw) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            let path = raw.as_str().trim_end_matches(['.', ',', ':', ';']);
            if is_contained_relative(path) && !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }

        paths
    }
}

/// True for relative paths without `..`, roots or URL schemes
pub fn is_contained_relative(path: &str) -> bool {
    if path.is_empty() || path.contains("://") || path.starts_with('~') {
        return false;
    }

    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn extract(body: &str) -> Vec<String> {
        ReferenceExtractor::new().unwrap().extract(body)
    }

    #[test]
    fn test_backticked_and_bare_references() {
        let body = "## References\n\n- Load `references/cql_syntax.md` for query grammar\n- Load references/space_layout.md.\n- load the `assets/page.html` template\n";
        assert_eq!(
            extract(body),
            vec!["references/cql_syntax.md", "references/space_layout.md", "assets/page.html"]
        );
    }

    #[test]
    fn test_duplicates_collapsed() {
        let body = "Load `references/a.md`. Later, load `references/a.md` again.";
        assert_eq!(extract(body), vec!["references/a.md"]);
    }

    #[test]
    fn test_escaping_and_absolute_paths_ignored() {
        let body = "Load `../secrets.md`. Load `/etc/passwd`. Load `https://example.com/x.md`. Load `~/notes.md`.";
        assert!(extract(body).is_empty());
    }

    #[test]
    fn test_bare_words_are_not_paths() {
        assert!(extract("Load balancing is configured per service.").is_empty());
    }
}
