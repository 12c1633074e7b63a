//! Explicit invocation (`/skill-name remaining args`)

use skillroute_skills::text::is_valid_slug;
use skillroute_skills::SkillRegistry;
use skillroute_types::ExplicitInvocation;
use tracing::debug;

use crate::error::{Result, RouteError};

const MAX_SUGGESTIONS: usize = 3;
const MIN_SHARED_PREFIX: usize = 3;

/// Recognizes `<sigil><skill-id> [args]` utterances
#[derive(Debug, Clone)]
pub struct ExplicitParser {
    sigil: String,
}

impl ExplicitParser {
    /// Parser for invocations starting with `sigil`
    pub fn new(sigil: impl Into<String>) -> Self {
        Self {
            sigil: sigil.into(),
        }
    }

    /// Configured sigil
    pub fn sigil(&self) -> &str {
        &self.sigil
    }

    /// Syntax only: the sigil followed directly by a slug-shaped token
    ///
    /// Returns `None` for ordinary text, a bare sigil, `/ foo` or paths such as
    /// `/usr/bin`.
    pub fn parse_syntax(&self, utterance: &str) -> Option<ExplicitInvocation> {
        let rest = utterance.trim_start().strip_prefix(self.sigil.as_str())?;

        let (token, args) = match rest.find(char::is_whitespace) {
            Some(split) => (&rest[..split], rest[split..].trim()),
            None => (rest, ""),
        };

        let id = token.trim_end_matches([':', ',']).to_lowercase();
        if !is_valid_slug(&id) {
            return None;
        }

        Some(ExplicitInvocation {
            skill_id: id,
            args: args.to_string(),
        })
    }

    /// Parse and resolve against `registry`
    ///
    /// An invocation naming an unregistered skill is an error rather than a
    /// fallback to matching, so the caller can tell the user.
    pub fn parse(
        &self,
        utterance: &str,
        registry: &SkillRegistry,
    ) -> Result<Option<ExplicitInvocation>> {
        let Some(invocation) = self.parse_syntax(utterance) else {
            return Ok(None);
        };

        if !registry.contains(&invocation.skill_id) {
            let suggestions = suggest(&invocation.skill_id, registry);
            debug!(id = %invocation.skill_id, ?suggestions, "explicit invocation of unknown skill");
            return Err(RouteError::UnknownSkill {
                id: invocation.skill_id,
                suggestions,
            });
        }

        Ok(Some(invocation))
    }
}

impl Default for ExplicitParser {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Registered ids that look like `token`, in registry order
fn suggest(token: &str, registry: &SkillRegistry) -> Vec<String> {
    registry
        .skill_ids()
        .filter(|id| {
            id.contains(token) || token.contains(id) || shared_prefix(id, token) >= MIN_SHARED_PREFIX
        })
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

fn shared_prefix(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn registry() -> SkillRegistry {
        SkillRegistry::from_manifests([
            (
                "skills/docker-deploy/SKILL.md",
                "---\nname: docker-deploy\ndescription: Use when deploying containers.\n---\n",
            ),
            (
                "skills/code-review/SKILL.md",
                "---\nname: code-review\ndescription: Use when reviewing code.\n---\n",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_invocation_with_args() {
        let parser = ExplicitParser::default();
        let invocation = parser
            .parse("  /Docker-Deploy   generate k8s manifests  ", &registry())
            .unwrap()
            .unwrap();
        assert_eq!(invocation.skill_id, "docker-deploy");
        assert_eq!(invocation.args, "generate k8s manifests");
    }

    #[test]
    fn test_parse_without_args() {
        let parser = ExplicitParser::default();
        let invocation = parser.parse("/code-review", &registry()).unwrap().unwrap();
        assert_eq!(invocation.skill_id, "code-review");
        assert_eq!(invocation.args, "");
    }

    #[test]
    fn test_not_an_invocation() {
        let parser = ExplicitParser::default();
        let registry = registry();
        for utterance in ["deploy my app", "/", "/ code-review", "/usr/bin/env", "a /code-review"] {
            assert!(parser.parse(utterance, &registry).unwrap().is_none(), "{}", utterance);
        }
    }

    #[test]
    fn test_unknown_skill_with_suggestions() {
        let parser = ExplicitParser::default();
        let err = parser.parse("/docker do things", &registry()).unwrap_err();
        match err {
            RouteError::UnknownSkill { id, suggestions } => {
                assert_eq!(id, "docker");
                assert_eq!(suggestions, vec!["docker-deploy"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_sigil() {
        let parser = ExplicitParser::new("!");
        assert!(parser.parse_syntax("/code-review").is_none());
        assert_eq!(
            parser.parse_syntax("!code-review now").unwrap().skill_id,
            "code-review"
        );
    }
}
