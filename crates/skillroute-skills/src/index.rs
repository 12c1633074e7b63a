//! Trigger phrase index
//!
//! One Aho-Corasick automaton over every trigger phrase of every skill. Phrases
//! and haystacks are normalized and padded with spaces so a single overlapping
//! scan finds all word-boundary matches at once.

use aho_corasick::AhoCorasick;
use skillroute_types::SkillDefinition;
use std::ops::Range;
use tracing::trace;

use crate::error::LoadError;
use crate::text::{normalize, pad};

/// A trigger phrase found in an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerHit {
    /// Position of the skill in registry order
    pub skill_index: usize,
    /// Position of the phrase in the skill's `trigger_phrases`
    pub phrase_index: usize,
}

/// Compiled automaton mapping pattern ids back to (skill, phrase)
#[derive(Debug, Clone, Default)]
pub struct TriggerIndex {
    automaton: Option<AhoCorasick>,
    owners: Vec<TriggerHit>,
}

impl TriggerIndex {
    /// Build the index for skills in registry order
    pub fn build(skills: &[SkillDefinition]) -> Result<Self, LoadError> {
        let mut patterns = Vec::new();
        let mut owners = Vec::new();

        for (skill_index, skill) in skills.iter().enumerate() {
            for (phrase_index, phrase) in skill.trigger_phrases.iter().enumerate() {
                patterns.push(pad(phrase));
                owners.push(TriggerHit {
                    skill_index,
                    phrase_index,
                });
            }
        }

        if patterns.is_empty() {
            return Ok(Self::default());
        }

        let automaton = AhoCorasick::new(&patterns)
            .map_err(|e| LoadError::Pattern(format!("trigger automaton: {}", e)))?;
        trace!(count = patterns.len(), "trigger automaton built");

        Ok(Self {
            automaton: Some(automaton),
            owners,
        })
    }

    /// Number of indexed phrases
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if no phrases are indexed
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// All distinct trigger hits in `utterance`, ordered by skill then phrase
    ///
    /// A match lying strictly inside a longer match owned by a different skill
    /// is dropped, so typing one skill's full trigger never also credits
    /// another skill whose trigger is a fragment of it.
    pub fn find(&self, utterance: &str) -> Vec<TriggerHit> {
        let Some(automaton) = self.automaton.as_ref() else {
            return Vec::new();
        };

        let haystack = pad(&normalize(utterance));
        let spans: Vec<(Range<usize>, TriggerHit)> = automaton
            .find_overlapping_iter(&haystack)
            .map(|m| (m.range(), self.owners[m.pattern().as_usize()]))
            .collect();

        let mut hits: Vec<TriggerHit> = spans
            .iter()
            .filter(|(span, hit)| {
                let shadowed = spans.iter().any(|(outer, other)| {
                    other.skill_index != hit.skill_index
                        && outer.len() > span.len()
                        && outer.start <= span.start
                        && span.end <= outer.end
                });
                if shadowed {
                    trace!(skill_index = hit.skill_index, "trigger hit nested in longer trigger");
                }
                !shadowed
            })
            .map(|(_, hit)| *hit)
            .collect();

        hits.sort_unstable_by_key(|h| (h.skill_index, h.phrase_index));
        hits.dedup();
        hits
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use skillroute_types::Category;
    use std::path::PathBuf;

    fn skill(id: &str, triggers: &[&str]) -> SkillDefinition {
        SkillDefinition {
            id: id.to_string(),
            description: String::new(),
            trigger_phrases: triggers.iter().map(|t| t.to_string()).collect(),
            body: String::new(),
            referenced_docs: Vec::new(),
            category: Category::Uncategorized,
            root: PathBuf::from(id),
            manifest_path: PathBuf::from(id).join("SKILL.md"),
        }
    }

    #[test]
    fn test_finds_overlapping_phrases_across_skills() {
        let skills = vec![
            skill("confluence-docs", &["search confluence", "confluence page"]),
            skill("page-titles", &["page titles"]),
        ];
        let index = TriggerIndex::build(&skills).unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.find("Please SEARCH Confluence page titles");
        assert_eq!(
            hits,
            vec![
                TriggerHit { skill_index: 0, phrase_index: 0 },
                TriggerHit { skill_index: 0, phrase_index: 1 },
                TriggerHit { skill_index: 1, phrase_index: 0 },
            ]
        );
    }

    #[test]
    fn test_phrase_nested_in_other_skills_phrase_is_dropped() {
        let skills = vec![
            skill("code-review", &["review a pull request"]),
            skill("git-workflow", &["pull request"]),
        ];
        let index = TriggerIndex::build(&skills).unwrap();

        assert_eq!(
            index.find("please review a pull request"),
            vec![TriggerHit { skill_index: 0, phrase_index: 0 }]
        );
        // Standalone occurrences still count
        assert_eq!(
            index.find("open a pull request"),
            vec![TriggerHit { skill_index: 1, phrase_index: 0 }]
        );
        assert_eq!(
            index.find("review a pull request then merge the pull request"),
            vec![
                TriggerHit { skill_index: 0, phrase_index: 0 },
                TriggerHit { skill_index: 1, phrase_index: 0 },
            ]
        );
    }

    #[test]
    fn test_nested_phrases_of_same_skill_both_count() {
        let skills = vec![skill("code-review", &["review a pull request", "pull request"])];
        let index = TriggerIndex::build(&skills).unwrap();
        assert_eq!(index.find("review a pull request").len(), 2);
    }

    #[test]
    fn test_word_boundaries_respected() {
        let skills = vec![skill("search", &["search"])];
        let index = TriggerIndex::build(&skills).unwrap();
        assert!(index.find("research the topic").is_empty());
        assert_eq!(index.find("search").len(), 1);
    }

    #[test]
    fn test_repeated_phrase_reported_once() {
        let skills = vec![skill("git", &["rebase"])];
        let index = TriggerIndex::build(&skills).unwrap();
        assert_eq!(index.find("rebase then rebase again").len(), 1);
    }

    #[test]
    fn test_empty_index() {
        let index = TriggerIndex::build(&[]).unwrap();
        assert!(index.is_empty());
        assert!(index.find("anything").is_empty());
    }
}
