//! Intent matching
//!
//! Scores every registered skill against an utterance with two signals:
//!
//! - trigger hits: trigger phrases found in the normalized utterance at word
//!   boundaries, via the registry's Aho-Corasick index
//! - keyword overlap: share of the utterance's content tokens that also appear
//!   in the skill's description or id
//!
//! ```text
//! raw   = 1.0 * hits + 0.5 * overlap
//! max   = 1.0 * min(triggers, 2) + 0.5
//! score = min(raw / max, 1.0)
//! ```
//!
//! Any trigger hit therefore scores at least 0.4, which outranks every skill
//! that only overlaps on keywords.

use skillroute_skills::text::content_tokens;
use skillroute_skills::SkillRegistry;
use skillroute_types::MatchCandidate;
use tracing::debug;

use crate::config::RouterConfig;

/// Weight of each trigger hit
pub const TRIGGER_WEIGHT: f64 = 1.0;
/// Weight of the keyword overlap ratio
pub const OVERLAP_WEIGHT: f64 = 0.5;
/// Trigger hits beyond this many do not raise the score further
pub const TRIGGER_CAP: usize = 2;

/// Scores closer than this are treated as equal
const SCORE_TOLERANCE: f64 = 1e-9;

/// Normalized score for one skill
pub fn score(hits: usize, trigger_count: usize, overlap: f64) -> f64 {
    let capped = trigger_count.min(TRIGGER_CAP);
    let raw = TRIGGER_WEIGHT * hits as f64 + OVERLAP_WEIGHT * overlap;
    let max = TRIGGER_WEIGHT * capped as f64 + OVERLAP_WEIGHT;
    (raw / max).min(1.0)
}

/// Ranks skills for free-form utterances
#[derive(Debug, Clone)]
pub struct IntentMatcher {
    threshold: f64,
    epsilon: f64,
}

impl IntentMatcher {
    /// Matcher keeping scores at or above `threshold`; scores within
    /// `epsilon` of the top are ambiguous
    pub fn new(threshold: f64, epsilon: f64) -> Self {
        Self { threshold, epsilon }
    }

    /// Matcher using the configured threshold and epsilon
    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.match_threshold, config.ambiguity_epsilon)
    }

    /// Candidates at or above the threshold, best first
    ///
    /// Ties keep registry order. When two or more candidates sit within
    /// epsilon of the top score they are all flagged ambiguous.
    pub fn rank(&self, utterance: &str, registry: &SkillRegistry) -> Vec<MatchCandidate> {
        let skills = registry.all();
        if skills.is_empty() {
            return Vec::new();
        }

        let tokens = content_tokens(utterance);

        let mut hits = vec![0usize; skills.len()];
        let mut best_phrase: Vec<Option<&str>> = vec![None; skills.len()];
        for hit in registry.trigger_index().find(utterance) {
            let Some(phrase) = skills[hit.skill_index].trigger_phrases.get(hit.phrase_index) else {
                continue;
            };
            hits[hit.skill_index] += 1;
            let slot = &mut best_phrase[hit.skill_index];
            if slot.map_or(true, |current| phrase.len() > current.len()) {
                *slot = Some(phrase.as_str());
            }
        }

        let mut candidates: Vec<MatchCandidate> = Vec::new();
        for (index, skill) in skills.iter().enumerate() {
            let overlap = match registry.keywords(index) {
                Some(keywords) if !tokens.is_empty() => {
                    tokens.intersection(keywords).count() as f64 / tokens.len() as f64
                }
                _ => 0.0,
            };

            let value = score(hits[index], skill.trigger_phrases.len(), overlap);
            if value > 0.0 {
                debug!(
                    skill = %skill.id,
                    hits = hits[index],
                    overlap,
                    score = value,
                    "scored skill"
                );
            }
            if value + SCORE_TOLERANCE >= self.threshold && value > 0.0 {
                candidates.push(MatchCandidate::new(
                    skill.id.clone(),
                    value,
                    best_phrase[index].map(str::to_string),
                ));
            }
        }

        // Stable sort keeps registry order among equal scores
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.mark_ambiguous(&mut candidates);
        candidates
    }

    fn mark_ambiguous(&self, candidates: &mut [MatchCandidate]) {
        let Some(top) = candidates.first().map(|c| c.score) else {
            return;
        };

        let close = candidates
            .iter()
            .take_while(|c| top - c.score <= self.epsilon + SCORE_TOLERANCE)
            .count();

        if close >= 2 {
            for candidate in &mut candidates[..close] {
                candidate.ambiguous = true;
            }
        }
    }
}

impl Default for IntentMatcher {
    fn default() -> Self {
        Self::from_config(&RouterConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn registry() -> SkillRegistry {
        SkillRegistry::from_manifests([
            (
                "skills/code-review/SKILL.md",
                "---\nname: code-review\ndescription: Review code changes. Use when the user asks to review a pull request or check a diff.\n---\n",
            ),
            (
                "skills/release-notes/SKILL.md",
                "---\nname: release-notes\ndescription: Draft release notes from merged pull requests. Use when preparing a release or writing a changelog.\n---\n",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_score_formula() {
        assert_eq!(score(0, 3, 0.0), 0.0);
        assert!((score(1, 3, 0.0) - 0.4).abs() < 1e-12);
        assert!((score(0, 3, 1.0) - 0.2).abs() < 1e-12);
        assert_eq!(score(2, 2, 1.0), 1.0);
        // Single-trigger skills are not penalized
        assert!((score(1, 1, 1.0) - 1.0).abs() < 1e-12);
        // Extra hits saturate at 1.0
        assert_eq!(score(3, 5, 0.0), 1.0);
    }

    #[test]
    fn test_trigger_hit_wins() {
        let matcher = IntentMatcher::default();
        let ranked = matcher.rank("Can you review a pull request for me?", &registry());

        assert_eq!(ranked[0].skill_id, "code-review");
        assert_eq!(ranked[0].matched_phrase.as_deref(), Some("review a pull request"));
        assert!(!ranked[0].ambiguous);
        assert!(ranked[0].score >= 0.4);
        assert!(ranked.iter().skip(1).all(|c| c.score < ranked[0].score));
    }

    #[test]
    fn test_no_signal_is_empty() {
        let matcher = IntentMatcher::default();
        assert!(matcher.rank("what's the weather like", &registry()).is_empty());
        assert!(matcher.rank("", &registry()).is_empty());
        assert!(matcher.rank("anything", &SkillRegistry::new()).is_empty());
    }

    #[test]
    fn test_threshold_filters_everything() {
        let matcher = IntentMatcher::new(1.0, 0.05);
        assert!(matcher.rank("pull request", &registry()).is_empty());
    }

    #[test]
    fn test_close_scores_are_ambiguous_in_registry_order() {
        let matcher = IntentMatcher::default();
        // "pull request" appears in both descriptions and in neither trigger list
        let ranked = matcher.rank("pull requests", &registry());

        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|c| c.ambiguous));
        assert_eq!(ranked[0].skill_id, "code-review");
        assert_eq!(ranked[1].skill_id, "release-notes");
    }

    #[test]
    fn test_full_trigger_beats_other_skills_nested_trigger() {
        let registry = SkillRegistry::from_manifests([
            (
                "skills/code-review/SKILL.md",
                "---\nname: code-review\ndescription: Reviews code for best practices and security.\ntriggers:\n  - review a pull request\n  - audit code quality\n  - check for security issues\n---\n",
            ),
            (
                "skills/git-workflow/SKILL.md",
                "---\nname: git-workflow\ndescription: Branching and merge conventions.\ntriggers:\n  - a pull request\n---\n",
            ),
        ])
        .unwrap();
        let matcher = IntentMatcher::default();

        let ranked = matcher.rank("review a pull request", &registry);
        assert_eq!(ranked[0].skill_id, "code-review");
        assert_eq!(ranked[0].matched_phrase.as_deref(), Some("review a pull request"));
        assert!(!ranked[0].ambiguous);
        assert!(ranked.iter().all(|c| c.skill_id != "git-workflow"));

        // The shorter trigger still fires on its own
        let ranked = matcher.rank("open a pull request", &registry);
        assert_eq!(ranked[0].skill_id, "git-workflow");
    }

    #[test]
    fn test_scores_within_epsilon_are_ambiguous() {
        let matcher = IntentMatcher::new(0.15, 0.05);
        let mut candidates = vec![
            MatchCandidate::new("code-review", 0.50, None),
            MatchCandidate::new("release-notes", 0.46, None),
            MatchCandidate::new("changelog", 0.30, None),
        ];
        matcher.mark_ambiguous(&mut candidates);

        assert!(candidates[0].ambiguous);
        assert!(candidates[1].ambiguous);
        assert!(!candidates[2].ambiguous);
    }

    #[test]
    fn test_scores_just_outside_epsilon_are_not_ambiguous() {
        let matcher = IntentMatcher::new(0.15, 0.05);
        let mut candidates = vec![
            MatchCandidate::new("code-review", 0.50, None),
            MatchCandidate::new("release-notes", 0.44, None),
        ];
        matcher.mark_ambiguous(&mut candidates);

        assert!(candidates.iter().all(|c| !c.ambiguous));
    }

    #[test]
    fn test_rank_is_deterministic() {
        let matcher = IntentMatcher::default();
        let registry = registry();
        let first = matcher.rank("review the release notes diff", &registry);
        for _ in 0..10 {
            assert_eq!(matcher.rank("review the release notes diff", &registry), first);
        }
    }
}
