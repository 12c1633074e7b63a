//! Trigger phrase extraction from skill descriptions
//!
//! Descriptions follow the convention "<summary>. This skill should be used
//! when X, Y, or Z." Phrases are collected from, in order:
//!
//! 1. the explicit `triggers:` front-matter list
//! 2. double-quoted phrases anywhere in the description
//! 3. clauses following a cue ("should be used when", "use for", ...), split
//!    on commas, semicolons, "or" and "and"
//!
//! Leading filler ("the user asks to", a leading article) is stripped from
//! every phrase.

use regex::Regex;

use crate::error::LoadError;
use crate::text::{is_stopword, normalize};

/// Longest phrase (in words) still considered a trigger
const MAX_PHRASE_WORDS: usize = 8;

/// Extracts normalized trigger phrases
pub struct TriggerExtractor {
    cue: Regex,
    terminator: Regex,
    splitter: Regex,
    filler: Regex,
    quoted: Regex,
}

impl TriggerExtractor {
    /// Compile the extraction patterns
    pub fn new() -> Result<Self, LoadError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| LoadError::Pattern(format!("trigger regex: {}", e)))
        };

        Ok(Self {
            cue: compile(
                r"(?i)\b(?:should\s+be\s+used\s+(?:when|for|whenever)|use\s+(?:this\s+skill\s+)?(?:when|whenever|for)|used\s+(?:when|for)|activate\s+when|invoke\s+when|triggers?\s+(?:on|when|include)|trigger\s+phrases?)\b:?",
            )?,
            terminator: compile(r"[.!?](?:\s|$)|\n")?,
            splitter: compile(r"(?i)\s*(?:[,;]|\bor\b|\band\b)\s*")?,
            filler: compile(
                r"^(?:(?:or|and|also|to|for|when|whenever|if|e g|eg|i e|such as|like|including)\s+)*(?:(?:the\s+)?(?:user|users|someone|you|they)\s+(?:asks?|asked|wants?|needs?|requests?|mentions?|is|are)\s+)?(?:(?:to|for|about)\s+)?(?:(?:a|an|the)\s+)?",
            )?,
            quoted: compile(r#""([^"\n]{3,80})"|“([^”\n]{3,80})”"#)?,
        })
    }

    /// Extract ordered, de-duplicated phrases
    pub fn extract(&self, description: &str, explicit: &[String]) -> Vec<String> {
        let mut phrases: Vec<String> = Vec::new();
        let mut push = |candidate: &str| {
            if let Some(phrase) = self.clean(candidate) {
                if !phrases.contains(&phrase) {
                    phrases.push(phrase);
                }
            }
        };

        for trigger in explicit {
            push(trigger);
        }

        for caps in self.quoted.captures_iter(description) {
            if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
                push(m.as_str());
            }
        }

        let cues: Vec<_> = self.cue.find_iter(description).collect();
        for (i, cue) in cues.iter().enumerate() {
            let rest = &description[cue.end()..];
            let mut end = self.terminator.find(rest).map_or(rest.len(), |m| m.start());
            if let Some(next) = cues.get(i + 1) {
                end = end.min(next.start().saturating_sub(cue.end()));
            }

            for fragment in self.splitter.split(&rest[..end]) {
                push(fragment);
            }
        }

        phrases
    }

    /// Normalize a fragment and strip leading filler; `None` if nothing
    /// meaningful remains
    fn clean(&self, fragment: &str) -> Option<String> {
        let normalized = normalize(fragment);
        let stripped = self.filler.replace(&normalized, "");
        let phrase = stripped.trim();

        let words: Vec<&str> = phrase.split(' ').filter(|w| !w.is_empty()).collect();
        if phrase.len() < 3 || words.is_empty() || words.len() > MAX_PHRASE_WORDS {
            return None;
        }
        if words.iter().all(|w| is_stopword(w)) {
            return None;
        }

        Some(words.join(" "))
    }
}
