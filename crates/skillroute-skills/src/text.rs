//! Text normalization shared by trigger extraction, indexing and matching

use std::collections::BTreeSet;

/// Words that carry no intent on their own
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "as", "at", "be", "by", "can", "do", "for", "from", "help",
    "how", "i", "if", "in", "into", "is", "it", "its", "me", "my", "need", "of", "on", "or",
    "our", "please", "should", "so", "some", "that", "the", "their", "them", "then", "there",
    "these", "this", "those", "to", "up", "us", "use", "used", "want", "was", "we", "what",
    "when", "where", "which", "while", "who", "will", "with", "would", "you", "your",
];

/// Lowercase, replace everything that is not alphanumeric with a space and
/// collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Surround a normalized string with single spaces so that substring search
/// only matches at word boundaries.
pub fn pad(normalized: &str) -> String {
    format!(" {} ", normalized)
}

/// Check whether a normalized token is a stopword
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.binary_search(&token).is_ok()
}

/// Fold simple English plurals ("docs" -> "doc") so both sides of a
/// comparison agree.
pub fn fold_plural(token: &str) -> &str {
    let keeps_s = token.ends_with("ss") || token.ends_with("us") || token.ends_with("is");
    if token.len() > 3 && token.ends_with('s') && !keeps_s {
        &token[..token.len() - 1]
    } else {
        token
    }
}

/// Distinct content-bearing tokens of `text`
pub fn content_tokens(text: &str) -> BTreeSet<String> {
    normalize(text)
        .split(' ')
        .filter(|t| t.chars().count() >= 2 && !is_stopword(t))
        .map(|t| fold_plural(t).to_string())
        .collect()
}

/// Skill ids are lowercase slugs: a letter followed by letters, digits or hyphens
pub fn is_valid_slug(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
