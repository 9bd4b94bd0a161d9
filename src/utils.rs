//! Small text utilities shared across modules.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static NON_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());
static TITLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r" [\|\-–—:] ").unwrap());

/// Collapse runs of whitespace to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").to_string()
}

/// Unicode scalar count, matching the reference's `textContent.length` semantics
/// (character count, not byte length).
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Split a title on the reference's recognized separators (` | `, ` - `, ` – `, ` — `, ` : `).
/// Returns `None` if no separator is present.
pub fn split_title(title: &str) -> Option<(&str, &str)> {
    let m = TITLE_SEPARATOR.find(title)?;
    Some((&title[..m.start()], &title[m.end()..]))
}

/// Lowercased, non-alphanumeric-delimited token set of a string, used for title/header
/// similarity comparisons.
fn token_set(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    NON_TOKEN
        .split(&lower)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the two strings' token sets, with a length-ratio fallback for
/// degenerate single-token inputs where Jaccard collapses to a trivial 0 or 1.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let sa = token_set(a);
    let sb = token_set(b);

    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    if sa.len() <= 1 && sb.len() <= 1 {
        let (la, lb) = (a.trim().len(), b.trim().len());
        if la == 0 || lb == 0 {
            return 0.0;
        }
        return la.min(lb) as f64 / la.max(lb) as f64;
    }

    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// True if `candidate` looks like a URL reference rather than prose (used to reject
/// byline extraction from links/handles).
pub fn looks_like_url(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    lower.starts_with("http") || lower.contains("facebook.com/") || lower.contains("twitter.com/")
}
