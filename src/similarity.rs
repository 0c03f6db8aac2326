//! Token-set (Jaccard) similarity.

use std::collections::HashSet;

/// Similarity above which a candidate reply counts as a repeat of a recent one.
pub const REPETITION_THRESHOLD: f64 = 0.6;

/// Similarity above which two questions are treated as the same question.
pub const QUESTION_MATCH_THRESHOLD: f64 = 0.7;

/// Jaccard index of the whitespace token sets of `a` and `b`, lowercased.
///
/// Returns a value in `[0, 1]`, and `0.0` when either side has no tokens.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let left: HashSet<&str> = a.split_whitespace().collect();
    let right: HashSet<&str> = b.split_whitespace().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    intersection as f64 / union as f64
}

/// Whether two question texts refer to the same question.
///
/// Matches when either text contains the other, or when their similarity
/// exceeds [`QUESTION_MATCH_THRESHOLD`]. Blank text never matches.
#[must_use]
pub fn is_near_match(query: &str, stored: &str) -> bool {
    let query = query.trim();
    let stored = stored.trim();
    if query.is_empty() || stored.is_empty() {
        return false;
    }
    query.contains(stored)
        || stored.contains(query)
        || similarity(query, stored) > QUESTION_MATCH_THRESHOLD
}
