//! Candidate ranking for search results.
//!
//! This module picks the single best candidate from one backend response:
//! - URL validity filter (http/https only)
//! - Ratio filter against compilations and mixes
//! - Duration-distance selection with stable tie-breaking

use crate::models::SearchCandidate;

// ============================================================================
// Thresholds
// ============================================================================

/// Candidates longer than this multiple of the expected length are treated
/// as compilations/mixes and skipped, unless nothing else is left.
pub const MAX_DURATION_RATIO: f64 = 3.0;

// ============================================================================
// Duration Helpers
// ============================================================================

/// Absolute difference between a candidate's length and the target, in seconds.
/// Unknown lengths (0.0) are compared like any other value.
pub fn duration_distance(candidate: &SearchCandidate, target_s: f64) -> f64 {
    (candidate.duration_s - target_s).abs()
}

/// Ratio filter: keeps candidates no longer than `MAX_DURATION_RATIO × target`.
pub fn within_ratio(candidate: &SearchCandidate, target_s: f64) -> bool {
    candidate.duration_s <= target_s * MAX_DURATION_RATIO
}

// ============================================================================
// Selection
// ============================================================================

/// Pick the best candidate for a track of `target_duration_ms`.
///
/// Returns `None` only when no candidate has an http(s) URL. Without a usable
/// target (absent or 0) the backend's own first result wins. Otherwise the
/// candidate closest in length wins, after the ratio filter; if the filter
/// removes everything the unfiltered list is used instead. Ties go to the
/// earlier candidate.
pub fn pick_best(
    candidates: &[SearchCandidate],
    target_duration_ms: Option<u64>,
) -> Option<&SearchCandidate> {
    let valid: Vec<&SearchCandidate> = candidates.iter().filter(|c| c.has_web_url()).collect();
    let first = *valid.first()?;

    let target_ms = match target_duration_ms {
        Some(ms) if ms > 0 => ms,
        _ => return Some(first),
    };
    let target_s = target_ms as f64 / 1000.0;

    let reasonable: Vec<&SearchCandidate> = valid
        .iter()
        .copied()
        .filter(|c| within_ratio(c, target_s))
        .collect();
    let pool = if reasonable.is_empty() { valid } else { reasonable };

    // min_by keeps the first of equal elements
    pool.into_iter().min_by(|a, b| {
        duration_distance(a, target_s).total_cmp(&duration_distance(b, target_s))
    })
}
