//! Text normalization for search-query construction.
//! Used by the query builder and the `show-queries` binary.
//!
//! Every function here is total and idempotent: a non-matching input comes
//! back unchanged, and re-applying a function to its own output is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Separator between artists in a multi-artist credit ("A;B;C").
pub const ARTIST_DELIMITER: char = ';';

/// Bracketed featuring credits: "(feat. X)", "[ft. X]", "(featuring X)", "(with X)".
/// Bare "feat. X" without brackets is deliberately not matched.
pub static FEATURE_CREDIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\(\[]\s*(?:feat\.?|ft\.?|featuring|with)\s+[^\)\]]+[\)\]]").unwrap()
});

/// Any bracket/parenthesis segment: "(Remix)", "[Live]", "(Deluxe Edition)".
pub static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\(\[][^\)\]]*[\)\]]").unwrap());

// ============================================================================
// HELPERS
// ============================================================================

/// Remove every match of `pattern`, repeating until the text stops changing.
/// Removing one segment can splice its neighbours into a new match
/// ("( (feat. X)feat. Y)"), so a single pass is not always a fixed point.
fn strip_until_stable(pattern: &Regex, text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = pattern.replace_all(&current, "").into_owned();
        if next == current {
            return current.trim().to_string();
        }
        current = next;
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case- and whitespace-insensitive key used to spot duplicate queries.
pub fn query_signature(query: &str) -> String {
    collapse_whitespace(query).to_lowercase()
}

// ============================================================================
// ARTIST NORMALIZATION
// ============================================================================

/// First artist of a `;`-separated credit, trimmed.
/// e.g., "Daft Punk;Pharrell Williams" → "Daft Punk"
pub fn primary_artist(artist_spec: &str) -> String {
    artist_spec
        .split(ARTIST_DELIMITER)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// All artists of a `;`-separated credit joined by single spaces.
/// Empty segments are dropped: "A;;B;" → "A B"
pub fn all_artists_flat(artist_spec: &str) -> String {
    artist_spec
        .split(ARTIST_DELIMITER)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TITLE NORMALIZATION
// ============================================================================

/// Strip bracketed featuring credits from a title.
/// e.g., "Get Lucky (feat. Pharrell Williams)" → "Get Lucky"
pub fn strip_feature_credit(title: &str) -> String {
    strip_until_stable(&FEATURE_CREDIT, title)
}

/// Strip every bracketed or parenthesized segment from a title.
/// e.g., "Song (Remix) [Live]" → "Song"
pub fn strip_all_parenthetical(title: &str) -> String {
    strip_until_stable(&PARENTHETICAL, title)
}

// ============================================================================
// TESTS
// ============================================================================
