//! Search-query strategy builder.
//!
//! Produces the ordered fallback chain of search queries for a track, most
//! specific first:
//! 1. Full title + all artists
//! 2. Full title + primary artist
//! 3. Title without featuring credit + primary artist
//! 4. Title without any bracketed segment + primary artist
//! 5. Full title + primary artist + "audio"
//! 6. Full title + primary artist + "lyrics"
//!
//! Later entries that collapse to an earlier query (case- and
//! whitespace-insensitively) are dropped, so the list may be shorter than six.

use rustc_hash::FxHashSet;

use crate::models::Strategy;
use crate::normalize::{
    all_artists_flat, collapse_whitespace, primary_artist, query_signature,
    strip_all_parenthetical, strip_feature_credit,
};

/// Build the deduplicated, ordered list of query strings for a track.
pub fn build_queries(title: &str, artist_spec: &str) -> Vec<String> {
    let primary = primary_artist(artist_spec);
    let all_artists = all_artists_flat(artist_spec);
    let title_no_feat = strip_feature_credit(title);
    let title_no_parens = strip_all_parenthetical(title);

    let candidates = [
        format!("{} {}", title, all_artists),
        format!("{} {}", title, primary),
        format!("{} {}", title_no_feat, primary),
        format!("{} {}", title_no_parens, primary),
        format!("{} {} audio", title, primary),
        format!("{} {} lyrics", title, primary),
    ];

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut queries = Vec::with_capacity(candidates.len());
    for candidate in candidates.iter() {
        if seen.insert(query_signature(candidate)) {
            queries.push(collapse_whitespace(candidate));
        }
    }
    queries
}

/// Same as [`build_queries`], wrapped as 1-indexed strategies.
pub fn build_strategies(title: &str, artist_spec: &str) -> Vec<Strategy> {
    build_queries(title, artist_spec)
        .into_iter()
        .enumerate()
        .map(|(i, query_text)| Strategy {
            index: i + 1,
            query_text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_chain() {
        let queries = build_queries("Song (feat. X) (Remix)", "A;B");
        assert_eq!(
            queries,
            vec![
                "Song (feat. X) (Remix) A B",
                "Song (feat. X) (Remix) A",
                "Song (Remix) A",
                "Song A",
                "Song (feat. X) (Remix) A audio",
                "Song (feat. X) (Remix) A lyrics",
            ]
        );
    }

    #[test]
    fn test_plain_title_single_artist_dedupes() {
        // Strategies 2-4 all collapse onto strategy 1
        let queries = build_queries("Song", "Artist");
        assert_eq!(queries, vec!["Song Artist", "Song Artist audio", "Song Artist lyrics"]);
    }

    #[test]
    fn test_feat_title_multi_artist() {
        let queries = build_queries("Song (feat. X)", "A;B");
        assert_eq!(
            queries,
            vec![
                "Song (feat. X) A B",
                "Song (feat. X) A",
                "Song A",
                "Song (feat. X) A audio",
                "Song (feat. X) A lyrics",
            ]
        );
    }

    #[test]
    fn test_dedup_is_case_and_whitespace_insensitive() {
        // "Song  A" and "song a" style variants must not both survive
        let queries = build_queries("Song  (Live)", "a;A");
        let signatures: Vec<String> = queries.iter().map(|q| query_signature(q)).collect();
        let unique: FxHashSet<&String> = signatures.iter().collect();
        assert_eq!(unique.len(), signatures.len());
        assert_eq!(queries[0], "Song (Live) a A");
        assert!(queries.iter().all(|q| !q.contains("  ")));
    }

    #[test]
    fn test_never_empty() {
        for (title, artist) in [("", ""), ("   ", ";;"), ("()", ""), ("Song", "")] {
            let queries = build_queries(title, artist);
            assert!(!queries.is_empty(), "{title:?} / {artist:?}");
        }
    }

    #[test]
    fn test_deterministic() {
        let a = build_queries("Song (feat. X) [Deluxe]", "A;B;C");
        let b = build_queries("Song (feat. X) [Deluxe]", "A;B;C");
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_strategies_indexes_from_one() {
        let strategies = build_strategies("Song (feat. X)", "A;B");
        let indexes: Vec<usize> = strategies.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![1, 2, 3, 4, 5]);
        assert_eq!(strategies[2].query_text, "Song A");
    }
}
