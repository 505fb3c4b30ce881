//! Core data models for track resolution.
//!
//! This module contains the inputs, search results, strategy descriptors and
//! outcomes passed between the query builder, ranker and resolver, plus the
//! serializable records used by the batch CLI.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Inputs
// ============================================================================

/// A piece of music metadata to resolve to a single video URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackQuery {
    #[serde(rename = "track_name")]
    pub title: String,
    /// One or more artists separated by `;`
    #[serde(rename = "artist")]
    pub artist_spec: String,
    /// Expected length; a numeric string or anything unparseable is accepted
    /// on input and the latter treated as absent.
    #[serde(
        rename = "duration_ms",
        default,
        deserialize_with = "lenient_duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_duration_ms: Option<u64>,
}

impl TrackQuery {
    pub fn new(title: &str, artist_spec: &str, target_duration_ms: Option<u64>) -> Self {
        Self {
            title: title.to_string(),
            artist_spec: artist_spec.to_string(),
            target_duration_ms,
        }
    }
}

/// Accept `180000`, `"180000"`, `""`, `null` or garbage for a duration field.
fn lenient_duration_ms<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}

// ============================================================================
// Search Results
// ============================================================================

/// One search hit as reported by a backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchCandidate {
    pub url: String,
    /// Length in seconds; 0.0 when the backend did not report one
    pub duration_s: f64,
}

impl SearchCandidate {
    pub fn new(url: &str, duration_s: f64) -> Self {
        Self {
            url: url.to_string(),
            duration_s,
        }
    }

    /// True for `http://` and `https://` URLs.
    pub fn has_web_url(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// One step of the query fallback chain. `index` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Strategy {
    pub index: usize,
    pub query_text: String,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Outcome of a single `resolve` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionResult {
    Success {
        url: String,
        strategy_index: usize,
        query_text: String,
    },
    Failure {
        reason: String,
    },
}

impl ResolutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ResolutionResult::Success { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ResolutionResult::Success { url, .. } => Some(url),
            ResolutionResult::Failure { .. } => None,
        }
    }

    /// Human-readable diagnostic, e.g. `strategy 3/6: "Song A"`.
    pub fn describe(&self, strategy_count: usize) -> String {
        match self {
            ResolutionResult::Success {
                strategy_index,
                query_text,
                ..
            } => format!("strategy {}/{}: \"{}\"", strategy_index, strategy_count, query_text),
            ResolutionResult::Failure { reason } => reason.clone(),
        }
    }
}

impl fmt::Display for ResolutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionResult::Success {
                url,
                strategy_index,
                query_text,
            } => write!(f, "{} (strategy {}: \"{}\")", url, strategy_index, query_text),
            ResolutionResult::Failure { reason } => f.write_str(reason),
        }
    }
}

/// A result together with how much of the strategy list it took.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Resolution {
    #[serde(flatten)]
    pub result: ResolutionResult,
    pub strategies_attempted: usize,
    pub strategy_count: usize,
}

impl Resolution {
    pub fn describe(&self) -> String {
        self.result.describe(self.strategy_count)
    }
}

// ============================================================================
// Batch Output
// ============================================================================

/// A track the batch run found a URL for.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedTrack {
    #[serde(flatten)]
    pub track: TrackQuery,
    pub url: String,
    pub strategy: String,
}

/// A track the batch run gave up on; `error` is the opaque failure reason.
#[derive(Clone, Debug, Serialize)]
pub struct FailedTrack {
    #[serde(flatten)]
    pub track: TrackQuery,
    pub url: String,
    pub error: String,
}

/// Full batch report written as JSON.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    pub resolved: Vec<ResolvedTrack>,
    pub failures: Vec<FailedTrack>,
}

impl BatchReport {
    /// Split resolutions into resolved and failed rows, counting them as it goes.
    /// Input order is kept within each list.
    pub fn assemble(resolutions: Vec<(TrackQuery, Resolution)>) -> (Self, ResolveStats) {
        let mut stats = ResolveStats::default();
        let mut report = BatchReport::default();
        for (track, resolution) in resolutions {
            stats.record(&resolution);
            let strategy = resolution.describe();
            match resolution.result {
                ResolutionResult::Success { url, .. } => report.resolved.push(ResolvedTrack {
                    track,
                    url,
                    strategy,
                }),
                ResolutionResult::Failure { reason } => report.failures.push(FailedTrack {
                    track,
                    url: String::new(),
                    error: reason,
                }),
            }
        }
        (report, stats)
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Counters for a batch run.
#[derive(Default, Debug, Clone, Serialize)]
pub struct ResolveStats {
    pub total_tracks: usize,
    pub resolved: usize,
    pub failed: usize,
    /// `wins_by_strategy[i]` counts successes from strategy `i + 1`
    pub wins_by_strategy: Vec<usize>,
    pub backend_queries: usize,
    pub elapsed_seconds: f64,
}

impl ResolveStats {
    /// Fold one resolution into the counters.
    pub fn record(&mut self, resolution: &Resolution) {
        self.total_tracks += 1;
        self.backend_queries += resolution.strategies_attempted;
        match &resolution.result {
            ResolutionResult::Success { strategy_index, .. } => {
                self.resolved += 1;
                // Strategy indices are 1-based; 0 is counted as resolved only
                if let Some(slot) = strategy_index.checked_sub(1) {
                    if self.wins_by_strategy.len() <= slot {
                        self.wins_by_strategy.resize(slot + 1, 0);
                    }
                    self.wins_by_strategy[slot] += 1;
                }
            }
            ResolutionResult::Failure { .. } => self.failed += 1,
        }
    }

    /// Resolution rate as a percentage
    pub fn resolve_rate(&self) -> f64 {
        if self.total_tracks == 0 {
            0.0
        } else {
            100.0 * self.resolved as f64 / self.total_tracks as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_query_lenient_duration() {
        let tracks: Vec<TrackQuery> = serde_json::from_str(
            r#"[
                {"track_name": "A", "artist": "X", "duration_ms": 180000},
                {"track_name": "B", "artist": "X", "duration_ms": "200000"},
                {"track_name": "C", "artist": "X", "duration_ms": "n/a"},
                {"track_name": "D", "artist": "X"},
                {"track_name": "E", "artist": "X", "duration_ms": null}
            ]"#,
        )
        .unwrap();
        let durations: Vec<Option<u64>> = tracks.iter().map(|t| t.target_duration_ms).collect();
        assert_eq!(durations, vec![Some(180000), Some(200000), None, None, None]);
    }

    #[test]
    fn test_has_web_url() {
        assert!(SearchCandidate::new("https://a", 1.0).has_web_url());
        assert!(SearchCandidate::new("http://a", 1.0).has_web_url());
        assert!(!SearchCandidate::new("ftp://a", 1.0).has_web_url());
        assert!(!SearchCandidate::new("httpx", 1.0).has_web_url());
        assert!(!SearchCandidate::new("", 1.0).has_web_url());
    }

    #[test]
    fn test_describe() {
        let ok = ResolutionResult::Success {
            url: "https://v".to_string(),
            strategy_index: 3,
            query_text: "Song A".to_string(),
        };
        assert_eq!(ok.describe(6), "strategy 3/6: \"Song A\"");
        let failed = ResolutionResult::Failure {
            reason: "no results after 6 strategies".to_string(),
        };
        assert_eq!(failed.describe(6), "no results after 6 strategies");
        assert_eq!(failed.to_string(), "no results after 6 strategies");
    }

    #[test]
    fn test_stats_record() {
        let mut stats = ResolveStats::default();
        stats.record(&Resolution {
            result: ResolutionResult::Success {
                url: "https://v".to_string(),
                strategy_index: 2,
                query_text: "q".to_string(),
            },
            strategies_attempted: 2,
            strategy_count: 6,
        });
        stats.record(&Resolution {
            result: ResolutionResult::Failure {
                reason: "no results after 6 strategies".to_string(),
            },
            strategies_attempted: 6,
            strategy_count: 6,
        });
        assert_eq!(stats.total_tracks, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.wins_by_strategy, vec![0, 1]);
        assert_eq!(stats.backend_queries, 8);
        assert!((stats.resolve_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_ignore_zero_strategy_index() {
        let mut stats = ResolveStats::default();
        stats.record(&Resolution {
            result: ResolutionResult::Success {
                url: "https://v".to_string(),
                strategy_index: 0,
                query_text: "q".to_string(),
            },
            strategies_attempted: 1,
            strategy_count: 1,
        });
        assert_eq!(stats.resolved, 1);
        assert!(stats.wins_by_strategy.is_empty());
    }

    #[test]
    fn test_batch_report_rows() {
        let resolutions = vec![
            (
                TrackQuery::new("Song", "A;B", Some(180_000)),
                Resolution {
                    result: ResolutionResult::Success {
                        url: "https://v/song".to_string(),
                        strategy_index: 3,
                        query_text: "Song A".to_string(),
                    },
                    strategies_attempted: 3,
                    strategy_count: 6,
                },
            ),
            (
                TrackQuery::new("Lost", "C", None),
                Resolution {
                    result: ResolutionResult::Failure {
                        reason: "no results after 3 strategies".to_string(),
                    },
                    strategies_attempted: 3,
                    strategy_count: 3,
                },
            ),
        ];
        let (report, stats) = BatchReport::assemble(resolutions);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "resolved": [{
                    "track_name": "Song",
                    "artist": "A;B",
                    "duration_ms": 180000,
                    "url": "https://v/song",
                    "strategy": "strategy 3/6: \"Song A\""
                }],
                "failures": [{
                    "track_name": "Lost",
                    "artist": "C",
                    "url": "",
                    "error": "no results after 3 strategies"
                }]
            })
        );

        assert_eq!(stats.total_tracks, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.wins_by_strategy, vec![0, 0, 1]);
        assert_eq!(stats.backend_queries, 6);
    }

    #[test]
    fn test_empty_batch_report() {
        let (report, stats) = BatchReport::assemble(Vec::new());
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"resolved": [], "failures": []})
        );
        assert_eq!(stats.total_tracks, 0);
        assert_eq!(stats.resolve_rate(), 0.0);
    }
}
