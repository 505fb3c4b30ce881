//! Track resolution: query fallback chain + candidate ranking.
//!
//! For each track the strategy list is built once and tried in order. Each
//! strategy costs exactly one backend search; the first strategy whose
//! results contain an acceptable candidate wins and no later strategy is
//! consulted. Backend errors count as an empty result for that strategy.
//! Nothing is retried and nothing is kept between calls.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::time::Duration;

use crate::backend::SearchBackend;
use crate::config::{ResolverConfig, DEFAULT_CANDIDATES_PER_QUERY};
use crate::models::{Resolution, ResolutionResult, Strategy, TrackQuery};
use crate::queries::build_strategies;
use crate::scoring::pick_best;

/// Progress of a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    NotStarted,
    /// Searching with the strategy of this 1-based index
    TryingStrategy(usize),
    Succeeded,
    Failed,
}

impl fmt::Display for ResolveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveState::NotStarted => f.write_str("not started"),
            ResolveState::TryingStrategy(i) => write!(f, "trying strategy {}", i),
            ResolveState::Succeeded => f.write_str("succeeded"),
            ResolveState::Failed => f.write_str("failed"),
        }
    }
}

/// Reason reported once every strategy came back empty.
pub fn exhausted_reason(strategies_attempted: usize) -> String {
    format!("no results after {} strategies", strategies_attempted)
}

pub struct Resolver<B> {
    backend: B,
    candidates_per_query: usize,
}

impl<B: SearchBackend> Resolver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            candidates_per_query: DEFAULT_CANDIDATES_PER_QUERY,
        }
    }

    pub fn with_config(backend: B, config: &ResolverConfig) -> Self {
        Self {
            backend,
            candidates_per_query: config.candidates_per_query.max(1),
        }
    }

    pub fn candidates_per_query(&self) -> usize {
        self.candidates_per_query
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resolve a track with the configured number of candidates per query.
    pub fn resolve_track(&self, track: &TrackQuery) -> Resolution {
        self.resolve_detailed(
            &track.title,
            &track.artist_spec,
            track.target_duration_ms,
            self.candidates_per_query,
        )
    }

    /// Resolve (title, artist, duration) to a single URL.
    /// `candidates_per_query` below 1 is treated as 1.
    pub fn resolve(
        &self,
        title: &str,
        artist_spec: &str,
        target_duration_ms: Option<u64>,
        candidates_per_query: usize,
    ) -> ResolutionResult {
        self.resolve_detailed(title, artist_spec, target_duration_ms, candidates_per_query)
            .result
    }

    /// Like [`Resolver::resolve`], also reporting how many strategies ran.
    pub fn resolve_detailed(
        &self,
        title: &str,
        artist_spec: &str,
        target_duration_ms: Option<u64>,
        candidates_per_query: usize,
    ) -> Resolution {
        let limit = candidates_per_query.max(1);
        let strategies = build_strategies(title, artist_spec);
        let strategy_count = strategies.len();

        let mut state = ResolveState::NotStarted;
        let mut attempted = 0;
        let mut winner: Option<(String, &Strategy)> = None;

        for strategy in strategies.iter() {
            state = ResolveState::TryingStrategy(strategy.index);
            attempted += 1;
            debug!(
                "{} - {}: {} of {}: \"{}\"",
                artist_spec, title, state, strategy_count, strategy.query_text
            );

            let candidates = match self.backend.search(&strategy.query_text, limit) {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("search failed for \"{}\": {}", strategy.query_text, e);
                    Vec::new()
                }
            };

            match pick_best(&candidates, target_duration_ms) {
                Some(best) => {
                    winner = Some((best.url.clone(), strategy));
                    state = ResolveState::Succeeded;
                    break;
                }
                None => debug!(
                    "no acceptable candidate among {} result(s) for strategy {}",
                    candidates.len(),
                    strategy.index
                ),
            }
        }

        if state != ResolveState::Succeeded {
            state = ResolveState::Failed;
        }

        let result = match (state, winner) {
            (ResolveState::Succeeded, Some((url, strategy))) => ResolutionResult::Success {
                url,
                strategy_index: strategy.index,
                query_text: strategy.query_text.clone(),
            },
            _ => ResolutionResult::Failure {
                reason: exhausted_reason(attempted),
            },
        };

        info!("{} - {}: {} ({})", artist_spec, title, state, result.describe(strategy_count));

        Resolution {
            result,
            strategies_attempted: attempted,
            strategy_count,
        }
    }
}

impl<B: SearchBackend> Resolver<B> {
    /// Resolve a batch on the current rayon pool, in input order.
    ///
    /// Sleeps `delay` after every track except the last one; with several
    /// workers each one throttles itself. `on_resolved` runs once per track.
    pub fn resolve_all<F>(
        &self,
        tracks: Vec<TrackQuery>,
        delay: Duration,
        on_resolved: F,
    ) -> Vec<(TrackQuery, Resolution)>
    where
        F: Fn(&Resolution) + Sync + Send,
    {
        let total = tracks.len();
        tracks
            .into_par_iter()
            .enumerate()
            .map(|(i, track)| {
                let resolution = self.resolve_track(&track);
                on_resolved(&resolution);
                if throttle_after(i, total) && !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                (track, resolution)
            })
            .collect()
    }
}

/// Throttle between tracks, not after the last one.
fn throttle_after(index: usize, total: usize) -> bool {
    index + 1 < total
}

/// One-shot resolution against `backend` without building a `Resolver`.
pub fn resolve<B: SearchBackend>(
    backend: &B,
    title: &str,
    artist_spec: &str,
    target_duration_ms: Option<u64>,
    candidates_per_query: usize,
) -> ResolutionResult {
    Resolver::new(backend).resolve(title, artist_spec, target_duration_ms, candidates_per_query)
}
