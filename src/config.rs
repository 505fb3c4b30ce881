//! Resolver configuration.
//!
//! Values come from an optional TOML file; any field left out of the file
//! keeps its default, and CLI flags override both.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CANDIDATES_PER_QUERY: usize = 3;

/// Long enough for a cold yt-dlp start plus one search page.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Results requested from the backend per query (at least 1)
    pub candidates_per_query: usize,
    /// Per-search timeout enforced by the backend (at least 1)
    pub search_timeout_secs: u64,
    /// yt-dlp executable, looked up on PATH unless absolute
    pub ytdlp_path: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            candidates_per_query: DEFAULT_CANDIDATES_PER_QUERY,
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            ytdlp_path: PathBuf::from(DEFAULT_YTDLP_PATH),
        }
    }
}

impl ResolverConfig {
    /// Load from a TOML file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: ResolverConfig = toml::from_str(contents)?;
        Ok(config.normalized())
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    /// Clamp values the resolver cannot use.
    pub fn normalized(mut self) -> Self {
        self.candidates_per_query = self.candidates_per_query.max(1);
        self.search_timeout_secs = self.search_timeout_secs.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.candidates_per_query, 3);
        assert_eq!(config.search_timeout(), Duration::from_secs(60));
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ResolverConfig::from_toml("candidates_per_query = 5\n").unwrap();
        assert_eq!(config.candidates_per_query, 5);
        assert_eq!(config.search_timeout_secs, DEFAULT_SEARCH_TIMEOUT_SECS);
    }

    #[test]
    fn test_zero_candidates_clamped() {
        let config = ResolverConfig::from_toml("candidates_per_query = 0").unwrap();
        assert_eq!(config.candidates_per_query, 1);
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let config = ResolverConfig::from_toml("search_timeout_secs = 0").unwrap();
        assert_eq!(config.search_timeout(), Duration::from_secs(1));

        let overridden = ResolverConfig {
            search_timeout_secs: 0,
            ..ResolverConfig::default()
        }
        .normalized();
        assert_eq!(overridden.search_timeout_secs, 1);
    }

    #[test]
    fn test_full_toml() {
        let config = ResolverConfig::from_toml(
            "candidates_per_query = 4\nsearch_timeout_secs = 15\nytdlp_path = \"/opt/bin/yt-dlp\"\n",
        )
        .unwrap();
        assert_eq!(config.search_timeout(), Duration::from_secs(15));
        assert_eq!(config.ytdlp_path, PathBuf::from("/opt/bin/yt-dlp"));
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(ResolverConfig::from_toml("candidates_per_query = \"many\"").is_err());
    }
}
