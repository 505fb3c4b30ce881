//! Search backends.
//!
//! The resolver only needs `search(query, limit)`. Any backend error is
//! treated by the resolver exactly like an empty result list, so backends
//! report failures as `BackendError` instead of hiding them, and the
//! resolver decides what to do with them.

use log::{debug, error};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::ResolverConfig;
use crate::models::SearchCandidate;

/// How often a running search process is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// yt-dlp output template: one "<url> <duration-seconds>" line per hit.
const PRINT_TEMPLATE: &str = "%(webpage_url)s %(duration)s";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to start {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("search timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("search exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },

    #[error("search I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Keyword search over a video platform.
pub trait SearchBackend: Send + Sync {
    /// Return up to `limit` hits for `query`, in the platform's relevance order.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>, BackendError>;
}

impl<T: SearchBackend + ?Sized> SearchBackend for Box<T> {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>, BackendError> {
        (**self).search(query, limit)
    }
}

impl<T: SearchBackend + ?Sized> SearchBackend for &T {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>, BackendError> {
        (**self).search(query, limit)
    }
}

// ============================================================================
// yt-dlp
// ============================================================================

/// Searches YouTube by running `yt-dlp ytsearchN:<query>` without downloading.
#[derive(Debug, Clone)]
pub struct YtDlpBackend {
    executable: PathBuf,
    timeout: Duration,
}

impl YtDlpBackend {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.ytdlp_path.clone(), config.search_timeout())
    }

    fn command(&self, query: &str, limit: usize) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args([
            "--print",
            PRINT_TEMPLATE,
            "--no-download",
            &format!("ytsearch{}:{}", limit, query),
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
        cmd
    }
}

impl SearchBackend for YtDlpBackend {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchCandidate>, BackendError> {
        debug!("yt-dlp search (limit {}): {}", limit, query);
        let child = self
            .command(query, limit)
            .spawn()
            .map_err(|source| BackendError::Spawn {
                path: self.executable.clone(),
                source,
            })?;

        let output = wait_with_timeout(child, self.timeout)?;
        if !output.status.success() {
            return Err(BackendError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_search_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Wait for a child process with a timeout. Kills the child on timeout.
///
/// stdout and stderr are drained on reader threads while polling, so a child
/// that writes more than a pipe buffer still runs to completion.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<Output, BackendError> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if Instant::now() >= deadline {
                    error!("yt-dlp search timed out after {}s, killing", timeout.as_secs());
                    let _ = child.kill();
                    let _ = child.wait(); // Reap the zombie
                    // Readers stay detached: a grandchild can keep the pipes open
                    return Err(BackendError::Timeout(timeout));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    };

    Ok(Output {
        status,
        stdout: collect(stdout)?,
        stderr: collect(stderr)?,
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(reader: Option<JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<Vec<u8>> {
    match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "pipe reader panicked"))?,
        None => Ok(Vec::new()),
    }
}

/// Parse `--print "%(webpage_url)s %(duration)s"` output.
///
/// Each line is split on its last whitespace run. A missing, unparseable
/// ("NA"), negative or non-finite duration becomes 0.0. Lines whose URL does
/// not start with "http" are skipped.
pub fn parse_search_output(stdout: &str) -> Vec<SearchCandidate> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (url, duration_s) = match line.rsplit_once(char::is_whitespace) {
                Some((url, dur)) => (url.trim_end(), parse_duration(dur)),
                None => (line, 0.0),
            };
            url.starts_with("http")
                .then(|| SearchCandidate::new(url, duration_s))
        })
        .collect()
}

fn parse_duration(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(d) if d.is_finite() && d >= 0.0 => d,
        _ => 0.0,
    }
}
