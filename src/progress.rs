//! Progress bar and logging utilities for batch resolution.
//!
//! In log-only mode the bar is hidden and periodic `[phase] n/total` lines
//! go to stderr instead, which keeps output readable under `tail -f`.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})";

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Format a track length given in milliseconds as m:ss.
pub fn format_track_length(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Progress bar over the tracks of a batch. Hidden in log-only mode.
pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb
}

/// Log progress every `interval` tracks (and on the last one) in log-only mode.
pub fn log_progress(phase: &str, current: u64, total: u64, interval: u64) {
    if is_log_only() && should_log(current, total, interval) {
        let pct = 100.0 * current as f64 / total as f64;
        eprintln!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
    }
}

fn should_log(current: u64, total: u64, interval: u64) -> bool {
    total > 0 && (current == total || (interval > 0 && current % interval == 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_format_track_length() {
        assert_eq!(format_track_length(200_000), "3:20");
        assert_eq!(format_track_length(59_999), "0:59");
        assert_eq!(format_track_length(0), "0:00");
    }

    #[test]
    fn test_should_log() {
        assert!(should_log(10, 25, 10));
        assert!(should_log(25, 25, 10));
        assert!(!should_log(11, 25, 10));
        assert!(!should_log(0, 0, 10));
        // interval 0 only logs the last item
        assert!(!should_log(5, 25, 0));
        assert!(should_log(25, 25, 0));
    }
}
