use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use track_resolver::backend::YtDlpBackend;
use track_resolver::config::ResolverConfig;
use track_resolver::models::{BatchReport, TrackQuery};
use track_resolver::progress::{
    create_progress_bar, format_duration, format_track_length, log_progress, set_log_only,
};
use track_resolver::resolver::Resolver;

#[derive(Parser)]
#[command(name = "track-resolver")]
#[command(about = "Resolve tracks (title, artist, duration) to a single YouTube URL")]
struct Args {
    /// Track title (single-track mode)
    #[arg(long, required_unless_present = "input", conflicts_with = "input")]
    title: Option<String>,

    /// Artist(s), ';'-separated (single-track mode)
    #[arg(long, required_unless_present = "input", conflicts_with = "input")]
    artist: Option<String>,

    /// Expected track length in milliseconds
    #[arg(long, conflicts_with = "input")]
    duration_ms: Option<u64>,

    /// JSON array of {track_name, artist, duration_ms} to resolve (batch mode)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the batch report here instead of stdout
    #[arg(long, requires = "input")]
    output: Option<PathBuf>,

    /// TOML file with resolver settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search results requested per query
    #[arg(long)]
    candidates: Option<usize>,

    /// Per-search timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to the yt-dlp executable
    #[arg(long)]
    ytdlp: Option<PathBuf>,

    /// Seconds to wait between tracks in batch mode
    #[arg(long, default_value = "2.0")]
    delay: f64,

    /// Tracks resolved in parallel in batch mode
    #[arg(long, default_value = "1")]
    workers: usize,

    /// Hide the progress bar and print periodic progress lines instead
    #[arg(long)]
    log_only: bool,

    /// Log every strategy attempt
    #[arg(short, long)]
    verbose: bool,
}

/// Progress lines every this many tracks in log-only mode
const LOG_INTERVAL: u64 = 25;

fn init_logging(verbose: bool) {
    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
    );
    clog.init();
}

fn build_config(args: &Args) -> Result<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig::default(),
    };
    if let Some(candidates) = args.candidates {
        config.candidates_per_query = candidates;
    }
    if let Some(timeout) = args.timeout {
        config.search_timeout_secs = timeout;
    }
    if let Some(ref ytdlp) = args.ytdlp {
        config.ytdlp_path = ytdlp.clone();
    }
    Ok(config.normalized())
}

fn load_tracks(path: &Path) -> Result<Vec<TrackQuery>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read track list {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse track list {}", path.display()))
}

fn run_single(resolver: &Resolver<YtDlpBackend>, track: TrackQuery) -> Result<bool> {
    match track.target_duration_ms {
        Some(ms) => info!(
            "Resolving: {} - {} ({})",
            track.artist_spec,
            track.title,
            format_track_length(ms)
        ),
        None => info!("Resolving: {} - {}", track.artist_spec, track.title),
    }

    let resolution = resolver.resolve_track(&track);
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(resolution.result.is_success())
}

fn run_batch(resolver: &Resolver<YtDlpBackend>, args: &Args, input: &Path) -> Result<()> {
    let start = Instant::now();
    let tracks = load_tracks(input)?;
    let total = tracks.len();
    info!("Loaded {} tracks from {}", total, input.display());

    let delay = if args.delay.is_finite() {
        Duration::from_secs_f64(args.delay.max(0.0))
    } else {
        Duration::ZERO
    };
    let pb = create_progress_bar(total as u64, "Resolving");

    let resolutions = resolver.resolve_all(tracks, delay, |_| {
        pb.inc(1);
        log_progress("resolve", pb.position(), total as u64, LOG_INTERVAL);
    });
    let (report, mut stats) = BatchReport::assemble(resolutions);

    pb.finish_with_message(format!("Resolved {}/{} tracks", stats.resolved, total));
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!("Wrote report to {}", path.display());
        }
        None => println!("{}", json),
    }

    stats.log_phase("resolve");
    info!(
        "Resolved {}/{} ({:.1}%) in {}",
        stats.resolved,
        stats.total_tracks,
        stats.resolve_rate(),
        format_duration(start.elapsed())
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    set_log_only(args.log_only);

    if args.workers == 0 {
        bail!("--workers must be at least 1");
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers)
        .build_global()
        .context("Failed to set thread pool size")?;

    let config = build_config(&args)?;
    let resolver = Resolver::with_config(YtDlpBackend::from_config(&config), &config);

    if let Some(ref input) = args.input {
        return run_batch(&resolver, &args, input);
    }

    let (Some(title), Some(artist)) = (args.title.as_deref(), args.artist.as_deref()) else {
        bail!("--title and --artist are required without --input");
    };
    let track = TrackQuery::new(title, artist, args.duration_ms);
    if !run_single(&resolver, track)? {
        std::process::exit(1);
    }
    Ok(())
}
