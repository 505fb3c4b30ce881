//! Print the search strategies for a track without running any search.
//! Usage: show-queries --title "Song (feat. X)" --artist "A;B"

use anyhow::Result;
use clap::Parser;

use track_resolver::normalize::{
    all_artists_flat, primary_artist, strip_all_parenthetical, strip_feature_credit,
};
use track_resolver::queries::build_strategies;

#[derive(Parser)]
#[command(name = "show-queries")]
#[command(about = "Show the ordered search queries a track would be resolved with")]
struct Args {
    #[arg(long)]
    title: String,

    /// Artist(s), ';'-separated
    #[arg(long)]
    artist: String,

    /// Print strategies as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let strategies = build_strategies(&args.title, &args.artist);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&strategies)?);
        return Ok(());
    }

    println!("primary artist:   {}", primary_artist(&args.artist));
    println!("all artists:      {}", all_artists_flat(&args.artist));
    println!("title w/o feat:   {}", strip_feature_credit(&args.title));
    println!("title w/o parens: {}", strip_all_parenthetical(&args.title));
    println!();
    for strategy in &strategies {
        println!("{:>2}/{}  {}", strategy.index, strategies.len(), strategy.query_text);
    }
    Ok(())
}
