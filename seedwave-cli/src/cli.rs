use clap::{Args as ClapArgs, Parser, Subcommand};
use seedwave_core::{Language, ViewMode};
use std::path::PathBuf;

/// Seedwave - browse and play a seed-generated music catalogue
#[derive(Parser, Debug)]
#[command(name = "seedwave", version, about)]
pub struct Args {
    /// Catalogue service URL (overrides the config file and SEEDWAVE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a fresh random seed
    Seed,

    /// Print catalogue rows for a seed
    List(ListArgs),

    /// Interactive catalogue browser
    Browse(BrowseArgs),

    /// Generate one song and follow its lyrics as it plays
    Song(SongArgs),

    /// Generate one song and save its audio
    Download(DownloadArgs),
}

/// Options shared by the catalogue commands.
#[derive(ClapArgs, Debug, Clone)]
pub struct FilterArgs {
    /// Catalogue seed (random when omitted)
    #[arg(long, short = 's')]
    pub seed: Option<String>,

    /// Language of generated titles and lyrics: en or ru
    #[arg(long, short = 'l', value_parser = parse_language)]
    pub language: Option<Language>,

    /// Only songs with at least this many likes (0 to 10, 0 = any)
    #[arg(long, value_parser = parse_likes)]
    pub likes: Option<f64>,
}

#[derive(ClapArgs, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// View mode: table (one page) or scroll (accumulated pages)
    #[arg(long, short = 'm', value_parser = parse_view_mode)]
    pub mode: Option<ViewMode>,

    /// Table mode: page number to show
    #[arg(long, short = 'p', default_value_t = 1)]
    pub page: u32,

    /// Scroll mode: how many pages to load
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Override the page size for the chosen mode
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(ClapArgs, Debug)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Start in this view mode instead of the saved one
    #[arg(long, short = 'm', value_parser = parse_view_mode)]
    pub mode: Option<ViewMode>,
}

/// Which song to open: a row of a catalogue, or a song seed on its own.
#[derive(ClapArgs, Debug, Clone)]
pub struct SongTarget {
    /// Seed of the song itself (a row's seed, not the catalogue seed)
    #[arg(required_unless_present = "row", conflicts_with = "row")]
    pub seed: Option<String>,

    /// Row number in the catalogue's table view; keeps the song's real names
    #[arg(long, short = 'r', requires = "catalogue")]
    pub row: Option<u64>,

    /// Catalogue seed the row belongs to
    #[arg(long, short = 'c')]
    pub catalogue: Option<String>,

    /// Likes filter of that catalogue (0 to 10, 0 = any)
    #[arg(long, value_parser = parse_likes, requires = "row")]
    pub likes: Option<f64>,

    #[arg(long, short = 'l', value_parser = parse_language)]
    pub language: Option<Language>,
}

#[derive(ClapArgs, Debug)]
pub struct SongArgs {
    #[command(flatten)]
    pub target: SongTarget,

    /// Playback speed multiplier for the simulated clock
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Track length in seconds (estimated from the lyrics when omitted)
    #[arg(long)]
    pub duration: Option<f64>,
}

#[derive(ClapArgs, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub target: SongTarget,

    /// Directory to save into
    #[arg(long, short = 'o', default_value = ".")]
    pub dir: PathBuf,

    /// Save the instrumental even when a final mix exists
    #[arg(long)]
    pub instrumental: bool,
}

fn parse_language(value: &str) -> Result<Language, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn parse_view_mode(value: &str) -> Result<ViewMode, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn parse_likes(value: &str) -> Result<f64, String> {
    let likes: f64 = value.parse().map_err(|_| format!("not a number: {value}"))?;
    if (0.0..=10.0).contains(&likes) {
        Ok(likes)
    } else {
        Err(format!("likes must be between 0 and 10, got {likes}"))
    }
}
