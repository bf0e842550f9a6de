use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedimage")]
#[command(about = "Find a featured image for every item of an RSS feed")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an image for each item of a feed
    Resolve {
        /// Feed URL (RSS or Atom)
        feed_url: String,

        /// Image used for every item before any network lookup
        #[arg(long)]
        default_image: Option<PathBuf>,

        /// Only resolve the first N items
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of items resolved in parallel (overrides FEEDIMAGE_WORKERS)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Write resolved images into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show host policies or the profile a host resolves to
    Hosts {
        /// Host name to look up
        #[arg(long)]
        lookup: Option<String>,
    },

    /// Print the stock photo query derived from a title
    CleanTitle {
        /// Article title
        title: String,
    },
}
