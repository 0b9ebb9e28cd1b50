use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use gameshelf::library::{GameFilter, SortKey};

#[derive(Parser)]
#[command(name = "gameshelf")]
#[command(author, version, about = "Personal game library manager")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rescan source directories and reconcile the library, then attach
    /// cached covers and fetch missing metadata
    Sync,

    /// Rescan source directories and reconcile the library
    RefreshSources,

    /// Attach already-cached cover images to entries missing one
    RefreshImages,

    /// Fetch provider metadata for entries that have none yet
    RefreshMetadata,

    /// List library entries
    List {
        /// Which entries to show
        #[arg(long, value_enum, default_value = "installed")]
        filter: FilterArg,

        /// Sort key
        #[arg(long, value_enum, default_value = "title")]
        sort: SortArg,

        /// Reverse the sort order
        #[arg(long)]
        descending: bool,

        /// Only titles containing this text (case-insensitive)
        #[arg(long)]
        title: Option<String>,
    },

    /// Record a play of a game right now
    MarkPlayed {
        /// Exact library title
        title: String,
    },

    /// Mark a game as completed
    MarkCompleted {
        /// Exact library title
        title: String,
    },

    /// Rename a library entry, keeping its history
    Rename {
        /// Exact library title
        title: String,

        /// New title
        new_title: String,
    },

    /// Delete an entry and its history from the library
    Remove {
        /// Exact library title
        title: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    Installed,
    Removed,
    Completed,
    All,
}

impl From<FilterArg> for GameFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Installed => GameFilter::Installed,
            FilterArg::Removed => GameFilter::Removed,
            FilterArg::Completed => GameFilter::Completed,
            FilterArg::All => GameFilter::All,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    Title,
    Added,
    Completed,
    Played,
    Rating,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Title => SortKey::Title,
            SortArg::Added => SortKey::Added,
            SortArg::Completed => SortKey::Completed,
            SortArg::Played => SortKey::Played,
            SortArg::Rating => SortKey::Rating,
        }
    }
}
