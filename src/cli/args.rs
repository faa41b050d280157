use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// seenit - Track the series you watch, episode by episode
#[derive(Parser)]
#[command(name = "seenit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalogue for series
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,
    },

    /// Start tracking a series and make it the active one
    #[command(alias = "t")]
    Track {
        /// Series id (see `seenit search`)
        id: u64,
    },

    /// Re-fetch a tracked series, keeping watched episodes
    Refresh {
        id: u64,
    },

    /// Stop tracking a series
    #[command(alias = "rm")]
    Remove {
        id: u64,
    },

    /// Make a tracked series the active one
    Select {
        id: u64,
    },

    /// List tracked series
    #[command(alias = "ls")]
    List {
        /// Only series whose name or genre contains this text
        #[arg(long, short)]
        filter: Option<String>,

        /// Only favorite series
        #[arg(long)]
        favorites: bool,
    },

    /// Show seasons and episodes of a series (the active one by default)
    Show {
        id: Option<u64>,
    },

    /// Mark an episode watched
    #[command(alias = "w")]
    Watch {
        series: u64,
        season: u64,
        /// Episode number within the season
        episode: u32,

        /// Mark the episode unwatched instead
        #[arg(long)]
        unwatch: bool,
    },

    /// Mark a whole season watched or unwatched
    Season(SeasonArgs),

    /// Toggle a series as favorite
    #[command(alias = "fav")]
    Favorite {
        id: u64,
    },

    /// Export tracking data to a backup file
    Export {
        /// Target directory (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Import tracking data from a backup file
    Import {
        /// Backup file; prompts when omitted
        file: Option<PathBuf>,
    },

    /// Activate or check a license
    License {
        #[command(subcommand)]
        action: LicenseCommand,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set a config value (format: key=value)
        #[arg(long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Args)]
pub struct SeasonArgs {
    pub series: u64,
    pub season: u64,

    /// Mark every episode watched
    #[arg(long, conflicts_with = "reset", required_unless_present = "reset")]
    pub complete: bool,

    /// Mark every episode unwatched
    #[arg(long)]
    pub reset: bool,
}

#[derive(Subcommand)]
pub enum LicenseCommand {
    /// Activate a license key
    Activate { key: String },

    /// Check a license key
    Check { key: String },
}
