//! CLI definitions for chatcast.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// chatcast CLI.
#[derive(Parser)]
#[command(name = "chatcast")]
#[command(about = "Broadcast one query to several AI chat sites side by side")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Log to the console as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Send a query to every enabled site
    Send {
        /// The query text
        query: String,

        /// Prompt template to wrap the query in (name or id)
        #[arg(short, long)]
        template: Option<String>,

        /// Return right after sending, without waiting for conversation URLs
        #[arg(long)]
        no_capture: bool,
    },

    /// Open or focus the batch page
    Open {
        /// Query to send once the sites have loaded
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Export conversations as Markdown
    Share {
        /// Site to export
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        site: Option<String>,

        /// Export every enabled site
        #[arg(long)]
        all: bool,

        /// Keep the export in the export history, optionally under a name
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        save: Option<String>,

        /// Write the Markdown to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Paste files into a site's composer
    Upload {
        /// Target site
        site: String,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Move the batch page into a window of its own
    Detach,

    /// Query history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Saved exports
    Exports {
        #[command(subcommand)]
        action: ExportAction,
    },

    /// User settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List the site catalog
    Sites {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Extract the conversation from a saved page
    ExtractFile {
        /// Saved HTML page
        html: PathBuf,

        /// Site whose extractor to use
        #[arg(short, long)]
        site: String,

        /// Print Markdown instead of JSON
        #[arg(long)]
        markdown: bool,
    },

    /// Convert an HTML fragment to Markdown
    Markdown {
        /// HTML file
        html: PathBuf,
    },

    /// Run a site's search steps against a saved page and print what they did
    DryRun {
        /// Saved HTML page
        html: PathBuf,

        /// Site whose steps to run
        #[arg(short, long)]
        site: String,

        /// Query to type
        #[arg(short, long)]
        query: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum HistoryAction {
    /// List recent queries
    List {
        /// Maximum entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Search queries (case-insensitive substring)
    Search {
        /// Text to look for
        text: String,
    },

    /// Show one entry with its conversation URLs
    Show {
        /// Entry id
        id: String,
    },

    /// Delete one entry
    Delete {
        /// Entry id
        id: String,
    },

    /// Delete every entry
    Clear,

    /// Reopen the batch page on an entry's conversations
    Restore {
        /// Entry id
        id: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum ExportAction {
    /// List saved exports
    List,

    /// Print a saved export
    Show {
        /// Export id
        id: String,
    },

    /// Delete one export
    Delete {
        /// Export id
        id: String,
    },

    /// Delete every export
    Clear,
}

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Print the settings (or one key) as JSON
    Get {
        /// Top-level key, e.g. enabledSites
        key: Option<String>,
    },

    /// Update settings from key=value pairs; values are JSON or plain strings
    Set {
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Restore the default settings
    Reset,
}
