//! Command-line interface definitions.
//!
//! Without a subcommand the site is built (and optionally watched). The
//! scaffolding subcommands create new content files from templates.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// leafpress static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Output directory
    #[arg(default_value = "html")]
    pub outdir: PathBuf,

    /// Canonical base URL of the site (overrides `url` in the config)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Write unminified HTML
    #[arg(short = 'm', long)]
    pub skip_minify: bool,

    /// Config file name, relative to the project root
    #[arg(short = 'C', long, default_value = "site.toml")]
    pub config: PathBuf,

    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Rebuild whenever a content file changes
    #[arg(short, long)]
    pub watch: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a new blog article
    NewArticle {
        /// Article id, used in the file name and URL
        id: String,

        /// Article title
        title: String,

        /// Create the article in the drafts directory, without a number prefix
        #[arg(long)]
        draft: bool,
    },

    /// Create the development log entry for a week
    NewDevlogEntry {
        /// Any day of the week (YYYY-MM-DD), today by default
        date: Option<NaiveDate>,
    },
}
