//! leafpress - a static site generator for Markdown blogs.

mod build;
mod cli;
mod compiler;
mod config;
mod scaffold;
mod utils;
mod watch;

use anyhow::Result;
use build::{build_site, load_templates};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use watch::watch_for_changes_blocking;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Some(command) => new_content(command, &config),
        None => {
            config.validate()?;
            build_site(&config)?;
            if cli.watch {
                watch_for_changes_blocking(&config)?;
            }
            Ok(())
        }
    }
}

/// Create new content from the scaffolding templates.
fn new_content(command: &Commands, config: &SiteConfig) -> Result<()> {
    let templates = load_templates(&config.paths.templates)?;
    let content = &config.paths.content;
    let now = Local::now().naive_local();

    match command {
        Commands::NewArticle { id, title, draft } => {
            scaffold::new_article(content, &templates, id, title, *draft, now)?;
        }
        Commands::NewDevlogEntry { date } => {
            let date = date.unwrap_or_else(|| now.date());
            scaffold::new_devlog_entry(content, &templates, date, now)?;
        }
    }
    Ok(())
}
