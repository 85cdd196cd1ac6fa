//! `[[sections]]` and `[[redirects]]` configuration.
//!
//! # Example
//! ```toml
//! [[sections]]
//! name = "Development Log"
//! directory = "devlog"
//! sort_by = "ctime"
//! article_template = "devlog-article.html"
//! initial_header_level = 4
//!
//! [[redirects]]
//! from = "posts/index.html"
//! to = "blog/index.html"
//! ```

use super::defaults;
use crate::compiler::{
    markup::MarkupOptions,
    section::{Section, SortKey},
};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One `[[sections]]` entry.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    /// Display name, unique across sections.
    pub name: String,

    /// Index page title; defaults to `name`.
    #[serde(default)]
    pub title: Option<String>,

    /// Source directory, relative to `[paths] content`.
    pub directory: PathBuf,

    /// Output directory, relative to the output root; defaults to `directory`.
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub sort_by: SortKey,

    #[serde(default = "defaults::section::index_template")]
    #[educe(Default = defaults::section::index_template())]
    pub index_template: String,

    #[serde(default = "defaults::section::article_template")]
    #[educe(Default = defaults::section::article_template())]
    pub article_template: String,

    /// HTML level of a top-level markdown heading.
    #[serde(default = "defaults::section::initial_header_level")]
    #[educe(Default = defaults::section::initial_header_level())]
    pub initial_header_level: u8,

    /// Abort the build on an entry with bad metadata instead of skipping it.
    #[serde(default)]
    pub strict: bool,
}

impl SectionConfig {
    /// Resolve into a [`Section`] whose directory lives under `content`.
    pub fn to_section(&self, content: &Path) -> Section {
        Section {
            name: self.name.clone(),
            title: self.title.clone().unwrap_or_else(|| self.name.clone()),
            directory: content.join(&self.directory),
            output_path: self.output.clone().unwrap_or_else(|| self.directory.clone()),
            sort_by: self.sort_by,
            index_template: self.index_template.clone(),
            article_template: self.article_template.clone(),
            markup: MarkupOptions {
                initial_header_level: self.initial_header_level,
            },
            strict: self.strict,
        }
    }
}

/// One `[[redirects]]` entry; both paths relative to the output root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectConfig {
    /// Legacy location that receives the redirect page.
    pub from: PathBuf,
    /// Existing page the redirect points to.
    pub to: PathBuf,
}
