//! `[build]` section configuration.
//!
//! Minification and the two external tools: the Sass stylesheet compiler and
//! the syntax-highlighter theme export.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in site.toml.
///
/// # Example
/// ```toml
/// [build]
/// minify = true
///
/// [build.sass]
/// command = ["sass"]
/// input = "scss/style.scss"
///
/// [build.highlight]
/// style = "monokai"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Minify HTML output (`--skip-minify` turns it off).
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    #[serde(default)]
    pub sass: SassConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,
}

/// `[build.sass]` - compiles `input` into `static/css/style.css`.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct SassConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Command and leading arguments.
    #[serde(default = "defaults::build::sass::command")]
    #[educe(Default = defaults::build::sass::command())]
    pub command: Vec<String>,

    /// Entry stylesheet, relative to the project root.
    #[serde(default = "defaults::build::sass::input")]
    #[educe(Default = defaults::build::sass::input())]
    pub input: PathBuf,

    /// Value of `--style`.
    #[serde(default = "defaults::build::sass::style")]
    #[educe(Default = defaults::build::sass::style())]
    pub style: String,
}

/// `[build.highlight]` - writes the highlighter theme to
/// `static/css/pygments.css`.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    #[serde(default = "defaults::build::highlight::command")]
    #[educe(Default = defaults::build::highlight::command())]
    pub command: Vec<String>,

    /// Highlighter theme name.
    #[serde(default = "defaults::build::highlight::style")]
    #[educe(Default = defaults::build::highlight::style())]
    pub style: String,

    /// CSS selector the theme rules are scoped to.
    #[serde(default = "defaults::build::highlight::selector")]
    #[educe(Default = defaults::build::highlight::selector())]
    pub selector: String,
}
