//! Site configuration management for `site.toml`.
//!
//! The file is optional: without it the defaults reproduce the stock site.
//!
//! # Sections
//!
//! | Section         | Purpose                                        |
//! |-----------------|------------------------------------------------|
//! | `url`           | Canonical base URL, passed to every template   |
//! | `[paths]`       | Input directories                              |
//! | `[build]`       | Minification, Sass, syntax-highlighter theme   |
//! | `[[sections]]`  | Content collections                            |
//! | `[[redirects]]` | Legacy URLs that point at moved pages          |
//!
//! # Example
//!
//! ```toml
//! url = "https://example.github.io"
//!
//! [build]
//! minify = true
//!
//! [build.sass]
//! enable = false
//!
//! [[sections]]
//! name = "Blog"
//! title = "Blog Posts"
//! directory = "blog"
//! ```

mod build;
pub mod defaults;
mod error;
mod paths;
mod sections;

pub use build::{BuildConfig, HighlightConfig, SassConfig};
pub use error::ConfigError;
pub use paths::PathsConfig;
pub use sections::{RedirectConfig, SectionConfig};

use crate::{cli::Cli, compiler::section::Section, utils::path::normalize_path};
use anyhow::{Context, Result, bail};
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing site.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute output directory (from the CLI)
    #[serde(skip)]
    pub outdir: PathBuf,

    /// Canonical base URL of the site
    #[serde(default = "defaults::url")]
    #[educe(Default = defaults::url())]
    pub url: String,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default = "defaults::section::sections")]
    #[educe(Default = defaults::section::sections())]
    pub sections: Vec<SectionConfig>,

    #[serde(default = "defaults::redirects::redirects")]
    #[educe(Default = defaults::redirects::redirects())]
    pub redirects: Vec<RedirectConfig>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).with_context(|| format!("in `{}`", path.display()))
    }

    /// Load `site.toml` from the project root (if present) and apply the CLI.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Resolved sections, in configuration order.
    pub fn sections(&self) -> Vec<Section> {
        self.sections
            .iter()
            .map(|section| section.to_section(&self.paths.content))
            .collect()
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = normalize_path(cli.root.as_deref().unwrap_or(Path::new("./")));

        // Output is relative to the working directory, not the project root
        self.outdir = normalize_path(&cli.outdir);

        Self::update_option(&mut self.url, cli.url.as_ref());
        if cli.skip_minify {
            self.build.minify = false;
        }

        self.update_path_with_root(&root);
        self.root = root;
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all input paths against the root directory
    fn update_path_with_root(&mut self, root: &Path) {
        let paths = &mut self.paths;
        paths.content = normalize_path(&root.join(&paths.content));
        paths.templates = normalize_path(&root.join(&paths.templates));
        paths.r#static = normalize_path(&root.join(&paths.r#static));
        paths.external = normalize_path(&root.join(&paths.external));
        self.build.sass.input = normalize_path(&root.join(&self.build.sass.input));
    }

    /// Validate configuration before building
    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("http") {
            bail!(ConfigError::Validation(
                "[url] must start with http:// or https://".into()
            ));
        }

        let mut names = FxHashSet::default();
        for section in &self.sections {
            if !names.insert(section.name.as_str()) {
                bail!(ConfigError::Validation(format!(
                    "[[sections]] name `{}` is used more than once",
                    section.name
                )));
            }
            if !(1..=6).contains(&section.initial_header_level) {
                bail!(ConfigError::Validation(format!(
                    "[[sections]] `{}`: initial_header_level must be between 1 and 6",
                    section.name
                )));
            }
        }

        if self.build.sass.enable {
            Self::check_command_installed("[build.sass.command]", &self.build.sass.command)?;
            if !self.build.sass.input.is_file() {
                bail!(ConfigError::Validation(format!(
                    "[build.sass.input] `{}` not found",
                    self.build.sass.input.display()
                )));
            }
        }

        if self.build.highlight.enable {
            Self::check_command_installed(
                "[build.highlight.command]",
                &self.build.highlight.command,
            )?;
        }

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
