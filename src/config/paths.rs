//! `[paths]` section configuration.
//!
//! Input directories of the site. Relative values are resolved against the
//! project root when the config is loaded.
//!
//! ```text
//! <root>/
//! ├── content/      markdown, one subdirectory per section, plus index.md
//! ├── templates/    tera templates
//! ├── static/       copied verbatim to <out>/static
//! └── external/     Sass include path
//! ```

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default = "defaults::paths::content")]
    #[educe(Default = defaults::paths::content())]
    pub content: PathBuf,

    #[serde(default = "defaults::paths::templates")]
    #[educe(Default = defaults::paths::templates())]
    pub templates: PathBuf,

    #[serde(default = "defaults::paths::r#static")]
    #[educe(Default = defaults::paths::r#static())]
    pub r#static: PathBuf,

    #[serde(default = "defaults::paths::external")]
    #[educe(Default = defaults::paths::external())]
    pub external: PathBuf,
}
