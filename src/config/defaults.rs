//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn url() -> String {
    "https://example.github.io".into()
}

// ============================================================================
// [paths] Section Defaults
// ============================================================================

pub mod paths {
    use std::path::PathBuf;

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn r#static() -> PathBuf {
        "static".into()
    }

    pub fn external() -> PathBuf {
        "external".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    pub mod sass {
        use std::path::PathBuf;

        pub fn command() -> Vec<String> {
            vec!["sass".into()]
        }

        pub fn input() -> PathBuf {
            "scss/style.scss".into()
        }

        pub fn style() -> String {
            "compressed".into()
        }
    }

    pub mod highlight {
        pub fn command() -> Vec<String> {
            vec!["pygmentize".into()]
        }

        pub fn style() -> String {
            "default".into()
        }

        pub fn selector() -> String {
            "pre".into()
        }
    }
}

// ============================================================================
// [[sections]] Defaults
// ============================================================================

pub mod section {
    use crate::config::SectionConfig;
    use crate::compiler::section::SortKey;

    pub fn index_template() -> String {
        "article-index.html".into()
    }

    pub fn article_template() -> String {
        "article.html".into()
    }

    pub fn initial_header_level() -> u8 {
        1
    }

    /// Blog, resources and the development log.
    pub fn sections() -> Vec<SectionConfig> {
        vec![
            SectionConfig {
                name: "Blog".into(),
                title: Some("Blog Posts".into()),
                directory: "blog".into(),
                sort_by: SortKey::Id,
                ..SectionConfig::default()
            },
            SectionConfig {
                name: "Resources".into(),
                directory: "resources".into(),
                sort_by: SortKey::Ctime,
                ..SectionConfig::default()
            },
            SectionConfig {
                name: "Development Log".into(),
                directory: "devlog".into(),
                sort_by: SortKey::Ctime,
                article_template: "devlog-article.html".into(),
                initial_header_level: 4,
                ..SectionConfig::default()
            },
        ]
    }
}

// ============================================================================
// [[redirects]] Defaults
// ============================================================================

pub mod redirects {
    use crate::config::RedirectConfig;

    /// Blog posts used to live under `posts/`.
    pub fn redirects() -> Vec<RedirectConfig> {
        vec![
            RedirectConfig {
                from: "posts/index.html".into(),
                to: "blog/index.html".into(),
            },
            RedirectConfig {
                from: "posts/01-gsoc-2020/index.html".into(),
                to: "blog/01-gsoc-2020/index.html".into(),
            },
        ]
    }
}
