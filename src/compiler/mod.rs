//! Content compilation for static site generation.
//!
//! - **markup**: Markdown to HTML fragment plus `<meta>` markers
//! - **meta**: metadata extraction and the typed `Page` record
//! - **fixer**: theme-specific HTML structure rewrites
//! - **renderer**: template composition and output writing
//! - **section**: per-directory page listings
//! - **assets**: stylesheet, highlighter theme and static copy
//!
//! # Render Flow
//!
//! ```text
//! Section::pages() ──► Renderer::render(index)
//!       │
//!       └──► Renderer::render(article) ──► markup ──► fixer ──► tera ──► file
//! ```

pub mod assets;
pub mod fixer;
pub mod markup;
pub mod meta;
pub mod renderer;
pub mod section;

use chrono::{DateTime, Local, NaiveDateTime};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use walkdir::WalkDir;

// ============================================================================
// Shared utilities
// ============================================================================

/// Extensions of content files.
pub const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Creation and modification time of a file, in local time.
#[derive(Debug, Clone, Copy)]
pub struct FileTimes {
    pub ctime: NaiveDateTime,
    pub mtime: NaiveDateTime,
}

/// Read file timestamps; creation time falls back to modification time on
/// filesystems that do not record it.
pub fn file_times(path: &Path) -> io::Result<FileTimes> {
    let metadata = fs::metadata(path)?;
    let mtime = metadata.modified()?;
    let ctime = metadata.created().unwrap_or(mtime);
    Ok(FileTimes {
        ctime: local_time(ctime),
        mtime: local_time(mtime),
    })
}

fn local_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
