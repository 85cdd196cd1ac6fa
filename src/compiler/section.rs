//! Sections: named collections of content files sharing a directory.
//!
//! Listings are never cached. Every call to [`Section::pages`] reads the
//! directory again, so an index rendered after a file change reflects it.

use super::{
    CONTENT_EXTENSIONS, file_times,
    markup::MarkupOptions,
    meta::{MetaError, Page},
};
use crate::utils::log::Logger;
use chrono::NaiveDateTime;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SectionError {
    #[error("cannot list `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid metadata in `{0}`")]
    Meta(PathBuf, #[source] MetaError),

    #[error("page id `{0}` of `{1}` is already used in this section")]
    DuplicateId(String, PathBuf),
}

/// Listing order of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Id,
    Title,
    Ctime,
    Mtime,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Section {
    pub name: String,
    pub title: String,
    #[serde(skip)]
    pub directory: PathBuf,
    /// Relative to the output directory.
    pub output_path: PathBuf,
    pub sort_by: SortKey,
    #[serde(skip)]
    pub index_template: String,
    #[serde(skip)]
    pub article_template: String,
    #[serde(skip)]
    pub markup: MarkupOptions,
    /// Fail the listing on the first bad entry instead of skipping it.
    #[serde(skip)]
    pub strict: bool,
}

/// One listed content file.
#[derive(Debug, Clone, Serialize)]
pub struct PageEntry {
    pub page: Page,
    pub file: PathBuf,
    pub ctime: NaiveDateTime,
    pub mtime: NaiveDateTime,
}

impl Section {
    /// Read the directory and return its pages, sorted by `sort_by`.
    ///
    /// Files are enumerated in file-name order; sorting is stable, so ties
    /// keep that order. Of several files with the same id, the first in
    /// file-name order is kept.
    pub fn pages(&self, log: &Logger) -> Result<Vec<PageEntry>, SectionError> {
        let mut entries = Vec::new();
        let mut seen = FxHashSet::default();
        for file in self.content_files()? {
            let entry = Self::entry(&file).and_then(|entry| {
                if seen.insert(entry.page.id.clone()) {
                    Ok(entry)
                } else {
                    Err(SectionError::DuplicateId(entry.page.id, file.clone()))
                }
            });
            match entry {
                Ok(entry) => entries.push(entry),
                Err(err) if !self.strict => {
                    log.warn(format_args!("{}: skipping {}: {err}", self.name, file.display()));
                }
                Err(err) => return Err(err),
            }
        }

        match self.sort_by {
            SortKey::Id => entries.sort_by(|a, b| a.page.id.cmp(&b.page.id)),
            SortKey::Title => entries.sort_by(|a, b| a.page.title.cmp(&b.page.title)),
            SortKey::Ctime => entries.sort_by(|a, b| a.ctime.cmp(&b.ctime)),
            SortKey::Mtime => entries.sort_by(|a, b| a.mtime.cmp(&b.mtime)),
        }
        Ok(entries)
    }

    /// `<output_path>/index.html`
    pub fn index_outfile(&self) -> PathBuf {
        self.output_path.join("index.html")
    }

    /// `<output_path>/<id>/index.html`
    pub fn article_outfile(&self, entry: &PageEntry) -> PathBuf {
        self.output_path.join(&entry.page.id).join("index.html")
    }

    fn content_files(&self) -> Result<Vec<PathBuf>, SectionError> {
        let io_err = |err| SectionError::Io(self.directory.clone(), err);
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.directory).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();
            if entry.file_type().map_err(io_err)?.is_file() && is_content_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn entry(file: &Path) -> Result<PageEntry, SectionError> {
        let page = Page::from_file(file).map_err(|err| SectionError::Meta(file.to_path_buf(), err))?;
        let times = file_times(file).map_err(|err| SectionError::Io(file.to_path_buf(), err))?;
        Ok(PageEntry {
            page,
            file: file.to_path_buf(),
            ctime: times.ctime,
            mtime: times.mtime,
        })
    }
}

/// Visible file with a content extension.
pub fn is_content_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_none_or(|n| n.starts_with('.'));
    let content = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CONTENT_EXTENSIONS.contains(&e));
    !hidden && content
}
