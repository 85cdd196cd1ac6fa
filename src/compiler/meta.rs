//! Page metadata extraction.
//!
//! Content authors declare metadata with `<meta>` markers at the top level of
//! a Markdown file:
//!
//! ```markdown
//! <meta name="title" content="Hello">
//! <meta name="summary" content="First post">
//! <meta name="date" content="2024-01-01T00:00:00">
//! ```
//!
//! [`extract`] collects those into a [`Metadata`] map, and
//! [`Page::from_metadata`] turns the map into a typed [`Page`].
//!
//! | Key       | Required | Format                                    |
//! |-----------|----------|-------------------------------------------|
//! | `title`   | yes      | non-empty text                            |
//! | `summary` | no       | text                                      |
//! | `date`    | no       | `YYYY-MM-DD`, ISO date-time, or RFC 3339  |

use super::markup::{self, Document, MarkupOptions};
use crate::utils::xml::create_xml_reader;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use quick_xml::{
    escape::unescape,
    events::{BytesStart, Event},
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Metadata key/value pairs declared in a content file.
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("cannot read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("missing required metadata field `{0}`")]
    MissingField(&'static str),

    #[error("invalid date `{0}`")]
    InvalidDate(String),
}

/// The metadata record describing one content entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// File stem, unique within a section.
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub date: Option<NaiveDateTime>,
}

impl Page {
    /// Build a page from extracted metadata.
    pub fn from_metadata(id: impl Into<String>, meta: &Metadata) -> Result<Self, MetaError> {
        let title = meta
            .get("title")
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .ok_or(MetaError::MissingField("title"))?;

        let date = match meta.get("date") {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        };

        Ok(Self {
            id: id.into(),
            title: title.to_owned(),
            summary: meta.get("summary").cloned(),
            date,
        })
    }

    /// Read and parse a content file, then build its page record.
    pub fn from_file(path: &Path) -> Result<Self, MetaError> {
        let text = fs::read_to_string(path).map_err(|err| MetaError::Io(path.to_path_buf(), err))?;
        let document = markup::parse(&text, &MarkupOptions::default());
        Self::from_metadata(page_id(path), &extract(&document))
    }
}

/// Page id for a content file: its file stem.
pub fn page_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Extraction
// ============================================================================

/// Collect `name -> content` pairs from the document's `<meta>` markers.
///
/// Markers lacking either attribute, and blocks that fail to parse, are
/// skipped. A later marker with the same name wins.
pub fn extract(document: &Document) -> Metadata {
    let mut meta = Metadata::new();
    for node in &document.meta_nodes {
        collect_meta_tags(node, &mut meta);
    }
    meta
}

fn collect_meta_tags(block: &str, meta: &mut Metadata) {
    let mut reader = create_xml_reader(block.as_bytes());
    loop {
        match reader.read_event() {
            Ok(Event::Start(elem) | Event::Empty(elem)) if elem.name().as_ref() == b"meta" => {
                if let Some((name, content)) = meta_pair(&elem) {
                    meta.insert(name, content);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

fn meta_pair(elem: &BytesStart<'_>) -> Option<(String, String)> {
    let mut name = None;
    let mut content = None;
    for attr in elem.html_attributes().with_checks(false).flatten() {
        let raw = std::str::from_utf8(&attr.value).ok()?;
        let value = unescape(raw).ok()?.into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(value),
            b"content" => content = Some(value),
            _ => {}
        }
    }
    Some((name?, content?))
}

// ============================================================================
// Dates
// ============================================================================

/// Parse an ISO-8601 date or date-time.
///
/// Offsets (RFC 3339) are converted to local time; bare dates mean midnight.
pub fn parse_date(raw: &str) -> Result<NaiveDateTime, MetaError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = s.replacen(' ', "T", 1).parse::<NaiveDateTime>() {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| MetaError::InvalidDate(raw.to_owned()))
}
