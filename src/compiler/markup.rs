//! Markdown to HTML conversion.
//!
//! Wraps `pulldown-cmark` and reshapes its event stream into the document
//! structure the rest of the pipeline expects:
//!
//! - top-level headings open nested `<section id="…">` blocks
//! - GFM alerts (`> [!NOTE]`) become `<aside class="admonition note">`
//! - top-level `<meta name=… content=…>` blocks are lifted out of the body
//!
//! ```text
//! # Intro              <section id="intro">
//! text          ──►      <h1>Intro</h1><p>text</p>
//! ## Details             <section id="details"><h2>Details</h2>…</section>
//!                      </section>
//! ```

use crate::utils::path::slugify;
use pulldown_cmark::{BlockQuoteKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use rustc_hash::FxHashMap;
use std::mem;

/// Options that vary per section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupOptions {
    /// Output level of a `#` heading (1..=6); deeper headings follow.
    pub initial_header_level: u8,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            initial_header_level: 1,
        }
    }
}

/// A converted content file.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// HTML fragment, not yet fixed up for the theme.
    pub body: String,
    /// `<meta>` tags lifted from top-level HTML blocks, in source order.
    pub meta_nodes: Vec<String>,
}

/// Convert Markdown text into a [`Document`].
pub fn parse(text: &str, options: &MarkupOptions) -> Document {
    let mut converter = Converter::new(options);
    for event in Parser::new_ext(text, markdown_options()) {
        converter.push(event);
    }
    converter.finish()
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
        | Options::ENABLE_DEFINITION_LIST
}

// ============================================================================
// Event Rewriting
// ============================================================================

struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    inner: Vec<Event<'a>>,
    text: String,
}

struct Converter<'a> {
    events: Vec<Event<'a>>,
    meta_nodes: Vec<String>,
    /// Block nesting depth; 0 means top level.
    depth: usize,
    /// Markdown levels of the currently open sections.
    open_sections: Vec<usize>,
    html_block: Option<String>,
    heading: Option<PendingHeading<'a>>,
    used_ids: FxHashMap<String, usize>,
    initial_level: usize,
}

impl<'a> Converter<'a> {
    fn new(options: &MarkupOptions) -> Self {
        Self {
            events: Vec::new(),
            meta_nodes: Vec::new(),
            depth: 0,
            open_sections: Vec::new(),
            html_block: None,
            heading: None,
            used_ids: FxHashMap::default(),
            initial_level: usize::from(options.initial_header_level.clamp(1, 6)),
        }
    }

    fn push(&mut self, event: Event<'a>) {
        if self.heading.is_some() {
            self.push_heading_event(event);
            return;
        }

        match event {
            Event::Start(Tag::HtmlBlock) if self.depth == 0 => {
                self.html_block = Some(String::new());
            }
            Event::Html(text) if self.html_block.is_some() => {
                if let Some(block) = self.html_block.as_mut() {
                    block.push_str(&text);
                }
            }
            Event::End(TagEnd::HtmlBlock) if self.html_block.is_some() => {
                if let Some(block) = self.html_block.take() {
                    self.flush_html_block(block);
                }
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) if self.depth == 0 => {
                self.heading = Some(PendingHeading {
                    level,
                    id,
                    classes,
                    attrs,
                    inner: Vec::new(),
                    text: String::new(),
                });
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                self.depth += 1;
                self.events.push(Event::Start(Tag::Heading {
                    level: self.shift(level),
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::End(TagEnd::Heading(level)) => {
                self.depth = self.depth.saturating_sub(1);
                self.events.push(Event::End(TagEnd::Heading(self.shift(level))));
            }
            Event::Start(Tag::BlockQuote(Some(kind))) => {
                self.depth += 1;
                let (class, title) = alert_names(kind);
                self.events.push(Event::Html(
                    format!("<aside class=\"admonition {class}\">\n<h1>{title}</h1>\n").into(),
                ));
            }
            Event::End(TagEnd::BlockQuote(Some(_))) => {
                self.depth = self.depth.saturating_sub(1);
                self.events.push(Event::Html("</aside>\n".into()));
            }
            Event::Start(tag) => {
                self.depth += 1;
                self.events.push(Event::Start(tag));
            }
            Event::End(tag) => {
                self.depth = self.depth.saturating_sub(1);
                self.events.push(Event::End(tag));
            }
            other => self.events.push(other),
        }
    }

    fn push_heading_event(&mut self, event: Event<'a>) {
        if let Event::End(TagEnd::Heading(_)) = event {
            if let Some(heading) = self.heading.take() {
                self.emit_section(heading);
            }
            return;
        }
        if let Some(heading) = self.heading.as_mut() {
            if let Event::Text(text) | Event::Code(text) = &event {
                heading.text.push_str(text);
            }
            heading.inner.push(event);
        }
    }

    fn emit_section(&mut self, heading: PendingHeading<'a>) {
        let level = heading.level as usize;
        self.close_sections(level);

        let base = match &heading.id {
            Some(id) => id.to_string(),
            None => slugify(&heading.text),
        };
        let id = self.unique_id(base);
        self.events.push(Event::Html(
            format!("<section id=\"{}\">\n", quick_xml::escape::escape(id.as_str())).into(),
        ));
        self.open_sections.push(level);

        let shifted = self.shift(heading.level);
        self.events.push(Event::Start(Tag::Heading {
            level: shifted,
            id: None,
            classes: heading.classes,
            attrs: heading.attrs,
        }));
        self.events.extend(heading.inner);
        self.events.push(Event::End(TagEnd::Heading(shifted)));
    }

    /// Close every open section at `level` or deeper.
    fn close_sections(&mut self, level: usize) {
        while self.open_sections.last().is_some_and(|&open| open >= level) {
            self.open_sections.pop();
            self.events.push(Event::Html("</section>\n".into()));
        }
    }

    fn unique_id(&mut self, base: String) -> String {
        let base = if base.is_empty() { "section".to_owned() } else { base };
        let count = self.used_ids.entry(base.clone()).or_insert(0);
        *count += 1;
        match *count {
            1 => base,
            n => format!("{base}-{}", n - 1),
        }
    }

    fn shift(&self, level: HeadingLevel) -> HeadingLevel {
        let shifted = (self.initial_level + level as usize - 1).min(6);
        HeadingLevel::try_from(shifted).unwrap_or(HeadingLevel::H6)
    }

    /// Lift the `<meta>` tags of a block that starts with one; the rest of
    /// the block stays in the body.
    fn flush_html_block(&mut self, block: String) {
        let block = if block.trim_start().starts_with("<meta") {
            let (tags, rest) = split_meta_tags(&block);
            self.meta_nodes.extend(tags);
            rest
        } else {
            block
        };
        if !block.trim().is_empty() {
            self.events.push(Event::Start(Tag::HtmlBlock));
            self.events.push(Event::Html(block.into()));
            self.events.push(Event::End(TagEnd::HtmlBlock));
        }
    }

    fn finish(mut self) -> Document {
        if let Some(heading) = self.heading.take() {
            self.emit_section(heading);
        }
        if let Some(block) = self.html_block.take() {
            self.flush_html_block(block);
        }
        self.close_sections(0);

        let events = mem::take(&mut self.events);
        let mut body = String::new();
        html::push_html(&mut body, events.into_iter());
        Document {
            body,
            meta_nodes: self.meta_nodes,
        }
    }
}

/// Cut every `<meta …>` tag out of `block`. Lines left blank are dropped.
fn split_meta_tags(block: &str) -> (Vec<String>, String) {
    let mut tags = Vec::new();
    let mut rest = String::new();
    for line in block.split_inclusive('\n') {
        let mut kept = String::new();
        let mut remaining = line;
        while let Some(start) = find_meta_start(remaining) {
            let Some(len) = tag_len(&remaining[start..]) else {
                break;
            };
            kept.push_str(&remaining[..start]);
            tags.push(remaining[start..start + len].to_owned());
            remaining = &remaining[start + len..];
        }
        kept.push_str(remaining);
        if kept.len() == line.len() || !kept.trim().is_empty() {
            rest.push_str(&kept);
        }
    }
    (tags, rest)
}

fn find_meta_start(text: &str) -> Option<usize> {
    text.match_indices("<meta").map(|(i, _)| i).find(|&i| {
        text[i + "<meta".len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/')
    })
}

/// Length of the tag at the start of `text`, up to its unquoted `>`.
fn tag_len(text: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}

/// Admonition class and display title for a GFM alert.
fn alert_names(kind: BlockQuoteKind) -> (&'static str, &'static str) {
    match kind {
        BlockQuoteKind::Note => ("note", "Note"),
        BlockQuoteKind::Tip => ("tip", "Tip"),
        BlockQuoteKind::Important => ("important", "Important"),
        BlockQuoteKind::Warning => ("warning", "Warning"),
        BlockQuoteKind::Caution => ("caution", "Caution"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(text: &str) -> String {
        parse(text, &MarkupOptions::default()).body
    }

    #[test]
    fn test_heading_opens_section() {
        let html = body("# Hello World\n\nSome text.\n");
        assert!(html.starts_with("<section id=\"hello-world\">"));
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>Some text.</p>"));
        assert!(html.trim_end().ends_with("</section>"));
    }

    #[test]
    fn test_nested_sections_close_in_order() {
        let html = body("# A\n\n## B\n\ntext\n\n# C\n");
        assert_eq!(html.matches("<section").count(), 3);
        assert_eq!(html.matches("</section>").count(), 3);

        // B closes together with A before C opens
        let b = html.find("id=\"b\"").unwrap();
        let c = html.find("id=\"c\"").unwrap();
        assert_eq!(html[b..c].matches("</section>").count(), 2);
    }

    #[test]
    fn test_initial_header_level_shifts_headings() {
        let doc = parse(
            "# Week\n\n## Day\n",
            &MarkupOptions {
                initial_header_level: 4,
            },
        );
        assert!(doc.body.contains("<h4>Week</h4>"));
        assert!(doc.body.contains("<h5>Day</h5>"));
    }

    #[test]
    fn test_header_level_clamped_to_six() {
        let doc = parse(
            "### Deep\n",
            &MarkupOptions {
                initial_header_level: 5,
            },
        );
        assert!(doc.body.contains("<h6>Deep</h6>"));
    }

    #[test]
    fn test_duplicate_heading_ids_are_unique() {
        let html = body("# Notes\n\n# Notes\n");
        assert!(html.contains("id=\"notes\""));
        assert!(html.contains("id=\"notes-1\""));
    }

    #[test]
    fn test_explicit_heading_id() {
        let html = body("# Setup {#install}\n");
        assert!(html.contains("<section id=\"install\">"));
    }

    #[test]
    fn test_alert_becomes_admonition() {
        let html = body("> [!CAUTION]\n> Mind the gap.\n");
        assert!(html.contains("<aside class=\"admonition caution\">"));
        assert!(html.contains("<h1>Caution</h1>"));
        assert!(html.contains("<p>Mind the gap.</p>"));
        assert!(html.contains("</aside>"));
        assert!(!html.contains("<blockquote"));
    }

    #[test]
    fn test_plain_blockquote_untouched() {
        let html = body("> quoted\n");
        assert!(html.contains("<blockquote>"));
        assert!(!html.contains("admonition"));
    }

    #[test]
    fn test_meta_block_is_lifted() {
        let doc = body_and_meta("<meta name=\"title\" content=\"Hello\">\n\nBody text.\n");
        assert_eq!(doc.meta_nodes.len(), 1);
        assert!(doc.meta_nodes[0].contains("name=\"title\""));
        assert!(!doc.body.contains("<meta"));
        assert!(doc.body.contains("<p>Body text.</p>"));
    }

    #[test]
    fn test_html_after_meta_in_same_block_kept() {
        let doc = body_and_meta("<meta name=\"title\" content=\"T\">\n<div>kept</div>\n\nbody\n");
        assert_eq!(doc.meta_nodes, ["<meta name=\"title\" content=\"T\">"]);
        assert!(doc.body.contains("<div>kept</div>"));
        assert!(doc.body.contains("<p>body</p>"));
        assert!(!doc.body.contains("<meta"));
    }

    #[test]
    fn test_meta_content_with_angle_bracket() {
        let doc = body_and_meta("<meta name=\"summary\" content=\"a > b\">\n<span>x</span>\n");
        assert_eq!(doc.meta_nodes, ["<meta name=\"summary\" content=\"a > b\">"]);
        assert!(doc.body.contains("<span>x</span>"));
    }

    #[test]
    fn test_other_html_block_kept() {
        let doc = body_and_meta("<div class=\"note\">raw</div>\n\ntext\n");
        assert!(doc.meta_nodes.is_empty());
        assert!(doc.body.contains("<div class=\"note\">raw</div>"));
    }

    #[test]
    fn test_table_and_void_elements() {
        let html = body("| a | b |\n|---|---|\n| 1 | 2 |\n\n---\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<hr />"));
    }

    #[test]
    fn test_definition_list() {
        let html = body("Term\n: Meaning\n");
        assert!(html.contains("<dl>"));
        assert!(html.contains("<dt>Term</dt>"));
    }

    fn body_and_meta(text: &str) -> Document {
        parse(text, &MarkupOptions::default())
    }
}
