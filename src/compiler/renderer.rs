//! Page rendering.
//!
//! The [`Renderer`] turns one template (plus an optional content file) into
//! one HTML file under the output directory:
//!
//! ```text
//! content/blog/01-hello.md
//!     │ markup::parse
//!     ▼
//! Document ──► fix_html ──► body ─┐
//!     │                           │
//!     └──► extract ──► Page ──────┤
//!                                 ▼
//! base args ─► call args ─► content args ─► path args ─► tera ─► minify ─► write
//! ```
//!
//! A failed template still produces a file: a diagnostic page is written in
//! place of the intended output, and the error is returned afterwards.

use super::{
    file_times,
    fixer::{FixError, fix_html},
    markup::{self, MarkupOptions},
    meta::{Page, extract, page_id},
};
use crate::utils::{
    log::Logger,
    minify::minify,
    path::{normalize_lexically, relative_path, to_url_path},
};
use std::{
    error::Error as _,
    fs,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template `{0}`: neither a content file nor an output file was given")]
    NoOutput(String),

    #[error("content file `{0}` is not under the content root")]
    OutsideContentRoot(PathBuf),

    #[error("cannot read content file `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("cannot fix HTML of `{0}`")]
    Fix(PathBuf, #[source] FixError),

    #[error("template `{template}` failed, diagnostic page written to `{}`", outfile.display())]
    Template {
        template: String,
        outfile: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("cannot write `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Result of template composition.
#[derive(Debug)]
pub enum Composed {
    Html(String),
    /// Composition failed; `diagnostic` is a self-contained error page.
    Failed { diagnostic: String, error: tera::Error },
}

impl Composed {
    /// The HTML to write, whichever way composition went.
    pub fn html(&self) -> &str {
        match self {
            Self::Html(html) => html,
            Self::Failed { diagnostic, .. } => diagnostic,
        }
    }
}

/// One render call.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    pub template: &'a str,
    pub content_file: Option<&'a Path>,
    pub args: Context,
    /// Relative to the output directory (absolute paths are used as-is).
    pub outfile: Option<PathBuf>,
    pub markup: MarkupOptions,
}

impl<'a> RenderRequest<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            template,
            content_file: None,
            args: Context::new(),
            outfile: None,
            markup: MarkupOptions::default(),
        }
    }

    pub fn content(mut self, file: &'a Path) -> Self {
        self.content_file = Some(file);
        self
    }

    pub fn args(mut self, args: Context) -> Self {
        self.args = args;
        self
    }

    pub fn outfile(mut self, outfile: impl Into<PathBuf>) -> Self {
        self.outfile = Some(outfile.into());
        self
    }

    pub fn markup(mut self, options: MarkupOptions) -> Self {
        self.markup = options;
        self
    }
}

/// Stateless page renderer: owns only its configuration.
pub struct Renderer {
    templates: Tera,
    outdir: PathBuf,
    content_root: PathBuf,
    minify: bool,
    base: Context,
    log: Logger,
}

impl Renderer {
    /// `base` is copied into every render context; a `meta` entry defaults
    /// to an empty map. Autoescaping is turned off: `body` is already HTML.
    pub fn new(
        mut templates: Tera,
        outdir: PathBuf,
        content_root: PathBuf,
        minify: bool,
        base: Context,
        log: Logger,
    ) -> Self {
        templates.autoescape_on(Vec::new());
        let mut defaults = Context::new();
        defaults.insert("meta", &super::meta::Metadata::new());
        defaults.extend(base);
        Self {
            templates,
            outdir,
            content_root,
            minify,
            base: defaults,
            log,
        }
    }

    /// Render `request.template` and write the result.
    pub fn render(&self, request: RenderRequest<'_>) -> Result<(), RenderError> {
        let RenderRequest {
            template,
            content_file,
            args,
            mut outfile,
            markup,
        } = request;

        let mut context = self.base.clone();
        context.extend(args);

        if let Some(file) = content_file {
            if outfile.is_none() {
                let relative = file
                    .strip_prefix(&self.content_root)
                    .map_err(|_| RenderError::OutsideContentRoot(file.to_path_buf()))?;
                outfile = Some(relative.with_extension("html"));
            }
            self.insert_content(&mut context, file, &markup)?;
        }

        let Some(outfile) = outfile else {
            return Err(RenderError::NoOutput(template.to_owned()));
        };
        let outfile = self.outdir.join(outfile);
        insert_paths(&mut context, &outfile, &self.outdir);

        let composed = self.compose(template, &context);
        self.write_html(&outfile, composed.html())?;

        match composed {
            Composed::Html(_) => Ok(()),
            Composed::Failed { error, .. } => Err(RenderError::Template {
                template: template.to_owned(),
                outfile,
                source: error,
            }),
        }
    }

    /// Render a redirect page at `target` pointing back to `origin`.
    ///
    /// # Panics
    /// If `origin` does not exist. Redirects are written after the pages
    /// they point to, so a missing origin is a bug in the build order.
    pub fn render_redirect_page(&self, origin: &Path, target: &Path) -> Result<(), RenderError> {
        assert!(
            origin.exists(),
            "redirect origin `{}` does not exist",
            origin.display()
        );

        let target = self.outdir.join(target);
        let parent = target.parent().unwrap_or(&self.outdir);
        let new_url = to_url_path(&relative_path(parent, origin));

        let mut args = Context::new();
        args.insert("new_url", &new_url);
        self.render(RenderRequest::new("redirect.html").args(args).outfile(target))
    }

    /// Run the template engine; never fails, see [`Composed`].
    pub fn compose(&self, template: &str, context: &Context) -> Composed {
        match self.templates.render(template, context) {
            Ok(html) => Composed::Html(html),
            Err(error) => Composed::Failed {
                diagnostic: diagnostic_page(template, &error),
                error,
            },
        }
    }

    fn insert_content(
        &self,
        context: &mut Context,
        file: &Path,
        markup: &MarkupOptions,
    ) -> Result<(), RenderError> {
        let text =
            fs::read_to_string(file).map_err(|err| RenderError::Read(file.to_path_buf(), err))?;
        let document = markup::parse(&text, markup);
        let body =
            fix_html(&document.body).map_err(|err| RenderError::Fix(file.to_path_buf(), err))?;
        let times = file_times(file).map_err(|err| RenderError::Read(file.to_path_buf(), err))?;

        let meta = extract(&document);
        let page = match Page::from_metadata(page_id(file), &meta) {
            Ok(page) => Some(page),
            Err(err) => {
                self.log.warn(format_args!("{}: {err}", file.display()));
                None
            }
        };
        let ctime = page.as_ref().and_then(|p| p.date).unwrap_or(times.ctime);

        context.insert("body", &body);
        context.insert("ctime", &ctime);
        context.insert("mtime", &times.mtime);
        if let Some(page) = &page {
            context.insert("page", page);
        }
        context.insert("content_file", &file.display().to_string());
        context.insert("meta", &meta);
        Ok(())
    }

    fn write_html(&self, file: &Path, html: &str) -> Result<(), RenderError> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|err| RenderError::Io(parent.to_path_buf(), err))?;
        }
        self.log.info(format_args!("writing to {}", file.display()));
        let bytes = minify(html.as_bytes(), self.minify);
        fs::write(file, &bytes).map_err(|err| RenderError::Io(file.to_path_buf(), err))
    }
}

/// Insert `root`, `css`, `img` and `js`, relative to the page's directory.
fn insert_paths(context: &mut Context, outfile: &Path, outdir: &Path) {
    let parent = outfile.parent().unwrap_or(outdir);
    let root = relative_path(parent, outdir);
    let static_dir = root.join("static");

    context.insert("root", &to_url_path(&root));
    for (key, dir) in [("css", "css"), ("img", "img"), ("js", "js")] {
        let path = normalize_lexically(&static_dir.join(dir));
        context.insert(key, &to_url_path(&path));
    }
}

/// Self-contained HTML page describing a template failure.
fn diagnostic_page(template: &str, error: &tera::Error) -> String {
    let mut items = format!("<li>{}</li>", tera::escape_html(&error.to_string()));
    let mut source = error.source();
    while let Some(err) = source {
        items.push_str(&format!("<li>{}</li>", tera::escape_html(&err.to_string())));
        source = err.source();
    }

    format!(
        concat!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">",
            "<title>Template error</title></head>\n<body>",
            "<h1>Template error in <code>{}</code></h1>\n<ol>{}</ol>\n</body></html>\n"
        ),
        tera::escape_html(template),
        items
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::section::{Section, SortKey};
    use std::path::Path;

    const ARTICLE: &str = "<html><head><link href=\"{{ css }}/style.css\"></head>\
        <body><h1>{{ page.title }}</h1>{{ body | safe }}<a href=\"{{ root }}/\">home</a></body></html>";

    struct Site {
        dir: tempfile::TempDir,
    }

    impl Site {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("content/blog")).unwrap();
            Self { dir }
        }

        fn content(&self) -> PathBuf {
            self.dir.path().join("content")
        }

        fn out(&self) -> PathBuf {
            self.dir.path().join("out")
        }

        fn write(&self, relative: &str, text: &str) -> PathBuf {
            let path = self.content().join(relative);
            fs::write(&path, text).unwrap();
            path
        }

        fn renderer(&self, templates: &[(&str, &str)], minify: bool) -> Renderer {
            let mut tera = Tera::default();
            tera.add_raw_templates(templates.iter().copied()).unwrap();
            let mut base = Context::new();
            base.insert("url", "https://example.org");
            Renderer::new(tera, self.out(), self.content(), minify, base, Logger::silent())
        }
    }

    const HELLO: &str = "<meta name=\"title\" content=\"Hello\">\n\
        <meta name=\"date\" content=\"2024-01-01T00:00:00\">\n\n# Greeting\n\nSome *emphasis* here.\n";

    #[test]
    fn test_render_article_end_to_end() {
        let site = Site::new();
        let file = site.write("blog/01-hello.md", HELLO);
        let renderer = site.renderer(&[("article.html", ARTICLE)], false);

        renderer
            .render(
                RenderRequest::new("article.html")
                    .content(&file)
                    .outfile("blog/01-hello/index.html"),
            )
            .unwrap();

        let html = fs::read_to_string(site.out().join("blog/01-hello/index.html")).unwrap();
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains(r#"<section id="greeting" class="content">"#));
        assert!(!html.contains("*emphasis*"));
        assert!(!html.contains("<meta name"));
        assert!(html.contains("../../static/css/style.css"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let site = Site::new();
        let file = site.write("blog/01-hello.md", HELLO);
        let renderer = site.renderer(&[("article.html", ARTICLE)], true);
        let outfile = site.out().join("blog/01-hello/index.html");

        let request = || RenderRequest::new("article.html").content(&file).outfile("blog/01-hello/index.html");
        renderer.render(request()).unwrap();
        let first = fs::read(&outfile).unwrap();
        renderer.render(request()).unwrap();
        assert_eq!(first, fs::read(&outfile).unwrap());
    }

    #[test]
    fn test_outfile_derived_from_content_file() {
        let site = Site::new();
        let file = site.write("index.md", "<meta name=\"title\" content=\"Home\">\n\nWelcome\n");
        let renderer = site.renderer(&[("index.html", "{{ body | safe }}|{{ root }}|{{ css }}")], false);

        renderer.render(RenderRequest::new("index.html").content(&file)).unwrap();

        let html = fs::read_to_string(site.out().join("index.html")).unwrap();
        assert!(html.contains("<p>Welcome</p>"));
        assert!(html.ends_with("|.|static/css"));
    }

    #[test]
    fn test_no_output_is_error_and_writes_nothing() {
        let site = Site::new();
        let renderer = site.renderer(&[("page.html", "x")], false);
        let err = renderer.render(RenderRequest::new("page.html")).unwrap_err();
        assert!(matches!(err, RenderError::NoOutput(ref t) if t == "page.html"));
        assert!(!site.out().exists());
    }

    #[test]
    fn test_call_args_override_base_and_are_not_shared() {
        let site = Site::new();
        let renderer = site.renderer(&[("t.html", "{{ url }}")], false);

        let mut args = Context::new();
        args.insert("url", "https://override.org");
        renderer.render(RenderRequest::new("t.html").args(args).outfile("a.html")).unwrap();
        renderer.render(RenderRequest::new("t.html").outfile("b.html")).unwrap();

        assert_eq!(fs::read_to_string(site.out().join("a.html")).unwrap(), "https://override.org");
        assert_eq!(fs::read_to_string(site.out().join("b.html")).unwrap(), "https://example.org");
    }

    #[test]
    fn test_page_date_overrides_ctime() {
        let site = Site::new();
        let file = site.write("blog/01-hello.md", HELLO);
        let renderer = site.renderer(&[("t.html", "{{ ctime }}")], false);
        renderer.render(RenderRequest::new("t.html").content(&file).outfile("t.html")).unwrap();
        assert_eq!(fs::read_to_string(site.out().join("t.html")).unwrap(), "2024-01-01T00:00:00");
    }

    #[test]
    fn test_missing_title_renders_without_page() {
        let site = Site::new();
        let file = site.write("blog/02-untitled.md", "Just text\n");
        let renderer = site.renderer(
            &[("t.html", "{% if page %}has page{% else %}no page{% endif %}")],
            false,
        );
        renderer.render(RenderRequest::new("t.html").content(&file).outfile("t.html")).unwrap();
        assert_eq!(fs::read_to_string(site.out().join("t.html")).unwrap(), "no page");
    }

    #[test]
    fn test_template_failure_writes_diagnostic_then_errors() {
        let site = Site::new();
        let renderer = site.renderer(&[("broken.html", "{{ missing.field }}")], false);

        let err = renderer
            .render(RenderRequest::new("broken.html").outfile("blog/index.html"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Template { ref template, .. } if template == "broken.html"));

        let html = fs::read_to_string(site.out().join("blog/index.html")).unwrap();
        assert!(html.contains("Template error"));
        assert!(html.contains("broken.html"));
    }

    #[test]
    fn test_unknown_template_is_template_error() {
        let site = Site::new();
        let renderer = site.renderer(&[], false);
        let err = renderer
            .render(RenderRequest::new("nope.html").outfile("x.html"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Template { .. }));
        assert!(site.out().join("x.html").exists());
    }

    #[test]
    fn test_root_resolves_to_outdir_at_every_depth() {
        let outdir = Path::new("/site/out");
        for relative in ["index.html", "blog/index.html", "blog/01-hello/index.html", "a/b/c/d/index.html"] {
            let outfile = outdir.join(relative);
            let mut context = Context::new();
            insert_paths(&mut context, &outfile, outdir);
            let root = context.get("root").and_then(|v| v.as_str()).unwrap().to_owned();
            let resolved = normalize_lexically(&outfile.parent().unwrap().join(root));
            assert_eq!(resolved, outdir, "{relative}");
        }
    }

    #[test]
    fn test_redirect_page_points_to_origin() {
        let site = Site::new();
        let renderer = site.renderer(&[("redirect.html", "{{ new_url }}")], false);
        let origin = site.out().join("blog/index.html");
        fs::create_dir_all(origin.parent().unwrap()).unwrap();
        fs::write(&origin, "blog").unwrap();

        renderer
            .render_redirect_page(&origin, Path::new("posts/index.html"))
            .unwrap();

        let html = fs::read_to_string(site.out().join("posts/index.html")).unwrap();
        assert_eq!(html, "../blog/index.html");
    }

    #[test]
    fn test_redirect_with_missing_origin_panics_and_writes_nothing() {
        let site = Site::new();
        let renderer = site.renderer(&[("redirect.html", "{{ new_url }}")], false);
        let origin = site.out().join("blog/index.html");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            renderer.render_redirect_page(&origin, Path::new("posts/index.html"))
        }));
        assert!(result.is_err());
        assert!(!site.out().join("posts/index.html").exists());
    }

    #[test]
    fn test_section_listing_in_context() {
        let site = Site::new();
        site.write("blog/01-hello.md", HELLO);
        site.write("blog/02-next.md", "<meta name=\"title\" content=\"Next\">\n");
        let section = Section {
            directory: site.content().join("blog"),
            sort_by: SortKey::Id,
            ..Section::default()
        };
        let renderer = site.renderer(
            &[("index.html", "{% for entry in pages %}{{ entry.page.title }};{% endfor %}")],
            false,
        );

        let mut args = Context::new();
        args.insert("pages", &section.pages(&Logger::silent()).unwrap());
        renderer
            .render(RenderRequest::new("index.html").args(args).outfile("blog/index.html"))
            .unwrap();

        let html = fs::read_to_string(site.out().join("blog/index.html")).unwrap();
        assert_eq!(html, "Hello;Next;");
    }
}
