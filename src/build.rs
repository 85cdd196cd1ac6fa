//! Site building orchestration.
//!
//! Every run is a full rebuild, in this order:
//!
//! ```text
//! build_site()
//!     │
//!     ├── render_pages()
//!     │       ├── index.html            (content/index.md)
//!     │       └── for each section
//!     │               ├── <section>/index.html
//!     │               └── <section>/<id>/index.html
//!     │
//!     ├── build_assets() ──► pygments.css, style.css, static/**
//!     │
//!     └── write_redirects() ──► legacy locations, after their origins exist
//! ```

use crate::{
    compiler::{
        assets::{compile_sass, copy_static, write_highlight_css},
        renderer::{RenderRequest, Renderer},
        section::Section,
    },
    config::SiteConfig,
    log,
    utils::log::Logger,
};
use anyhow::{Context as _, Result, bail};
use std::path::Path;
use tera::{Context, Tera};

/// Template of the site's front page.
const HOME_TEMPLATE: &str = "index.html";
/// Content of the site's front page, relative to the content root.
const HOME_CONTENT: &str = "index.md";

/// Load every template under `dir`, named by their path relative to it.
pub fn load_templates(dir: &Path) -> Result<Tera> {
    let glob = format!("{}/**/*", dir.display());
    Tera::new(&glob).with_context(|| format!("cannot load templates from `{}`", dir.display()))
}

/// Build the entire site into `config.outdir`.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    log!("build"; "building {} into {}", config.root.display(), config.outdir.display());

    let sections = config.sections();
    let renderer = create_renderer(config, &sections)?;

    let count = render_pages(&renderer, &config.paths.content, &sections)?;
    build_assets(config)?;
    write_redirects(config, &renderer)?;

    log!("build"; "done, {count} pages written to {}", config.outdir.display());
    Ok(())
}

fn create_renderer(config: &SiteConfig, sections: &[Section]) -> Result<Renderer> {
    let templates = load_templates(&config.paths.templates)?;

    let mut base = Context::new();
    base.insert("url", &config.url);
    base.insert("sections", sections);

    Ok(Renderer::new(
        templates,
        config.outdir.clone(),
        config.paths.content.clone(),
        config.build.minify,
        base,
        Logger::new("render"),
    ))
}

/// Render the front page and every section. Returns the number of pages.
fn render_pages(renderer: &Renderer, content: &Path, sections: &[Section]) -> Result<usize> {
    let home = content.join(HOME_CONTENT);
    let mut request = RenderRequest::new(HOME_TEMPLATE).outfile("index.html");
    if home.is_file() {
        request = request.content(&home);
    }
    renderer.render(request).context("cannot render the front page")?;
    let mut count = 1;

    let log = Logger::new("section");
    for section in sections {
        let pages = section
            .pages(&log)
            .with_context(|| format!("cannot list section `{}`", section.name))?;
        log!("section"; "{}: {} pages", section.name, pages.len());

        let mut args = Context::new();
        args.insert("title", &section.title);
        args.insert("section", section);
        args.insert("pages", &pages);
        renderer
            .render(
                RenderRequest::new(&section.index_template)
                    .args(args)
                    .outfile(section.index_outfile()),
            )
            .with_context(|| format!("cannot render index of `{}`", section.name))?;
        count += 1;

        for entry in &pages {
            let mut args = Context::new();
            args.insert("section", section);
            renderer
                .render(
                    RenderRequest::new(&section.article_template)
                        .content(&entry.file)
                        .args(args)
                        .outfile(section.article_outfile(entry))
                        .markup(section.markup),
                )
                .with_context(|| format!("cannot render `{}`", entry.file.display()))?;
            count += 1;
        }
    }

    Ok(count)
}

/// Highlighter theme, compiled stylesheet and static files.
fn build_assets(config: &SiteConfig) -> Result<()> {
    let css = config.outdir.join("static/css");
    let build = &config.build;

    if build.highlight.enable {
        write_highlight_css(&build.highlight, &css.join("pygments.css"))
            .context("syntax highlighter theme export failed")?;
    }
    if build.sass.enable {
        compile_sass(&config.root, &build.sass, &config.paths.external, &css.join("style.css"))
            .context("stylesheet compilation failed")?;
    }
    copy_static(&config.paths.r#static, &config.outdir.join("static"))?;
    Ok(())
}

fn write_redirects(config: &SiteConfig, renderer: &Renderer) -> Result<()> {
    for redirect in &config.redirects {
        let origin = config.outdir.join(&redirect.to);
        if !origin.exists() {
            bail!(
                "[[redirects]] `{}` points to `{}`, which was not generated",
                redirect.from.display(),
                redirect.to.display()
            );
        }
        renderer
            .render_redirect_page(&origin, &redirect.from)
            .with_context(|| format!("cannot write redirect `{}`", redirect.from.display()))?;
    }
    Ok(())
}
