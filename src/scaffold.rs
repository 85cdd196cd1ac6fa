//! Content scaffolding: new blog articles and development log entries.
//!
//! Both are rendered from templates in the template directory:
//!
//! | Command            | Template               | Output                          |
//! |--------------------|------------------------|---------------------------------|
//! | `new-article`      | `new-blog-article.md`  | `content/blog/NN-<id>.md`       |
//! | `new-article --draft` | `new-blog-article.md` | `content/blog-draft/<id>.md`  |
//! | `new-devlog-entry` | `new-devlog-entry.md`  | `content/devlog/YYYY-Www.md`    |

use crate::log;
use anyhow::{Context as _, Result, bail};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};

const ARTICLE_TEMPLATE: &str = "new-blog-article.md";
const DEVLOG_TEMPLATE: &str = "new-devlog-entry.md";

/// Create a new blog article and return its path.
///
/// Published articles get the next two-digit number prefix; drafts keep the
/// bare id and go to `blog-draft`.
pub fn new_article(
    content: &Path,
    templates: &Tera,
    id: &str,
    title: &str,
    draft: bool,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let dir = content.join(if draft { "blog-draft" } else { "blog" });
    fs::create_dir_all(&dir)?;

    let name = if draft {
        id.to_owned()
    } else {
        format!("{:02}-{id}", next_id_number(&dir)?)
    };
    let path = dir.join(format!("{name}.md"));
    if path.exists() {
        bail!("blog article path already exists: {}", path.display());
    }

    let mut context = Context::new();
    context.insert("title", title);
    context.insert("date", &iso_timestamp(now));
    write_from_template(templates, ARTICLE_TEMPLATE, &context, &path)?;
    Ok(path)
}

/// Create the development log entry for the ISO week containing `date`.
pub fn new_devlog_entry(
    content: &Path,
    templates: &Tera,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let entry_name = week_entry_name(date);
    let dir = content.join("devlog");
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{entry_name}.md"));
    if path.exists() {
        bail!("development log entry `{entry_name}.md` already exists");
    }

    let mut context = Context::new();
    context.insert("date", &iso_timestamp(now));
    context.insert("entry_name", &entry_name);
    write_from_template(templates, DEVLOG_TEMPLATE, &context, &path)?;
    Ok(path)
}

/// `YYYY-Www` of the ISO calendar week.
pub fn week_entry_name(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Highest leading number among `dir`'s entries, plus one.
fn next_id_number(dir: &Path) -> Result<u32> {
    let mut last = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("cannot list `{}`", dir.display()))? {
        let name = entry?.file_name();
        let prefix = name.to_string_lossy().split('-').next().map(str::to_owned);
        if let Some(number) = prefix.and_then(|p| p.parse::<u32>().ok()) {
            last = last.max(number);
        }
    }
    Ok(last + 1)
}

fn iso_timestamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn write_from_template(templates: &Tera, template: &str, context: &Context, path: &Path) -> Result<()> {
    let text = templates
        .render(template, context)
        .with_context(|| format!("cannot render template `{template}`"))?;
    fs::write(path, text).with_context(|| format!("cannot write `{}`", path.display()))?;
    log!("new"; "created {}", path.display());
    Ok(())
}
