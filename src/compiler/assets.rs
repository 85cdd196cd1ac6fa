//! Supporting assets: compiled stylesheet, highlighter theme, static files.
//!
//! The two external tools run as blocking child processes through `exec!`;
//! a non-zero exit is returned as an error and aborts the build.

use super::collect_all_files;
use crate::config::{HighlightConfig, SassConfig};
use crate::exec;
use crate::log;
use crate::utils::exec::FilterRule;
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Sass filter: skip deprecation chatter from dependencies.
pub static SASS_FILTER: FilterRule = FilterRule::new(&["Deprecation Warning", "DEPRECATION WARNING"]);

/// Compile the Sass entry stylesheet to `output`.
pub fn compile_sass(root: &Path, sass: &SassConfig, include: &Path, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    log!("sass"; "{} -> {}", sass.input.display(), output.display());
    exec!(
        filter=&SASS_FILTER;
        root;
        &sass.command;
        format!("--style={}", sass.style),
        format!("-I{}", include.display()),
        &sass.input,
        output
    )?;
    Ok(())
}

/// Export the highlighter theme as CSS and write it to `output`.
pub fn write_highlight_css(highlight: &HighlightConfig, output: &Path) -> Result<()> {
    let css = exec!(
        &highlight.command;
        "-S", &highlight.style, "-f", "html", "-a", &highlight.selector
    )?
    .stdout;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, css).with_context(|| format!("cannot write `{}`", output.display()))?;
    log!("highlight"; "theme `{}` -> {}", highlight.style, output.display());
    Ok(())
}

/// Copy every file under `source` to the same relative path under `dest`.
///
/// Existing files are overwritten. Returns the number of files copied; a
/// missing `source` copies nothing.
pub fn copy_static(source: &Path, dest: &Path) -> Result<usize> {
    let files = collect_all_files(source);
    for file in &files {
        let relative = file.strip_prefix(source)?;
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(file, &target)
            .with_context(|| format!("cannot copy `{}`", file.display()))?;
    }
    log!("static"; "copied {} files to {}", files.len(), dest.display());
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_static_mirrors_tree() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("static");
        fs::create_dir_all(source.join("img")).unwrap();
        fs::write(source.join("img/logo.svg"), "<svg/>").unwrap();
        fs::write(source.join("robots.txt"), "User-agent: *").unwrap();

        let dest = dir.path().join("out/static");
        assert_eq!(copy_static(&source, &dest).unwrap(), 2);
        assert_eq!(fs::read_to_string(dest.join("img/logo.svg")).unwrap(), "<svg/>");
        assert_eq!(fs::read_to_string(dest.join("robots.txt")).unwrap(), "User-agent: *");
    }

    #[test]
    fn test_copy_static_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("static");
        let dest = dir.path().join("out");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(source.join("a.js"), "new").unwrap();
        fs::write(dest.join("a.js"), "old").unwrap();

        copy_static(&source, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("a.js")).unwrap(), "new");
    }

    #[test]
    fn test_copy_static_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(copy_static(&dir.path().join("none"), &dir.path().join("out")).unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_highlight_css_from_command_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("css/pygments.css");
        // `echo` stands in for the highlighter: it prints its arguments
        let highlight = HighlightConfig {
            command: vec!["echo".into()],
            ..HighlightConfig::default()
        };

        write_highlight_css(&highlight, &output).unwrap();
        let css = fs::read_to_string(&output).unwrap();
        assert_eq!(css.trim(), "-S default -f html -a pre");
    }

    #[cfg(unix)]
    #[test]
    fn test_sass_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let sass = SassConfig {
            command: vec!["false".into()],
            ..SassConfig::default()
        };
        let result = compile_sass(dir.path(), &sass, dir.path(), &dir.path().join("out/style.css"));
        assert!(result.is_err());
    }
}
