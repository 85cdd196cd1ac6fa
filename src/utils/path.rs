//! Path and slug helpers shared by the renderer, sections and watcher.

use deunicode::deunicode;
use std::{
    env,
    path::{Component, Path, PathBuf},
};

/// Lexically normalize a path: drop `.` components and fold `..` into
/// their parent where possible. Never touches the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Relative path from directory `base` to `target`, walking up with `..`.
///
/// Both paths are compared lexically, so they should be absolute (or both
/// relative to the same directory). Returns `.` when they are equal.
///
/// | base | target | result |
/// |------|--------|--------|
/// | `/out/blog/hello` | `/out` | `../..` |
/// | `/out` | `/out` | `.` |
/// | `/out/posts` | `/out/blog/index.html` | `../blog/index.html` |
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base = normalize_lexically(base);
    let target = normalize_lexically(target);

    let base_parts: Vec<_> = base.components().collect();
    let target_parts: Vec<_> = target.components().collect();
    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &target_parts[common..] {
        rel.push(part);
    }

    if rel.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        rel
    }
}

/// Render a path with forward slashes for use inside URLs.
pub fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a path to absolute, using canonicalize if the path exists
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()
                .map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Convert heading text into an ASCII anchor (`"Ünïcode Title!"` → `"unicode-title"`).
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text).to_ascii_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
