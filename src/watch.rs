//! File system watcher for rebuild-on-change.
//!
//! The project root is watched recursively. Events pass through
//! [`ContentFilter`]; accepted ones are debounced and trigger a full rebuild.
//!
//! ```text
//! notify events ──► ContentFilter ──► Debouncer (300ms) ──► build_site()
//! ```

use crate::{build::build_site, compiler::CONTENT_EXTENSIONS, config::SiteConfig, log};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Component, Path, PathBuf},
    sync::mpsc::{self, RecvTimeoutError},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

/// Directories whose contents never trigger a rebuild.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    "node_modules",
    "target",
    ".idea",
    ".vscode",
    ".mypy_cache",
];

/// Editor swap/backup file extensions.
const IGNORED_EXTENSIONS: &[&str] = &["swp", "swo", "swx", "tmp", "bak"];

// =============================================================================
// Content Filter
// =============================================================================

/// Decides which change events are worth a rebuild.
///
/// An event passes when the default ignore rules pass and the path has a
/// content extension.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    extensions: &'static [&'static str],
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self {
            extensions: CONTENT_EXTENSIONS,
        }
    }
}

impl ContentFilter {
    pub fn accepts(&self, kind: &EventKind, path: &Path) -> bool {
        Self::passes_default_rules(kind, path) && self.is_content(path)
    }

    fn passes_default_rules(kind: &EventKind, path: &Path) -> bool {
        !matches!(kind, EventKind::Access(_)) && !in_ignored_dir(path) && !is_temp_file(path)
    }

    fn is_content(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

fn in_ignored_dir(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name.to_str().is_some_and(|n| IGNORED_DIRS.contains(&n)),
        _ => false,
    })
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    IGNORED_EXTENSIONS.contains(&ext)
        || name.ends_with('~')
        || name.starts_with(".#")
        || name == ".DS_Store"
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, path: PathBuf) {
        self.pending.insert(path);
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Loop
// =============================================================================

/// Format path as relative to root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Rebuild the whole site; a failure is logged and watching continues.
fn rebuild(config: &SiteConfig, changed: &[PathBuf]) {
    let root = config.get_root();
    let mut names: Vec<_> = changed.iter().map(|p| rel_path(p, root)).collect();
    names.sort();
    log!("watch"; "{} changed, rebuilding...", names.join(", "));

    if let Err(err) = build_site(config) {
        log!("watch"; "build failed");
        log!("watch"; "{err:#}");
    }
}

/// Watch the project root and rebuild on accepted changes. Blocks until the
/// watcher's channel closes.
pub fn watch_for_changes_blocking(config: &SiteConfig) -> Result<()> {
    let root = config.get_root();
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;
    log!("watch"; "watching {} for changes", root.display());

    let filter = ContentFilter::default();
    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(Event { kind, paths, .. })) if !debouncer.in_cooldown() => {
                for path in paths {
                    if filter.accepts(&kind, &path) {
                        debouncer.add(path);
                    }
                }
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                rebuild(config, &debouncer.take());
                debouncer.mark_rebuild();
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind};

    fn modify() -> EventKind {
        EventKind::Modify(ModifyKind::Data(DataChange::Content))
    }

    #[test]
    fn test_accepts_content_changes() {
        let filter = ContentFilter::default();
        assert!(filter.accepts(&modify(), Path::new("/site/content/blog/01-hello.md")));
        assert!(filter.accepts(&EventKind::Create(CreateKind::File), Path::new("content/a.markdown")));
        assert!(filter.accepts(&EventKind::Remove(RemoveKind::File), Path::new("content/a.md")));
    }

    #[test]
    fn test_rejects_other_extensions() {
        let filter = ContentFilter::default();
        assert!(!filter.accepts(&modify(), Path::new("templates/article.html")));
        assert!(!filter.accepts(&modify(), Path::new("content/notes.rst")));
        assert!(!filter.accepts(&modify(), Path::new("content/README")));
    }

    #[test]
    fn test_rejects_access_events() {
        let filter = ContentFilter::default();
        let access = EventKind::Access(AccessKind::Any);
        assert!(!filter.accepts(&access, Path::new("content/a.md")));
    }

    #[test]
    fn test_rejects_ignored_dirs() {
        let filter = ContentFilter::default();
        assert!(!filter.accepts(&modify(), Path::new("/site/.git/a.md")));
        assert!(!filter.accepts(&modify(), Path::new("node_modules/pkg/README.md")));
        assert!(!filter.accepts(&modify(), Path::new("target/doc/a.md")));
    }

    #[test]
    fn test_rejects_editor_artifacts() {
        assert!(is_temp_file(Path::new("content/a.md~")));
        assert!(is_temp_file(Path::new("content/.a.md.swp")));
        assert!(is_temp_file(Path::new("content/.#a.md")));
        assert!(is_temp_file(Path::new(".DS_Store")));
        assert!(!is_temp_file(Path::new("content/a.md")));

        let filter = ContentFilter::default();
        assert!(!filter.accepts(&modify(), Path::new("content/.#a.md")));
    }

    #[test]
    fn test_debouncer_batches_paths() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));

        debouncer.add(PathBuf::from("a.md"));
        debouncer.add(PathBuf::from("a.md"));
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));
        debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS));
        assert!(debouncer.ready());

        assert_eq!(debouncer.take(), [PathBuf::from("a.md")]);
        debouncer.mark_rebuild();
        assert!(debouncer.in_cooldown());
    }
}
