//! Watching the problem tree for external edits.
//!
//! Uses notify for cross-platform file system events. Changes are
//! debounced and reported as the set of problem ids they touched; the app
//! re-lists the store but never reloads open buffers.
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::store::{ProblemId, parse_problem_dir};

/// A debounced batch of changes under the store root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreChanges {
    /// Problems whose directory saw an event.
    pub problems: BTreeSet<ProblemId>,
}

impl StoreChanges {
    pub fn touches(&self, id: ProblemId) -> bool {
        self.problems.contains(&id)
    }
}

/// Watches the store root recursively.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    root: PathBuf,
    debounce: Duration,
    pending_since: Option<Instant>,
    pending: StoreChanges,
}

impl StoreWatcher {
    /// Create a watcher for the tree under `root`.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the root cannot be watched.
    pub fn new(root: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Event paths from the OS are canonical.
        let root = root
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| root.as_ref().to_path_buf());

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "watching problem store");

        Ok(Self {
            _watcher: watcher,
            rx,
            root,
            debounce,
            pending_since: None,
            pending: StoreChanges::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the accumulated changes once the tree has been quiet for the
    /// debounce period.
    pub fn take_changes(&mut self) -> Option<StoreChanges> {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if is_relevant(&ev) => {
                    for path in &ev.paths {
                        if let Some(id) = problem_for_path(&self.root, path) {
                            self.pending.problems.insert(id);
                        }
                    }
                    self.pending_since = Some(Instant::now());
                }
                Ok(ev) => tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "ignored watch event"),
                Err(err) => tracing::warn!(error = %err, "watch error"),
            }
        }

        let pending_since = self.pending_since?;
        if pending_since.elapsed() < self.debounce {
            return None;
        }
        self.pending_since = None;
        Some(std::mem::take(&mut self.pending))
    }
}

fn is_relevant(event: &Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    // Atomic saves stage through hidden temp files; the rename that follows
    // is reported under the real name.
    !event.paths.iter().all(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(".tmp"))
    })
}

/// Problem id of the top-level `<N>_<slug>` directory containing `path`.
fn problem_for_path(root: &Path, path: &Path) -> Option<ProblemId> {
    let relative = path.strip_prefix(root).ok()?;
    match relative.components().next()? {
        Component::Normal(name) => parse_problem_dir(name.to_str()?).map(|(id, _)| id),
        _ => None,
    }
}
