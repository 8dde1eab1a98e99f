//! In-process file enumeration used when no git work tree is available.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use ignore::WalkBuilder;

use crate::domain::errors::QuickOpenError;
use crate::infra::finder::{Finder, FinderEvent, next_event};

const WALK_BATCH: usize = 256;

/// Walks `root` on a background thread, respecting ignore files, and streams relative paths.
pub struct WalkFinder {
    root: PathBuf,
    show_hidden: bool,
    cancel: Arc<AtomicBool>,
    events: Option<Receiver<FinderEvent>>,
    started: bool,
}

impl WalkFinder {
    pub fn new(root: PathBuf, show_hidden: bool) -> Self {
        Self {
            root,
            show_hidden,
            cancel: Arc::new(AtomicBool::new(false)),
            events: None,
            started: false,
        }
    }
}

impl Finder for WalkFinder {
    fn start(&mut self) -> Result<(), QuickOpenError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let (tx, rx) = mpsc::channel();
        let root = self.root.clone();
        let show_hidden = self.show_hidden;
        let cancel = Arc::clone(&self.cancel);
        thread::spawn(move || {
            walk(&root, show_hidden, &cancel, |batch| {
                tx.send(FinderEvent::Data(batch)).is_ok()
            });
            let _ = tx.send(FinderEvent::Complete);
        });
        tracing::debug!(root = %self.root.display(), "started directory walk");

        self.events = Some(rx);
        Ok(())
    }

    fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.events = None;
    }

    fn try_next(&mut self) -> Option<FinderEvent> {
        next_event(&mut self.events)
    }
}

impl Drop for WalkFinder {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Enumerate files below `root` as root-relative paths, in batches.
pub fn walk(
    root: &Path,
    show_hidden: bool,
    cancel: &AtomicBool,
    mut emit: impl FnMut(Vec<String>) -> bool,
) {
    let mut builder = WalkBuilder::new(root);
    builder
        .git_ignore(true)
        .require_git(false)
        .hidden(!show_hidden);

    let mut batch = Vec::with_capacity(WALK_BATCH);
    for result in builder.build() {
        if cancel.load(Ordering::Relaxed) {
            return;
        }
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "walk error");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        batch.push(rel.display().to_string());
        if batch.len() >= WALK_BATCH && !emit(std::mem::take(&mut batch)) {
            return;
        }
    }

    if !batch.is_empty() {
        emit(batch);
    }
}
