//! Git integration utilities.

use std::path::{Path, PathBuf};

/// Lightweight wrapper around [`gix::Repository`] discovery.
#[derive(Default)]
pub struct GitClient {
    repo: Option<gix::Repository>,
}

impl GitClient {
    /// Attempt to locate a git repository starting from `path`.
    pub fn discover(path: impl AsRef<Path>) -> Self {
        let repo = gix::discover(path).ok();
        Self { repo }
    }

    /// Root of the work tree, absent for bare repositories or when discovery failed.
    pub fn work_tree(&self) -> Option<PathBuf> {
        self.repo
            .as_ref()?
            .work_dir()
            .map(Path::to_path_buf)
    }
}

/// Whether `path` lies inside a non-bare git work tree.
pub fn is_work_tree(path: &Path) -> bool {
    GitClient::discover(path).work_tree().is_some()
}
