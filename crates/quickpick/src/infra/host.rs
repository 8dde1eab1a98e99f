//! Host editor, filesystem, and platform capabilities consumed by the controller.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Editor surface the quick-open controller drives. All calls are fire-and-forget.
pub trait Host {
    /// Run an editor command line such as `e! path`.
    fn command(&mut self, text: &str);
    /// Change the editor's working directory.
    fn chdir(&mut self, path: &Path);
    /// Invoke a named command from the editor's command registry.
    fn execute_command(&mut self, name: &str);
    /// Working directory used to pick the listing strategy.
    fn current_dir(&self) -> PathBuf;

    /// Lines of the active buffer.
    fn buffer_lines(&self) -> Vec<String> {
        Vec::new()
    }

    /// Colorscheme names the editor can switch to.
    fn colorschemes(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Filesystem probe used when resolving bookmarks.
pub trait FsProbe {
    /// Fails when the path does not exist.
    fn is_directory(&self, path: &Path) -> io::Result<bool>;
}

/// [`FsProbe`] backed by `std::fs`. Symlinks are not followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl FsProbe for StdFs {
    fn is_directory(&self, path: &Path) -> io::Result<bool> {
        fs::symlink_metadata(path).map(|meta| meta.is_dir())
    }
}

/// Platform locations resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Platform {
    home: Option<PathBuf>,
    install_dir: Option<PathBuf>,
}

impl Platform {
    pub fn new(home: Option<PathBuf>, install_dir: Option<PathBuf>) -> Self {
        Self { home, install_dir }
    }

    /// Resolve the home directory and the directory containing the running executable.
    pub fn detect() -> Result<Self> {
        let exe = std::env::current_exe().context("unable to locate running executable")?;
        Ok(Self {
            home: dirs_next::home_dir(),
            install_dir: exe.parent().map(Path::to_path_buf),
        })
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn install_dir(&self) -> Option<&Path> {
        self.install_dir.as_deref()
    }

    /// True when `cwd` is the install directory or the home directory, meaning no project is open.
    pub fn is_install_or_home(&self, cwd: &Path) -> bool {
        self.install_dir() == Some(cwd) || self.home_dir() == Some(cwd)
    }

    /// Replace a leading `~` with the home directory.
    pub fn expand_home(&self, raw: &str) -> String {
        match (raw.strip_prefix('~'), self.home_dir()) {
            (Some(rest), Some(home)) => format!("{}{rest}", home.display()),
            _ => raw.to_owned(),
        }
    }
}

/// Action issued to a [`ScriptHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    Command(String),
    Chdir(PathBuf),
    Execute(String),
}

impl fmt::Display for HostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAction::Command(text) => write!(f, ":{text}"),
            HostAction::Chdir(path) => write!(f, "cd {}", path.display()),
            HostAction::Execute(name) => write!(f, "exec {name}"),
        }
    }
}

/// Host that records issued actions instead of driving an editor.
///
/// `chdir` also moves the recorded working directory so later sessions pick their strategy
/// from the new location.
#[derive(Debug, Clone, Default)]
pub struct ScriptHost {
    cwd: PathBuf,
    actions: Vec<HostAction>,
    lines: Vec<String>,
    colorschemes: Vec<String>,
}

impl ScriptHost {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    pub fn with_buffer_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_colorschemes(mut self, names: Vec<String>) -> Self {
        self.colorschemes = names;
        self
    }

    pub fn actions(&self) -> &[HostAction] {
        &self.actions
    }

    pub fn take_actions(&mut self) -> Vec<HostAction> {
        std::mem::take(&mut self.actions)
    }
}

impl Host for ScriptHost {
    fn command(&mut self, text: &str) {
        self.actions.push(HostAction::Command(text.to_owned()));
    }

    fn chdir(&mut self, path: &Path) {
        self.cwd = path.to_path_buf();
        self.actions.push(HostAction::Chdir(path.to_path_buf()));
    }

    fn execute_command(&mut self, name: &str) {
        self.actions.push(HostAction::Execute(name.to_owned()));
    }

    fn current_dir(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn buffer_lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    fn colorschemes(&self) -> Vec<String> {
        self.colorschemes.clone()
    }
}
