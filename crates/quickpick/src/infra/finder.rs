//! Streaming listing sources that feed file entries into a quick-open session.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use parking_lot::Mutex;

use crate::domain::errors::QuickOpenError;
use crate::infra::walker::WalkFinder;

const CHUNK_SIZE: usize = 8 * 1024;

/// Event produced by a running [`Finder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinderEvent {
    /// A batch of raw entries in arrival order.
    Data(Vec<String>),
    /// The source is exhausted. Emitted once; nothing follows it.
    Complete,
}

/// A long-running listing source.
///
/// After [`Finder::stop`] returns, [`Finder::try_next`] yields nothing further.
pub trait Finder {
    fn start(&mut self) -> Result<(), QuickOpenError>;

    /// Terminate the source. Safe to call repeatedly or before `start`.
    fn stop(&mut self);

    /// Next pending event without blocking.
    fn try_next(&mut self) -> Option<FinderEvent>;
}

/// How a streaming listing is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinderSpec {
    /// External command run in `cwd` whose stdout is split on `delimiter`.
    Process {
        program: String,
        args: Vec<String>,
        delimiter: String,
        cwd: PathBuf,
    },
    /// In-process directory walk honoring ignore files.
    Walk { root: PathBuf, show_hidden: bool },
}

impl FinderSpec {
    /// Tracked and untracked-but-not-ignored files of the git work tree containing `cwd`.
    ///
    /// `-z` keeps paths unquoted, so entries are NUL-delimited.
    pub fn git_ls_files(cwd: &Path) -> Self {
        FinderSpec::Process {
            program: "git".into(),
            args: ["ls-files", "--others", "--exclude-standard", "--cached", "-z"]
                .into_iter()
                .map(String::from)
                .collect(),
            delimiter: "\0".into(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// A user supplied command line run through the platform shell in `cwd`, one entry per
    /// line.
    pub fn shell(command_line: &str, cwd: &Path) -> Self {
        let (program, flag) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        FinderSpec::Process {
            program: program.into(),
            args: vec![flag.into(), command_line.into()],
            delimiter: "\n".into(),
            cwd: cwd.to_path_buf(),
        }
    }
}

/// Builds finders for a [`FinderSpec`].
pub trait FinderFactory {
    fn create(&self, spec: &FinderSpec) -> Box<dyn Finder>;
}

/// Factory producing real processes and walkers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFinders;

impl FinderFactory for SystemFinders {
    fn create(&self, spec: &FinderSpec) -> Box<dyn Finder> {
        match spec {
            FinderSpec::Process {
                program,
                args,
                delimiter,
                cwd,
            } => Box::new(FinderProcess::new(program, args.clone(), delimiter).in_dir(cwd)),
            FinderSpec::Walk { root, show_hidden } => {
                Box::new(WalkFinder::new(root.clone(), *show_hidden))
            }
        }
    }
}

/// External listing process whose stdout is read on a background thread.
///
/// On unix the process leads its own process group, so [`Finder::stop`] also takes down any
/// pipeline members or subcommands it spawned.
pub struct FinderProcess {
    program: String,
    args: Vec<String>,
    delimiter: Vec<u8>,
    cwd: Option<PathBuf>,
    child: Arc<Mutex<Option<Child>>>,
    group: Option<u32>,
    events: Option<Receiver<FinderEvent>>,
    started: bool,
}

impl FinderProcess {
    pub fn new(program: impl Into<String>, args: Vec<String>, delimiter: &str) -> Self {
        Self {
            program: program.into(),
            args,
            delimiter: delimiter.as_bytes().to_vec(),
            cwd: None,
            child: Arc::new(Mutex::new(None)),
            group: None,
            events: None,
            started: false,
        }
    }

    /// Run the process in `dir` instead of the current process directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl Finder for FinderProcess {
    fn start(&mut self) -> Result<(), QuickOpenError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|source| QuickOpenError::FinderSpawn {
                program: self.program.clone(),
                source,
            })?;
        tracing::debug!(
            program = %self.program,
            cwd = ?self.cwd,
            pid = child.id(),
            "started listing process"
        );
        if cfg!(unix) {
            self.group = Some(child.id());
        }

        let stdout = child.stdout.take();
        *self.child.lock() = Some(child);

        let (tx, rx) = mpsc::channel();
        let slot = Arc::clone(&self.child);
        let delimiter = self.delimiter.clone();
        let program = self.program.clone();
        thread::spawn(move || {
            if let Some(stdout) = stdout {
                let result = read_entries(stdout, &delimiter, |batch| {
                    tx.send(FinderEvent::Data(batch)).is_ok()
                });
                if let Err(err) = result {
                    tracing::warn!(program = %program, error = %err, "listing output read failed");
                }
            }
            reap(&slot, &program);
            let _ = tx.send(FinderEvent::Complete);
        });

        self.events = Some(rx);
        Ok(())
    }

    fn stop(&mut self) {
        self.events = None;
        // The group can outlive its leader, so signal it even after the reader reaped `sh`.
        if let Some(group) = self.group.take() {
            kill_group(group, &self.program);
        }
        // Taken by the reader once output ends; nothing left to kill then.
        let child = self.child.lock().take();
        if let Some(mut child) = child {
            if let Err(err) = child.kill() {
                tracing::debug!(
                    program = %self.program,
                    error = %err,
                    "listing process already exited"
                );
            }
            let _ = child.wait();
            tracing::debug!(program = %self.program, "stopped listing process");
        }
    }

    fn try_next(&mut self) -> Option<FinderEvent> {
        let event = next_event(&mut self.events);
        if event == Some(FinderEvent::Complete) {
            // Output closed, so no group member still holds the pipe.
            self.group = None;
        }
        event
    }
}

impl Drop for FinderProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(unix)]
fn kill_group(group: u32, program: &str) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(group) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => {
            tracing::debug!(
                program = %program,
                group,
                error = %err,
                "failed to signal process group"
            );
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_group: u32, _program: &str) {}

fn reap(slot: &Mutex<Option<Child>>, program: &str) {
    let child = slot.lock().take();
    let Some(mut child) = child else {
        return;
    };
    match child.wait() {
        Ok(status) if status.success() => {
            tracing::debug!(program = %program, "listing process finished");
        }
        Ok(status) => {
            tracing::warn!(program = %program, %status, "listing process exited abnormally");
        }
        Err(err) => {
            tracing::warn!(program = %program, error = %err, "failed to wait for listing process");
        }
    }
}

/// Pop the next event from a finder channel, closing it once the source completes.
pub(crate) fn next_event(events: &mut Option<Receiver<FinderEvent>>) -> Option<FinderEvent> {
    let receiver = events.as_ref()?;
    match receiver.try_recv() {
        Ok(FinderEvent::Complete) | Err(TryRecvError::Disconnected) => {
            *events = None;
            Some(FinderEvent::Complete)
        }
        Ok(event) => Some(event),
        Err(TryRecvError::Empty) => None,
    }
}

/// Read `reader` to the end, handing each chunk's complete entries to `emit`.
///
/// Empty entries are skipped and an unterminated trailing entry is flushed at EOF. Reading
/// stops early when `emit` returns `false`.
pub fn read_entries<R: Read>(
    mut reader: R,
    delimiter: &[u8],
    mut emit: impl FnMut(Vec<String>) -> bool,
) -> io::Result<()> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        pending.extend_from_slice(&buf[..read]);

        let batch = drain_entries(&mut pending, delimiter);
        if !batch.is_empty() && !emit(batch) {
            return Ok(());
        }
    }

    if !pending.is_empty() {
        emit(vec![String::from_utf8_lossy(&pending).into_owned()]);
    }
    Ok(())
}

fn drain_entries(pending: &mut Vec<u8>, delimiter: &[u8]) -> Vec<String> {
    let mut entries = Vec::new();
    let mut start = 0;
    while let Some(offset) = find_subslice(&pending[start..], delimiter) {
        let entry = &pending[start..start + offset];
        if !entry.is_empty() {
            entries.push(String::from_utf8_lossy(entry).into_owned());
        }
        start += offset + delimiter.len();
    }
    pending.drain(..start);
    entries
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
