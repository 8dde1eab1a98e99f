//! Executes the action bound to a selected menu option.

use std::path::Path;

use crate::app::accumulator::Accumulator;
use crate::domain::errors::QuickOpenError;
use crate::domain::model::{ItemKind, MenuOption, join_path};
use crate::infra::host::{FsProbe, Host, Platform};

/// Registry command opening the user configuration.
pub const OPEN_CONFIG_COMMAND: &str = "quickpick.config.open";
/// Registry command opening a directory picker.
pub const OPEN_FOLDER_COMMAND: &str = "quickpick.openFolder";

/// Route `option` to the host by its kind.
///
/// File and bookmark selections record their joined path in `accumulator` before anything that
/// can fail, so a bookmark whose target is missing is still recorded as seen.
pub fn dispatch<H: Host + ?Sized>(
    option: &MenuOption,
    host: &mut H,
    platform: &Platform,
    fs: &dyn FsProbe,
    accumulator: &mut Accumulator,
) -> Result<(), QuickOpenError> {
    match option.kind {
        ItemKind::BookmarkHelp => host.execute_command(OPEN_CONFIG_COMMAND),
        ItemKind::Color => host.command(&format!("colo {}", option.label)),
        ItemKind::FolderHelp => host.execute_command(OPEN_FOLDER_COMMAND),
        ItemKind::BufferLine => host.command(&option.label),
        ItemKind::File => {
            let full_path = join_path(&option.detail, &option.label);
            accumulator.mark_seen(full_path.as_str());
            host.command(&format!("e! {full_path}"));
        }
        ItemKind::Bookmark => {
            let full_path = join_path(&option.detail, &option.label);
            let expanded = platform.expand_home(&full_path);
            accumulator.mark_seen(full_path.as_str());
            // Edits the literal path; only the directory check sees the expanded one.
            host.command(&format!("e! {full_path}"));

            let target = Path::new(&expanded);
            let is_dir = fs
                .is_directory(target)
                .map_err(|source| QuickOpenError::BookmarkUnreachable {
                    path: target.to_path_buf(),
                    source,
                })?;
            if is_dir {
                host.chdir(target);
            } else {
                host.chdir(Path::new(&option.detail));
            }
        }
    }

    tracing::debug!(kind = ?option.kind, label = %option.label, "dispatched selection");
    Ok(())
}
