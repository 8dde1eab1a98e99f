//! Population strategies for a quick-open session.

use std::path::Path;

use crate::app::classify::{classify, classify_batch};
use crate::domain::model::{Item, ItemKind};
use crate::infra::config::{ConfigSource, SEARCH_PLACEHOLDER};
use crate::infra::finder::FinderSpec;
use crate::infra::host::Platform;

pub const FOLDER_HELP_TEXT: &str = "Open Folder";
pub const BOOKMARK_HELP_TEXT: &str = "Opens Configuration to add a bookmark/Add Bookmark";

/// How a `show()` session is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Folder help plus configured bookmarks, built synchronously.
    Bookmarks,
    /// Entries streamed from a finder.
    Stream(FinderSpec),
}

/// Pick the strategy for a session started in `cwd`.
///
/// `in_work_tree` is only consulted when neither bookmarks nor an override command apply.
pub fn select_strategy(
    cwd: &Path,
    platform: &Platform,
    config: &dyn ConfigSource,
    in_work_tree: impl FnOnce(&Path) -> bool,
) -> Strategy {
    if platform.is_install_or_home(cwd) {
        return Strategy::Bookmarks;
    }

    if let Some(template) = config.exec_command() {
        let command_line = template.replace(SEARCH_PLACEHOLDER, "");
        return Strategy::Stream(FinderSpec::shell(&command_line, cwd));
    }

    if in_work_tree(cwd) {
        Strategy::Stream(FinderSpec::git_ls_files(cwd))
    } else {
        Strategy::Stream(FinderSpec::Walk {
            root: cwd.to_path_buf(),
            show_hidden: config.show_hidden(),
        })
    }
}

/// Folder help first, then one bookmark item per path, or a bookmark help item when none exist.
///
/// `bookmarks` is only read.
pub fn bookmark_items(bookmarks: &[String]) -> Vec<Item> {
    let mut items = Vec::with_capacity(bookmarks.len() + 1);
    items.push(classify(FOLDER_HELP_TEXT, ItemKind::FolderHelp));

    if bookmarks.is_empty() {
        items.push(classify(BOOKMARK_HELP_TEXT, ItemKind::BookmarkHelp));
    } else {
        items.extend(classify_batch(bookmarks.iter().cloned(), ItemKind::Bookmark));
    }
    items
}

/// One item per buffer line, numbered from 1.
pub fn buffer_line_items(lines: &[String]) -> Vec<Item> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| Item::buffer_line(index + 1, line.as_str()))
        .collect()
}

pub fn colorscheme_items(names: &[String]) -> Vec<Item> {
    classify_batch(names.iter().cloned(), ItemKind::Color)
}
