//! Domain models for quick-open items and their menu projection.

use std::path::Path;

/// Semantic type of a quick-open entry. Fixed when the item is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    File,
    BufferLine,
    Bookmark,
    BookmarkHelp,
    FolderHelp,
    Color,
}

impl ItemKind {
    /// Icon displayed next to items of this kind.
    pub fn icon(self) -> Icon {
        match self {
            ItemKind::File => Icon::FileText,
            ItemKind::BufferLine => Icon::AngleRight,
            ItemKind::Bookmark => Icon::Star,
            ItemKind::BookmarkHelp => Icon::Info,
            ItemKind::FolderHelp => Icon::FolderOpen,
            ItemKind::Color => Icon::PaintBrush,
        }
    }

    /// Whether the content is split into a basename label and a dirname detail.
    ///
    /// Only path kinds split; help and color entries show their content verbatim.
    pub fn splits_content(self) -> bool {
        matches!(self, ItemKind::File | ItemKind::Bookmark)
    }
}

/// Display icon. Each [`ItemKind`] maps to exactly one icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    FileText,
    AngleRight,
    Star,
    Info,
    FolderOpen,
    PaintBrush,
}

impl Icon {
    /// Icon-font name used by graphical menus.
    pub fn name(self) -> &'static str {
        match self {
            Icon::FileText => "file-text-o",
            Icon::AngleRight => "angle-right",
            Icon::Star => "star-o",
            Icon::Info => "info",
            Icon::FolderOpen => "folder-open-o",
            Icon::PaintBrush => "paint-brush",
        }
    }

    /// Single-character glyph used by the terminal menu.
    pub fn glyph(self) -> char {
        match self {
            Icon::FileText => '·',
            Icon::AngleRight => '›',
            Icon::Star => '★',
            Icon::Info => 'i',
            Icon::FolderOpen => '▸',
            Icon::PaintBrush => '◆',
        }
    }
}

/// One classified entry of the working list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    content: String,
    kind: ItemKind,
    /// Source text for [`ItemKind::BufferLine`] items; `content` holds the line number.
    line: Option<String>,
}

impl Item {
    pub fn new(content: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            content: content.into(),
            kind,
            line: None,
        }
    }

    /// Build a buffer line entry from its 1-based number and text.
    pub fn buffer_line(number: usize, text: impl Into<String>) -> Self {
        Self {
            content: number.to_string(),
            kind: ItemKind::BufferLine,
            line: Some(text.into()),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn icon(&self) -> Icon {
        self.kind.icon()
    }

    /// Key used to match the item against the set of opened paths.
    pub fn seen_key(&self) -> &str {
        self.content.trim()
    }

    /// Project the item into a menu row. `pinned` is supplied by the caller.
    pub fn to_option(&self, pinned: bool) -> MenuOption {
        let (label, detail) = match self.kind {
            kind if kind.splits_content() => split_path(self.content.trim()),
            ItemKind::BufferLine => (
                self.content.clone(),
                self.line.clone().unwrap_or_default(),
            ),
            _ => (self.content.clone(), String::new()),
        };

        MenuOption {
            kind: self.kind,
            icon: self.icon(),
            label,
            detail,
            pinned,
        }
    }
}

/// Row handed to the menu widget and returned on selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub kind: ItemKind,
    pub icon: Icon,
    pub label: String,
    pub detail: String,
    pub pinned: bool,
}

/// Split a path into `(basename, dirname)`; a bare name has dirname `.`.
pub fn split_path(raw: &str) -> (String, String) {
    let path = Path::new(raw);
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| raw.to_owned());
    let detail = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => ".".to_owned(),
        Some(parent) => parent.to_string_lossy().into_owned(),
        None => raw.to_owned(),
    };
    (label, detail)
}

/// Join a dirname and basename produced by [`split_path`] back into a path string.
pub fn join_path(detail: &str, label: &str) -> String {
    if detail.is_empty() || detail == "." {
        return label.to_owned();
    }
    Path::new(detail).join(label).to_string_lossy().into_owned()
}
