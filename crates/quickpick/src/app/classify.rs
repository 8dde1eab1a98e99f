//! Classification of raw source entries into typed items.

use crate::domain::model::{Item, ItemKind};

/// Tag one raw entry with its kind. Any text is accepted verbatim.
pub fn classify(raw: impl Into<String>, kind: ItemKind) -> Item {
    Item::new(raw, kind)
}

/// Tag a batch of raw entries, preserving order.
pub fn classify_batch<I, S>(raw: I, kind: ItemKind) -> Vec<Item>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    raw.into_iter().map(|entry| classify(entry, kind)).collect()
}
