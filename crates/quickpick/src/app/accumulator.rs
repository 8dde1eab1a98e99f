//! Ordered item list for the current session plus the set of opened paths.

use std::collections::HashSet;

use crate::app::menu::Menu;
use crate::domain::model::{Item, MenuOption};

/// Holds the session's classified items in arrival order.
///
/// `seen` outlives individual sessions; [`Accumulator::clear`] only resets the items.
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    items: Vec<Item>,
    seen: HashSet<String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all items for a new session.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Append items without sorting or deduplicating.
    pub fn extend(&mut self, items: impl IntoIterator<Item = Item>) {
        self.items.extend(items);
    }

    /// Record a resolved path the user opened. Returns `true` if it was new.
    pub fn mark_seen(&mut self, path: impl Into<String>) -> bool {
        self.seen.insert(path.into())
    }

    pub fn is_seen(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    /// Project every item into a menu option, pinning the ones already opened.
    pub fn options(&self) -> Vec<MenuOption> {
        self.items
            .iter()
            .map(|item| item.to_option(self.is_seen(item.seen_key())))
            .collect()
    }

    /// Push the full option list to the menu in one call.
    pub fn render<M: Menu + ?Sized>(&self, menu: &mut M) {
        menu.set_items(self.options());
    }
}
