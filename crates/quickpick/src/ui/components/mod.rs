//! Collection of reusable TUI components.

pub mod menu;
