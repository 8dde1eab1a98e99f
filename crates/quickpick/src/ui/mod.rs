//! Terminal frontend for the quick-open controller.

pub mod app;
pub mod components;
