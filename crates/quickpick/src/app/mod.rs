//! Application layer orchestrating quick-open sessions.

pub mod accumulator;
pub mod classify;
pub mod dispatch;
pub mod menu;
pub mod session;
pub mod source;
