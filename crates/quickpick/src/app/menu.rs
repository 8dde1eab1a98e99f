//! Contract between the quick-open controller and the menu widget that displays it.

use std::sync::mpsc::Sender;

use crate::domain::model::MenuOption;

/// Menu widget displaying quick-open options.
///
/// The widget owns filtering and navigation. The controller always hands it the full current
/// option list.
pub trait Menu {
    fn show(&mut self);
    fn set_loading(&mut self, loading: bool);
    fn set_items(&mut self, options: Vec<MenuOption>);

    /// Register the channel that receives options the user picks.
    fn attach(&mut self, selections: Sender<MenuOption>);

    /// Drop the registered channel; no further selections are delivered.
    fn detach(&mut self);
}
