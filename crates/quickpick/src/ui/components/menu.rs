//! Terminal menu widget displaying quick-open options.

use std::sync::mpsc::Sender;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

use crate::app::menu::Menu;
use crate::domain::model::MenuOption;

/// Interactive state backing the menu overlay.
///
/// Filtering is a case-insensitive substring match over label and detail. Pinned options are
/// listed first, otherwise the controller's order is kept.
#[derive(Debug, Default)]
pub struct MenuState {
    visible: bool,
    loading: bool,
    options: Vec<MenuOption>,
    filter: String,
    matches: Vec<usize>,
    cursor: usize,
    selections: Option<Sender<MenuOption>>,
}

impl MenuState {
    /// Whether the menu is currently displayed.
    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Hide the menu.
    pub fn close(&mut self) {
        self.visible = false;
    }

    /// Every option last supplied by the controller.
    pub fn options(&self) -> &[MenuOption] {
        &self.options
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Options passing the filter, in display order.
    pub fn visible_options(&self) -> impl Iterator<Item = &MenuOption> {
        self.matches.iter().filter_map(|idx| self.options.get(*idx))
    }

    pub fn visible_len(&self) -> usize {
        self.matches.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Option under the cursor.
    pub fn selected(&self) -> Option<&MenuOption> {
        self.matches
            .get(self.cursor)
            .and_then(|idx| self.options.get(*idx))
    }

    /// Append a character to the filter.
    pub fn push_char(&mut self, ch: char) {
        self.filter.push(ch);
        self.cursor = 0;
        self.refilter();
    }

    /// Remove the most recently typed filter character if present.
    pub fn pop_char(&mut self) {
        if self.filter.pop().is_some() {
            self.cursor = 0;
            self.refilter();
        }
    }

    /// Move the cursor, wrapping at both ends.
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.matches.len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).rem_euclid(len as isize);
        self.cursor = next as usize;
    }

    /// Deliver the option under the cursor to the attached listener.
    ///
    /// Returns `false` when nothing is selected or no listener is attached.
    pub fn confirm(&mut self) -> bool {
        let Some(option) = self.selected().cloned() else {
            return false;
        };
        match &self.selections {
            Some(sender) => sender.send(option).is_ok(),
            None => false,
        }
    }

    fn refilter(&mut self) {
        let needle = self.filter.to_lowercase();
        let mut pinned = Vec::new();
        let mut rest = Vec::new();
        for (idx, option) in self.options.iter().enumerate() {
            if !matches_filter(option, &needle) {
                continue;
            }
            if option.pinned {
                pinned.push(idx);
            } else {
                rest.push(idx);
            }
        }
        pinned.extend(rest);
        self.matches = pinned;
        self.cursor = self.cursor.min(self.matches.len().saturating_sub(1));
    }
}

impl Menu for MenuState {
    fn show(&mut self) {
        self.visible = true;
        self.filter.clear();
        self.cursor = 0;
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_items(&mut self, options: Vec<MenuOption>) {
        self.options = options;
        self.refilter();
    }

    fn attach(&mut self, selections: Sender<MenuOption>) {
        self.selections = Some(selections);
    }

    fn detach(&mut self) {
        self.selections = None;
    }
}

fn matches_filter(option: &MenuOption, needle: &str) -> bool {
    needle.is_empty()
        || option.label.to_lowercase().contains(needle)
        || option.detail.to_lowercase().contains(needle)
}

/// Plain-text rendering of one option row.
pub fn row_text(option: &MenuOption) -> String {
    let mut row = format!("{} {}", option.icon.glyph(), option.label);
    if !option.detail.is_empty() {
        row.push_str("  ");
        row.push_str(&option.detail);
    }
    if option.pinned {
        row.push_str(" (open)");
    }
    row
}

fn row_line(option: &MenuOption) -> Line<'static> {
    let label_style = if option.pinned {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let mut spans = vec![
        Span::styled(
            format!("{} ", option.icon.glyph()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(option.label.clone(), label_style),
    ];
    if !option.detail.is_empty() {
        spans.push(Span::styled(
            format!("  {}", option.detail),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

/// Visual component that renders the menu overlay.
#[derive(Debug, Default)]
pub struct MenuView;

impl MenuView {
    /// Draw the menu if it is visible.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &MenuState) {
        if !state.is_open() {
            return;
        }

        let width = area.width.saturating_sub(4).min(100);
        let height = area.height.saturating_sub(2);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + 1,
            width,
            height,
        };

        frame.render_widget(Clear, popup);

        let title = if state.is_loading() {
            format!("Quick Open ({} loading...)", state.options().len())
        } else {
            format!("Quick Open ({}/{})", state.visible_len(), state.options().len())
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        frame.render_widget(block.clone(), popup);

        let inner = block.inner(popup);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let prompt = Paragraph::new(format!("> {}", state.filter()))
            .style(Style::default().fg(Color::White));
        frame.render_widget(prompt, layout[0]);

        let rows: Vec<ListItem> = state
            .visible_options()
            .map(|option| ListItem::new(row_line(option)))
            .collect();
        let list = List::new(rows).highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
        let mut list_state = ListState::default();
        if state.visible_len() > 0 {
            list_state.select(Some(state.cursor()));
        }
        frame.render_stateful_widget(list, layout[1], &mut list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;

    use crate::domain::model::{Item, ItemKind};

    fn state_with(contents: &[&str]) -> MenuState {
        let mut state = MenuState::default();
        state.show();
        state.set_items(
            contents
                .iter()
                .map(|c| Item::new(*c, ItemKind::File).to_option(false))
                .collect(),
        );
        state
    }

    #[test]
    fn filter_matches_label_or_detail_case_insensitively() {
        let mut state = state_with(&["src/Main.rs", "docs/guide.md", "README.md"]);
        for ch in "main".chars() {
            state.push_char(ch);
        }
        let labels: Vec<_> = state.visible_options().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Main.rs"]);

        state.pop_char();
        state.pop_char();
        state.pop_char();
        state.pop_char();
        state.push_char('d');
        state.push_char('o');
        state.push_char('c');
        let labels: Vec<_> = state.visible_options().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["guide.md"]);
    }

    #[test]
    fn pinned_options_come_first() {
        let mut state = MenuState::default();
        state.set_items(vec![
            Item::new("a.rs", ItemKind::File).to_option(false),
            Item::new("b.rs", ItemKind::File).to_option(true),
        ]);
        assert_eq!(state.selected().map(|o| o.label.as_str()), Some("b.rs"));
    }

    #[test]
    fn cursor_wraps_and_survives_new_items() {
        let mut state = state_with(&["a", "b", "c"]);
        state.move_cursor(-1);
        assert_eq!(state.cursor(), 2);
        state.move_cursor(1);
        assert_eq!(state.cursor(), 0);

        state.move_cursor(2);
        state.set_items(vec![Item::new("only", ItemKind::File).to_option(false)]);
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn confirm_sends_selected_option_to_listener() {
        let (tx, rx) = mpsc::channel();
        let mut state = state_with(&["x.rs", "y.rs"]);
        assert!(!state.confirm());

        state.attach(tx);
        state.move_cursor(1);
        assert!(state.confirm());
        assert_eq!(rx.try_recv().map(|o| o.label), Ok("y.rs".to_string()));

        state.detach();
        assert!(!state.confirm());
    }
}
