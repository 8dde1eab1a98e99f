//! Application loop for the TUI.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};

use crate::app::session::QuickOpen;
use crate::infra::host::{HostAction, ScriptHost};
use crate::ui::components::menu::{MenuState, MenuView};

const TICK_RATE: Duration = Duration::from_millis(50);

/// Which list the picker opens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    Files,
    BufferLines,
    Colorschemes,
}

/// Primary entry point for running the interactive picker.
pub struct UiApp {
    quick_open: QuickOpen<MenuState, ScriptHost>,
    view: MenuView,
    mode: PickerMode,
    selected: bool,
    should_quit: bool,
}

impl UiApp {
    pub fn new(quick_open: QuickOpen<MenuState, ScriptHost>, mode: PickerMode) -> Self {
        Self {
            quick_open,
            view: MenuView,
            mode,
            selected: false,
            should_quit: false,
        }
    }

    /// Launch the terminal UI and run until an option is picked or the user quits.
    pub fn run(&mut self) -> Result<()> {
        self.start();

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    /// Host actions issued by the picked option.
    pub fn take_actions(&mut self) -> Vec<HostAction> {
        self.quick_open.host_mut().take_actions()
    }

    fn start(&mut self) {
        match self.mode {
            PickerMode::Files => self.quick_open.show(),
            PickerMode::BufferLines => self.quick_open.show_buffer_lines(),
            PickerMode::Colorschemes => self.quick_open.show_colorschemes(),
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.tick()?;
            terminal.draw(|frame| self.render(frame))?;

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)? {
                let ev = event::read()?;
                self.handle_event(ev);
            }
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        self.quick_open
            .pump()
            .context("failed to open selection")?;
        if self.selected {
            self.quick_open.menu_mut().close();
            self.should_quit = true;
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.size());

        self.view.render(frame, layout[0], self.quick_open.menu());

        let hint = Paragraph::new("enter open · ↑/↓ move · type to filter · esc quit")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, layout[1]);
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event
            && key.kind == KeyEventKind::Press
        {
            self.handle_key(key);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let menu = self.quick_open.menu_mut();
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Enter => self.selected = menu.confirm(),
            KeyCode::Up => menu.move_cursor(-1),
            KeyCode::Down => menu.move_cursor(1),
            KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                menu.move_cursor(-1);
            }
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                menu.move_cursor(1);
            }
            KeyCode::Backspace => menu.pop_char(),
            KeyCode::Char(ch) => menu.push_char(ch),
            _ => {}
        }
    }
}
