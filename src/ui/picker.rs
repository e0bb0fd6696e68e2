//! Interactive checkbox list for choosing which tables to export

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Terminal;
use std::io;

use crate::inventory::TableSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerAction {
    Continue,
    Confirm,
    Cancel,
}

/// Cursor and selection state, independent of the terminal
#[derive(Debug)]
pub struct PickerState {
    pub items: Vec<TableSelection>,
    pub cursor: usize,
}

impl PickerState {
    pub fn new(items: Vec<TableSelection>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> PickerAction {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.items.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') => {
                if let Some(item) = self.items.get_mut(self.cursor) {
                    item.toggle();
                }
            }
            KeyCode::Char('a') => {
                let select = !self.items.iter().all(|t| t.selected);
                for item in &mut self.items {
                    item.selected = select;
                }
            }
            KeyCode::Enter => return PickerAction::Confirm,
            KeyCode::Esc | KeyCode::Char('q') => return PickerAction::Cancel,
            _ => {}
        }
        PickerAction::Continue
    }

    fn list_items(&self) -> Vec<ListItem<'static>> {
        self.items
            .iter()
            .map(|t| {
                let mark = if t.selected { "[x]" } else { "[ ]" };
                ListItem::new(format!(
                    "{} {} ({}) - {}",
                    mark, t.table.name, t.row_count, t.table.description
                ))
            })
            .collect()
    }
}

/// Let the user toggle tables. Returns `None` when the picker is cancelled.
pub fn pick_tables(inventory: Vec<TableSelection>) -> Result<Option<Vec<TableSelection>>> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run(&mut terminal, PickerState::new(inventory));

    terminal::disable_raw_mode().ok();
    terminal.backend_mut().execute(LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut state: PickerState,
) -> Result<Option<Vec<TableSelection>>> {
    let mut list_state = ListState::default().with_selected(Some(0));

    loop {
        list_state.select(Some(state.cursor));
        let items = state.list_items();

        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(1)])
                .split(frame.area());

            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" اختر الجداول للتصدير ")
                        .border_style(Style::default().fg(Color::Blue)),
                )
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, chunks[0], &mut list_state);

            frame.render_widget(
                Paragraph::new(" space: toggle   a: all   enter: export   q: cancel")
                    .style(Style::default().fg(Color::DarkGray)),
                chunks[1],
            );
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match state.handle_key(key.code) {
                PickerAction::Continue => {}
                PickerAction::Confirm => return Ok(Some(state.items)),
                PickerAction::Cancel => return Ok(None),
            }
        }
    }
}
