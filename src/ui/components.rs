//! Panels of the dashboard

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;

use super::{Phase, Progress};
use crate::inventory::TableSelection;

fn border() -> Style {
    Style::default().fg(Color::Blue)
}

/// Current phase
pub struct StatusPanel {
    phase: Phase,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Counting,
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (indicator, color) = match self.phase {
            Phase::Counting => ("#", Color::Cyan),
            Phase::Exporting => ("↑", Color::Cyan),
            Phase::Previewing => ("?", Color::Yellow),
            Phase::Importing => ("↓", Color::Magenta),
            Phase::Complete => ("✓", Color::Green),
        };
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);

        let line = Line::from(vec![
            Span::styled(format!(" {} ", indicator), style),
            Span::styled(self.phase.to_string(), style),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" أرشيف آل عمير ")
            .border_style(border());

        frame.render_widget(Paragraph::new(vec![Line::from(""), line]).block(block), area);
    }
}

pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(border());

        let Some(progress) = &self.progress else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let label = if progress.total > 0 {
            format!("{}: {}/{}", progress.label, progress.current, progress.total)
        } else {
            progress.label.clone()
        };

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(progress.ratio().min(1.0))
            .label(label);
        frame.render_widget(gauge, area);
    }
}

/// Table inventory with row counts
pub struct InventoryPanel {
    entries: Vec<TableSelection>,
}

impl InventoryPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn set(&mut self, inventory: &[TableSelection]) {
        self.entries = inventory.to_vec();
    }

    /// Rows needed: entries plus header and borders
    pub fn height(&self) -> u16 {
        if self.entries.is_empty() {
            0
        } else {
            self.entries.len() as u16 + 3
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.entries.is_empty() {
            return;
        }

        let rows = self.entries.iter().map(|entry| {
            let mark = if entry.selected { "[x]" } else { "[ ]" };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(entry.table.name),
                Cell::from(entry.row_count.to_string()),
                Cell::from(entry.table.description),
            ])
        });

        let header = Row::new(vec!["", "الجدول", "السجلات", "الوصف"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(20),
                Constraint::Length(8),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Tables ")
                .border_style(border()),
        );

        frame.render_widget(table, area);
    }
}

/// Scrolling activity log
pub struct LogPanel {
    entries: Vec<String>,
    max_entries: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 200,
        }
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(border());

        let visible = area.height.saturating_sub(2) as usize;
        let start = self.entries.len().saturating_sub(visible);
        let last = self.entries.len().saturating_sub(1);

        let items: Vec<ListItem> = self.entries[start..]
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let color = if start + i == last { Color::White } else { Color::DarkGray };
                ListItem::new(Span::styled(format!(" {}", entry), Style::default().fg(color)))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}
