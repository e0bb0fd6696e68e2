//! Progress reporting for long-running exports and imports
//!
//! Three implementations of [`Ui`]:
//! - [`UiApp`]: full-screen ratatui dashboard (phase, progress, tables, activity)
//! - [`LogUi`]: forwards everything to `tracing`, the default for scripts
//! - [`SilentUi`]: does nothing, for tests

mod components;
pub mod picker;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{debug, info};

use crate::inventory::TableSelection;
use components::{InventoryPanel, LogPanel, ProgressPanel, StatusPanel};

/// What the tool is currently doing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Counting,
    Exporting,
    Previewing,
    Importing,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Counting => write!(f, "Counting table rows"),
            Phase::Exporting => write!(f, "Exporting tables"),
            Phase::Previewing => write!(f, "Validating import file"),
            Phase::Importing => write!(f, "Importing rows"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress information for the current operation
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Sink for phase changes, progress and activity messages
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
    fn show_inventory(&mut self, _inventory: &[TableSelection]) {}
}

/// Full-screen terminal dashboard
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    status: StatusPanel,
    progress: ProgressPanel,
    tables: InventoryPanel,
    log: LogPanel,
}

impl UiApp {
    /// Create the dashboard and enter the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            status: StatusPanel::new(),
            progress: ProgressPanel::new(),
            tables: InventoryPanel::new(),
            log: LogPanel::new(),
        })
    }

    fn draw(&mut self) -> Result<()> {
        let status = &self.status;
        let progress = &self.progress;
        let tables = &self.tables;
        let log = &self.log;

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),
                    Constraint::Length(3),
                    Constraint::Length(tables.height()),
                    Constraint::Min(5),
                ])
                .split(frame.area());

            status.render(frame, chunks[0]);
            progress.render(frame, chunks[1]);
            tables.render(frame, chunks[2]);
            log.render(frame, chunks[3]);
        })?;

        Ok(())
    }

    /// Show the summary, wait for a key, then restore the terminal
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.set_phase(Phase::Complete);
        self.clear_progress();
        self.log(summary);
        self.log("اضغط أي مفتاح للخروج...");
        self.draw()?;

        loop {
            if event::poll(Duration::from_millis(100))? {
                if let CrosstermEvent::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.status.set_phase(phase);
        self.draw().ok();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.progress.set(Progress::new(current, total, label));
        self.draw().ok();
    }

    fn clear_progress(&mut self) {
        self.progress.clear();
        self.draw().ok();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.log.add(message);
        self.draw().ok();
    }

    fn show_inventory(&mut self, inventory: &[TableSelection]) {
        self.tables.set(inventory);
        self.draw().ok();
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}

/// Reports through `tracing`
#[derive(Default)]
pub struct LogUi;

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        info!("{}", phase);
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        debug!("{} {}/{}", label.into(), current, total);
    }

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        info!("{}", message.into());
    }

    fn show_inventory(&mut self, inventory: &[TableSelection]) {
        for entry in inventory {
            debug!(rows = entry.row_count, selected = entry.selected, "{}", entry.table);
        }
    }
}

/// The UI chosen on the command line
pub enum Frontend {
    Dashboard(UiApp),
    Log(LogUi),
}

impl Frontend {
    pub fn new(dashboard: bool) -> Result<Self> {
        if dashboard {
            Ok(Frontend::Dashboard(UiApp::new()?))
        } else {
            Ok(Frontend::Log(LogUi))
        }
    }

    /// Report the final summary and release the terminal
    pub fn finish(self, summary: &str) -> Result<()> {
        match self {
            Frontend::Dashboard(app) => app.finish(summary),
            Frontend::Log(_) => {
                println!("{}", summary);
                Ok(())
            }
        }
    }
}

impl Ui for Frontend {
    fn set_phase(&mut self, phase: Phase) {
        match self {
            Frontend::Dashboard(ui) => ui.set_phase(phase),
            Frontend::Log(ui) => ui.set_phase(phase),
        }
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        match self {
            Frontend::Dashboard(ui) => ui.set_progress(current, total, label),
            Frontend::Log(ui) => ui.set_progress(current, total, label),
        }
    }

    fn clear_progress(&mut self) {
        match self {
            Frontend::Dashboard(ui) => ui.clear_progress(),
            Frontend::Log(ui) => ui.clear_progress(),
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        match self {
            Frontend::Dashboard(ui) => ui.log(message),
            Frontend::Log(ui) => ui.log(message),
        }
    }

    fn show_inventory(&mut self, inventory: &[TableSelection]) {
        match self {
            Frontend::Dashboard(ui) => ui.show_inventory(inventory),
            Frontend::Log(ui) => ui.show_inventory(inventory),
        }
    }
}

/// Silent UI implementation for testing
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_ratio() {
        assert_eq!(Progress::new(0, 0, "x").ratio(), 0.0);
        assert_eq!(Progress::new(50, 200, "x").ratio(), 0.25);
    }
}
