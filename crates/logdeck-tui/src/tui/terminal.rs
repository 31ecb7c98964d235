/*
[INPUT]:  Crossterm stdout, terminal raw mode, ratatui backend
[OUTPUT]: Screen handle for the interactive terminal or a headless test buffer
[POS]:    TUI terminal lifecycle guard
[UPDATE]: When changing alternate-screen handling or headless sizing
*/

use std::io;

use anyhow::Result;
use ratatui::Terminal;
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::crossterm::{ExecutableCommand, terminal};

const HEADLESS_WIDTH: u16 = 120;
const HEADLESS_HEIGHT: u16 = 40;

pub(super) enum Screen {
    Interactive(TerminalGuard),
    Headless(Terminal<TestBackend>),
}

impl Screen {
    pub(super) fn interactive() -> Result<Self> {
        Ok(Screen::Interactive(TerminalGuard::new()?))
    }

    pub(super) fn headless() -> Result<Self> {
        let terminal = Terminal::new(TestBackend::new(HEADLESS_WIDTH, HEADLESS_HEIGHT))?;
        Ok(Screen::Headless(terminal))
    }

    pub(super) fn is_interactive(&self) -> bool {
        matches!(self, Screen::Interactive(_))
    }

    pub(super) fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        match self {
            Screen::Interactive(guard) => guard.draw(f),
            Screen::Headless(terminal) => {
                terminal.draw(f)?;
                Ok(())
            }
        }
    }
}

pub(super) struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
