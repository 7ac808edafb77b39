//! Terminal rendering of frame projections

use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use timehack_runtime::FrameProjection;
use timehack_time::SyncState;

/// Full-screen clock on the alternate screen
pub struct TerminalUi {
    out: Stdout,
    active: bool,
    write_failed: bool,
}

impl TerminalUi {
    pub fn enter() -> io::Result<Self> {
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(TerminalUi {
            out,
            active: true,
            write_failed: false,
        })
    }

    pub fn render(&mut self, frame: &FrameProjection) {
        if let Err(e) = self.draw(frame) {
            // One warning per session
            if !self.write_failed {
                tracing::warn!(error = %e, "terminal write failed");
                self.write_failed = true;
            }
        }
    }

    fn draw(&mut self, frame: &FrameProjection) -> io::Result<()> {
        let emphasis = if frame.flash_lit {
            Attribute::Reverse
        } else {
            Attribute::Reset
        };

        let digit = frame
            .countdown_digit
            .map(|d| d.to_string())
            .unwrap_or_default();

        queue!(
            self.out,
            MoveTo(0, 1),
            Clear(ClearType::CurrentLine),
            SetAttribute(emphasis),
            Print(format!("  {}  ", frame.clock_text)),
            SetAttribute(Attribute::Reset),
            MoveTo(0, 3),
            Clear(ClearType::CurrentLine),
            Print(format!("  {}", digit)),
            MoveTo(0, 5),
            Clear(ClearType::CurrentLine),
            Print(format!("  {}", frame.announcement_text)),
            MoveTo(0, 7),
            Clear(ClearType::CurrentLine),
            Print(status_line(frame)),
        )?;
        self.out.flush()
    }

    pub fn leave(mut self) -> io::Result<()> {
        self.active = false;
        execute!(self.out, Show, LeaveAlternateScreen)
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        if self.active {
            let _ = execute!(self.out, Show, LeaveAlternateScreen);
        }
    }
}

fn status_line(frame: &FrameProjection) -> String {
    let sync = &frame.sync;
    let state = match (sync.state, sync.degraded) {
        (SyncState::Synced, false) => "synced",
        (SyncState::Synced, true) => "synced (stale)",
        (SyncState::Unsynced, _) => "local clock",
    };
    let correction = sync
        .last_correction_ms
        .map(|ms| format!(", last correction {:+.0} ms", ms))
        .unwrap_or_default();

    format!("  [{} via {}{}]", state, sync.anchor, correction)
}
