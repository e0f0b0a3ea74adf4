//! Keystroke input handling using crossterm
//!
//! Features:
//! - Non-blocking key polling between frames
//! - Digits 1-5 jump to a level, `r` resets, `d` toggles the debug breakdown
//! - `q`, Escape or Ctrl+C quit

use crate::session::Command;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::Result as IoResult;
use std::time::Duration;

/// What a key press asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Forwarded to the session controller
    Command(Command),
    ToggleDebug,
    Quit,
}

/// Handles user input from terminal
pub struct InputHandler {
    /// Timeout for a single poll
    poll_timeout: Duration,
}

impl InputHandler {
    pub fn new() -> Self {
        InputHandler {
            poll_timeout: Duration::ZERO,
        }
    }

    /// Enable raw mode for terminal input
    pub fn enable_raw_mode() -> IoResult<()> {
        crossterm::terminal::enable_raw_mode()
    }

    /// Drain every pending key press and map the ones we understand
    pub fn poll(&self) -> Result<Vec<Input>> {
        let mut inputs = Vec::new();
        while event::poll(self.poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                if let Some(input) = Self::map_key(&key) {
                    inputs.push(input);
                }
            }
        }
        Ok(inputs)
    }

    /// Translate one key event; unknown keys and key releases yield `None`
    pub fn map_key(key: &KeyEvent) -> Option<Input> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Input::Quit),
            KeyCode::Esc | KeyCode::Char('q') => Some(Input::Quit),
            KeyCode::Char('r') => Some(Input::Command(Command::Reset)),
            KeyCode::Char('d') => Some(Input::ToggleDebug),
            KeyCode::Char(c @ '1'..='5') => {
                let level = c.to_digit(10)? as u8;
                Some(Input::Command(Command::JumpTo(level)))
            }
            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
