//! Key source and output backed by the process terminal through `crossterm`.

use crate::key::{Key, KeySource};
use crate::output::Output;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::{execute, terminal};
use log::{trace, warn};
use std::io::{self, Write};

/// Reads keys from the terminal. Raw mode is active between `begin` and `end`.
#[derive(Debug, Default)]
pub struct TerminalInput {
    raw: bool,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeySource for TerminalInput {
    fn begin(&mut self) -> io::Result<()> {
        if !self.raw {
            terminal::enable_raw_mode()?;
            self.raw = true;
        }
        Ok(())
    }

    fn read_key(&mut self) -> io::Result<Key> {
        loop {
            // Windows reports releases as well; only presses and repeats are keys.
            if let Event::Key(ev) = event::read()? {
                if ev.kind != KeyEventKind::Release {
                    let key = decode_key(ev);
                    trace!("key event {ev:?} decoded as {key}");
                    return Ok(key);
                }
            }
        }
    }

    fn end(&mut self) -> io::Result<()> {
        if self.raw {
            self.raw = false;
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            warn!("failed to leave raw mode: {e}");
        }
    }
}

fn decode_key(ev: KeyEvent) -> Key {
    let ctrl = ev.modifiers.contains(KeyModifiers::CONTROL);
    match ev.code {
        KeyCode::Char('c') | KeyCode::Char('C') if ctrl => Key::CtrlC,
        KeyCode::Char(_) if ctrl => Key::Unknown,
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Escape,
        KeyCode::Tab => Key::Tab,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        _ => Key::Unknown,
    }
}

/// Writes to standard output. Line feeds are emitted as `\r\n` so output stays
/// aligned while raw mode is active.
#[derive(Debug, Default)]
pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        TerminalOutput
    }
}

impl Output for TerminalOutput {
    fn print(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        execute!(stdout, Print(text.replace('\n', "\r\n")))?;
        stdout.flush()
    }

    fn size(&self) -> io::Result<(usize, usize)> {
        let (cols, rows) = terminal::size()?;
        Ok((cols as usize, rows as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_decode_printable_and_space() {
        assert_eq!(decode_key(press(KeyCode::Char('x'), KeyModifiers::NONE)), Key::Char('x'));
        assert_eq!(decode_key(press(KeyCode::Char('X'), KeyModifiers::SHIFT)), Key::Char('X'));
        assert_eq!(decode_key(press(KeyCode::Char(' '), KeyModifiers::NONE)), Key::Space);
    }

    #[test]
    fn test_decode_control_keys() {
        assert_eq!(decode_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)), Key::CtrlC);
        assert_eq!(decode_key(press(KeyCode::Char('w'), KeyModifiers::CONTROL)), Key::Unknown);
        assert_eq!(decode_key(press(KeyCode::Esc, KeyModifiers::NONE)), Key::Escape);
        assert_eq!(decode_key(press(KeyCode::Up, KeyModifiers::NONE)), Key::Up);
        assert_eq!(decode_key(press(KeyCode::F(1), KeyModifiers::NONE)), Key::Unknown);
    }
}
