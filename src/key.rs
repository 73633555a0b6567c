use std::fmt;
use std::io;

/// A decoded key press as consumed by the line editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    Space,
    Enter,
    Backspace,
    Delete,
    Escape,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    CtrlC,
    /// Any key the editor has no use for.
    Unknown,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c:?}"),
            Key::CtrlC => f.write_str("Ctrl+C"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Blocking source of key presses.
///
/// A read session is bracketed by [`begin`](KeySource::begin) and
/// [`end`](KeySource::end); terminals switch to raw mode in between.
pub trait KeySource {
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Blocks until the next key is available.
    fn read_key(&mut self) -> io::Result<Key>;

    fn end(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<K: KeySource + ?Sized> KeySource for &mut K {
    fn begin(&mut self) -> io::Result<()> {
        (**self).begin()
    }

    fn read_key(&mut self) -> io::Result<Key> {
        (**self).read_key()
    }

    fn end(&mut self) -> io::Result<()> {
        (**self).end()
    }
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn begin(&mut self) -> io::Result<()> {
        (**self).begin()
    }

    fn read_key(&mut self) -> io::Result<Key> {
        (**self).read_key()
    }

    fn end(&mut self) -> io::Result<()> {
        (**self).end()
    }
}
