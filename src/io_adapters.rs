use crate::key::{Key, KeySource};
use crate::output::Output;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::rc::Rc;

#[derive(Debug, Default)]
struct Script {
    keys: VecDeque<IoResult<Key>>,
    session_active: bool,
}

/// Memory-backed key source replaying a prepared key sequence.
///
/// Clones share the same queue, so a test can keep one handle to append keys
/// while an environment owns the other.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    script: Rc<RefCell<Script>>,
}

impl ScriptedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the keys that typing `text` produces.
    ///
    /// `\n` maps to Enter, `\t` to Tab, `\x08` and `\x7f` to Backspace, `\x1b` to
    /// Escape and `\x03` to Ctrl+C.
    pub fn push_str(&self, text: &str) -> &Self {
        for ch in text.chars() {
            let key = match ch {
                '\n' => Key::Enter,
                '\t' => Key::Tab,
                ' ' => Key::Space,
                '\x08' | '\x7f' => Key::Backspace,
                '\x1b' => Key::Escape,
                '\x03' => Key::CtrlC,
                c => Key::Char(c),
            };
            self.script.borrow_mut().keys.push_back(Ok(key));
        }
        self
    }

    pub fn push_keys(&self, keys: &[Key]) -> &Self {
        let mut script = self.script.borrow_mut();
        script.keys.extend(keys.iter().copied().map(Ok));
        drop(script);
        self
    }

    /// Queue a read failure.
    pub fn push_error(&self, kind: ErrorKind, msg: &str) -> &Self {
        self.script
            .borrow_mut()
            .keys
            .push_back(Err(IoError::new(kind, msg.to_string())));
        self
    }

    /// True when every queued key has been read.
    pub fn is_consumed(&self) -> bool {
        self.script.borrow().keys.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().keys.len()
    }

    pub fn is_session_active(&self) -> bool {
        self.script.borrow().session_active
    }
}

impl KeySource for ScriptedKeys {
    fn begin(&mut self) -> IoResult<()> {
        let mut script = self.script.borrow_mut();
        if script.session_active {
            return Err(IoError::other("key session already active"));
        }
        script.session_active = true;
        Ok(())
    }

    fn read_key(&mut self) -> IoResult<Key> {
        let mut script = self.script.borrow_mut();
        if !script.session_active {
            return Err(IoError::other("read_key called outside of a key session"));
        }
        script
            .keys
            .pop_front()
            .unwrap_or_else(|| Err(IoError::new(ErrorKind::UnexpectedEof, "key script exhausted")))
    }

    fn end(&mut self) -> IoResult<()> {
        let mut script = self.script.borrow_mut();
        if !script.session_active {
            return Err(IoError::other("key session ended twice"));
        }
        script.session_active = false;
        Ok(())
    }
}

/// Memory-backed output capturing everything the editor prints.
#[derive(Debug, Clone)]
pub struct MemOutput {
    buf: Rc<RefCell<String>>,
    width: usize,
}

impl MemOutput {
    /// An output reporting an 80 column terminal.
    pub fn new() -> Self {
        Self::with_width(80)
    }

    pub fn with_width(width: usize) -> Self {
        Self {
            buf: Rc::new(RefCell::new(String::new())),
            width,
        }
    }

    /// Everything printed so far.
    pub fn contents(&self) -> String {
        self.buf.borrow().clone()
    }

    /// Returns the printed text and clears the buffer.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buf.borrow_mut())
    }
}

impl Default for MemOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl Output for MemOutput {
    fn print(&mut self, text: &str) -> IoResult<()> {
        self.buf.borrow_mut().push_str(text);
        Ok(())
    }

    fn size(&self) -> IoResult<(usize, usize)> {
        Ok((self.width, 24))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_keys_require_session() {
        let mut keys = ScriptedKeys::new();
        keys.push_str("a");
        assert!(keys.read_key().is_err());

        keys.begin().unwrap();
        assert!(keys.begin().is_err());
        assert_eq!(keys.read_key().unwrap(), Key::Char('a'));
        assert_eq!(keys.read_key().unwrap_err().kind(), ErrorKind::UnexpectedEof);
        keys.end().unwrap();
        assert!(keys.end().is_err());
    }

    #[test]
    fn test_push_str_maps_control_chars() {
        let mut keys = ScriptedKeys::new();
        keys.push_str("ö \t\x7f\n\x1b\x03");
        keys.begin().unwrap();
        let read: Vec<Key> = (0..7).map(|_| keys.read_key().unwrap()).collect();
        assert_eq!(
            read,
            vec![
                Key::Char('ö'),
                Key::Space,
                Key::Tab,
                Key::Backspace,
                Key::Enter,
                Key::Escape,
                Key::CtrlC
            ]
        );
        assert!(keys.is_consumed());
    }

    #[test]
    fn test_mem_output_clones_share_buffer() {
        let mut out = MemOutput::new();
        let view = out.clone();
        out.print("hello").unwrap();
        out.println(" world").unwrap();
        assert_eq!(view.contents(), "hello world\n");
        assert_eq!(out.take(), "hello world\n");
        assert!(out.contents().is_empty());
    }
}
