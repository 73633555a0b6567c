//! Interactive line editing: echoing, history browsing and tab-completion.
//!
//! The editor reads one key at a time from a [`KeySource`] and echoes to an
//! [`Output`]. A command may span several physical lines: as long as the text typed
//! so far ends inside a quote or after a backslash, another line is read with an
//! empty prompt.
//!
//! Only one read may be active per terminal. The double-tab timestamp lives in the
//! state of that read.

use crate::completion::{Completer, CompletionOption, filter_options, longest_common_prefix};
use crate::error::Error;
use crate::history::BrowseHistory;
use crate::key::{Key, KeySource};
use crate::output::{Output, print_list};
use crate::parser::{escape, parse_command, parse_partial};
use std::io;
use std::time::{Duration, Instant};

/// Two Tab presses within this window list all options.
pub const DOUBLE_TAB_WINDOW: Duration = Duration::from_millis(250);

/// Prints the options offered on a double tab.
pub type OptionsPrinter<'a> = dyn Fn(&mut dyn Output, &[CompletionOption]) -> io::Result<()> + 'a;

/// Collaborators and tuning of a single read.
pub struct ReadCommandOptions<'a> {
    /// Source for Up/Down browsing.
    pub history: Option<&'a dyn BrowseHistory>,
    /// Source of completion options on Tab.
    pub completion: Option<&'a dyn Completer>,
    /// Replaces [`print_options_list`] on double tab.
    pub options_printer: Option<&'a OptionsPrinter<'a>>,
    /// Longest pause between two Tab presses that still lists all options.
    pub double_tab_window: Duration,
}

impl Default for ReadCommandOptions<'_> {
    fn default() -> Self {
        Self {
            history: None,
            completion: None,
            options_printer: None,
            double_tab_window: DOUBLE_TAB_WINDOW,
        }
    }
}

/// Default double-tab listing: options sorted by label, laid out in a grid.
pub fn print_options_list(out: &mut dyn Output, options: &[CompletionOption]) -> io::Result<()> {
    let mut labels: Vec<&str> = options.iter().map(CompletionOption::label).collect();
    labels.sort_unstable();
    print_list(out, &labels)
}

/// Per-read state that survives physical line breaks.
#[derive(Debug, Default)]
struct ReadState {
    /// Time of the last Tab press that inserted nothing.
    pending_tab: Option<Instant>,
}

impl ReadState {
    fn arm_double_tab(&mut self) {
        self.pending_tab = Some(Instant::now());
    }

    fn take_double_tab(&mut self, window: Duration) -> bool {
        let hit = self
            .pending_tab
            .is_some_and(|t| t.elapsed() < window);
        if hit {
            self.pending_tab = None;
        }
        hit
    }
}

/// Buffer and display bookkeeping of one physical line.
struct LineEditor<'a> {
    out: &'a mut dyn Output,
    prompt: Option<&'a str>,
    buffer: String,
    /// Characters currently shown after the prompt.
    shown: usize,
    /// False while typed text must stay hidden.
    echo: bool,
}

impl<'a> LineEditor<'a> {
    fn new(out: &'a mut dyn Output, prompt: Option<&'a str>, echo: bool) -> Self {
        LineEditor {
            out,
            prompt,
            buffer: String::new(),
            shown: 0,
            echo,
        }
    }

    fn print_prompt(&mut self) -> io::Result<()> {
        match self.prompt {
            Some(prompt) => self.out.print(&format!("{prompt}> ")),
            None => Ok(()),
        }
    }

    fn put_str(&mut self, text: &str) -> io::Result<()> {
        self.buffer.push_str(text);
        if !self.echo {
            return Ok(());
        }
        self.shown += text.chars().count();
        self.out.print(text)
    }

    fn put_char(&mut self, ch: char) -> io::Result<()> {
        let mut tmp = [0u8; 4];
        self.put_str(ch.encode_utf8(&mut tmp))
    }

    fn remove_last_char(&mut self) -> io::Result<()> {
        if self.buffer.pop().is_some() && self.shown > 0 {
            self.shown -= 1;
            self.out.print("\x08 \x08")?;
        }
        Ok(())
    }

    fn clear_line(&mut self) -> io::Result<()> {
        self.buffer.clear();
        if self.shown > 0 {
            let back = "\x08".repeat(self.shown);
            let blank = " ".repeat(self.shown);
            self.out.print(&format!("{back}{blank}{back}"))?;
            self.shown = 0;
        }
        Ok(())
    }

    fn replace_line(&mut self, text: &str) -> io::Result<()> {
        self.clear_line()?;
        self.put_str(text)
    }

    fn reprint_line(&mut self) -> io::Result<()> {
        self.print_prompt()?;
        if self.echo {
            self.out.print(&self.buffer)?;
        }
        Ok(())
    }
}

/// Reads one command with history browsing and completion, and returns its tokens.
///
/// An empty line yields an empty token list. Ctrl+C aborts with [`Error::Interrupted`];
/// a failing key source aborts with [`Error::Io`]. The read is bracketed by
/// [`KeySource::begin`] and [`KeySource::end`].
pub fn read_command(
    keys: &mut dyn KeySource,
    out: &mut dyn Output,
    prompt: &str,
    opts: &ReadCommandOptions<'_>,
) -> Result<Vec<String>, Error> {
    with_key_session(keys, |keys| {
        let mut state = ReadState::default();
        let mut text = String::new();
        let mut prompt = prompt;

        loop {
            let line = read_physical_line(keys, out, Some(prompt), &text, opts, &mut state, true)?;
            text.push_str(&line);

            let (tokens, is_complete) = parse_command(&text);
            if is_complete {
                return Ok(tokens);
            }

            // the line break belongs to the open quote or escape
            text.push('\n');
            prompt = "";
        }
    })
}

/// Reads a single raw line without history or completion.
pub fn read_line(keys: &mut dyn KeySource, out: &mut dyn Output) -> Result<String, Error> {
    let opts = ReadCommandOptions::default();
    with_key_session(keys, |keys| {
        read_physical_line(keys, out, None, "", &opts, &mut ReadState::default(), true)
    })
}

/// Reads a single raw line without echoing it, e.g. a password.
///
/// Backspace and Escape still edit the hidden buffer. Only the final line break is
/// printed.
pub fn read_password(keys: &mut dyn KeySource, out: &mut dyn Output) -> Result<String, Error> {
    let opts = ReadCommandOptions::default();
    with_key_session(keys, |keys| {
        read_physical_line(keys, out, None, "", &opts, &mut ReadState::default(), false)
    })
}

/// Reads a single raw line; Up and Down recall entries of `history` verbatim.
pub fn read_line_with_history(
    keys: &mut dyn KeySource,
    out: &mut dyn Output,
    history: &dyn BrowseHistory,
) -> Result<String, Error> {
    let opts = ReadCommandOptions {
        history: Some(history),
        ..Default::default()
    };
    with_key_session(keys, |keys| {
        read_physical_line(keys, out, None, "", &opts, &mut ReadState::default(), true)
    })
}

fn with_key_session<T>(
    keys: &mut dyn KeySource,
    f: impl FnOnce(&mut dyn KeySource) -> Result<T, Error>,
) -> Result<T, Error> {
    keys.begin()?;
    let result = f(&mut *keys);
    let ended = keys.end();
    let value = result?;
    ended?;
    Ok(value)
}

/// Edits one physical line until Enter. `prior` holds the earlier lines of the same
/// command and is only used to tokenize for completion.
fn read_physical_line(
    keys: &mut dyn KeySource,
    out: &mut dyn Output,
    prompt: Option<&str>,
    prior: &str,
    opts: &ReadCommandOptions<'_>,
    state: &mut ReadState,
    echo: bool,
) -> Result<String, Error> {
    let mut editor = LineEditor::new(out, prompt, echo);
    editor.print_prompt()?;

    // None while not browsing, otherwise the index of the shown entry.
    let mut browse: Option<usize> = None;

    loop {
        match keys.read_key()? {
            Key::CtrlC => return Err(Error::Interrupted),

            Key::Enter => {
                editor.out.print("\n")?;
                return Ok(editor.buffer);
            }

            Key::Escape => editor.clear_line()?,

            Key::Backspace => editor.remove_last_char()?,

            Key::Space => editor.put_char(' ')?,

            Key::Char(c) => editor.put_char(c)?,

            Key::Up => {
                if let Some(history) = opts.history {
                    let next = browse.map_or(0, |i| i + 1);
                    if let Some(line) = history.line_at(next) {
                        browse = Some(next);
                        editor.replace_line(&line)?;
                    }
                }
            }

            Key::Down => {
                if let (Some(history), Some(current)) = (opts.history, browse) {
                    match current.checked_sub(1) {
                        Some(prev) => match history.line_at(prev) {
                            Some(line) => {
                                browse = Some(prev);
                                editor.replace_line(&line)?;
                            }
                            None => {
                                // history shrank while browsing
                                browse = None;
                                editor.clear_line()?;
                            }
                        },
                        None => {
                            browse = None;
                            editor.clear_line()?;
                        }
                    }
                }
            }

            Key::Tab => {
                if let Some(completion) = opts.completion {
                    complete(&mut editor, completion, prior, opts, state)?;
                }
            }

            _ => {}
        }
    }
}

fn complete(
    editor: &mut LineEditor<'_>,
    completion: &dyn Completer,
    prior: &str,
    opts: &ReadCommandOptions<'_>,
    state: &mut ReadState,
) -> io::Result<()> {
    let parsed = parse_partial(&format!("{prior}{}", editor.buffer));
    let mut tokens = parsed.tokens;
    if !parsed.last_token_open {
        // a new token has been started (or nothing typed yet)
        tokens.push(String::new());
    }
    let index = tokens.len() - 1;
    let prefix = tokens[index].clone();

    let options = filter_options(completion.complete(&tokens, index), &prefix);
    if options.is_empty() {
        state.arm_double_tab();
        return Ok(());
    }

    if state.take_double_tab(opts.double_tab_window) {
        editor.out.print("\n")?;
        match opts.options_printer {
            Some(printer) => printer(&mut *editor.out, &options)?,
            None => print_options_list(&mut *editor.out, &options)?,
        }
        return editor.reprint_line();
    }

    if let [option] = options.as_slice() {
        if option.replacement().is_empty() {
            state.arm_double_tab();
            return Ok(());
        }
        editor.put_str(&escape(&option.replacement()[prefix.len()..]))?;
        if !option.is_partial() {
            editor.put_char(' ')?;
        }
        return Ok(());
    }

    let suffix = &longest_common_prefix(&options)[prefix.len()..];
    if suffix.is_empty() {
        state.arm_double_tab();
        Ok(())
    } else {
        editor.put_str(&escape(suffix))
    }
}
