//! Shell-like splitting of a command line into tokens, and the inverse formatting.

/// Scanner state. Escapes remember whether they were started inside double quotes.
///
/// An escaped character is always taken literally; the escape only decides which
/// state scanning returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParsingState {
    Unquoted,
    Escape,
    SingleQuote,
    DoubleQuote,
    DoubleQuoteEscape,
}

/// Result of scanning a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedLine {
    pub tokens: Vec<String>,
    /// False when the input ends inside a quote or after an unconsumed backslash.
    pub is_complete: bool,
    /// True when the last entry of `tokens` was still being typed at the end of the input.
    pub last_token_open: bool,
}

struct CommandFSM {
    state: ParsingState,
    tokens: Vec<String>,
    buffer: String,
}

impl CommandFSM {
    fn new() -> Self {
        CommandFSM {
            state: ParsingState::Unquoted,
            tokens: Vec::new(),
            buffer: String::new(),
        }
    }

    fn run(mut self, input: &str) -> ParsedLine {
        for ch in input.chars() {
            match self.state {
                ParsingState::Unquoted => self.handle_unquoted(ch),
                ParsingState::Escape => {
                    self.buffer.push(ch);
                    self.state = ParsingState::Unquoted;
                }
                ParsingState::SingleQuote => self.handle_single_quote(ch),
                ParsingState::DoubleQuote => self.handle_double_quote(ch),
                ParsingState::DoubleQuoteEscape => {
                    self.buffer.push(ch);
                    self.state = ParsingState::DoubleQuote;
                }
            }
        }

        let last_token_open = !self.buffer.is_empty();
        self.flush();

        ParsedLine {
            tokens: self.tokens,
            is_complete: self.state == ParsingState::Unquoted,
            last_token_open,
        }
    }

    fn handle_unquoted(&mut self, ch: char) {
        match ch {
            '\\' => self.state = ParsingState::Escape,
            '\'' => self.state = ParsingState::SingleQuote,
            '"' => self.state = ParsingState::DoubleQuote,
            ' ' => self.flush(),
            c => self.buffer.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = ParsingState::Unquoted,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = ParsingState::Unquoted,
            '\\' => self.state = ParsingState::DoubleQuoteEscape,
            c => self.buffer.push(c),
        }
    }

    /// Emits the accumulated token. Empty accumulators never produce a token.
    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.tokens.push(std::mem::take(&mut self.buffer));
        }
    }
}

pub(crate) fn parse_partial(input: &str) -> ParsedLine {
    CommandFSM::new().run(input)
}

/// Splits a command line into tokens, honoring backslash escapes, single quotes and double quotes.
///
/// # Returns
/// The tokens and a flag that is `false` when the input ended inside a quote or directly
/// after a backslash. Callers reading interactively should then continue with the next line.
///
/// ```
/// use promptline::parse_command;
/// let (tokens, complete) = parse_command(r#"echo "a b" c\ d"#);
/// assert_eq!(tokens, vec!["echo", "a b", "c d"]);
/// assert!(complete);
/// ```
pub fn parse_command(input: &str) -> (Vec<String>, bool) {
    let parsed = parse_partial(input);
    (parsed.tokens, parsed.is_complete)
}

/// Formats tokens as a single command line. Inverse of [`parse_command`] for tokens
/// produced by it.
pub fn format_command<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| quote(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wraps the token in double quotes when [`needs_quote`] says so.
pub fn quote(token: &str) -> String {
    if needs_quote(token) {
        format!("\"{}\"", token.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        token.to_string()
    }
}

/// True when the token contains characters that would split it on re-parsing.
pub fn needs_quote(token: &str) -> bool {
    token.contains(' ')
}

/// Escapes every character that is special in an unquoted command line.
///
/// Stronger than [`quote`]: the result stays valid when typed directly into the
/// editing buffer, which is how completion suffixes are inserted.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '"' | '\'' | ' ' | '\n' | '\r') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
