//! Interactive command line input: line editing, history, tab-completion and command
//! dispatch.
//!
//! The line editor in [`editor`] turns key presses from a [`KeySource`] into a command
//! line, echoing to an [`Output`]. Commands are split into tokens shell-style (see
//! [`parse_command`]) and may continue over several lines while a quote is open or a
//! line ends in a backslash. Up and Down browse the history; Tab completes the token
//! under the cursor, and a second Tab shortly after an ambiguous one lists all
//! options.
//!
//! The main entry point is [`Environment`], which owns a set of named [`Command`]s and
//! runs a read-execute loop over them. [`Environment::terminal`] wires it to the
//! process terminal through `crossterm`; [`ScriptedKeys`] and [`MemOutput`] drive it
//! from memory.

pub mod command;
pub mod completion;
pub mod editor;
mod environment;
pub mod error;
pub mod history;
mod io_adapters;
mod key;
mod output;
mod parser;
pub mod settings;
mod terminal;

pub use command::{ArgsCommand, Command, CustomCommand, exit_command, parameterless_command};
pub use completion::{
    ArgCompletion, Completer, CompletionOption, FixedArgCompletion, LocalFileSystemArgCompletion,
    OneOfArgCompletion, local_file_system_completion,
};
pub use editor::{
    ReadCommandOptions, read_command, read_line, read_line_with_history, read_password,
};
pub use environment::{Environment, ErrorHandler, PromptFn, UnknownCommandHandler};
pub use error::Error;
pub use history::{CommandHistory, History, LineHistory};
pub use io_adapters::{MemOutput, ScriptedKeys};
pub use key::{Key, KeySource};
pub use output::{Output, print_list};
pub use parser::{escape, format_command, needs_quote, parse_command, quote};
pub use settings::Settings;
pub use terminal::{TerminalInput, TerminalOutput};
