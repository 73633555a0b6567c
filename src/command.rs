use crate::completion::{Completer, CompletionOption};
use crate::error::Error;
use crate::output::Output;
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};

/// Handler invoked with the arguments of a command (its name excluded).
pub type ExecHandler = Box<dyn FnMut(&[String], &mut dyn Output) -> Result<()>>;

/// Object-safe trait for anything the environment can dispatch to.
///
/// Returning [`Error::Exit`] from `exec` stops the environment's loop gracefully;
/// [`Error::CommandFaulted`] marks an abrupt failure (see
/// [`Environment::set_recover_faults`](crate::Environment::set_recover_faults)).
pub trait Command {
    /// Unique name the command is registered and invoked under.
    fn name(&self) -> &str;

    /// Completion options for `tokens[index]`. `tokens[0]` is the command name.
    fn complete(&self, _tokens: &[String], _index: usize) -> Vec<CompletionOption> {
        Vec::new()
    }

    fn exec(&mut self, args: &[String], out: &mut dyn Output) -> Result<()>;
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete(&self, tokens: &[String], index: usize) -> Vec<CompletionOption> {
        (**self).complete(tokens, index)
    }

    fn exec(&mut self, args: &[String], out: &mut dyn Output) -> Result<()> {
        (**self).exec(args, out)
    }
}

/// A command assembled from closures.
pub struct CustomCommand {
    name: String,
    completion: Option<Box<dyn Completer>>,
    handler: ExecHandler,
}

impl CustomCommand {
    pub fn new(
        name: impl Into<String>,
        handler: impl FnMut(&[String], &mut dyn Output) -> Result<()> + 'static,
    ) -> Self {
        CustomCommand {
            name: name.into(),
            completion: None,
            handler: Box::new(handler),
        }
    }

    pub fn with_completion(mut self, completion: impl Completer + 'static) -> Self {
        self.completion = Some(Box::new(completion));
        self
    }
}

impl Command for CustomCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete(&self, tokens: &[String], index: usize) -> Vec<CompletionOption> {
        match &self.completion {
            Some(completion) => completion.complete(tokens, index),
            None => Vec::new(),
        }
    }

    fn exec(&mut self, args: &[String], out: &mut dyn Output) -> Result<()> {
        (self.handler)(args, out)
    }
}

/// A command that stops the environment's loop.
pub fn exit_command(name: impl Into<String>) -> CustomCommand {
    CustomCommand::new(name, |_, _| Err(Error::Exit.into()))
}

/// A command without argument completion.
pub fn parameterless_command(
    name: impl Into<String>,
    handler: impl FnMut(&[String], &mut dyn Output) -> Result<()> + 'static,
) -> CustomCommand {
    CustomCommand::new(name, handler)
}

/// Command whose arguments are parsed with [`argh`].
///
/// Wrap it with [`ArgsCommand::into_command`] to register it.
pub trait ArgsCommand: Sized + FromArgs + 'static {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    fn complete(_tokens: &[String], _index: usize) -> Vec<CompletionOption> {
        Vec::new()
    }

    fn execute(self, out: &mut dyn Output) -> Result<()>;

    fn into_command() -> Box<dyn Command> {
        Box::new(Parsed::<Self>(std::marker::PhantomData))
    }
}

struct Parsed<T>(std::marker::PhantomData<T>);

impl<T: ArgsCommand> Command for Parsed<T> {
    fn name(&self) -> &str {
        T::name()
    }

    fn complete(&self, tokens: &[String], index: usize) -> Vec<CompletionOption> {
        T::complete(tokens, index)
    }

    fn exec(&mut self, args: &[String], out: &mut dyn Output) -> Result<()> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match T::from_args(&[T::name()], &args) {
            Ok(cmd) => cmd.execute(out),
            // --help
            Err(EarlyExit { output, status: Ok(()) }) => Ok(out.print(&output)?),
            Err(EarlyExit { output, status: Err(()) }) => Err(anyhow!("{}", output.trim_end())),
        }
    }
}
