use crate::command::Command;
use crate::completion::{Completer, CompletionOption};
use crate::editor::{self, ReadCommandOptions};
use crate::error::{Error, is_command_faulted, is_exit};
use crate::history::CommandHistory;
use crate::key::KeySource;
use crate::output::Output;
use crate::settings::Settings;
use crate::terminal::{TerminalInput, TerminalOutput};
use anyhow::Result;
use log::{debug, trace};
use std::collections::BTreeMap;
use std::time::Duration;

/// Produces the prompt before every command.
pub type PromptFn = Box<dyn Fn() -> String>;

/// Called for commands that are not registered.
pub type UnknownCommandHandler = Box<dyn FnMut(&str, &[String], &mut dyn Output) -> Result<()>>;

/// Called with the name, arguments and error of a failed command. Returning `Ok`
/// continues the loop, returning `Err` ends it with that error.
pub type ErrorHandler = Box<dyn FnMut(&str, &[String], &anyhow::Error, &mut dyn Output) -> Result<()>>;

/// An interactive command loop with registered commands, history and completion.
///
/// Example
/// ```
/// use promptline::{CustomCommand, Environment, MemOutput, ScriptedKeys, exit_command};
///
/// let keys = ScriptedKeys::new();
/// keys.push_str("greet world\nexit\n");
/// let out = MemOutput::new();
///
/// let mut env = Environment::new(keys, out.clone());
/// env.register_command(exit_command("exit")).unwrap();
/// env.register_command(CustomCommand::new("greet", |args, out| {
///     out.println(&format!("hello {}", args.join(" ")))?;
///     Ok(())
/// }))
/// .unwrap();
///
/// env.run().unwrap();
/// assert!(out.contents().contains("hello world\n"));
/// ```
pub struct Environment {
    keys: Box<dyn KeySource>,
    out: Box<dyn Output>,
    prompt: PromptFn,
    history: CommandHistory,
    commands: BTreeMap<String, Box<dyn Command>>,
    unknown_command: UnknownCommandHandler,
    unknown_completion: Box<dyn Completer>,
    error_handler: Option<ErrorHandler>,
    recover_faults: bool,
    double_tab_window: Duration,
}

impl Environment {
    /// Environment with default [`Settings`].
    pub fn new(keys: impl KeySource + 'static, out: impl Output + 'static) -> Self {
        Self::with_settings(keys, out, &Settings::default())
    }

    pub fn with_settings(
        keys: impl KeySource + 'static,
        out: impl Output + 'static,
        settings: &Settings,
    ) -> Self {
        let prompt = settings.prompt.clone();
        Environment {
            keys: Box::new(keys),
            out: Box::new(out),
            prompt: Box::new(move || prompt.clone()),
            history: CommandHistory::new(settings.history_size),
            commands: BTreeMap::new(),
            unknown_command: Box::new(reject_unknown),
            unknown_completion: Box::new(|_: &[String], _: usize| Vec::new()),
            error_handler: Some(Box::new(print_error)),
            recover_faults: settings.recover_faults,
            double_tab_window: settings.double_tab_window,
        }
    }

    /// Environment on the process terminal, configured from process variables.
    pub fn terminal() -> Self {
        Self::with_settings(
            TerminalInput::new(),
            TerminalOutput::new(),
            &Settings::from_process_env(),
        )
    }

    pub fn set_prompt(&mut self, prompt: impl Fn() -> String + 'static) {
        self.prompt = Box::new(prompt);
    }

    pub fn set_static_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.prompt = Box::new(move || prompt.clone());
    }

    /// Replaces the default behavior of failing with [`Error::UnknownCommand`].
    pub fn set_unknown_command_handler(
        &mut self,
        handler: impl FnMut(&str, &[String], &mut dyn Output) -> Result<()> + 'static,
    ) {
        self.unknown_command = Box::new(handler);
    }

    /// Completion for arguments of commands that are not registered.
    pub fn set_unknown_completion(&mut self, completion: impl Completer + 'static) {
        self.unknown_completion = Box::new(completion);
    }

    /// Replaces the default handler, which prints `ERR: <error>` and continues.
    pub fn set_error_handler(
        &mut self,
        handler: impl FnMut(&str, &[String], &anyhow::Error, &mut dyn Output) -> Result<()> + 'static,
    ) {
        self.error_handler = Some(Box::new(handler));
    }

    /// Removes the error handler: every command error ends [`run`](Self::run).
    pub fn escalate_errors(&mut self) {
        self.error_handler = None;
    }

    pub fn has_error_handler(&self) -> bool {
        self.error_handler.is_some()
    }

    /// When false (the default), [`Error::CommandFaulted`] ends [`run`](Self::run)
    /// even if an error handler is set.
    pub fn set_recover_faults(&mut self, recover: bool) {
        self.recover_faults = recover;
    }

    pub fn recover_faults(&self) -> bool {
        self.recover_faults
    }

    pub fn set_double_tab_window(&mut self, window: Duration) {
        self.double_tab_window = window;
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    /// The output the editor echoes to and commands print to.
    pub fn output(&mut self) -> &mut dyn Output {
        &mut *self.out
    }

    /// Registers a command under its name.
    ///
    /// Fails for an empty name, a name with whitespace, quotes or backslashes, and for
    /// a name that is already taken.
    pub fn register_command(&mut self, cmd: impl Command + 'static) -> Result<(), Error> {
        let name = cmd.name().to_string();
        if !is_valid_name(&name) {
            return Err(Error::InvalidCommandName(name));
        }
        if self.commands.contains_key(&name) {
            return Err(Error::DuplicateCommand(name));
        }
        debug!("registered command {name:?}");
        self.commands.insert(name, Box::new(cmd));
        Ok(())
    }

    /// Returns false when no command of this name was registered.
    pub fn unregister_command(&mut self, name: &str) -> bool {
        let removed = self.commands.remove(name).is_some();
        if removed {
            debug!("unregistered command {name:?}");
        }
        removed
    }

    /// Registered names in lexicographic order.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Every completion option for `tokens[index]`, unfiltered.
    pub fn completion_options(&self, tokens: &[String], index: usize) -> Vec<CompletionOption> {
        self.registry_completion().complete(tokens, index)
    }

    fn registry_completion(&self) -> RegistryCompletion<'_> {
        RegistryCompletion {
            commands: &self.commands,
            unknown: &*self.unknown_completion,
        }
    }

    /// Reads one command with completion and history. A non-empty command is added
    /// to the history.
    pub fn read_command(&mut self) -> Result<Vec<String>, Error> {
        let prompt = (self.prompt)();
        let completion = RegistryCompletion {
            commands: &self.commands,
            unknown: &*self.unknown_completion,
        };
        let opts = ReadCommandOptions {
            history: Some(&self.history),
            completion: Some(&completion),
            options_printer: None,
            double_tab_window: self.double_tab_window,
        };
        let cmd = editor::read_command(&mut *self.keys, &mut *self.out, &prompt, &opts)?;

        trace!("read command {cmd:?}");
        if !cmd.is_empty() {
            self.history.put(cmd.clone());
        }
        Ok(cmd)
    }

    /// Runs the command `name`, or the unknown-command handler if none is registered.
    pub fn exec_command(&mut self, name: &str, args: &[String]) -> Result<()> {
        match self.commands.get_mut(name) {
            Some(cmd) => {
                debug!("exec {name:?} with {} args", args.len());
                cmd.exec(args, &mut *self.out)
            }
            None => {
                debug!("unknown command {name:?}");
                (self.unknown_command)(name, args, &mut *self.out)
            }
        }
    }

    /// Reads and executes commands until one returns [`Error::Exit`].
    ///
    /// Reading errors, including Ctrl+C, end the loop with that error. Command errors
    /// go to the error handler; without a handler they end the loop. Faulted commands
    /// end the loop unless fault recovery is enabled.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let cmd = self.read_command()?;
            let Some((name, args)) = cmd.split_first() else {
                continue;
            };

            let Err(err) = self.exec_command(name, args) else {
                continue;
            };

            if is_exit(&err) {
                debug!("{name:?} requested exit");
                return Ok(());
            }
            if is_command_faulted(&err) && !self.recover_faults {
                return Err(err);
            }
            match self.error_handler.as_mut() {
                Some(handler) => handler(name, args, &err, &mut *self.out)?,
                None => return Err(err),
            }
        }
    }
}

/// Completes command names at index 0 and delegates arguments to the named command.
struct RegistryCompletion<'a> {
    commands: &'a BTreeMap<String, Box<dyn Command>>,
    unknown: &'a dyn Completer,
}

impl Completer for RegistryCompletion<'_> {
    fn complete(&self, tokens: &[String], index: usize) -> Vec<CompletionOption> {
        if index == 0 {
            return self
                .commands
                .keys()
                .map(|name| CompletionOption::new(name.as_str(), false))
                .collect();
        }
        match tokens.first().and_then(|name| self.commands.get(name)) {
            Some(cmd) => cmd.complete(tokens, index),
            None => self.unknown.complete(tokens, index),
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\'))
}

fn reject_unknown(name: &str, _args: &[String], _out: &mut dyn Output) -> Result<()> {
    Err(Error::UnknownCommand(name.to_string()).into())
}

fn print_error(_name: &str, _args: &[String], err: &anyhow::Error, out: &mut dyn Output) -> Result<()> {
    out.println(&format!("ERR: {err}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CustomCommand, exit_command, parameterless_command};
    use crate::completion::prepare_options;
    use crate::error::{is_interrupted, is_unknown_command};
    use crate::io_adapters::{MemOutput, ScriptedKeys};
    use crate::key::Key;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Printed = Rc<RefCell<String>>;

    fn print_handler(sink: Printed) -> impl FnMut(&[String], &mut dyn Output) -> Result<()> {
        move |args: &[String], _: &mut dyn Output| {
            let mut sink = sink.borrow_mut();
            for arg in args {
                sink.push_str(&format!(">{arg}<"));
            }
            sink.push('|');
            Ok(())
        }
    }

    fn prepare_test_env() -> (Environment, ScriptedKeys, MemOutput, Printed) {
        let keys = ScriptedKeys::new();
        let out = MemOutput::new();
        let printed = Printed::default();

        let mut env = Environment::new(keys.clone(), out.clone());
        env.register_command(exit_command("exit")).unwrap();
        env.register_command(
            CustomCommand::new("print", print_handler(printed.clone())).with_completion(
                |_: &[String], _: usize| {
                    vec![
                        CompletionOption::labelled("FOO", "foo", false),
                        CompletionOption::labelled("FOO", "bar", false),
                        CompletionOption::labelled("PART", "part", true),
                    ]
                },
            ),
        )
        .unwrap();
        (env, keys, out, printed)
    }

    fn replace_print(env: &mut Environment, printed: &Printed, words: &'static [&'static str]) {
        assert!(env.unregister_command("print"));
        env.register_command(
            CustomCommand::new("print", print_handler(printed.clone()))
                .with_completion(move |_: &[String], _: usize| prepare_options(words, false)),
        )
        .unwrap();
    }

    #[test]
    fn test_history_browsing() {
        let (mut env, keys, _, printed) = prepare_test_env();
        keys.push_keys(&[Key::Up, Key::Down]);
        keys.push_str("\n");
        keys.push_str("p\tf\t\n");
        keys.push_keys(&[Key::Up]);
        keys.push_str("\nprint 1\nprint 2\n");
        keys.push_keys(&[Key::Up, Key::Up]);
        keys.push_str("\n");
        keys.push_keys(&[Key::Down, Key::Up, Key::Up, Key::Down]);
        keys.push_str("\n");
        keys.push_keys(&[Key::Up; 6]);
        keys.push_str("\nexit\n");

        env.run().unwrap();
        assert_eq!(*printed.borrow(), ">foo<|>foo<|>1<|>2<|>1<|>1<|>foo<|");
        assert!(keys.is_consumed());

        let lines: Vec<String> = env.history().iter().map(|c| c.join(" ")).collect();
        assert_eq!(lines, vec!["exit", "print foo", "print 1", "print 2"]);
    }

    #[test]
    fn test_simple_completion() {
        let (mut env, keys, _, printed) = prepare_test_env();
        keys.push_str("p\tf\t\np\tb\t\nexit\n");
        env.run().unwrap();
        assert_eq!(*printed.borrow(), ">foo<|>bar<|");
        assert!(keys.is_consumed());
    }

    #[test]
    fn test_partial_completion() {
        let (mut env, keys, _, printed) = prepare_test_env();
        keys.push_str("p\tf\t_\np\tp\t_\nexit\n");
        env.run().unwrap();
        assert_eq!(*printed.borrow(), ">foo<>_<|>part_<|");
        assert!(keys.is_consumed());
    }

    #[test]
    fn test_empty_input_completion() {
        let (mut env, keys, _, printed) = prepare_test_env();
        assert!(env.unregister_command("print"));
        keys.push_str("\t\n");
        env.run().unwrap();
        assert_eq!(*printed.borrow(), "");
        assert!(keys.is_consumed());
    }

    #[test]
    fn test_single_option_completion() {
        let (mut env, keys, _, printed) = prepare_test_env();
        replace_print(&mut env, &printed, &["test"]);
        keys.push_str("p\t\t\nexit\n");
        env.run().unwrap();
        assert_eq!(*printed.borrow(), ">test<|");
        assert!(keys.is_consumed());
    }

    #[test]
    fn test_longest_prefix_completion() {
        let (mut env, keys, _, printed) = prepare_test_env();
        replace_print(&mut env, &printed, &["foobar1", "foobar2", "foobar21"]);
        keys.push_str("p\tf\t1\np\tf\t2\t1\nexit\n");
        env.run().unwrap();
        assert_eq!(*printed.borrow(), ">foobar1<|>foobar21<|");
        assert!(keys.is_consumed());
    }

    #[test]
    fn test_double_tab_lists_command_names() {
        let (mut env, keys, out, _) = prepare_test_env();
        env.set_double_tab_window(Duration::from_secs(60));
        env.set_static_prompt("app");
        keys.push_str("\t\t\x03");

        let err = env.run().unwrap_err();
        assert!(is_interrupted(&err));
        assert_eq!(out.contents(), "app> \nexit  print\napp> ");
    }

    #[test]
    fn test_registration_rules() {
        let (mut env, _, _, _) = prepare_test_env();
        assert!(matches!(
            env.register_command(exit_command("exit")),
            Err(Error::DuplicateCommand(name)) if name == "exit"
        ));
        for bad in ["", "two words", "quo\"te", "tab\there", "back\\slash"] {
            assert!(matches!(
                env.register_command(exit_command(bad)),
                Err(Error::InvalidCommandName(_))
            ));
        }
        assert!(!env.unregister_command("missing"));
        assert_eq!(env.command_names().collect::<Vec<_>>(), vec!["exit", "print"]);
    }

    #[test]
    fn test_completion_options() {
        let (mut env, _, _, _) = prepare_test_env();
        let names: Vec<String> = env
            .completion_options(&[String::new()], 0)
            .iter()
            .map(|o| o.replacement().to_string())
            .collect();
        assert_eq!(names, vec!["exit", "print"]);

        let tokens = vec!["print".to_string(), String::new()];
        assert_eq!(env.completion_options(&tokens, 1).len(), 3);

        let unknown = vec!["nope".to_string(), String::new()];
        assert!(env.completion_options(&unknown, 1).is_empty());
        env.set_unknown_completion(|_: &[String], _: usize| prepare_options(&["any"], false));
        assert_eq!(env.completion_options(&unknown, 1)[0].replacement(), "any");
    }

    #[test]
    fn test_default_error_handler_continues() {
        let (mut env, keys, out, printed) = prepare_test_env();
        env.register_command(parameterless_command("fail", |_, _| Err(anyhow::anyhow!("boom"))))
            .unwrap();
        keys.push_str("fail\nnope 1\nprint x\nexit\n");

        env.run().unwrap();
        assert_eq!(*printed.borrow(), ">x<|");
        let text = out.contents();
        assert!(text.contains("ERR: boom\n"));
        assert!(text.contains("ERR: unknown command \"nope\"\n"));
    }

    #[test]
    fn test_error_handler_can_stop_loop() {
        let (mut env, keys, _, printed) = prepare_test_env();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        env.set_error_handler(move |name, args, err, _| {
            log.borrow_mut().push(format!("{name} {args:?}"));
            if is_unknown_command(err) {
                Ok(())
            } else {
                Err(anyhow::anyhow!("stopped after {name}"))
            }
        });
        env.register_command(parameterless_command("fail", |_, _| Err(anyhow::anyhow!("boom"))))
            .unwrap();
        keys.push_str("nope\nfail a\nprint never\nexit\n");

        let err = env.run().unwrap_err();
        assert_eq!(err.to_string(), "stopped after fail");
        assert_eq!(*seen.borrow(), vec!["nope []", "fail [\"a\"]"]);
        assert_eq!(*printed.borrow(), "");
        assert!(!keys.is_consumed());
    }

    #[test]
    fn test_without_error_handler_errors_escalate() {
        let (mut env, keys, _, _) = prepare_test_env();
        env.escalate_errors();
        assert!(!env.has_error_handler());
        keys.push_str("nope\nexit\n");

        let err = env.run().unwrap_err();
        assert!(is_unknown_command(&err));
    }

    #[test]
    fn test_faults_end_loop_unless_recovered() {
        let (mut env, keys, out, _) = prepare_test_env();
        env.register_command(parameterless_command("crash", |_, _| Err(Error::fault("index out of range").into())))
            .unwrap();

        keys.push_str("crash\n");
        let err = env.run().unwrap_err();
        assert!(is_command_faulted(&err));
        assert!(!out.contents().contains("ERR:"));

        env.set_recover_faults(true);
        keys.push_str("crash\nexit\n");
        env.run().unwrap();
        assert!(out.contents().contains("ERR: command faulted: index out of range\n"));
        assert!(keys.is_consumed());
    }

    #[test]
    fn test_commands_run_outside_key_session() {
        let (mut env, keys, _, _) = prepare_test_env();
        let watcher = keys.clone();
        let active = Rc::new(RefCell::new(Vec::new()));
        let record = active.clone();
        env.register_command(parameterless_command("check", move |_, _| {
            record.borrow_mut().push(watcher.is_session_active());
            Ok(())
        }))
        .unwrap();
        keys.push_str("check\nexit\n");
        env.run().unwrap();
        assert_eq!(*active.borrow(), vec![false]);
    }

    #[test]
    fn test_read_errors_propagate() {
        let (mut env, keys, _, _) = prepare_test_env();
        keys.push_str("print");
        let err = env.run().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof
        ));
        assert!(env.history().is_empty());
    }

    #[test]
    fn test_dynamic_prompt_and_settings() {
        let settings = Settings {
            history_size: 1,
            prompt: "ignored".to_string(),
            ..Settings::default()
        };
        let keys = ScriptedKeys::new();
        let out = MemOutput::new();
        let mut env = Environment::with_settings(keys.clone(), out.clone(), &settings);
        let counter = Rc::new(RefCell::new(0));
        let tick = counter.clone();
        env.set_prompt(move || {
            *tick.borrow_mut() += 1;
            format!("#{}", tick.borrow())
        });

        keys.push_str("a\nb\n");
        assert_eq!(env.read_command().unwrap(), vec!["a"]);
        assert_eq!(env.read_command().unwrap(), vec!["b"]);
        assert_eq!(out.contents(), "#1> a\n#2> b\n");
        assert_eq!(env.history().len(), 1);
    }
}
