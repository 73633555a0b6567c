use anyhow::{Context, Result, anyhow};
use argh::FromArgs;
use log::info;
use promptline::error::is_interrupted;
use promptline::{
    ArgsCommand, Completer, CompletionOption, Environment, Error, FixedArgCompletion,
    LocalFileSystemArgCompletion, Output, Settings, TerminalInput, TerminalOutput, exit_command,
    parameterless_command, print_list,
};
use std::env;
use std::fs;
use std::path::{MAIN_SEPARATOR, PathBuf};
use std::time::Duration;

#[derive(FromArgs)]
/// Small interactive shell showing off history, tab-completion and command dispatch.
/// PROMPTLINE_* variables provide the defaults for every option.
struct Args {
    #[argh(option)]
    /// number of commands kept in history
    history_size: Option<usize>,

    #[argh(option)]
    /// double-tab window in milliseconds
    double_tab_ms: Option<u64>,

    #[argh(switch)]
    /// keep running after a command faults
    recover_faults: bool,

    #[argh(option)]
    /// static prompt; defaults to the current directory
    prompt: Option<String>,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut settings = Settings::from_process_env();
        if let Some(n) = self.history_size {
            settings.history_size = n;
        }
        if let Some(ms) = self.double_tab_ms {
            settings.double_tab_window = Duration::from_millis(ms);
        }
        if self.recover_faults {
            settings.recover_faults = true;
        }
        if let Some(prompt) = &self.prompt {
            settings.prompt = prompt.clone();
        }
        settings
    }
}

#[derive(FromArgs)]
/// Write arguments to the standard output.
struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline
    no_newline: bool,

    #[argh(positional, greedy)]
    /// words to print
    words: Vec<String>,
}

impl ArgsCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, out: &mut dyn Output) -> Result<()> {
        out.print(&self.words.join(" "))?;
        if !self.no_newline {
            out.print("\n")?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Change the current working directory. Defaults to $HOME.
struct Cd {
    #[argh(positional)]
    /// directory to switch to
    target: Option<String>,
}

impl ArgsCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn complete(tokens: &[String], index: usize) -> Vec<CompletionOption> {
        FixedArgCompletion::new(vec![Box::new(LocalFileSystemArgCompletion::new(false))])
            .complete(tokens, index)
    }

    fn execute(self, _out: &mut dyn Output) -> Result<()> {
        let target = match self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => env::var("HOME")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("cd: no target and HOME not set"))?,
        };
        env::set_current_dir(&target).with_context(|| format!("cd: {}", target.display()))
    }
}

#[derive(FromArgs)]
/// Print the contents of a file.
struct Cat {
    #[argh(positional)]
    /// file to print
    file: String,
}

impl ArgsCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn complete(tokens: &[String], index: usize) -> Vec<CompletionOption> {
        FixedArgCompletion::new(vec![Box::new(LocalFileSystemArgCompletion::new(true))])
            .complete(tokens, index)
    }

    fn execute(self, out: &mut dyn Output) -> Result<()> {
        let text = fs::read_to_string(&self.file).with_context(|| format!("cat: {}", self.file))?;
        out.print(&text)?;
        if !text.is_empty() && !text.ends_with('\n') {
            out.print("\n")?;
        }
        Ok(())
    }
}

fn list_dir(out: &mut dyn Output) -> Result<()> {
    let mut names = Vec::new();
    for entry in fs::read_dir(".").context("ls")? {
        let entry = entry?;
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() {
            name.push(MAIN_SEPARATOR);
        }
        names.push(name);
    }
    names.sort();
    print_list(out, &names)?;
    Ok(())
}

fn cwd_prompt() -> String {
    env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default()
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();
    let settings = args.settings();

    let mut cle = Environment::with_settings(TerminalInput::new(), TerminalOutput::new(), &settings);
    if settings.prompt.is_empty() {
        cle.set_prompt(cwd_prompt);
    }

    cle.register_command(exit_command("exit"))?;
    cle.register_command(Echo::into_command())?;
    cle.register_command(Cd::into_command())?;
    cle.register_command(Cat::into_command())?;
    cle.register_command(parameterless_command("ls", |_, out| list_dir(out)))?;
    cle.register_command(parameterless_command("fail", |args, _| {
        Err(anyhow!("{}", args.join(" ")))
    }))?;
    cle.register_command(parameterless_command("fault", |args, _| {
        Err(Error::fault(args.join(" ")).into())
    }))?;

    info!(
        "starting with history size {} and recover_faults={}",
        settings.history_size, settings.recover_faults
    );
    match cle.run() {
        Err(e) if is_interrupted(&e) => {
            println!();
            Ok(())
        }
        other => other,
    }
}
