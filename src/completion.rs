//! Completion options and the helpers to build and narrow them down.

use log::debug;
use std::fmt;
use std::fs;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// One possible value for the token that is currently typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOption {
    label: Option<String>,
    replacement: String,
    partial: bool,
}

impl CompletionOption {
    /// An option without a label; listings show the replacement.
    pub fn new(replacement: impl Into<String>, partial: bool) -> Self {
        Self {
            label: None,
            replacement: replacement.into(),
            partial,
        }
    }

    /// An option that is listed as `label` but inserts `replacement`.
    pub fn labelled(label: impl Into<String>, replacement: impl Into<String>, partial: bool) -> Self {
        Self {
            label: Some(label.into()),
            replacement: replacement.into(),
            partial,
        }
    }

    /// Full text of the completed token, including what has already been typed.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Partial options are not a final value (e.g. a directory), so no separator
    /// is inserted after them.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn label(&self) -> &str {
        match &self.label {
            Some(label) if !label.is_empty() => label,
            _ => &self.replacement,
        }
    }
}

impl fmt::Display for CompletionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Turns plain words into options sharing the same `partial` flag.
pub fn prepare_options<S: AsRef<str>>(list: &[S], partial: bool) -> Vec<CompletionOption> {
    list.iter()
        .map(|s| CompletionOption::new(s.as_ref(), partial))
        .collect()
}

/// Keeps the options whose replacement starts with `prefix`.
pub fn filter_options(options: Vec<CompletionOption>, prefix: &str) -> Vec<CompletionOption> {
    options
        .into_iter()
        .filter(|o| o.replacement.starts_with(prefix))
        .collect()
}

/// Longest prefix shared by the replacements of all options. Empty for no options.
pub fn longest_common_prefix(options: &[CompletionOption]) -> &str {
    let Some(first) = options.first() else {
        return "";
    };
    let first = first.replacement.as_str();

    let mut longest = 0;
    for (idx, ch) in first.char_indices() {
        let end = idx + ch.len_utf8();
        let prefix = &first[..end];
        if !options.iter().all(|o| o.replacement.starts_with(prefix)) {
            break;
        }
        longest = end;
    }
    &first[..longest]
}

/// Completion for a whole command: receives all tokens and the index of the token
/// being completed, and returns every option for it.
///
/// The options must include the text typed so far; the editor filters them by it.
pub trait Completer {
    fn complete(&self, tokens: &[String], index: usize) -> Vec<CompletionOption>;
}

impl<F> Completer for F
where
    F: Fn(&[String], usize) -> Vec<CompletionOption>,
{
    fn complete(&self, tokens: &[String], index: usize) -> Vec<CompletionOption> {
        self(tokens, index)
    }
}

/// Completion of a single positional argument.
pub trait ArgCompletion {
    fn options(&self, tokens: &[String], index: usize) -> Vec<CompletionOption>;
}

/// Command completion built from one [`ArgCompletion`] per positional argument.
///
/// Token 1 is completed by the first argument completion, token 2 by the second and
/// so on. Tokens past the last argument get no options.
pub struct FixedArgCompletion {
    args: Vec<Box<dyn ArgCompletion>>,
}

impl FixedArgCompletion {
    pub fn new(args: Vec<Box<dyn ArgCompletion>>) -> Self {
        Self { args }
    }
}

impl Completer for FixedArgCompletion {
    fn complete(&self, tokens: &[String], index: usize) -> Vec<CompletionOption> {
        match index.checked_sub(1).and_then(|i| self.args.get(i)) {
            Some(arg) => arg.options(tokens, index),
            None => Vec::new(),
        }
    }
}

/// A fixed list of final words.
pub struct OneOfArgCompletion {
    options: Vec<CompletionOption>,
}

impl OneOfArgCompletion {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        Self {
            options: prepare_options(words, false),
        }
    }
}

impl ArgCompletion for OneOfArgCompletion {
    fn options(&self, _tokens: &[String], _index: usize) -> Vec<CompletionOption> {
        self.options.clone()
    }
}

/// Browses the local file system relative to the process working directory.
pub struct LocalFileSystemArgCompletion {
    pub with_files: bool,
}

impl LocalFileSystemArgCompletion {
    pub fn new(with_files: bool) -> Self {
        Self { with_files }
    }
}

impl ArgCompletion for LocalFileSystemArgCompletion {
    fn options(&self, tokens: &[String], index: usize) -> Vec<CompletionOption> {
        let entry = tokens.get(index).map(String::as_str).unwrap_or("");
        match local_file_system_completion(None, entry, self.with_files) {
            Ok(options) => options,
            Err(e) => {
                debug!("path completion for {entry:?} failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Lists the file system entries that may complete the path `entry`.
///
/// `working_dir` defaults to the process working directory and is ignored for absolute
/// entries. An entry ending in the path separator lists that directory, any other entry
/// lists its parent so that the typed file name acts as a prefix.
///
/// Directories become partial options ending in the separator; files are only included
/// with `with_files` and become final options. Replacements of relative entries are
/// relative to the working directory.
pub fn local_file_system_completion(
    working_dir: Option<&Path>,
    entry: &str,
    with_files: bool,
) -> io::Result<Vec<CompletionOption>> {
    let working_dir = match working_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let entry_path = Path::new(entry);
    let absolute = entry_path.is_absolute();
    let lists_entry = entry.is_empty() || entry.ends_with(MAIN_SEPARATOR) || entry.ends_with('/');

    // Directory to read, and the textual prefix every replacement starts with.
    let (dir, typed_dir): (PathBuf, String) = if lists_entry {
        let dir = if absolute {
            entry_path.to_path_buf()
        } else {
            working_dir.join(entry_path)
        };
        (dir, entry.to_string())
    } else {
        let typed_dir = match entry.rfind(['/', MAIN_SEPARATOR]) {
            Some(pos) => entry[..=pos].to_string(),
            None => String::new(),
        };
        let dir = if absolute {
            PathBuf::from(&typed_dir)
        } else {
            working_dir.join(&typed_dir)
        };
        (dir, typed_dir)
    };

    let mut options = Vec::new();
    for dir_entry in fs::read_dir(&dir)? {
        let dir_entry = dir_entry?;
        let is_dir = dir_entry.file_type()?.is_dir();
        if !is_dir && !with_files {
            continue;
        }

        let name = dir_entry.file_name().to_string_lossy().into_owned();
        let mut label = name.clone();
        let mut replacement = format!("{typed_dir}{name}");
        if is_dir {
            label.push(MAIN_SEPARATOR);
            replacement.push(MAIN_SEPARATOR);
        }
        options.push(CompletionOption::labelled(label, replacement, is_dir));
    }
    options.sort_by(|a, b| a.replacement.cmp(&b.replacement));
    Ok(options)
}
