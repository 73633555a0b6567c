use crate::editor::DOUBLE_TAB_WINDOW;
use log::warn;
use std::env as stdenv;
use std::str::FromStr;
use std::time::Duration;

pub const HISTORY_SIZE_VAR: &str = "PROMPTLINE_HISTORY_SIZE";
pub const DOUBLE_TAB_MS_VAR: &str = "PROMPTLINE_DOUBLE_TAB_MS";
pub const RECOVER_FAULTS_VAR: &str = "PROMPTLINE_RECOVER_FAULTS";
pub const PROMPT_VAR: &str = "PROMPTLINE_PROMPT";

/// Runtime configuration of an [`Environment`](crate::Environment).
///
/// Defaults can be overridden from `PROMPTLINE_*` process variables; malformed
/// values are ignored with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Maximum number of commands kept in history.
    pub history_size: usize,
    /// Two Tab presses within this window list all options.
    pub double_tab_window: Duration,
    /// Route faulted commands to the error handler instead of ending the loop.
    pub recover_faults: bool,
    /// Prompt printed before `> `.
    pub prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_size: 100,
            double_tab_window: DOUBLE_TAB_WINDOW,
            recover_faults: false,
            prompt: String::new(),
        }
    }
}

impl Settings {
    /// Defaults overridden by the current process variables.
    pub fn from_process_env() -> Self {
        Self::from_vars(stdenv::vars())
    }

    /// Defaults overridden by the given `(key, value)` pairs. Unrelated keys are skipped.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                HISTORY_SIZE_VAR => {
                    if let Some(n) = parse_var(key, value) {
                        settings.history_size = n;
                    }
                }
                DOUBLE_TAB_MS_VAR => {
                    if let Some(ms) = parse_var(key, value) {
                        settings.double_tab_window = Duration::from_millis(ms);
                    }
                }
                RECOVER_FAULTS_VAR => {
                    if let Some(flag) = parse_flag(key, value) {
                        settings.recover_faults = flag;
                    }
                }
                PROMPT_VAR => settings.prompt = value.to_string(),
                _ => {}
            }
        }
        settings
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {key}={value:?}: not a number");
            None
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => {
            warn!("ignoring {key}={value:?}: not a boolean");
            None
        }
    }
}
