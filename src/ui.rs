// UI layer: everything that touches the terminal. Results go to stdout,
// warnings and errors to stderr, and a spinner is drawn while a request is
// in flight.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Result;
use crossterm::style::{style, Stylize};
use crossterm::tty::IsTty;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Number;

use crate::token::mask_token;

/// Run `f` with a spinner on stderr. indicatif draws nothing when stderr
/// is not a terminal, so piped output stays clean.
pub fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}

/// Balances are printed exactly as the server sent them (`42`, `-3`, `1.5`).
pub fn format_balance(balance: &Number) -> String {
    balance.to_string()
}

pub fn print_balance(balance: &Number) {
    println!("{}", format_balance(balance));
}

pub fn warn(message: impl Display) {
    eprintln!("{} {}", label("WARNING:", Label::Warning), message);
}

pub fn error(message: impl Display) {
    eprintln!("{} {}", label("ERROR:", Label::Error), message);
}

enum Label {
    Warning,
    Error,
}

fn label(text: &str, kind: Label) -> String {
    if !std::io::stderr().is_tty() {
        return text.to_string();
    }
    match kind {
        Label::Warning => style(text).yellow().bold().to_string(),
        Label::Error => style(text).red().bold().to_string(),
    }
}

/// Whether prompts can be shown.
pub fn is_interactive() -> bool {
    std::io::stdout().is_tty()
}

/// Ask for a new API token. The current token is offered as a masked
/// default; accepting it returns `None` (keep the current token).
pub fn prompt_for_token(current: &str) -> Result<Option<String>> {
    let mask = mask_token(current);
    let mut input = Input::<String>::new();
    input.with_prompt("Alces Flight Center API token");
    if let Some(mask) = &mask {
        input.default(mask.clone()).show_default(true);
    }
    let answer = input.interact_text()?;
    Ok(resolve_answer(answer, mask.as_deref()))
}

fn resolve_answer(answer: String, mask: Option<&str>) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() || Some(answer) == mask {
        None
    } else {
        Some(answer.to_string())
    }
}
