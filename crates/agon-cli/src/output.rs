//! Terminal output.
//!
//! Results go to stdout, everything addressed to the person at the keyboard
//! (progress, warnings, session notices) goes to stderr.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

/// Width of the label column in profile listings.
const LABEL_WIDTH: usize = 14;

pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// A notice about the session, such as an expired login.
pub fn alert(msg: &str) {
    eprintln!("{} {}", "!".yellow().bold(), msg);
}

pub fn note(msg: &str) {
    eprintln!("{}", msg.dimmed());
}

/// One line of a label/value listing. Blank or missing values are skipped.
pub fn field<'a>(label: &str, value: impl Into<Option<&'a str>>) {
    let Some(value) = value.into().filter(|v| !v.trim().is_empty()) else {
        return;
    };
    println!("{}", format_field(label, value));
}

fn format_field(label: &str, value: &str) -> String {
    let label = format!("{label}:");
    format!("{} {}", format!("{label:<LABEL_WIDTH$}").dimmed(), value)
}

/// Print a response body, pretty unless `compact`.
pub fn json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}
