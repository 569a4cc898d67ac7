//! Terminal output styling.

use colored::Colorize;

/// Leading marker for a progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Success,
    Error,
    Warning,
    Info,
}

impl StatusIndicator {
    pub fn display(&self) -> String {
        match self {
            StatusIndicator::Success => "✓".green().bold().to_string(),
            StatusIndicator::Error => "✗".red().bold().to_string(),
            StatusIndicator::Warning => "⚠".yellow().bold().to_string(),
            StatusIndicator::Info => "→".dimmed().to_string(),
        }
    }
}

pub fn header(title: &str) -> String {
    format!("=== {} ===", title).bold().to_string()
}

pub fn highlight(text: &str) -> String {
    text.cyan().to_string()
}

pub fn muted(text: &str) -> String {
    text.dimmed().to_string()
}

/// Print `message` prefixed with `indicator`.
pub fn line(indicator: StatusIndicator, message: impl AsRef<str>) {
    println!("{} {}", indicator.display(), message.as_ref());
}
