//! Styled terminal output utilities.

use erd_migrate::{Direction, MigrationState, StatusEntry};
use owo_colors::OwoColorize;

/// Width that `kv` pads keys to
const KEY_WIDTH: usize = 10;

/// Print a command title, underlined to its display width
pub fn header(text: &str) {
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.chars().count()).dimmed());
    println!();
}

/// Print the erd banner
pub fn logo() {
    println!("{}", "erd · schema migrations".bright_cyan().bold());
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair; short keys are padded so values line up
pub fn kv(key: &str, value: &str) {
    let key = format!("{}:", key);
    println!("  {:<width$} {}", key.dimmed(), value, width = KEY_WIDTH);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print an info message
pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Print a warning message
pub fn warn(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a step indicator
pub fn step(current: usize, total: usize, text: &str) {
    println!("{} {}", format!("[{}/{}]", current, total).dimmed(), text);
}

/// Print a list item
pub fn list_item(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

/// Style text as success (green)
pub fn style_success(text: &str) -> String {
    text.green().to_string()
}

/// Style text as pending (yellow)
pub fn style_pending(text: &str) -> String {
    text.yellow().to_string()
}

/// Style text as error (red)
pub fn style_error(text: &str) -> String {
    text.red().to_string()
}

/// Fixed-width status badge for the status table
pub fn state_badge(state: MigrationState) -> String {
    match state {
        MigrationState::Up => style_success("  up  "),
        MigrationState::Down => style_pending(" down "),
    }
}

/// Fixed-width direction label for run reports
pub fn direction_label(direction: Direction) -> String {
    match direction {
        Direction::Up => style_success("up  "),
        Direction::Down => style_pending("down"),
    }
}

/// Print one row of the status table; orphaned names are shown in red
pub fn status_row(entry: &StatusEntry, width: usize) {
    let name = if entry.is_orphan() {
        style_error(&entry.name)
    } else {
        entry.name.clone()
    };
    println!(
        " {}   {:<width$}  {}",
        state_badge(entry.status),
        entry.version.as_str(),
        name
    );
}
