//! Styled terminal output utilities.

use notekeep_mongodb::Note;
use owo_colors::OwoColorize;

/// Print a header/title
pub fn header(text: &str) {
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.chars().count()).dimmed());
    println!();
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
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

/// Print one note as a single summary line
pub fn note_line(note: &Note) {
    println!(
        "  {}  {}  {}",
        note.id.to_hex().dimmed(),
        note.updated_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
        note.title.bold()
    );
}

/// Print every field of a note
pub fn note_detail(note: &Note) {
    section(&note.title);
    kv("id", &note.id.to_hex());
    kv("created", &note.created_at.to_rfc3339());
    kv("updated", &note.updated_at.to_rfc3339());
    newline();
    for line in note.body.lines() {
        println!("  {}", line);
    }
}
