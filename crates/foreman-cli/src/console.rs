//! CLI console utilities

use colored::*;
use foreman_core::TraceLevel;

/// CLI console for formatted output
pub struct CliConsole {
    verbose: bool,
}

impl CliConsole {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message (verbose only)
    pub fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    /// Print a header
    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.len()).dimmed());
    }

    /// Print table header
    pub fn print_table_header(&self, headers: &[&str]) {
        let header_line = headers
            .iter()
            .map(|h| format!("{:<20}", h.bold()))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", header_line);
        println!("{}", "-".repeat(headers.len() * 21).dimmed());
    }

    /// Print table row
    pub fn print_table_row(&self, values: &[&str]) {
        let row_line = values
            .iter()
            .map(|v| format!("{:<20}", v))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", row_line);
    }

    /// Print raw text to stdout, unstyled
    pub fn plain(&self, text: &str) {
        println!("{}", text);
    }
}

/// Level name colored the way the trace viewer shows it
pub fn colored_level(level: TraceLevel) -> ColoredString {
    let name = format!("{:<5}", level.as_str());
    match level {
        TraceLevel::Trace => name.dimmed(),
        TraceLevel::Debug => name.cyan(),
        TraceLevel::Info => name.green(),
        TraceLevel::Warn => name.yellow(),
        TraceLevel::Error => name.red().bold(),
    }
}
