//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use predictor_lib::{health::ComponentStatus, Severity};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any response as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a percentage the way the result panel shows it
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Format a probability as a percentage
pub fn format_probability(probability: f64) -> String {
    format_percent(probability * 100.0)
}

/// Color a headline by severity
pub fn color_severity(severity: Severity, text: &str) -> String {
    match severity {
        Severity::Warning => text.red().bold().to_string(),
        Severity::Success => text.green().bold().to_string(),
    }
}

/// Color a component status
pub fn color_status(status: ComponentStatus) -> String {
    match status {
        ComponentStatus::Healthy => "healthy".green().to_string(),
        ComponentStatus::Degraded => "degraded".yellow().to_string(),
        ComponentStatus::Unhealthy => "unhealthy".red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(72.06), "72.06%");
        assert_eq!(format_percent(70.0), "70.00%");
        assert_eq!(format_probability(0.25), "25.00%");
    }

    #[test]
    fn test_color_status_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(color_status(ComponentStatus::Degraded), "degraded");
        assert_eq!(color_severity(Severity::Success, "ok"), "ok");
    }
}
