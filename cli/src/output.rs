//! Terminal output utilities for styled CLI output.
//!
//! This module provides a consistent interface for printing styled output
//! to the terminal, replacing direct `println!` calls with structured output.

use console::{Term, style};
use std::fmt::Display;
use storedesk_business::{Notification, NotificationLevel};

/// Terminal output helper for consistent styled output.
pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper writing to stdout.
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Print a success message with a green checkmark.
    pub fn success(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✓").green().bold(), message)),
        );
    }

    /// Print an error message with a red X.
    pub fn error(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✗").red().bold(), message)),
        );
    }

    /// Print a warning message with a yellow warning sign.
    pub fn warning(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("⚠").yellow().bold(), message)),
        );
    }

    pub fn notification(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Success => self.success(&notification.message),
            NotificationLevel::Error => self.error(&notification.message),
        }
    }

    /// Print a plain message without any prefix.
    pub fn print(&self, message: impl Display) {
        drop(self.term.write_line(&message.to_string()));
    }

    /// Print a header with emphasis.
    pub fn header(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&style(message).bold().cyan().to_string()),
        );
    }

    /// Print a divider line.
    pub fn divider(&self, width: usize) {
        drop(
            self.term
                .write_line(&style("─".repeat(width)).dim().to_string()),
        );
    }

    /// Print a labeled value with indentation.
    pub fn labeled_indent(&self, label: impl Display, value: impl Display, indent: usize) {
        let spaces = " ".repeat(indent);
        drop(
            self.term
                .write_line(&format!("{spaces}{}: {}", style(label).dim(), value)),
        );
    }

    /// One summary card: a label and a highlighted count.
    pub fn stat_card(&self, label: impl Display, value: u64) {
        drop(self.term.write_line(&format!(
            "  {:<16} {}",
            style(label).dim(),
            style(value).cyan().bold()
        )));
    }

    /// Print a dim/muted message.
    pub fn dim(&self, message: impl Display) {
        drop(self.term.write_line(&style(message).dim().to_string()));
    }

    /// Print a count summary.
    pub fn count(&self, label: impl Display, shown: usize, total: usize) {
        drop(self.term.write_line(&format!(
            "{}: {} of {} user(s)",
            style(label).dim(),
            style(shown).cyan().bold(),
            total
        )));
    }
}
