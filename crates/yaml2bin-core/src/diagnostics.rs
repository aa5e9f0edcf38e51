/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The single diagnostic channel shared by every pipeline component.
//!
//! A sink only records messages. Whether a run stops after a report is
//! decided by the caller that reported it.

use colored::Colorize;
use std::fmt;
use std::io::IsTerminal;

/// Receives user-facing diagnostics.
pub trait ErrorSink {
    fn report(&mut self, message: &str);
}

/// Prints `<tool>: error: <message>` lines to standard error.
#[derive(Debug, Clone)]
pub struct StderrSink {
    tool: String,
    color: bool,
}

impl StderrSink {
    /// Create a sink for `tool`, coloring the `error:` label when stderr is a terminal.
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            color: std::io::stderr().is_terminal(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn format(&self, message: &str) -> String {
        let label = if self.color {
            "error:".red().bold().to_string()
        } else {
            "error:".to_string()
        };
        format!("{}: {} {}", self.tool, label, message)
    }
}

impl ErrorSink for StderrSink {
    fn report(&mut self, message: &str) {
        eprintln!("{}", self.format(message));
    }
}

/// Keeps reported messages in memory, in report order.
#[derive(Debug, Clone, Default)]
pub struct CollectedErrors {
    messages: Vec<String>,
}

impl CollectedErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl ErrorSink for CollectedErrors {
    fn report(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// A number rendered with its English ordinal suffix (`1st`, `12th`, `23rd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordinal(pub u32);

impl Ordinal {
    pub fn suffix(self) -> &'static str {
        // 11, 12 and 13 (and 111, 112, ...) always take "th".
        match self.0 % 100 {
            11..=13 => "th",
            _ => match self.0 % 10 {
                1 => "st",
                2 => "nd",
                3 => "rd",
                _ => "th",
            },
        }
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, self.suffix())
    }
}
