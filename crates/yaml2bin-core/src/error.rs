/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for the conversion pipeline.
//!
//! Every variant is terminal for a run. The `Display` text of each variant is
//! the single diagnostic line shown to the user.

use crate::diagnostics::Ordinal;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `-D` entry without `=`, or with an empty macro name.
    #[error("invalid syntax for -D: {0}")]
    InvalidSyntax(String),

    /// The same macro name was defined twice.
    #[error("'{0}' redefined")]
    DuplicateMacro(String),

    #[error("failed to read '{path}': {source}")]
    InputUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML input: {0}")]
    StructuredParse(String),

    #[error("cannot find the {0} document")]
    DocumentIndexOutOfRange(Ordinal),

    /// The converter failed and has already reported why through the sink.
    #[error("conversion failed")]
    ConverterFailure,

    #[error("failed to {action} '{path}': {source}")]
    OutputUnwritable {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the diagnostic for this error has already been sent to the sink.
    pub fn already_reported(&self) -> bool {
        matches!(self, Error::ConverterFailure)
    }

    pub(crate) fn output(action: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        Error::OutputUnwritable {
            action,
            path: path.into(),
            source,
        }
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        Error::StructuredParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
