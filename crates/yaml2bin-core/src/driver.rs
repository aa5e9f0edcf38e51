/*
 * driver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The conversion run: definitions, output, input, preprocessing, parsing,
//! conversion and commit, in that order.
//!
//! Nothing reaches the destination unless every step succeeds. The first
//! failure is reported once through the [`ErrorSink`] and ends the run.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use crate::convert::{BlobConverter, Converter};
use crate::diagnostics::{ErrorSink, Ordinal};
use crate::document::{DocumentParser, YamlStreamParser};
use crate::output::{OutputFile, OutputTarget};
use crate::preprocess::preprocess;
use crate::{Defines, Error, Result};

/// Output size limit used when none is given (10 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Where the YAML description is read from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputSource {
    #[default]
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` selects standard input; anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            InputSource::Stdin
        } else {
            InputSource::File(PathBuf::from(arg))
        }
    }

    /// Read the whole input. Bytes that are not UTF-8 are a parse failure,
    /// not a read failure.
    pub fn read_to_string(&self) -> Result<String> {
        let result = match self {
            InputSource::Stdin => {
                let mut bytes = Vec::new();
                std::io::stdin().read_to_end(&mut bytes).map(|_| bytes)
            }
            InputSource::File(path) => fs::read(path),
        };
        let bytes = result.map_err(|source| Error::InputUnreadable {
            path: self.to_string(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|e| {
            Error::StructuredParse(format!("input is not valid UTF-8: {}", e.utf8_error()))
        })
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Stdin => write!(f, "<stdin>"),
            InputSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub input: InputSource,
    /// Raw `NAME=VALUE` entries, applied in order.
    pub defines: Vec<String>,
    /// 1-based number of the document to convert.
    pub doc_num: u32,
    /// Maximum output size in bytes; `0` means unlimited.
    pub max_size: u64,
    pub output: OutputTarget,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            input: InputSource::Stdin,
            defines: Vec::new(),
            doc_num: 1,
            max_size: DEFAULT_MAX_SIZE,
            output: OutputTarget::Stdout,
        }
    }
}

impl ConvertOptions {
    /// The bound handed to the converter, with `0` mapped to no limit.
    pub fn size_limit(&self) -> u64 {
        if self.max_size == 0 {
            u64::MAX
        } else {
            self.max_size
        }
    }
}

/// Runs the pipeline with a pluggable parser and converter.
pub struct Driver {
    parser: Box<dyn DocumentParser>,
    converter: Box<dyn Converter>,
}

impl Driver {
    pub fn new(parser: Box<dyn DocumentParser>, converter: Box<dyn Converter>) -> Self {
        Self { parser, converter }
    }

    /// Run the whole conversion, returning the number of bytes committed.
    ///
    /// On failure the error has been reported through `sink` exactly once.
    pub fn run(&self, options: &ConvertOptions, sink: &mut dyn ErrorSink) -> Result<u64> {
        let result = self.execute(options, sink);
        if let Err(err) = &result {
            if !err.already_reported() {
                sink.report(&err.to_string());
            }
        }
        result
    }

    fn execute(&self, options: &ConvertOptions, sink: &mut dyn ErrorSink) -> Result<u64> {
        let defines = Defines::from_entries(&options.defines)?;
        tracing::debug!(count = defines.len(), "Loaded macro definitions");

        let mut output = OutputFile::create(&options.output)?;

        let text = options.input.read_to_string()?;
        tracing::debug!(input = %options.input, bytes = text.len(), "Read input");

        let preprocessed = preprocess(&text, &defines);
        let documents = self.parser.parse(&preprocessed)?;
        if documents.select(options.doc_num).is_none() {
            return Err(Error::DocumentIndexOutOfRange(Ordinal(options.doc_num)));
        }

        let written = match self.converter.convert(
            &documents,
            options.doc_num,
            options.size_limit(),
            &mut output,
            sink,
        ) {
            Ok(written) => written,
            Err(err) => {
                output.discard();
                return Err(err);
            }
        };

        output.commit()?;
        Ok(written)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(Box::new(YamlStreamParser), Box::new(BlobConverter))
    }
}
