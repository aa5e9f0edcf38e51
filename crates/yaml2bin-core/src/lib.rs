/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Create binary files from YAML descriptions.
//!
//! A run takes a YAML stream, substitutes `[[NAME]]` and `[[NAME=default]]`
//! placeholders, selects one document of the stream and hands it to a
//! [`Converter`] that produces the bytes. Output is committed to its
//! destination only when every step succeeded.
//!
//! # Example
//!
//! ```ignore
//! use yaml2bin_core::{ConvertOptions, Driver, InputSource, OutputTarget, StderrSink};
//!
//! let options = ConvertOptions {
//!     input: InputSource::from_arg("section.yaml"),
//!     defines: vec!["SIZE=16".to_string()],
//!     output: OutputTarget::from_arg("section.bin"),
//!     ..Default::default()
//! };
//! let mut sink = StderrSink::new("yaml2bin");
//! let written = Driver::default().run(&options, &mut sink)?;
//! ```

pub mod convert;
pub mod defines;
pub mod diagnostics;
pub mod document;
pub mod driver;
pub mod error;
pub mod output;
pub mod preprocess;

pub use convert::{BlobConverter, Converter};
pub use defines::Defines;
pub use diagnostics::{CollectedErrors, ErrorSink, Ordinal, StderrSink};
pub use document::{DocumentParser, DocumentStream, YamlStreamParser};
pub use driver::{ConvertOptions, DEFAULT_MAX_SIZE, Driver, InputSource};
pub use error::{Error, Result};
pub use output::{OutputFile, OutputTarget};
pub use preprocess::{Placeholder, preprocess};

// Re-exported so converters can be written against the same YAML types.
pub use yaml_rust2::Yaml;
