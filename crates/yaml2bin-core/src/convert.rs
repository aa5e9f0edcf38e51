/*
 * convert.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Converters from a selected YAML document to output bytes.
//!
//! The built-in [`BlobConverter`] understands documents of the form:
//!
//! ```yaml
//! Blob:
//!   - Hex: "7f454c46"
//!   - Text: "payload"
//!   - Fill:
//!       Byte: 0xff
//!       Size: 16
//! ```
//!
//! The whole layout is validated and sized before the first byte is written.

use std::io::Write;

use yaml_rust2::Yaml;

use crate::diagnostics::{ErrorSink, Ordinal};
use crate::document::DocumentStream;
use crate::{Error, Result};

/// Produces the artifact bytes for one document of a stream.
pub trait Converter {
    /// Write document `doc_num` (1-based) of `documents` to `out`.
    ///
    /// At most `max_size` bytes may be produced. On failure the converter
    /// reports its own diagnostic through `sink` and returns
    /// [`Error::ConverterFailure`]. Returns the number of bytes written.
    fn convert(
        &self,
        documents: &DocumentStream,
        doc_num: u32,
        max_size: u64,
        out: &mut dyn Write,
        sink: &mut dyn ErrorSink,
    ) -> Result<u64>;
}

const BLOB_KEY: &str = "Blob";
const FILL_BUFFER: usize = 4096;

/// Converter for `Blob` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobConverter;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Bytes(Vec<u8>),
    Fill { byte: u8, size: u64 },
}

impl Chunk {
    fn len(&self) -> u64 {
        match self {
            Chunk::Bytes(bytes) => bytes.len() as u64,
            Chunk::Fill { size, .. } => *size,
        }
    }

    fn write_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        match self {
            Chunk::Bytes(bytes) => out.write_all(bytes),
            Chunk::Fill { byte, size } => {
                let buffer = [*byte; FILL_BUFFER];
                let mut remaining = *size;
                while remaining > 0 {
                    let step = remaining.min(FILL_BUFFER as u64) as usize;
                    out.write_all(&buffer[..step])?;
                    remaining -= step as u64;
                }
                Ok(())
            }
        }
    }
}

impl Converter for BlobConverter {
    fn convert(
        &self,
        documents: &DocumentStream,
        doc_num: u32,
        max_size: u64,
        out: &mut dyn Write,
        sink: &mut dyn ErrorSink,
    ) -> Result<u64> {
        let Some(document) = documents.select(doc_num) else {
            return Err(fail(
                sink,
                format!("cannot find the {} document", Ordinal(doc_num)),
            ));
        };
        let chunks = parse_blob(document).map_err(|message| fail(sink, message))?;

        let total = chunks
            .iter()
            .try_fold(0u64, |total, chunk| total.checked_add(chunk.len()));
        let total = match total {
            Some(total) if total <= max_size => total,
            _ => {
                return Err(fail(
                    sink,
                    "the desired output size is greater than permitted. \
                     Use the --max-size option to change the limit",
                ));
            }
        };

        for chunk in &chunks {
            chunk
                .write_to(out)
                .map_err(|e| fail(sink, format!("failed to write output: {}", e)))?;
        }

        tracing::debug!(chunks = chunks.len(), bytes = total, "Converted blob document");
        Ok(total)
    }
}

fn fail(sink: &mut dyn ErrorSink, message: impl AsRef<str>) -> Error {
    sink.report(message.as_ref());
    Error::ConverterFailure
}

fn parse_blob(document: &Yaml) -> std::result::Result<Vec<Chunk>, String> {
    let Some(hash) = document.as_hash() else {
        return Err("unknown document type".to_string());
    };
    if !hash.contains_key(&Yaml::String(BLOB_KEY.to_string())) {
        return Err("unknown document type".to_string());
    }
    if let Some(key) = hash.keys().find(|key| key.as_str() != Some(BLOB_KEY)) {
        return Err(format!("unknown key '{}'", key_name(key)));
    }

    match &document[BLOB_KEY] {
        Yaml::Null => Ok(Vec::new()),
        Yaml::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_chunk(item).map_err(|e| format!("chunk {}: {}", i, e)))
            .collect(),
        _ => Err(format!("{}: expected a sequence of chunks", BLOB_KEY)),
    }
}

fn parse_chunk(item: &Yaml) -> std::result::Result<Chunk, String> {
    let entries = match item.as_hash() {
        Some(hash) if hash.len() == 1 => hash,
        _ => return Err("expected a mapping with exactly one of Hex, Text or Fill".to_string()),
    };
    let Some((key, value)) = entries.iter().next() else {
        return Err("expected a mapping with exactly one of Hex, Text or Fill".to_string());
    };

    match key.as_str() {
        Some("Hex") => {
            let text = value.as_str().ok_or("Hex: expected a string")?;
            let digits: String = text.split_whitespace().collect();
            hex::decode(digits)
                .map(Chunk::Bytes)
                .map_err(|e| format!("invalid hex content: {}", e))
        }
        Some("Text") => {
            let text = value.as_str().ok_or("Text: expected a string")?;
            Ok(Chunk::Bytes(text.as_bytes().to_vec()))
        }
        Some("Fill") => parse_fill(value),
        _ => Err(format!("unknown chunk kind '{}'", key_name(key))),
    }
}

fn parse_fill(value: &Yaml) -> std::result::Result<Chunk, String> {
    let hash = value.as_hash().ok_or("Fill: expected a mapping")?;
    if let Some(key) = hash
        .keys()
        .find(|key| !matches!(key.as_str(), Some("Byte" | "Size")))
    {
        return Err(format!("Fill: unknown key '{}'", key_name(key)));
    }

    let byte = match &value["Byte"] {
        Yaml::BadValue => 0,
        yaml => yaml
            .as_i64()
            .and_then(|n| u8::try_from(n).ok())
            .ok_or("Fill: Byte must be an integer in 0..=255")?,
    };
    let size = value["Size"]
        .as_i64()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or("Fill: Size must be a non-negative integer")?;

    Ok(Chunk::Fill { byte, size })
}

fn key_name(key: &Yaml) -> String {
    match key {
        Yaml::String(s) | Yaml::Real(s) => s.clone(),
        Yaml::Integer(n) => n.to_string(),
        Yaml::Boolean(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectedErrors;
    use crate::document::{DocumentParser, YamlStreamParser};
    use pretty_assertions::assert_eq;

    fn convert(text: &str, doc_num: u32, max_size: u64) -> (Result<u64>, Vec<u8>, CollectedErrors) {
        let documents = YamlStreamParser.parse(text).unwrap();
        let mut out = Vec::new();
        let mut sink = CollectedErrors::new();
        let result = BlobConverter.convert(&documents, doc_num, max_size, &mut out, &mut sink);
        (result, out, sink)
    }

    #[test]
    fn test_writes_chunks_in_order() {
        let text = "Blob:\n  - Hex: \"de ad be ef\"\n  - Text: \"hi\"\n  - Fill: { Byte: 0x01, Size: 3 }\n";
        let (result, out, sink) = convert(text, 1, u64::MAX);
        assert_eq!(result.unwrap(), 9);
        assert_eq!(out, vec![0xde, 0xad, 0xbe, 0xef, b'h', b'i', 1, 1, 1]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_fill_defaults_to_zero_and_spans_buffers() {
        let (result, out, _) = convert("Blob:\n  - Fill: { Size: 5000 }\n", 1, u64::MAX);
        assert_eq!(result.unwrap(), 5000);
        assert_eq!(out.len(), 5000);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_blob() {
        let (result, out, _) = convert("Blob:\n", 1, u64::MAX);
        assert_eq!(result.unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_selects_requested_document() {
        let text = "Blob:\n  - Text: a\n---\nBlob:\n  - Text: b\n";
        let (result, out, _) = convert(text, 2, u64::MAX);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(out, b"b");
    }

    #[test]
    fn test_missing_document_is_reported() {
        let (result, out, sink) = convert("Blob:\n", 3, u64::MAX);
        assert!(matches!(result, Err(Error::ConverterFailure)));
        assert!(out.is_empty());
        assert_eq!(sink.messages(), ["cannot find the 3rd document"]);
    }

    #[test]
    fn test_size_limit_is_checked_before_writing() {
        let (result, out, sink) = convert("Blob:\n  - Text: abc\n  - Fill: { Size: 8 }\n", 1, 10);
        assert!(matches!(result, Err(Error::ConverterFailure)));
        assert!(out.is_empty());
        assert_eq!(
            sink.messages(),
            ["the desired output size is greater than permitted. Use the --max-size option to change the limit"]
        );
    }

    #[test]
    fn test_size_equal_to_limit_is_allowed() {
        let (result, _, _) = convert("Blob:\n  - Fill: { Size: 10 }\n", 1, 10);
        assert_eq!(result.unwrap(), 10);
    }

    #[test]
    fn test_unknown_document_type() {
        for text in ["ELF:\n  Class: 64\n", "just a string\n", "- 1\n"] {
            let (result, _, sink) = convert(text, 1, u64::MAX);
            assert!(matches!(result, Err(Error::ConverterFailure)));
            assert_eq!(sink.messages(), ["unknown document type"]);
        }
    }

    #[test]
    fn test_unknown_top_level_key() {
        let (_, _, sink) = convert("Blob:\nExtra: 1\n", 1, u64::MAX);
        assert_eq!(sink.messages(), ["unknown key 'Extra'"]);
    }

    #[test]
    fn test_bad_chunks_are_reported_with_their_index() {
        let cases = [
            ("Blob:\n  - Hex: \"abc\"\n", "chunk 0: invalid hex content: Odd number of digits"),
            ("Blob:\n  - Text: a\n  - Bytes: 1\n", "chunk 1: unknown chunk kind 'Bytes'"),
            ("Blob:\n  - Fill: { Byte: 256, Size: 1 }\n", "chunk 0: Fill: Byte must be an integer in 0..=255"),
            ("Blob:\n  - Fill: { Byte: 1 }\n", "chunk 0: Fill: Size must be a non-negative integer"),
            ("Blob:\n  - Fill: { Size: -1 }\n", "chunk 0: Fill: Size must be a non-negative integer"),
            ("Blob:\n  - Text: a\n    Hex: \"00\"\n", "chunk 0: expected a mapping with exactly one of Hex, Text or Fill"),
            ("Blob:\n  - Hex: 12\n", "chunk 0: Hex: expected a string"),
        ];
        for (text, expected) in cases {
            let (result, out, sink) = convert(text, 1, u64::MAX);
            assert!(matches!(result, Err(Error::ConverterFailure)), "{}", text);
            assert!(out.is_empty());
            assert_eq!(sink.messages(), [expected]);
        }
    }
}
