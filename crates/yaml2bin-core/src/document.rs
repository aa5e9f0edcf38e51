/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsing preprocessed text into a stream of YAML documents.

use yaml_rust2::{Yaml, YamlLoader};

use crate::Result;

/// Turns preprocessed text into a document stream.
pub trait DocumentParser {
    fn parse(&self, text: &str) -> Result<DocumentStream>;
}

/// Parser for `---`-separated YAML streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlStreamParser;

impl DocumentParser for YamlStreamParser {
    fn parse(&self, text: &str) -> Result<DocumentStream> {
        let documents = YamlLoader::load_from_str(text)?;
        tracing::debug!(documents = documents.len(), "Parsed YAML stream");
        Ok(DocumentStream::new(documents))
    }
}

/// The parsed documents of one input, in source order.
#[derive(Debug, Clone, Default)]
pub struct DocumentStream {
    documents: Vec<Yaml>,
}

impl DocumentStream {
    pub fn new(documents: Vec<Yaml>) -> Self {
        Self { documents }
    }

    /// Select a document by its 1-based number. `0` is never valid.
    pub fn select(&self, doc_num: u32) -> Option<&Yaml> {
        let index = usize::try_from(doc_num).ok()?.checked_sub(1)?;
        self.documents.get(index)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
