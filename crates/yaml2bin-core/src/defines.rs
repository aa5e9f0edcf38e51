/*
 * defines.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Macro definitions supplied on the command line with `-D NAME=VALUE`.

use std::collections::HashMap;

use crate::{Error, Result};

/// Table of macro overrides. Names are unique; redefining one is an error.
#[derive(Debug, Clone, Default)]
pub struct Defines {
    values: HashMap<String, String>,
}

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw `NAME=VALUE` entries, stopping at the first bad one.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut defines = Self::new();
        for entry in entries {
            defines.define(entry.as_ref())?;
        }
        Ok(defines)
    }

    /// Add one `NAME=VALUE` entry.
    ///
    /// The name is everything before the first `=` and must not be empty.
    /// The value is everything after it and may be empty or contain more `=`.
    pub fn define(&mut self, entry: &str) -> Result<()> {
        let Some((name, value)) = entry.split_once('=') else {
            return Err(Error::InvalidSyntax(entry.to_string()));
        };
        if name.is_empty() {
            return Err(Error::InvalidSyntax(entry.to_string()));
        }
        if self.values.contains_key(name) {
            return Err(Error::DuplicateMacro(name.to_string()));
        }
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
