//! Serialization module for converting Swagger documents to YAML or JSON format.
//!
//! This module provides functions to serialize documents into standard formats
//! and write them to files or return them as strings.

use crate::error::Result;
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Formatting options passed through to the JSON serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonOptions {
    /// Indent width in spaces; `None` renders compact JSON
    pub indent: Option<usize>,
}

impl JsonOptions {
    pub fn compact() -> Self {
        Self { indent: None }
    }

    pub fn indented(width: usize) -> Self {
        Self {
            indent: Some(width),
        }
    }
}

/// Serializes a document to YAML format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml<T: Serialize>(doc: &T) -> Result<String> {
    debug!("Serializing document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Serializes a document to JSON format with two-space pretty printing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize>(doc: &T) -> Result<String> {
    serialize_json_with(doc, &JsonOptions::indented(2))
}

/// Serializes a document to JSON with the given formatting options.
pub fn serialize_json_with<T: Serialize>(doc: &T, options: &JsonOptions) -> Result<String> {
    debug!("Serializing document to JSON ({:?})", options);
    let Some(width) = options.indent else {
        return Ok(serde_json::to_string(doc)?);
    };

    let indent = " ".repeat(width);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| crate::error::Error::SerializationError(e.to_string()))
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
/// Parent directories are created when missing.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, content)?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
