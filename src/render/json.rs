//! Canonical JSON output.
//!
//! Documents always come out in the `pages` layout with `doc` roots, so a
//! legacy single-content record is upgraded by a load and save cycle.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::Document;

/// Layout of the emitted JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Two-space indentation
    #[default]
    Pretty,
    /// Single line
    Compact,
}

/// Serialize a document.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let written = if format == JsonFormat::Compact {
        serde_json::to_string(doc)
    } else {
        serde_json::to_string_pretty(doc)
    };
    written.map_err(|e| Error::Write(format!("cannot encode {:?}: {}", doc.title, e)))
}

/// The document as a JSON value, for callers embedding it in a larger payload.
pub fn to_json_value(doc: &Document) -> Result<Value> {
    serde_json::to_value(doc).map_err(|e| Error::Write(format!("cannot encode {:?}: {}", doc.title, e)))
}
