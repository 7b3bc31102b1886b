//! JSON rendering and loading for both document models.

use crate::error::{Error, Result};
use crate::model::{Document, SourceDocument};
use serde::Serialize;
use serde_json::Value;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

fn render<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };
    Ok(result?)
}

/// Convert a layered document to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    render(doc, format)
}

/// Convert a source document to JSON.
pub fn source_to_json(source: &SourceDocument, format: JsonFormat) -> Result<String> {
    render(source, format)
}

/// Layered document as a JSON value.
pub fn document_to_value(doc: &Document) -> Result<Value> {
    Ok(serde_json::to_value(doc)?)
}

/// Check that a payload has the top-level keys of the layered schema.
///
/// The text may be under `symbols` or `full_text`.
pub fn validate_value(value: &Value) -> Result<()> {
    let Some(object) = value.as_object() else {
        return Err(Error::Validation("document must be a JSON object".into()));
    };
    if !object.contains_key("symbols") && !object.contains_key("full_text") {
        return Err(Error::Validation("document has no 'symbols' text".into()));
    }
    for key in ["entities", "metadata"] {
        if !object.contains_key(key) {
            return Err(Error::Validation(format!("document has no '{}'", key)));
        }
    }
    if !object["entities"].is_object() {
        return Err(Error::Validation("'entities' must map layer names to lists".into()));
    }
    Ok(())
}

/// Parse and validate a layered document.
pub fn from_json_str(json: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(json)?;
    validate_value(&value)?;
    let doc: Document = serde_json::from_value(value)?;
    doc.validate()?;
    Ok(doc)
}

/// Parse a source document.
pub fn source_from_json_str(json: &str) -> Result<SourceDocument> {
    Ok(serde_json::from_str(json)?)
}
