//! Document model detection for JSON payloads.

use crate::convert::Format;
use crate::error::{Error, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Detect the document model of a JSON file.
///
/// # Example
/// ```no_run
/// use doclayer::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("document.json").unwrap();
/// println!("model: {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    detect_format(&value)
}

/// Detect the document model of a JSON string.
pub fn detect_format_from_str(json: &str) -> Result<Format> {
    let value: Value = serde_json::from_str(json)?;
    detect_format(&value)
}

/// Detect the document model of a JSON value.
///
/// # Returns
/// * `Format::Layered` if the value has a text buffer and `entities`
/// * `Format::Hierarchical` if it has `pages` whose entries carry `content` or `lines`
/// * `Err(Error::Validation)` otherwise
pub fn detect_format(value: &Value) -> Result<Format> {
    if is_layered(value) {
        return Ok(Format::Layered);
    }
    if is_hierarchical(value) {
        return Ok(Format::Hierarchical);
    }
    Err(Error::Validation("unrecognized document model".into()))
}

/// Check for the layered schema's text buffer and entity map.
pub fn is_layered(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    let has_text = ["symbols", "full_text"]
        .iter()
        .any(|k| object.get(*k).is_some_and(Value::is_string));
    has_text && object.get("entities").is_some_and(Value::is_object)
}

/// Check for a page list in the hierarchical shape.
///
/// An empty page list counts as hierarchical.
pub fn is_hierarchical(value: &Value) -> bool {
    let Some(pages) = value.get("pages").and_then(Value::as_array) else {
        return false;
    };
    pages.iter().all(|page| {
        page.as_object()
            .is_some_and(|p| p.contains_key("content") || p.contains_key("lines"))
    })
}
