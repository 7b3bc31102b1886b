//! The hierarchical source document.

use super::{ContentItem, Metadata, SourcePage};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A source document: pages of typed, positioned content items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document identifier
    #[serde(default)]
    pub id: String,

    /// Backend metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Pages in reading order
    #[serde(default)]
    pub pages: Vec<SourcePage>,
}

impl SourceDocument {
    /// Create an empty source document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add a page.
    pub fn add_page(&mut self, page: SourcePage) {
        self.pages.push(page);
    }

    /// Builder form of [`SourceDocument::add_page`].
    pub fn with_page(mut self, page: SourcePage) -> Self {
        self.add_page(page);
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Iterate over every content item in traversal order.
    pub fn items(&self) -> impl Iterator<Item = &ContentItem> {
        self.pages.iter().flat_map(|p| p.content.iter())
    }
}

/// A raw positioned line of text without any structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    #[serde(default)]
    pub text: String,

    /// `[x0, y0, x1, y1]` on the page
    #[serde(default)]
    pub bbox: [f64; 4],
}

impl RawLine {
    pub fn new(text: impl Into<String>, bbox: [f64; 4]) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }

    /// Whether the line holds only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Accept identifiers written either as strings or numbers.
pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
