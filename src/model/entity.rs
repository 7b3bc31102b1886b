//! Entities: positioned units of content inside a layer.

use super::{BoundingBox, Span};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key/value bag used for type-specific flags.
pub type Metadata = Map<String, Value>;

/// A typed, positioned unit of document content.
///
/// `spans[i]` pairs with `boxes[i]` whenever both are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Position inside the owning layer
    #[serde(default)]
    pub id: usize,

    /// Offsets into the document text
    #[serde(default)]
    pub spans: Vec<Span>,

    /// Page-relative geometry
    #[serde(default)]
    pub boxes: Vec<BoundingBox>,

    /// Text covered by the entity
    #[serde(default)]
    pub text: String,

    /// Type-specific flags
    #[serde(default)]
    pub metadata: Metadata,
}

impl Entity {
    /// Create an entity with a single span/box pair.
    pub fn new(span: Span, bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            spans: vec![span],
            boxes: vec![bbox],
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Create an entity that only carries a span.
    pub fn from_span(span: Span, text: impl Into<String>) -> Self {
        Self {
            spans: vec![span],
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set a metadata value.
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Merge a metadata map; incoming keys win.
    pub fn with_metadata(mut self, metadata: &Metadata) -> Self {
        for (key, value) in metadata {
            self.metadata.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn span(&self) -> Option<&Span> {
        self.spans.first()
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.boxes.first()
    }

    /// Boolean flag, `false` when absent or not a bool.
    pub fn flag(&self, key: &str) -> bool {
        self.metadata.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Unsigned integer value, `0` when absent.
    pub fn meta_usize(&self, key: &str) -> usize {
        self.metadata
            .get(key)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .unwrap_or(0)
    }

    /// String value, empty when absent.
    pub fn meta_str(&self, key: &str) -> &str {
        self.metadata.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Check that spans and boxes pair up index-wise.
    pub fn is_paired(&self) -> bool {
        self.spans.is_empty() || self.boxes.is_empty() || self.spans.len() == self.boxes.len()
    }
}
