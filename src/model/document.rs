//! The layered document: one text buffer plus named entity layers.

use super::{Entity, Metadata, Span};
use crate::error::{Error, Result};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Well-known layer names.
pub mod layers {
    pub const PAGES: &str = "pages";
    pub const PARAGRAPHS: &str = "paragraphs";
    pub const BLOCKS: &str = "blocks";
    pub const SENTENCES: &str = "sentences";
    pub const WORDS: &str = "words";
    pub const TOKENS: &str = "tokens";
    pub const CITATIONS: &str = "citations";
    pub const EQUATIONS: &str = "equations";
    pub const BIBLIOGRAPHY: &str = "bibliography";
    pub const TABLES: &str = "tables";
    pub const FIGURES: &str = "figures";
    pub const ROWS: &str = "rows";
    pub const TITLES: &str = "titles";

    /// Layers that are serialized even when empty.
    pub const REQUIRED: [&str; 3] = [PAGES, PARAGRAPHS, BLOCKS];
}

/// Page geometry recorded on the layered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f64,

    /// Page height in points
    pub height: f64,

    /// Rotation in degrees
    #[serde(default)]
    pub rotation: i32,
}

impl PageInfo {
    pub fn new(number: u32, width: f64, height: f64) -> Self {
        Self {
            number,
            width,
            height,
            rotation: 0,
        }
    }

    /// US Letter (8.5 x 11 inches).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }
}

/// A layered document.
///
/// Built once per conversion; layers are replaced wholesale with [`Document::add_layer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document identifier
    pub id: String,

    /// Free-form document metadata
    pub metadata: Metadata,

    /// Page geometry, in page order
    pub pages: Vec<PageInfo>,

    /// The full concatenated text
    pub symbols: String,

    entities: BTreeMap<String, Vec<Entity>>,
}

impl Document {
    /// Create an empty document with the required layers present.
    pub fn new(id: impl Into<String>) -> Self {
        let entities = layers::REQUIRED
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        Self {
            id: id.into(),
            metadata: Metadata::new(),
            pages: Vec::new(),
            symbols: String::new(),
            entities,
        }
    }

    /// Create a document over the given text.
    pub fn with_symbols(id: impl Into<String>, symbols: impl Into<String>) -> Self {
        let mut doc = Self::new(id);
        doc.symbols = symbols.into();
        doc
    }

    /// Replace a layer. Entity ids are renumbered to their position.
    pub fn add_layer(&mut self, name: impl Into<String>, mut entities: Vec<Entity>) {
        for (i, entity) in entities.iter_mut().enumerate() {
            entity.id = i;
        }
        self.entities.insert(name.into(), entities);
    }

    /// Get a layer, or an empty slice if it does not exist.
    pub fn get_layer(&self, name: &str) -> &[Entity] {
        self.entities.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a layer exists and is non-empty.
    pub fn has_layer(&self, name: &str) -> bool {
        !self.get_layer(name).is_empty()
    }

    /// Names of all layers, in serialization order.
    pub fn layer_names(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }

    /// Iterate over `(layer, entities)` pairs.
    pub fn layers(&self) -> impl Iterator<Item = (&str, &[Entity])> {
        self.entities
            .iter()
            .map(|(name, entities)| (name.as_str(), entities.as_slice()))
    }

    /// Total number of entities over all layers.
    pub fn entity_count(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    /// Length of the text buffer in chars.
    pub fn symbol_count(&self) -> usize {
        self.symbols.chars().count()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text covered by a span, or `None` if it falls outside the buffer.
    pub fn text_of(&self, span: &Span) -> Option<&str> {
        char_slice(&self.symbols, span.start, span.end)
    }

    /// Check the offset, geometry and pairing invariants of every entity.
    pub fn validate(&self) -> Result<()> {
        let len = self.symbol_count();
        for (name, entities) in &self.entities {
            for entity in entities {
                if let Some(span) = entity.spans.iter().find(|s| !s.fits(len)) {
                    return Err(Error::Validation(format!(
                        "entity {} in layer '{}' has span {}..{} outside {} characters",
                        entity.id, name, span.start, span.end, len
                    )));
                }
                if entity.boxes.iter().any(|b| !b.is_valid()) {
                    return Err(Error::Validation(format!(
                        "entity {} in layer '{}' has an invalid box",
                        entity.id, name
                    )));
                }
                if !entity.is_paired() {
                    return Err(Error::Validation(format!(
                        "entity {} in layer '{}' has {} spans but {} boxes",
                        entity.id,
                        name,
                        entity.spans.len(),
                        entity.boxes.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

/// Slice `text` by char offsets.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let mut offsets = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()));
    let begin = offsets.nth(start)?;
    let finish = if end == start {
        begin
    } else {
        offsets.nth(end - start - 1)?
    };
    Some(&text[begin..finish])
}

/// Serializes required layers always and other layers only when non-empty.
struct LayerView<'a>(&'a BTreeMap<String, Vec<Entity>>);

impl Serialize for LayerView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut visible: BTreeMap<&str, &[Entity]> = self
            .0
            .iter()
            .filter(|(_, entities)| !entities.is_empty())
            .map(|(name, entities)| (name.as_str(), entities.as_slice()))
            .collect();
        for name in layers::REQUIRED {
            visible.entry(name).or_insert(&[]);
        }
        visible.serialize(serializer)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Document", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.serialize_field("pages", &self.pages)?;
        state.serialize_field("full_text", &self.symbols)?;
        state.serialize_field("symbols", &self.symbols)?;
        state.serialize_field("entities", &LayerView(&self.entities))?;
        state.end()
    }
}

#[derive(Deserialize)]
struct DocumentRepr {
    #[serde(default)]
    id: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    pages: Vec<PageInfo>,
    #[serde(default)]
    symbols: Option<String>,
    #[serde(default)]
    full_text: Option<String>,
    #[serde(default)]
    entities: BTreeMap<String, Vec<Entity>>,
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = DocumentRepr::deserialize(deserializer)?;
        let mut doc = Document::new(repr.id);
        doc.metadata = repr.metadata;
        doc.pages = repr.pages;
        doc.symbols = repr.symbols.or(repr.full_text).unwrap_or_default();
        doc.entities.extend(repr.entities);
        Ok(doc)
    }
}
