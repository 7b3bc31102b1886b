//! Source pages and their content items.

use super::{FigureItem, KeyValueItem, RawLine, TableItem, TextItem};
use serde::{Deserialize, Serialize};

/// A page of the hierarchical source document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourcePage {
    /// Page width in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Page height in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Rotation in degrees
    #[serde(default)]
    pub rotation: i32,

    /// Typed content items in reading order
    #[serde(default)]
    pub content: Vec<ContentItem>,

    /// Raw positioned lines, used when `content` is empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<RawLine>,
}

impl SourcePage {
    /// Create a page with the given dimensions.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    /// Create a page with standard Letter size (8.5 x 11 inches).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Add a content item.
    pub fn add_item(&mut self, item: impl Into<ContentItem>) {
        self.content.push(item.into());
    }

    /// Builder form of [`SourcePage::add_item`].
    pub fn with_item(mut self, item: impl Into<ContentItem>) -> Self {
        self.add_item(item);
        self
    }

    /// Add a raw line.
    pub fn with_line(mut self, line: RawLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Dimensions, replacing missing or degenerate (`<= 1`) values with the defaults.
    pub fn dimensions(&self, default_width: f64, default_height: f64) -> (f64, f64) {
        let usable = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 1.0);
        (
            usable(self.width).unwrap_or(default_width),
            usable(self.height).unwrap_or(default_height),
        )
    }

    /// The page carries no typed items, only raw lines.
    pub fn needs_inference(&self) -> bool {
        self.content.is_empty() && !self.lines.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.lines.is_empty()
    }
}

/// A typed content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text(TextItem),
    Table(TableItem),
    Figure(FigureItem),
    KeyValue(KeyValueItem),
}

impl ContentItem {
    /// Page number (1-indexed, 0 = unknown).
    pub fn page(&self) -> u32 {
        match self {
            ContentItem::Text(t) => t.page,
            ContentItem::Table(t) => t.page,
            ContentItem::Figure(f) => f.page,
            ContentItem::KeyValue(kv) => kv.page,
        }
    }

    /// `[x0, y0, x1, y1]` on the page.
    pub fn bbox(&self) -> [f64; 4] {
        match self {
            ContentItem::Text(t) => t.bbox,
            ContentItem::Table(t) => t.bbox,
            ContentItem::Figure(f) => f.bbox,
            ContentItem::KeyValue(kv) => kv.bbox,
        }
    }

    /// Text this item contributes to the layered document.
    pub fn display_text(&self) -> String {
        match self {
            ContentItem::Text(t) => t.text.clone(),
            ContentItem::Table(t) => t.display_text(),
            ContentItem::Figure(f) => f.display_text(),
            ContentItem::KeyValue(kv) => kv.display_text(),
        }
    }
}

impl From<TextItem> for ContentItem {
    fn from(item: TextItem) -> Self {
        ContentItem::Text(item)
    }
}

impl From<TableItem> for ContentItem {
    fn from(item: TableItem) -> Self {
        ContentItem::Table(item)
    }
}

impl From<FigureItem> for ContentItem {
    fn from(item: FigureItem) -> Self {
        ContentItem::Figure(item)
    }
}

impl From<KeyValueItem> for ContentItem {
    fn from(item: KeyValueItem) -> Self {
        ContentItem::KeyValue(item)
    }
}
