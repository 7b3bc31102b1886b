//! Figures and key-value pairs.

use super::source::deserialize_id;
use super::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A figure item on a source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureItem {
    /// Backend identifier, used for the fallback text
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default)]
    pub bbox: [f64; 4],

    /// Page number (1-indexed, 0 = the containing page)
    #[serde(default)]
    pub page: u32,

    /// Image payload (usually a base64 string), carried as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Value>,

    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl FigureItem {
    pub fn new(id: impl Into<String>, bbox: [f64; 4], page: u32) -> Self {
        Self {
            id: id.into(),
            caption: None,
            bbox,
            page,
            image_data: None,
            metadata: Metadata::new(),
        }
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Attach image data.
    pub fn with_image_data(mut self, data: impl Into<Value>) -> Self {
        self.image_data = Some(data.into());
        self
    }

    /// Text used for the figure entity.
    pub fn display_text(&self) -> String {
        match &self.caption {
            Some(caption) => caption.clone(),
            None => format!("Figure {}", self.id),
        }
    }
}

/// A key-value pair detected on a form-like page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueItem {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub bbox: [f64; 4],

    /// Page number (1-indexed, 0 = the containing page)
    #[serde(default)]
    pub page: u32,
}

impl KeyValueItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>, bbox: [f64; 4], page: u32) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            bbox,
            page,
        }
    }

    /// Rendered `"key: value"` text.
    pub fn display_text(&self) -> String {
        format!("{}: {}", self.key, self.value)
    }
}
