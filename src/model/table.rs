//! Table types.

use super::source::deserialize_id;
use super::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A table item on a source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableItem {
    /// Backend identifier, used for the fallback text
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,

    /// Table caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    #[serde(default)]
    pub bbox: [f64; 4],

    /// Page number (1-indexed, 0 = the containing page)
    #[serde(default)]
    pub page: u32,

    #[serde(default)]
    pub num_rows: usize,

    #[serde(default)]
    pub num_cols: usize,

    /// Cell payloads, passed through untouched
    #[serde(default)]
    pub cells: Vec<Value>,

    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl TableItem {
    /// Create an empty table.
    pub fn new(id: impl Into<String>, bbox: [f64; 4], page: u32) -> Self {
        Self {
            id: id.into(),
            caption: None,
            bbox,
            page,
            num_rows: 0,
            num_cols: 0,
            cells: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Set the grid size and cells.
    pub fn with_grid(mut self, num_rows: usize, num_cols: usize, cells: Vec<Value>) -> Self {
        self.num_rows = num_rows;
        self.num_cols = num_cols;
        self.cells = cells;
        self
    }

    /// Text used for the table entity.
    pub fn display_text(&self) -> String {
        match &self.caption {
            Some(caption) => caption.clone(),
            None => format!("Table {}", self.id),
        }
    }
}

/// A table cell produced by region detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell text
    pub text: String,

    /// Row index (0-indexed)
    pub row: usize,

    /// Column index (0-indexed)
    pub col: usize,

    /// Number of rows this cell spans
    pub rowspan: usize,

    /// Number of columns this cell spans
    pub colspan: usize,

    /// `[x0, y0, x1, y1]` estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
}

impl TableCell {
    /// Create a single-span cell.
    pub fn new(text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            text: text.into(),
            row,
            col,
            rowspan: 1,
            colspan: 1,
            bbox: None,
        }
    }

    /// Set column span.
    pub fn with_colspan(mut self, colspan: usize) -> Self {
        self.colspan = colspan.max(1);
        self
    }

    /// Set the estimated geometry.
    pub fn with_bbox(mut self, bbox: [f64; 4]) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Check if this cell is merged with neighbours.
    pub fn is_merged(&self) -> bool {
        self.rowspan > 1 || self.colspan > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_text_fallback() {
        let table = TableItem::new("4", [0.0; 4], 1);
        assert_eq!(table.display_text(), "Table 4");
        let table = table.with_caption("Table 4: Results");
        assert_eq!(table.display_text(), "Table 4: Results");
    }

    #[test]
    fn test_numeric_id_accepted() {
        let table: TableItem =
            serde_json::from_value(json!({"id": 7, "bbox": [0, 0, 1, 1], "page": 2})).unwrap();
        assert_eq!(table.id, "7");
        assert_eq!(table.num_rows, 0);
        assert!(table.cells.is_empty());
    }

    #[test]
    fn test_cell_colspan() {
        let cell = TableCell::new("Total", 2, 0).with_colspan(3);
        assert!(cell.is_merged());
        assert_eq!(TableCell::new("x", 0, 0).with_colspan(0).colspan, 1);
    }
}
