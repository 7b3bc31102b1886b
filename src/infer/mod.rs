//! Structural inference from raw positioned lines.
//!
//! Used when a source page carries only [`RawLine`]s and no typed items.
//! Every candidate carries a confidence in `[0, 1]`; callers gate on it.
//! Detection never fails: a page the heuristics cannot handle yields an
//! empty [`PageStructure`].

mod config;
mod structure;
mod table_detector;

pub use config::InferenceConfig;
pub use structure::StructureDetector;
pub use table_detector::{split_segments, RowData, Segment, TableDetector};

use crate::model::{BoundingBox, RawLine, TableCell};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of title candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleKind {
    MainTitle,
    Subtitle,
}

impl TitleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleKind::MainTitle => "main_title",
            TitleKind::Subtitle => "subtitle",
        }
    }
}

/// A line that looks like a page title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleCandidate {
    pub text: String,
    pub line_index: usize,
    pub kind: TitleKind,
    pub confidence: f64,
}

/// A run of non-empty lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphCandidate {
    /// Lines joined with `\n`
    pub text: String,
    pub first_line: usize,
    pub last_line: usize,
    pub confidence: f64,
}

/// A line that looks like a section heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    pub text: String,
    pub line_index: usize,
    pub level: u8,
    pub confidence: f64,
}

/// A table region found by geometric clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    /// Union of the member line boxes
    pub bbox: BoundingBox,
    pub num_rows: usize,
    pub num_cols: usize,
    pub cells: Vec<TableCell>,
    /// Indices of the member lines, ascending
    pub line_indices: Vec<usize>,
    pub caption: Option<String>,
    pub caption_line: Option<usize>,
    pub confidence: f64,
}

/// Everything inferred for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageStructure {
    pub titles: Vec<TitleCandidate>,
    pub paragraphs: Vec<ParagraphCandidate>,
    pub headings: Vec<HeadingCandidate>,
    pub tables: Vec<TableRegion>,
}

impl PageStructure {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
            && self.paragraphs.is_empty()
            && self.headings.is_empty()
            && self.tables.is_empty()
    }
}

/// Derives titles, paragraphs and headings from a page's lines.
pub trait StructurePredictor: Send + Sync {
    /// Infer text structure. The `tables` field of the result is left empty.
    fn predict(&self, lines: &[RawLine]) -> PageStructure;
}

/// Finds table regions among a page's lines.
pub trait TablePredictor: Send + Sync {
    fn predict(&self, lines: &[RawLine], page_width: f64, page_height: f64) -> Vec<TableRegion>;
}

/// The predictors a conversion uses, passed in explicitly.
#[derive(Clone)]
pub struct Predictors {
    pub structure: Arc<dyn StructurePredictor>,
    pub tables: Arc<dyn TablePredictor>,
}

impl Predictors {
    /// Heuristic predictors configured from `config`.
    pub fn heuristic(config: &InferenceConfig) -> Self {
        Self {
            structure: Arc::new(StructureDetector::with_config(config.clone())),
            tables: Arc::new(TableDetector::with_config(config.clone())),
        }
    }

    /// Swap the structure predictor.
    pub fn with_structure(mut self, predictor: Arc<dyn StructurePredictor>) -> Self {
        self.structure = predictor;
        self
    }

    /// Swap the table predictor.
    pub fn with_tables(mut self, predictor: Arc<dyn TablePredictor>) -> Self {
        self.tables = predictor;
        self
    }

    /// Run both predictors over one page.
    pub fn infer_page(&self, lines: &[RawLine], page_width: f64, page_height: f64) -> PageStructure {
        let mut structure = self.structure.predict(lines);
        structure.tables = self.tables.predict(lines, page_width, page_height);
        log::debug!(
            "Inference: {} lines -> {} titles, {} paragraphs, {} headings, {} tables",
            lines.len(),
            structure.titles.len(),
            structure.paragraphs.len(),
            structure.headings.len(),
            structure.tables.len()
        );
        structure
    }
}

impl Default for Predictors {
    fn default() -> Self {
        Self::heuristic(&InferenceConfig::default())
    }
}

impl std::fmt::Debug for Predictors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictors").finish_non_exhaustive()
    }
}
