//! Heuristic thresholds for structural inference.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Thresholds used by the structure and table detectors.
///
/// The defaults are empirical; none of them is known to be tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Lines from the top of the page considered for titles
    pub max_title_lines: usize,
    /// Titles have fewer words than this
    pub max_title_words: usize,
    pub main_title_confidence: f64,
    pub subtitle_confidence: f64,
    pub paragraph_confidence: f64,
    pub heading_confidence: f64,
    /// Lowercase prefixes that mark a heading
    pub heading_keywords: Vec<String>,
    /// Lowercase prefixes that make a heading level 1
    pub level_one_keywords: Vec<String>,

    /// Vertical quantum (points) used to group cells into rows
    pub row_quantum: f64,
    /// Segments a row needs to be a table-row candidate
    pub min_segments: usize,
    /// Whitespace run length that separates segments inside one cell
    pub min_gap_chars: usize,
    /// Gap standard deviation must stay below this share of the mean gap
    pub gap_stddev_ratio: f64,
    /// Consecutive candidate rows needed for a region
    pub min_table_rows: usize,
    /// Share of rows whose segment count is within one of the mean
    pub min_row_consistency: f64,
    pub table_confidence: f64,

    /// Horizontal slack around a region, as a share of its width
    pub caption_horizontal_margin: f64,
    /// Vertical reach above and below a region, as a share of page height
    pub caption_vertical_ratio: f64,
    pub caption_keyword_score: f64,
    pub caption_other_score: f64,
    /// Penalty per unit of page-normalized distance
    pub caption_distance_weight: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_title_lines: 3,
            max_title_words: 10,
            main_title_confidence: 0.7,
            subtitle_confidence: 0.5,
            paragraph_confidence: 0.8,
            heading_confidence: 0.6,
            heading_keywords: [
                "introduction",
                "abstract",
                "background",
                "method",
                "result",
                "discussion",
                "conclusion",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            level_one_keywords: ["abstract", "introduction", "conclusion"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            row_quantum: 3.0,
            min_segments: 3,
            min_gap_chars: 2,
            gap_stddev_ratio: 0.2,
            min_table_rows: 2,
            min_row_consistency: 0.7,
            table_confidence: 0.8,
            caption_horizontal_margin: 0.1,
            caption_vertical_ratio: 0.05,
            caption_keyword_score: 3.0,
            caption_other_score: 1.0,
            caption_distance_weight: 10.0,
        }
    }
}

impl InferenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the whitespace run that separates segments.
    pub fn with_min_gap_chars(mut self, chars: usize) -> Self {
        self.min_gap_chars = chars;
        self
    }

    /// Set the gap regularity threshold.
    pub fn with_gap_stddev_ratio(mut self, ratio: f64) -> Self {
        self.gap_stddev_ratio = ratio;
        self
    }

    /// Set the caption search reach.
    pub fn with_caption_vertical_ratio(mut self, ratio: f64) -> Self {
        self.caption_vertical_ratio = ratio;
        self
    }

    /// Set the row grouping quantum.
    pub fn with_row_quantum(mut self, quantum: f64) -> Self {
        self.row_quantum = quantum;
        self
    }

    /// Set the minimum number of rows for a table region.
    pub fn with_min_table_rows(mut self, rows: usize) -> Self {
        self.min_table_rows = rows;
        self
    }

    /// Reject values the detectors cannot work with.
    pub fn validate(&self) -> Result<()> {
        let confidences = [
            ("main_title_confidence", self.main_title_confidence),
            ("subtitle_confidence", self.subtitle_confidence),
            ("paragraph_confidence", self.paragraph_confidence),
            ("heading_confidence", self.heading_confidence),
            ("table_confidence", self.table_confidence),
            ("min_row_consistency", self.min_row_consistency),
        ];
        for (name, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.row_quantum.is_nan() || self.row_quantum <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "row_quantum must be positive, got {}",
                self.row_quantum
            )));
        }
        if self.gap_stddev_ratio < 0.0 || self.caption_vertical_ratio < 0.0 {
            return Err(Error::InvalidConfig(
                "gap and caption ratios must not be negative".into(),
            ));
        }
        if self.min_segments < 2 || self.min_table_rows < 1 || self.min_gap_chars < 1 {
            return Err(Error::InvalidConfig(
                "min_segments must be at least 2, min_table_rows and min_gap_chars at least 1"
                    .into(),
            ));
        }
        Ok(())
    }
}
