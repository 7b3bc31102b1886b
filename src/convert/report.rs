//! Conversion output with statistics and non-fatal warnings.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Counters collected during a conversion walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages processed
    pub page_count: usize,

    /// Content items (or inferred rows) emitted
    pub item_count: usize,

    pub paragraph_count: usize,

    pub table_count: usize,

    pub figure_count: usize,

    pub citation_count: usize,

    /// Text items classified as RTL
    pub rtl_item_count: usize,

    /// Pages whose structure was inferred from raw lines
    pub inferred_page_count: usize,

    /// Entities skipped for missing geometry
    pub skipped_count: usize,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Statistics and recoverable problems of one conversion.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub stats: ConversionStats,

    /// Non-fatal errors, such as [`Error::MissingGeometry`] and [`Error::PageOutOfRange`]
    pub warnings: Vec<Error>,
}

impl ConversionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recoverable problem.
    pub fn warn(&mut self, error: Error) {
        log::warn!("{}", error);
        if error.is_recoverable() {
            self.stats.skipped_count += 1;
        }
        self.warnings.push(error);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A conversion result together with its report.
#[derive(Debug)]
pub struct Converted<T> {
    pub output: T,
    pub report: ConversionReport,
}

impl<T> Converted<T> {
    pub fn new(output: T, report: ConversionReport) -> Self {
        Self { output, report }
    }

    /// Drop the report.
    pub fn into_output(self) -> T {
        self.output
    }
}
