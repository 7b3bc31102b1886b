//! Right-to-left and bidirectional text processing.
//!
//! Classification works from a fixed table of RTL code-point ranges.
//! Display reordering uses the Unicode Bidirectional Algorithm when the
//! `bidi` feature is enabled and falls back to reversing RTL runs otherwise.

mod direction;
mod normalize;
mod reorder;

pub use direction::{
    contains_rtl, is_rtl, is_rtl_char, is_rtl_language, is_rtl_with_threshold, rtl_ratio, runs,
    text_direction, Direction, Run, RTL_THRESHOLD,
};
pub use normalize::{
    direction_marker, isolate, mark_runs, normalize_rtl_text, ALM, LRM, PDI, RLI, RLM,
};
pub use reorder::{reorder_words, reverse_rtl_runs, BidiCapability};

use crate::error::{Error, Result};

/// RTL processor bound to a reordering capability and threshold.
#[derive(Debug, Clone, Copy)]
pub struct RtlProcessor {
    capability: BidiCapability,
    threshold: f64,
}

impl RtlProcessor {
    /// Create a processor with the best capability of this build.
    pub fn new() -> Self {
        Self {
            capability: BidiCapability::detect(),
            threshold: RTL_THRESHOLD,
        }
    }

    /// Create a processor with a specific capability.
    ///
    /// Fails when the capability is not compiled in.
    pub fn with_capability(capability: BidiCapability) -> Result<Self> {
        if !capability.is_available() {
            return Err(Error::InvalidConfig(format!(
                "bidi capability {:?} requires the `bidi` feature",
                capability
            )));
        }
        Ok(Self {
            capability,
            threshold: RTL_THRESHOLD,
        })
    }

    /// Set the RTL ratio threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn capability(&self) -> BidiCapability {
        self.capability
    }

    /// Check if text is RTL under this processor's threshold.
    pub fn is_rtl(&self, text: &str) -> bool {
        is_rtl_with_threshold(text, self.threshold)
    }

    /// Reorder RTL text for display. LTR text is returned unchanged.
    pub fn reorder(&self, text: &str) -> String {
        if !self.is_rtl(text) {
            return text.to_string();
        }
        match self.capability {
            #[cfg(feature = "bidi")]
            BidiCapability::UnicodeBidi => reorder::reorder_uba(&normalize_rtl_text(text)),
            _ => reverse_rtl_runs(text),
        }
    }

    /// Normalize then reorder a paragraph.
    pub fn process_paragraph(&self, text: &str) -> String {
        if !self.is_rtl(text) {
            return text.to_string();
        }
        self.reorder(&normalize_rtl_text(text))
    }

    /// Process only the RTL runs of mixed-direction text.
    pub fn process_mixed_text(&self, text: &str) -> String {
        runs(text)
            .into_iter()
            .map(|run| {
                if run.rtl {
                    self.process_paragraph(run.text)
                } else {
                    run.text.to_string()
                }
            })
            .collect()
    }

    /// Reverse a word list when the joined words read right to left.
    pub fn reorder_words<T: AsRef<str>>(&self, words: Vec<T>) -> Vec<T> {
        reorder_words(words)
    }
}

impl Default for RtlProcessor {
    fn default() -> Self {
        Self::new()
    }
}
