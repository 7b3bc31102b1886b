//! Conversion options and configuration.

use crate::error::{Error, Result};
use crate::infer::InferenceConfig;
use serde::{Deserialize, Serialize};

/// Current version of the options schema.
pub const CONFIG_VERSION: u32 = 1;

/// Options for converting between the two document models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Schema version of these options
    pub version: u32,

    /// Flag RTL text items in entity metadata
    pub detect_rtl: bool,

    /// Add reordered `display_text` to RTL entities
    pub display_reordering: bool,

    /// Extract numeric citations from sentences
    pub extract_citations: bool,

    /// Lines that open the bibliography (both sides compared trimmed and lowercased)
    pub bibliography_markers: Vec<String>,

    /// When to run structural inference
    pub infer_structure: InferenceMode,

    /// Inferred candidates below this confidence are dropped
    pub min_confidence: f64,

    /// Page width used when the source has none
    pub default_page_width: f64,

    /// Page height used when the source has none
    pub default_page_height: f64,

    /// Heuristic thresholds
    pub inference: InferenceConfig,
}

impl ConvertOptions {
    /// Create new conversion options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Enable or disable RTL detection.
    pub fn with_rtl_detection(mut self, detect: bool) -> Self {
        self.detect_rtl = detect;
        self
    }

    /// Enable or disable display reordering of RTL text.
    pub fn with_display_reordering(mut self, reorder: bool) -> Self {
        self.display_reordering = reorder;
        self
    }

    /// Enable or disable citation extraction.
    pub fn with_citations(mut self, extract: bool) -> Self {
        self.extract_citations = extract;
        self
    }

    /// Set the bibliography marker lines.
    pub fn with_bibliography_markers<S: Into<String>>(
        mut self,
        markers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.bibliography_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the inference mode.
    pub fn with_inference_mode(mut self, mode: InferenceMode) -> Self {
        self.infer_structure = mode;
        self
    }

    /// Never run structural inference.
    pub fn without_inference(mut self) -> Self {
        self.infer_structure = InferenceMode::Never;
        self
    }

    /// Set the confidence gate for inferred candidates.
    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Set the default page size.
    pub fn with_default_page_size(mut self, width: f64, height: f64) -> Self {
        self.default_page_width = width;
        self.default_page_height = height;
        self
    }

    /// Set the heuristic thresholds.
    pub fn with_inference_config(mut self, config: InferenceConfig) -> Self {
        self.inference = config;
        self
    }

    /// Check the options once, at the boundary.
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(Error::InvalidConfig(format!(
                "unsupported options version {} (expected {})",
                self.version, CONFIG_VERSION
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidConfig(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.default_page_width) || !positive(self.default_page_height) {
            return Err(Error::InvalidConfig(format!(
                "default page size must be positive, got {}x{}",
                self.default_page_width, self.default_page_height
            )));
        }
        self.inference.validate()
    }

    /// Whether a line opens the bibliography, ignoring case and surrounding space.
    pub fn is_bibliography_marker(&self, text: &str) -> bool {
        let normalized = text.trim().to_lowercase();
        self.bibliography_markers
            .iter()
            .any(|m| m.trim().to_lowercase() == normalized)
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            detect_rtl: true,
            display_reordering: false,
            extract_citations: true,
            bibliography_markers: ["references", "bibliography", "works cited"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            infer_structure: InferenceMode::WhenAbsent,
            min_confidence: 0.5,
            default_page_width: 612.0,
            default_page_height: 792.0,
            inference: InferenceConfig::default(),
        }
    }
}

/// When structural inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// Pages without typed items are emitted without structure
    Never,
    /// Infer structure for pages that carry only raw lines
    #[default]
    WhenAbsent,
}
