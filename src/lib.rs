//! # doclayer
//!
//! Bidirectional conversion between hierarchical and layered document models.
//!
//! A hierarchical document is a list of pages holding typed, positioned
//! content items (text with nested sentences and words, tables, figures,
//! key-value pairs). A layered document is one text buffer (`symbols`) plus
//! named entity layers whose entities point into it with spans and boxes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use doclayer::model::{SourceDocument, SourcePage, TextItem};
//! use doclayer::render::{self, JsonFormat};
//!
//! fn main() -> doclayer::Result<()> {
//!     let source = SourceDocument::new("paper").with_page(
//!         SourcePage::letter()
//!             .with_item(TextItem::paragraph("Hello world.", [72.0, 72.0, 540.0, 90.0], 1)),
//!     );
//!
//!     let doc = doclayer::to_layered(&source)?;
//!     println!("{}", render::to_json(&doc, JsonFormat::Pretty)?);
//!
//!     let back = doclayer::to_hierarchical(&doc)?;
//!     assert_eq!(back.page_count(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Offset fidelity**: spans count chars and always slice `symbols` exactly
//! - **RTL support**: Arabic, Hebrew and friends are detected and flagged,
//!   with optional display reordering (Unicode Bidi behind the `bidi` feature)
//! - **Structural inference**: titles, paragraphs, headings and tables from raw lines
//! - **Storage**: LRU cache, gzip file store and parallel batch helpers

pub mod convert;
pub mod detect;
pub mod error;
pub mod infer;
pub mod model;
pub mod render;
pub mod rtl;
pub mod storage;

// Re-export commonly used types
pub use convert::{
    AdapterRegistry, ConversionReport, ConvertOptions, Converted, Format, FormatAdapter,
    FormatVersion, ForwardConverter, InferenceMode, ReverseConverter,
};
pub use detect::{detect_format, detect_format_from_path, detect_format_from_str};
pub use error::{Error, Result};
pub use infer::{InferenceConfig, Predictors};
pub use model::{Document, Entity, SourceDocument};
pub use render::JsonFormat;
pub use rtl::RtlProcessor;

use std::path::Path;

/// Convert a source document to a layered document with default options.
///
/// # Example
///
/// ```no_run
/// use doclayer::{to_layered, SourceDocument};
///
/// let doc = to_layered(&SourceDocument::new("empty")).unwrap();
/// assert_eq!(doc.symbols, "");
/// ```
pub fn to_layered(source: &SourceDocument) -> Result<Document> {
    ForwardConverter::default().convert(source)
}

/// Convert a layered document back to a source document with default options.
///
/// Entities without a box are skipped.
pub fn to_hierarchical(doc: &Document) -> Result<SourceDocument> {
    ReverseConverter::default().convert(doc)
}

/// Detect the model of a JSON document and convert it to the other one.
///
/// # Example
///
/// ```no_run
/// use doclayer::{convert_json, JsonFormat};
///
/// let layered = convert_json(r#"{"pages": []}"#, JsonFormat::Compact).unwrap();
/// assert!(layered.contains("\"symbols\""));
/// ```
pub fn convert_json(json: &str, format: JsonFormat) -> Result<String> {
    Doclayer::new().convert_str(json, format)
}

/// Read a JSON document from disk and convert it to the other model.
pub fn convert_file<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let json = std::fs::read_to_string(path)?;
    convert_json(&json, format)
}

/// Builder for configuring and running conversions.
///
/// # Example
///
/// ```no_run
/// use doclayer::{Doclayer, JsonFormat, SourceDocument};
///
/// let json = Doclayer::new()
///     .with_display_reordering()
///     .without_citations()
///     .with_min_confidence(0.6)
///     .forward(&SourceDocument::new("doc"))?
///     .to_json(JsonFormat::Pretty)?;
/// # Ok::<(), doclayer::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Doclayer {
    options: ConvertOptions,
    predictors: Option<Predictors>,
}

impl Doclayer {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Do not flag RTL text.
    pub fn without_rtl(mut self) -> Self {
        self.options = self.options.with_rtl_detection(false);
        self
    }

    /// Add reordered display text to RTL entities.
    pub fn with_display_reordering(mut self) -> Self {
        self.options = self.options.with_display_reordering(true);
        self
    }

    /// Do not extract citations.
    pub fn without_citations(mut self) -> Self {
        self.options = self.options.with_citations(false);
        self
    }

    /// Never infer structure from raw lines.
    pub fn without_inference(mut self) -> Self {
        self.options = self.options.without_inference();
        self
    }

    /// Drop inferred candidates below `confidence`.
    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.options = self.options.with_min_confidence(confidence);
        self
    }

    /// Use custom structure and table predictors.
    pub fn with_predictors(mut self, predictors: Predictors) -> Self {
        self.predictors = Some(predictors);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    fn forward_converter(&self) -> Result<ForwardConverter> {
        let converter = ForwardConverter::try_new(self.options.clone())?;
        Ok(match &self.predictors {
            Some(predictors) => converter.with_predictors(predictors.clone()),
            None => converter,
        })
    }

    /// Convert a source document to a layered one.
    pub fn forward(&self, source: &SourceDocument) -> Result<DoclayerResult> {
        let converted = self.forward_converter()?.convert_with_report(source)?;
        Ok(DoclayerResult {
            document: converted.output,
            report: converted.report,
        })
    }

    /// Convert a layered document back to a source document.
    pub fn reverse(&self, doc: &Document) -> Result<Converted<SourceDocument>> {
        ReverseConverter::try_new(self.options.clone())?.convert_with_report(doc)
    }

    /// Detect the model of `json` and convert it to the other one.
    pub fn convert_str(&self, json: &str, format: JsonFormat) -> Result<String> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        match detect_format(&value)? {
            Format::Hierarchical => {
                let source: SourceDocument = serde_json::from_value(value)?;
                self.forward(&source)?.to_json(format)
            }
            Format::Layered => {
                render::validate_value(&value)?;
                let doc: Document = serde_json::from_value(value)?;
                let converted = self.reverse(&doc)?;
                render::source_to_json(&converted.output, format)
            }
        }
    }
}

/// Result of a forward conversion.
#[derive(Debug)]
pub struct DoclayerResult {
    /// The layered document
    pub document: Document,
    /// Statistics and skipped entities
    pub report: ConversionReport,
}

impl DoclayerResult {
    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}
