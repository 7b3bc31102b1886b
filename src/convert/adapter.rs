//! JSON adapters wrapping the forward and reverse converters.

use super::{ConvertOptions, Format, FormatAdapter, FormatVersion, ForwardConverter, ReverseConverter};
use crate::error::{Error, Result};
use crate::model::{Document, SourceDocument};
use crate::render;
use serde_json::Value;

/// Version of the layered JSON schema produced here.
const LAYERED_MAJOR: u32 = 1;
const LAYERED_MINOR: u32 = 0;

fn layered_version() -> FormatVersion {
    FormatVersion::versioned(Format::Layered.name(), LAYERED_MAJOR, LAYERED_MINOR)
}

/// Hierarchical JSON to layered JSON.
#[derive(Debug, Clone, Default)]
pub struct ForwardAdapter {
    converter: ForwardConverter,
}

impl ForwardAdapter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            converter: ForwardConverter::new(options),
        }
    }

    /// Validate `options`, then create an adapter.
    pub fn try_new(options: ConvertOptions) -> Result<Self> {
        Ok(Self::from_converter(ForwardConverter::try_new(options)?))
    }

    /// Wrap a configured converter.
    pub fn from_converter(converter: ForwardConverter) -> Self {
        Self { converter }
    }
}

impl FormatAdapter for ForwardAdapter {
    fn name(&self) -> &str {
        "forward"
    }

    fn source_format(&self) -> FormatVersion {
        FormatVersion::unversioned(Format::Hierarchical.name())
    }

    fn target_format(&self) -> FormatVersion {
        layered_version()
    }

    fn convert(&self, payload: &Value) -> Result<Value> {
        let source: SourceDocument = serde_json::from_value(payload.clone()).map_err(|e| {
            Error::conversion(Format::Hierarchical.name(), Format::Layered.name(), e.into())
        })?;
        let doc = self.converter.convert(&source)?;
        render::document_to_value(&doc)
    }
}

/// Layered JSON to hierarchical JSON.
#[derive(Debug, Clone, Default)]
pub struct ReverseAdapter {
    converter: ReverseConverter,
}

impl ReverseAdapter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            converter: ReverseConverter::new(options),
        }
    }

    /// Validate `options`, then create an adapter.
    pub fn try_new(options: ConvertOptions) -> Result<Self> {
        Ok(Self {
            converter: ReverseConverter::try_new(options)?,
        })
    }
}

impl FormatAdapter for ReverseAdapter {
    fn name(&self) -> &str {
        "reverse"
    }

    fn source_format(&self) -> FormatVersion {
        layered_version()
    }

    fn target_format(&self) -> FormatVersion {
        FormatVersion::unversioned(Format::Hierarchical.name())
    }

    fn convert(&self, payload: &Value) -> Result<Value> {
        render::validate_value(payload)?;
        let doc: Document = serde_json::from_value(payload.clone())?;
        let source = self.converter.convert(&doc)?;
        Ok(serde_json::to_value(&source)?)
    }
}
