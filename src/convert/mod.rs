//! Conversion between the hierarchical and layered document models.
//!
//! The converters do the work; the registry dispatches JSON payloads to
//! adapters by source and target format name.
//!
//! # Example
//!
//! ```no_run
//! use doclayer::convert::AdapterRegistry;
//!
//! fn main() -> doclayer::Result<()> {
//!     let registry = AdapterRegistry::with_defaults();
//!     let payload = serde_json::json!({ "pages": [] });
//!     let layered = registry.convert(&payload, "hierarchical", "layered")?;
//!     println!("{}", layered["symbols"]);
//!     Ok(())
//! }
//! ```

mod adapter;
mod forward;
mod options;
mod report;
mod reverse;

pub use adapter::{ForwardAdapter, ReverseAdapter};
pub use forward::ForwardConverter;
pub use options::{ConvertOptions, InferenceMode, CONFIG_VERSION};
pub use report::{ConversionReport, ConversionStats, Converted};
pub use reverse::ReverseConverter;

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The two document models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Pages of typed content items
    Hierarchical,
    /// One text buffer plus entity layers
    Layered,
}

impl Format {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Hierarchical => "hierarchical",
            Format::Layered => "layered",
        }
    }

    /// The other model.
    pub fn opposite(&self) -> Format {
        match self {
            Format::Hierarchical => Format::Layered,
            Format::Layered => Format::Hierarchical,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hierarchical" => Ok(Format::Hierarchical),
            "layered" => Ok(Format::Layered),
            other => Err(Error::Other(format!("Unknown format: {}", other))),
        }
    }
}

/// A format name with an optional `major.minor` version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatVersion {
    pub name: String,
    pub major: Option<u32>,
    pub minor: Option<u32>,
}

impl FormatVersion {
    /// An unversioned format.
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            major: None,
            minor: None,
        }
    }

    /// A versioned format.
    pub fn versioned(name: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            name: name.into().to_lowercase(),
            major: Some(major),
            minor: Some(minor),
        }
    }

    /// Check the name is non-empty and the version parts come together.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("format name cannot be empty".into()));
        }
        if self.major.is_some() != self.minor.is_some() {
            return Err(Error::InvalidConfig(format!(
                "format '{}' needs both major and minor versions",
                self.name
            )));
        }
        Ok(())
    }

    /// Same name, and equal major versions when both carry one.
    pub fn is_compatible_with(&self, other: &FormatVersion) -> bool {
        if !self.name.eq_ignore_ascii_case(&other.name) {
            return false;
        }
        match (self.major, other.major) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.major, self.minor) {
            (Some(major), Some(minor)) => write!(f, "{}-v{}.{}", self.name, major, minor),
            _ => f.write_str(&self.name),
        }
    }
}

impl FromStr for FormatVersion {
    type Err = Error;

    /// Parse `"name"` or `"name-vMAJOR.MINOR"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = s.rsplit_once("-v").and_then(|(name, version)| {
            let (major, minor) = version.split_once('.')?;
            Some(FormatVersion::versioned(name, major.parse().ok()?, minor.parse().ok()?))
        });
        let version = parsed.unwrap_or_else(|| FormatVersion::unversioned(s));
        version.validate()?;
        Ok(version)
    }
}

/// Trait for format adapters.
///
/// Implement this trait to add a conversion between two payload formats.
pub trait FormatAdapter: Send + Sync {
    /// Name of this adapter.
    fn name(&self) -> &str;

    /// Format the adapter reads.
    fn source_format(&self) -> FormatVersion;

    /// Format the adapter produces.
    fn target_format(&self) -> FormatVersion;

    /// Convert a JSON payload.
    fn convert(&self, payload: &Value) -> Result<Value>;

    /// Check if this adapter handles the given pair.
    fn handles(&self, source: &FormatVersion, target: &FormatVersion) -> bool {
        self.source_format().is_compatible_with(source)
            && self.target_format().is_compatible_with(target)
    }
}

/// Registry of format adapters.
///
/// The registry maps (source, target) format names to adapters.
pub struct AdapterRegistry {
    adapters: HashMap<(String, String), Arc<dyn FormatAdapter>>,
    by_name: HashMap<String, Arc<dyn FormatAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the forward and reverse adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ForwardAdapter::default()));
        registry.register(Arc::new(ReverseAdapter::default()));
        registry
    }

    /// Create a registry whose default adapters use `options`, once they validate.
    pub fn with_options(options: ConvertOptions) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(ForwardAdapter::try_new(options.clone())?));
        registry.register(Arc::new(ReverseAdapter::try_new(options)?));
        Ok(registry)
    }

    /// Register an adapter, replacing any adapter for the same pair.
    pub fn register(&mut self, adapter: Arc<dyn FormatAdapter>) {
        let key = (
            adapter.source_format().name.to_lowercase(),
            adapter.target_format().name.to_lowercase(),
        );
        log::debug!("Registering adapter '{}' for {} -> {}", adapter.name(), key.0, key.1);
        self.adapters.insert(key, adapter.clone());
        self.by_name.insert(adapter.name().to_lowercase(), adapter);
    }

    /// Get the adapter for a format pair. Names may carry a `-vMAJOR.MINOR` suffix.
    pub fn get_for_formats(&self, source: &str, target: &str) -> Option<Arc<dyn FormatAdapter>> {
        let source: FormatVersion = source.parse().ok()?;
        let target: FormatVersion = target.parse().ok()?;
        self.adapters
            .get(&(source.name.clone(), target.name.clone()))
            .filter(|adapter| adapter.handles(&source, &target))
            .cloned()
    }

    /// Get an adapter by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn FormatAdapter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if a format pair is supported.
    pub fn supports(&self, source: &str, target: &str) -> bool {
        self.get_for_formats(source, target).is_some()
    }

    /// Registered (source, target) pairs, sorted.
    pub fn supported_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self.adapters.keys().cloned().collect();
        pairs.sort();
        pairs
    }

    /// Convert a payload with the adapter registered for the pair.
    pub fn convert(&self, payload: &Value, source: &str, target: &str) -> Result<Value> {
        let adapter = self
            .get_for_formats(source, target)
            .ok_or_else(|| Error::UnsupportedFormat {
                source_format: source.to_string(),
                target_format: target.to_string(),
            })?;
        adapter.convert(payload)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("pairs", &self.supported_pairs())
            .finish()
    }
}
