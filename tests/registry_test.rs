//! Integration tests for the adapter registry and model detection.

use std::sync::Arc;

use doclayer::convert::{AdapterRegistry, Format, FormatAdapter, FormatVersion};
use doclayer::{detect_format, detect_format_from_path, Error, Result};
use serde_json::{json, Value};

/// Adapter that upper-cases a `text` field.
struct ShoutAdapter;

impl FormatAdapter for ShoutAdapter {
    fn name(&self) -> &str {
        "shout"
    }

    fn source_format(&self) -> FormatVersion {
        FormatVersion::unversioned("plain")
    }

    fn target_format(&self) -> FormatVersion {
        FormatVersion::versioned("loud", 2, 1)
    }

    fn convert(&self, payload: &Value) -> Result<Value> {
        let text = payload["text"]
            .as_str()
            .ok_or_else(|| Error::Validation("missing text".into()))?;
        Ok(json!({ "text": text.to_uppercase() }))
    }
}

fn hierarchical() -> Value {
    json!({
        "id": "reg",
        "pages": [{
            "width": 612.0,
            "height": 792.0,
            "content": [
                {"type": "text", "text": "Hello registry.", "category": "paragraph",
                 "bbox": [72.0, 72.0, 300.0, 90.0], "page": 1}
            ]
        }]
    })
}

#[test]
fn test_custom_adapter() {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(ShoutAdapter));

    assert!(registry.supports("plain", "loud"));
    assert!(registry.supports("PLAIN", "loud-v2.0"));
    assert!(!registry.supports("plain", "loud-v3.0"));
    assert!(!registry.supports("loud", "plain"));

    let out = registry
        .convert(&json!({"text": "quiet"}), "plain", "loud")
        .unwrap();
    assert_eq!(out, json!({"text": "QUIET"}));

    let err = registry.convert(&json!({}), "plain", "loud").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let adapter = registry.get_by_name("Shout").unwrap();
    assert_eq!(adapter.target_format().to_string(), "loud-v2.1");
}

#[test]
fn test_default_registry_round_trip() {
    let registry = AdapterRegistry::default();
    assert_eq!(
        registry.supported_pairs(),
        vec![
            ("hierarchical".to_string(), "layered".to_string()),
            ("layered".to_string(), "hierarchical".to_string()),
        ]
    );

    let layered = registry
        .convert(&hierarchical(), "hierarchical", "layered-v1.0")
        .unwrap();
    assert_eq!(layered["symbols"], "Hello registry.\n");
    assert_eq!(detect_format(&layered).unwrap(), Format::Layered);

    let back = registry.convert(&layered, "layered", "hierarchical").unwrap();
    assert_eq!(detect_format(&back).unwrap(), Format::Hierarchical);
    assert_eq!(back["pages"][0]["content"][0]["text"], "Hello registry.");
}

#[test]
fn test_unsupported_pair() {
    let registry = AdapterRegistry::with_defaults();
    let err = registry
        .convert(&hierarchical(), "hierarchical", "markdown")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedFormat { ref source_format, ref target_format }
            if source_format == "hierarchical" && target_format == "markdown"
    ));
    assert!(!err.is_recoverable());
}

#[test]
fn test_reverse_adapter_rejects_invalid_payload() {
    let registry = AdapterRegistry::with_defaults();
    let err = registry
        .convert(&json!({"symbols": "x"}), "layered", "hierarchical")
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_format_versions() {
    let version: FormatVersion = "layered-v1.2".parse().unwrap();
    assert_eq!(version, FormatVersion::versioned("layered", 1, 2));
    assert!(version.is_compatible_with(&FormatVersion::versioned("layered", 1, 0)));
    assert!(version.is_compatible_with(&FormatVersion::unversioned("layered")));
    assert!(!version.is_compatible_with(&FormatVersion::versioned("layered", 2, 2)));

    let bad = FormatVersion {
        name: "layered".into(),
        major: Some(1),
        minor: None,
    };
    assert!(matches!(bad.validate(), Err(Error::InvalidConfig(_))));
    assert!("".parse::<FormatVersion>().is_err());
}

#[test]
fn test_detect_format_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    std::fs::write(&path, hierarchical().to_string()).unwrap();
    assert_eq!(detect_format_from_path(&path).unwrap(), Format::Hierarchical);

    std::fs::write(&path, r#"{"title": "neither"}"#).unwrap();
    assert!(matches!(detect_format_from_path(&path), Err(Error::Validation(_))));
    assert!(detect_format_from_path(dir.path().join("absent.json")).is_err());
}
