//! Rendering module for reading and writing documents as JSON.

mod json;

pub use json::{
    document_to_value, from_json_str, source_from_json_str, source_to_json, to_json,
    validate_value, JsonFormat,
};
