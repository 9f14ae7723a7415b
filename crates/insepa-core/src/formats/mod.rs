//! # Formats
//!
//! Serialization of the two persisted documents.

pub mod document;

pub use document::{
    LoadReport, namespaces_from_json, namespaces_to_json, pool_from_json, pool_to_json,
};
