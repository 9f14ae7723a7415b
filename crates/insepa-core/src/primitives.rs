//! # Innate Primitives
//!
//! Hardcoded runtime constants for the INSEPA engine.
//!
//! These primitives are compiled into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Segmentation Primitive**: Splits text into word and symbol units.
//! 2. **Indexing Primitive**: One monotonic index line per namespace.
//! 3. **Default Namespace**: Synthesized whenever the registry would be empty.

/// A unit is a maximal run of word characters or a maximal run of non-space
/// symbols.
///
/// Whitespace always separates and never forms a unit.
pub const UNIT_PATTERN: &str = r"\w+|[^\w\s]+";

/// Sentence boundary used for segmentation suggestions.
///
/// A boundary is a terminal mark followed by whitespace; the mark stays with
/// the sentence before it.
pub const SENTENCE_BOUNDARY_PATTERN: &str = r"[.?!]\s+";

/// Identifier of the namespace synthesized when the registry is empty.
pub const DEFAULT_NAMESPACE_ID: u64 = 0;

/// Name of the namespace synthesized when the registry is empty.
pub const DEFAULT_NAMESPACE_NAME: &str = "Interações";

/// Prefix of the display name given to pool entries (`"Texto 3"`).
pub const POOL_ENTRY_NAME_PREFIX: &str = "Texto";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum size of a persisted document accepted by the loader (64 MB).
///
/// Checked before parsing so an oversized file is never materialized.
pub const MAX_DOCUMENT_SIZE: usize = 64 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_namespace_is_zero() {
        assert_eq!(DEFAULT_NAMESPACE_ID, 0);
        assert_eq!(DEFAULT_NAMESPACE_NAME, "Interações");
    }
}
