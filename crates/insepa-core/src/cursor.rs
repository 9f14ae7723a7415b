//! # Namespace Cursor
//!
//! The highest sequence number ever used within a namespace.
//!
//! The cursor is recomputed from the full block history every time it is
//! needed. The `ultimo_child` marker stored on the namespace is output only;
//! it is never read back to decide the next allocation.

use crate::Namespace;

/// The NamespaceCursor scans a namespace's blocks for its index high-water mark.
pub struct NamespaceCursor;

impl NamespaceCursor {
    /// Maximum sequence number over every entrada and saida token in the
    /// namespace. Returns 0 for a namespace without blocks.
    ///
    /// Only the sequence part is considered, so tokens minted under an older
    /// namespace id (before a reindex) still count.
    #[must_use]
    pub fn last_index(namespace: &Namespace) -> u64 {
        namespace
            .blocks
            .iter()
            .flat_map(|block| block.tokens())
            .map(|token| token.sequence)
            .max()
            .unwrap_or(0)
    }

    /// The first index available for the next allocation.
    #[must_use]
    pub fn next_index(namespace: &Namespace) -> u64 {
        Self::last_index(namespace).saturating_add(1)
    }
}

// =============================================================================
// TESTS
// =============================================================================
