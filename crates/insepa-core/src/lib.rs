//! # insepa-core
//!
//! The deterministic indexing engine for INSEPA - THE LOGIC.
//!
//! This crate implements sequential indexing of text fragments into dotted
//! hierarchical tokens, the block lifecycle (input-only block, multi-output
//! append with merge), the alnulu checksum, the text pool, and the CB
//! trigger-set matcher.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is synchronous and pure: no I/O, no async, no logging dependency
//! - Is deterministic: `BTreeMap`/`BTreeSet` only, integer arithmetic only
//! - Validates before it mutates: a rejected operation changes nothing
//! - Leaves persistence to the caller, one whole-document write per operation

// =============================================================================
// MODULES
// =============================================================================

pub mod checksum;
pub mod cursor;
pub mod formats;
pub mod lifecycle;
pub mod pool;
pub mod primitives;
pub mod registry;
pub mod session;
pub mod tokenizer;
pub mod trigger;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Block, CbConfig, CbStatus, Entrada, EntradaField, EntradaTokens, InsepaError, Namespace,
    Passage, PoolEntry, PoolTokens, Saida, SaidaField, SaidaTokens, Token, TokenGroups,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use checksum::checksum;
pub use cursor::NamespaceCursor;
pub use lifecycle::BlockLifecycle;
pub use pool::TextPool;
pub use registry::NamespaceRegistry;
pub use session::Session;
pub use tokenizer::UnitTokenizer;
pub use trigger::TriggerSetMatcher;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    LoadReport, namespaces_from_json, namespaces_to_json, pool_from_json, pool_to_json,
};
