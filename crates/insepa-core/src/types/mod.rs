//! # Core Type Definitions
//!
//! This module contains all core types for the INSEPA document model:
//! - Token identifiers (`Token`, `TokenGroups`) and their wire groupings
//! - Namespace content (`Namespace`, `Block`, `Entrada`, `Saida`)
//! - Pool content (`PoolEntry`)
//! - Trigger configuration (`CbConfig`, `CbStatus`)
//! - Editable fields (`EntradaField`, `SaidaField`)
//! - Error types (`InsepaError`)
//!
//! Rust field names are English; the serialized names are the ones the
//! persisted documents have always used (`texto`, `reacao`, `blocos`, ...).
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they act as map keys or set members

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// TOKEN
// =============================================================================

/// A dotted `scope.sequence` identifier marking one unit's position.
///
/// For namespace blocks the scope is the namespace id at allocation time,
/// for pool entries it is the entry's 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token {
    /// Namespace id or pool position.
    pub scope: u64,
    /// Position on the scope's index line.
    pub sequence: u64,
}

impl Token {
    /// Create a new token.
    #[must_use]
    pub const fn new(scope: u64, sequence: u64) -> Self {
        Self { scope, sequence }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.sequence)
    }
}

impl FromStr for Token {
    type Err = InsepaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, sequence) = s
            .split_once('.')
            .ok_or_else(|| InsepaError::MalformedToken(s.to_string()))?;
        let scope = scope
            .parse()
            .map_err(|_| InsepaError::MalformedToken(s.to_string()))?;
        let sequence = sequence
            .parse()
            .map_err(|_| InsepaError::MalformedToken(s.to_string()))?;
        Ok(Self { scope, sequence })
    }
}

impl TryFrom<String> for Token {
    type Error = InsepaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.to_string()
    }
}

/// Serde adapter for "last token" fields, persisted as `""` when absent.
pub(crate) mod optional_token {
    use super::Token;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(token: &Option<Token>, s: S) -> Result<S::Ok, S::Error> {
        match token {
            Some(t) => s.collect_str(t),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Token>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(de::Error::custom)
    }
}

/// Token groups produced by one allocation: primary, secondary, tertiary and
/// their concatenation, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenGroups {
    pub primary: Vec<Token>,
    pub secondary: Vec<Token>,
    pub tertiary: Vec<Token>,
    pub total: Vec<Token>,
}

impl TokenGroups {
    /// Last token of the concatenated group, if any.
    #[must_use]
    pub fn last(&self) -> Option<Token> {
        self.total.last().copied()
    }
}

/// Input token set as persisted: `{E, RE, CE, TOTAL}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntradaTokens {
    #[serde(rename = "E", default)]
    pub text: Vec<Token>,
    #[serde(rename = "RE", default)]
    pub reaction: Vec<Token>,
    #[serde(rename = "CE", default)]
    pub context: Vec<Token>,
    #[serde(rename = "TOTAL", default)]
    pub total: Vec<Token>,
}

impl From<TokenGroups> for EntradaTokens {
    fn from(groups: TokenGroups) -> Self {
        Self {
            text: groups.primary,
            reaction: groups.secondary,
            context: groups.tertiary,
            total: groups.total,
        }
    }
}

/// Output token set as persisted: `{S, RS, CS, TOTAL}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaidaTokens {
    #[serde(rename = "S", default)]
    pub text: Vec<Token>,
    #[serde(rename = "RS", default)]
    pub reaction: Vec<Token>,
    #[serde(rename = "CS", default)]
    pub context: Vec<Token>,
    #[serde(rename = "TOTAL", default)]
    pub total: Vec<Token>,
}

impl From<TokenGroups> for SaidaTokens {
    fn from(groups: TokenGroups) -> Self {
        Self {
            text: groups.primary,
            reaction: groups.secondary,
            context: groups.tertiary,
            total: groups.total,
        }
    }
}

// =============================================================================
// PASSAGE (operation input)
// =============================================================================

/// The three text fields submitted for one side of a block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Passage {
    /// Primary text, decomposed into units.
    pub text: String,
    /// Reaction, tokenized as one whole-field unit.
    pub reaction: String,
    /// Context, tokenized as one whole-field unit.
    pub context: String,
}

impl Passage {
    /// Create a new passage.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        reaction: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            reaction: reaction.into(),
            context: context.into(),
        }
    }

    /// A passage whose primary text is blank is a deliberate skip.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// =============================================================================
// BLOCK
// =============================================================================

/// The input side of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrada {
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "reacao", default)]
    pub reaction: String,
    #[serde(rename = "contexto", default)]
    pub context: String,
    #[serde(default)]
    pub tokens: EntradaTokens,
    #[serde(rename = "fim", default, with = "optional_token")]
    pub end: Option<Token>,
    #[serde(rename = "alnulu", default)]
    pub checksum: i64,
}

/// One output record of a block.
///
/// Consecutive outputs sharing reaction and context are merged into the same
/// record: `texts` gains a fragment and the token sets grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Saida {
    #[serde(rename = "textos")]
    pub texts: Vec<String>,
    #[serde(rename = "reacao", default)]
    pub reaction: String,
    #[serde(rename = "contexto", default)]
    pub context: String,
    #[serde(default)]
    pub tokens: SaidaTokens,
    #[serde(rename = "fim", default, with = "optional_token")]
    pub end: Option<Token>,
    /// Checksum over every fragment (the checksum is additive).
    #[serde(rename = "alnulu", default)]
    pub checksum: i64,
}

/// One input fragment plus zero or more output records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Dense, 1-based within the namespace.
    #[serde(rename = "bloco_id")]
    pub id: u64,
    pub entrada: Entrada,
    #[serde(default)]
    pub saidas: Vec<Saida>,
    #[serde(default)]
    pub open: bool,
}

impl Block {
    /// Every token of the block, entrada first, then each saida in order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.entrada
            .tokens
            .total
            .iter()
            .chain(self.saidas.iter().flat_map(|s| s.tokens.total.iter()))
    }
}

// =============================================================================
// TRIGGER CONFIGURATION
// =============================================================================

/// Whether a namespace's CB is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CbStatus {
    #[serde(rename = "disponivel")]
    Enabled,
    #[default]
    #[serde(rename = "indisponivel")]
    Disabled,
}

impl CbStatus {
    /// The persisted spelling of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "disponivel",
            Self::Disabled => "indisponivel",
        }
    }
}

impl fmt::Display for CbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CbStatus {
    type Err = InsepaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "disponivel" | "enabled" | "on" => Ok(Self::Enabled),
            "indisponivel" | "disabled" | "off" => Ok(Self::Disabled),
            other => Err(InsepaError::MalformedStatus(other.to_string())),
        }
    }
}

/// Per-namespace CB configuration: the target set of block ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CbConfig {
    pub status: CbStatus,
    #[serde(default)]
    pub bids: Vec<u64>,
}

impl CbConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(status: CbStatus, bids: Vec<u64>) -> Self {
        Self { status, bids }
    }

    /// Check if registrations are currently observed.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status == CbStatus::Enabled
    }
}

// =============================================================================
// NAMESPACE
// =============================================================================

/// A namespace ("mãe"): one unbroken index line and its blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(rename = "nome")]
    pub name: String,
    /// Advisory marker of the last token issued. Never trusted for allocation.
    #[serde(rename = "ultimo_child")]
    pub last_child: String,
    #[serde(rename = "blocos", default)]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cb: Option<CbConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cbcs: Option<Vec<Vec<u64>>>,
}

impl Namespace {
    /// Create an empty namespace whose cursor marker sits at `{id}.0`.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_child: Token::new(id, 0).to_string(),
            blocks: Vec::new(),
            cb: None,
            cbcs: None,
        }
    }

    /// Look up a block by its 1-based id.
    #[must_use]
    pub fn block(&self, id: u64) -> Option<&Block> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.blocks.get(index)
    }

    /// Look up a block mutably by its 1-based id.
    pub fn block_mut(&mut self, id: u64) -> Option<&mut Block> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.blocks.get_mut(index)
    }

    /// Reassign block ids as `1..=N` in current order.
    pub fn renumber_blocks(&mut self) {
        for (block, id) in self.blocks.iter_mut().zip(1u64..) {
            block.id = id;
        }
    }
}

// =============================================================================
// POOL ENTRY
// =============================================================================

/// Pool token set as persisted: `{TOTAL}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolTokens {
    #[serde(rename = "TOTAL", default)]
    pub total: Vec<Token>,
}

/// One ingested raw text with its locally-scoped index line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(default)]
    pub tokens: PoolTokens,
    #[serde(rename = "ultimo_child", default, with = "optional_token")]
    pub last_child: Option<Token>,
    #[serde(rename = "fim", default, with = "optional_token")]
    pub end: Option<Token>,
    #[serde(rename = "alnulu", default)]
    pub checksum: i64,
}

// =============================================================================
// EDITABLE FIELDS
// =============================================================================

/// Fields of an entrada that can be overwritten in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntradaField {
    Text,
    Reaction,
    Context,
}

/// Fields of a saida that can be overwritten in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaidaField {
    Reaction,
    Context,
    /// The fragment at a 1-based position of `texts`.
    FragmentAt(usize),
}

// =============================================================================
// ADVISORY MARKER
// =============================================================================

/// Accept the advisory `ultimo_child` marker as a string or a bare integer.
///
/// Some writers stored the raw last index instead of a token string; the
/// number is kept as text and qualified during load.
pub(crate) fn advisory_marker<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Marker {
        Text(String),
        Index(u64),
    }

    Ok(match Option::<Marker>::deserialize(d)? {
        Some(Marker::Text(s)) => s,
        Some(Marker::Index(n)) => n.to_string(),
        None => String::new(),
    })
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the INSEPA engine.
///
/// - Not-found and malformed conditions are rejected before any mutation
/// - Blank input is a skip, never an error
/// - Nothing here is fatal; every error is recoverable by the caller
#[derive(Debug, Error)]
pub enum InsepaError {
    /// The namespace id is outside the dense range.
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(u64),

    /// The block id is outside the namespace's dense range.
    #[error("Block not found: {block} in namespace {namespace}")]
    BlockNotFound { namespace: u64, block: u64 },

    /// The output index is outside the block's output list.
    #[error("Output not found: #{output} in block {block}")]
    OutputNotFound { block: u64, output: usize },

    /// The fragment index is outside the output's fragment list.
    #[error("Fragment not found: #{fragment} in output #{output}")]
    FragmentNotFound { output: usize, fragment: usize },

    /// The pool position is outside `1..=len`.
    #[error("Pool entry not found: {0}")]
    PoolEntryNotFound(usize),

    /// The CBC index is outside the namespace's CBC list.
    #[error("CBC not found: #{0}")]
    CbcNotFound(usize),

    /// A range expression did not match `start-end`.
    #[error("Malformed range: '{0}' (expected start-end, e.g. 2-5)")]
    MalformedRange(String),

    /// An identifier list contained a non-numeric entry.
    #[error("Malformed identifier list: '{0}'")]
    MalformedIdList(String),

    /// A token string did not match `scope.sequence`.
    #[error("Malformed token: '{0}'")]
    MalformedToken(String),

    /// A CB status was neither enabled nor disabled.
    #[error("Malformed CB status: '{0}'")]
    MalformedStatus(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_display_and_parse() {
        let token = Token::new(3, 12);
        assert_eq!(token.to_string(), "3.12");
        assert_eq!("3.12".parse::<Token>().expect("parse"), token);
    }

    #[test]
    fn token_rejects_malformed() {
        assert!(matches!(
            "312".parse::<Token>(),
            Err(InsepaError::MalformedToken(_))
        ));
        assert!("a.1".parse::<Token>().is_err());
        assert!("1.".parse::<Token>().is_err());
    }

    #[test]
    fn token_serializes_as_string() {
        let json = serde_json::to_string(&Token::new(0, 4)).expect("serialize");
        assert_eq!(json, "\"0.4\"");
    }

    #[test]
    fn missing_end_token_serializes_empty() {
        let entry = PoolEntry {
            name: "Texto 1".to_string(),
            text: String::new(),
            tokens: PoolTokens::default(),
            last_child: None,
            end: None,
            checksum: 0,
        };
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["fim"], "");
        assert_eq!(json["ultimo_child"], "");

        let back: PoolEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, entry);
    }

    #[test]
    fn cb_status_wire_names() {
        let json = serde_json::to_string(&CbStatus::Enabled).expect("serialize");
        assert_eq!(json, "\"disponivel\"");
        assert_eq!(
            "indisponivel".parse::<CbStatus>().expect("parse"),
            CbStatus::Disabled
        );
        assert!("maybe".parse::<CbStatus>().is_err());
    }

    #[test]
    fn namespace_block_lookup_is_one_based() {
        let ns = Namespace::new(0, "Interações");
        assert!(ns.block(0).is_none());
        assert!(ns.block(1).is_none());
        assert_eq!(ns.last_child, "0.0");
    }

    #[test]
    fn blank_passage_detected() {
        assert!(Passage::new("   ", "r", "c").is_blank());
        assert!(!Passage::new("Olá", "", "").is_blank());
    }
}
