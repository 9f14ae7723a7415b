//! # Document Format
//!
//! JSON serialization for the namespace document and the pool document.
//!
//! File I/O operations are in the app layer; everything here is a pure
//! bytes-to-values transformation.
//!
//! ## Versioned Load
//!
//! Older writers produced shapes that the engine no longer works with
//! directly. They are upgraded exactly once, here, at the load boundary:
//!
//! - v1 blocks carry a single `saida` object (`{}` when empty) whose token
//!   groups are named `E/RE/CE`; they become a one-element `saidas` list
//! - outputs without an `alnulu` get it recomputed from their fragments
//! - a bare integer `ultimo_child` is qualified as `"{id}.{n}"` with the
//!   reindexed id
//! - bare-string pool entries are tokenized at their position
//!
//! After loading, the registry is reindexed so identifiers are dense.
//!
//! ## Security
//!
//! The document size is validated before parsing (`MAX_DOCUMENT_SIZE`).

use crate::checksum::checksum;
use crate::primitives::MAX_DOCUMENT_SIZE;
use crate::types::{advisory_marker, optional_token};
use crate::{
    Block, CbConfig, Entrada, EntradaTokens, InsepaError, Namespace, NamespaceRegistry,
    PoolEntry, Saida, SaidaTokens, TextPool, Token,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// LOAD REPORT
// =============================================================================

/// What the versioned-load step had to upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Blocks read in the single-`saida` shape.
    pub legacy_blocks: usize,
    /// Outputs whose checksum had to be recomputed.
    pub recomputed_checksums: usize,
    /// `ultimo_child` markers stored as bare integers.
    pub qualified_markers: usize,
    /// Pool entries stored as bare strings.
    pub legacy_pool_entries: usize,
}

impl LoadReport {
    /// Check if the load step changed anything.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// RAW (ON-DISK) SHAPES
// =============================================================================

#[derive(Deserialize)]
struct RawNamespaceDocument {
    #[serde(default)]
    maes: BTreeMap<u64, RawNamespace>,
}

#[derive(Deserialize)]
struct RawNamespace {
    nome: String,
    #[serde(default, deserialize_with = "advisory_marker")]
    ultimo_child: String,
    #[serde(default)]
    blocos: Vec<RawBlock>,
    #[serde(default)]
    cb: Option<CbConfig>,
    #[serde(default)]
    cbcs: Option<Vec<Vec<u64>>>,
}

#[derive(Deserialize)]
struct RawBlock {
    bloco_id: u64,
    entrada: Entrada,
    #[serde(default)]
    saidas: Option<Vec<RawSaida>>,
    #[serde(default)]
    saida: Option<LegacySaida>,
    #[serde(default)]
    open: Option<bool>,
}

#[derive(Deserialize)]
struct RawSaida {
    #[serde(default)]
    textos: Vec<String>,
    #[serde(default)]
    reacao: String,
    #[serde(default)]
    contexto: String,
    #[serde(default)]
    tokens: SaidaTokens,
    #[serde(default, with = "optional_token")]
    fim: Option<Token>,
    #[serde(default)]
    alnulu: Option<i64>,
}

/// The v1 single output. `{}` means "no output yet".
#[derive(Deserialize)]
struct LegacySaida {
    #[serde(default)]
    texto: Option<String>,
    #[serde(default)]
    reacao: String,
    #[serde(default)]
    contexto: String,
    #[serde(default)]
    tokens: EntradaTokens,
    #[serde(default, with = "optional_token")]
    fim: Option<Token>,
    #[serde(default)]
    alnulu: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPoolEntry {
    Entry(PoolEntry),
    Legacy(String),
}

#[derive(Serialize)]
struct NamespaceDocument<'a> {
    maes: &'a NamespaceRegistry,
}

// =============================================================================
// UPGRADES
// =============================================================================

impl RawSaida {
    fn upgrade(self, report: &mut LoadReport) -> Saida {
        let checksum = self.alnulu.unwrap_or_else(|| {
            report.recomputed_checksums += 1;
            self.textos.iter().map(|t| checksum(t)).sum()
        });
        Saida {
            texts: self.textos,
            reaction: self.reacao,
            context: self.contexto,
            tokens: self.tokens,
            end: self.fim,
            checksum,
        }
    }
}

impl LegacySaida {
    fn upgrade(self, report: &mut LoadReport) -> Option<Saida> {
        let text = self.texto?;
        let checksum = self.alnulu.unwrap_or_else(|| {
            report.recomputed_checksums += 1;
            checksum(&text)
        });
        Some(Saida {
            texts: vec![text],
            reaction: self.reacao,
            context: self.contexto,
            tokens: SaidaTokens {
                text: self.tokens.text,
                reaction: self.tokens.reaction,
                context: self.tokens.context,
                total: self.tokens.total,
            },
            end: self.fim,
            checksum,
        })
    }
}

impl RawBlock {
    fn upgrade(self, report: &mut LoadReport) -> Block {
        let saidas: Vec<Saida> = match (self.saidas, self.saida) {
            (Some(list), _) => list.into_iter().map(|s| s.upgrade(report)).collect(),
            (None, Some(legacy)) => {
                report.legacy_blocks += 1;
                legacy.upgrade(report).into_iter().collect()
            }
            (None, None) => Vec::new(),
        };
        let open = self.open.unwrap_or(saidas.is_empty());

        Block {
            id: self.bloco_id,
            entrada: self.entrada,
            saidas,
            open,
        }
    }
}

impl RawNamespace {
    /// Upgrade to a `Namespace`. An unqualified marker is returned separately
    /// since its scope is only known once the registry is reindexed.
    fn upgrade(self, report: &mut LoadReport) -> (Namespace, Option<u64>) {
        let pending_marker = match self.ultimo_child.parse::<u64>() {
            Ok(index) => {
                report.qualified_markers += 1;
                Some(index)
            }
            Err(_) if self.ultimo_child.is_empty() => Some(0),
            Err(_) => None,
        };

        let mut namespace = Namespace {
            name: self.nome,
            last_child: self.ultimo_child,
            blocks: self
                .blocos
                .into_iter()
                .map(|b| b.upgrade(report))
                .collect(),
            cb: self.cb,
            cbcs: self.cbcs,
        };
        namespace.renumber_blocks();
        (namespace, pending_marker)
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

fn check_size(bytes: &[u8]) -> Result<(), InsepaError> {
    if bytes.len() > MAX_DOCUMENT_SIZE {
        return Err(InsepaError::DeserializationError(format!(
            "Document size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_DOCUMENT_SIZE
        )));
    }
    Ok(())
}

/// Parse a namespace document, upgrading legacy shapes and reindexing.
pub fn namespaces_from_json(bytes: &[u8]) -> Result<(NamespaceRegistry, LoadReport), InsepaError> {
    check_size(bytes)?;

    let raw: RawNamespaceDocument = serde_json::from_slice(bytes).map_err(|e| {
        InsepaError::DeserializationError(format!("Failed to parse namespace document: {}", e))
    })?;

    let mut report = LoadReport::default();
    let mut pending_markers = BTreeMap::new();
    let namespaces: BTreeMap<u64, Namespace> = raw
        .maes
        .into_iter()
        .map(|(id, ns)| {
            let (namespace, pending) = ns.upgrade(&mut report);
            if let Some(index) = pending {
                pending_markers.insert(id, index);
            }
            (id, namespace)
        })
        .collect();

    // Reindexing keeps the ascending order of stored ids.
    let stored_ids: Vec<u64> = namespaces.keys().copied().collect();
    let mut registry = NamespaceRegistry::reindex(namespaces);
    for (id, stored_id) in (0u64..).zip(stored_ids) {
        if let Some(&index) = pending_markers.get(&stored_id) {
            registry.get_mut(id)?.last_child = Token::new(id, index).to_string();
        }
    }

    Ok((registry, report))
}

/// Serialize a namespace document as pretty-printed UTF-8 JSON.
pub fn namespaces_to_json(registry: &NamespaceRegistry) -> Result<Vec<u8>, InsepaError> {
    serde_json::to_vec_pretty(&NamespaceDocument { maes: registry })
        .map_err(|e| InsepaError::SerializationError(e.to_string()))
}

/// Parse a pool document, tokenizing bare-string entries at their position.
pub fn pool_from_json(bytes: &[u8]) -> Result<(TextPool, LoadReport), InsepaError> {
    check_size(bytes)?;

    let raw: Vec<RawPoolEntry> = serde_json::from_slice(bytes).map_err(|e| {
        InsepaError::DeserializationError(format!("Failed to parse pool document: {}", e))
    })?;

    let mut report = LoadReport::default();
    let mut pool = TextPool::new();
    for (index, entry) in raw.into_iter().enumerate() {
        let entry = match entry {
            RawPoolEntry::Entry(entry) => entry,
            RawPoolEntry::Legacy(text) => {
                report.legacy_pool_entries += 1;
                TextPool::ingest(index + 1, &text)
            }
        };
        pool.push_loaded(entry);
    }

    Ok((pool, report))
}

/// Serialize a pool document as pretty-printed UTF-8 JSON.
pub fn pool_to_json(pool: &TextPool) -> Result<Vec<u8>, InsepaError> {
    serde_json::to_vec_pretty(pool).map_err(|e| InsepaError::SerializationError(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
