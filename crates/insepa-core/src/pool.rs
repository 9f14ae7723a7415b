//! # Text Pool
//!
//! A flat store of ingested raw texts, independent of any namespace.
//!
//! Each entry owns a local index line that restarts at 1 and is scoped by the
//! entry's 1-based position (`"3.1"`, `"3.2"`, ...). Because identifiers are
//! positional, removing an entry retokenizes every entry after it.

use crate::checksum::checksum;
use crate::primitives::POOL_ENTRY_NAME_PREFIX;
use crate::tokenizer::UnitTokenizer;
use crate::{InsepaError, PoolEntry, PoolTokens};
use serde::{Deserialize, Serialize};

/// The TextPool holds the ordered list of ingested texts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextPool {
    entries: Vec<PoolEntry>,
}

impl TextPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize `text` as the entry at 1-based `position`.
    ///
    /// Every unit (word or symbol) gets a token `"{position}.{n}"`, `n` from 1.
    #[must_use]
    pub fn ingest(position: usize, text: &str) -> PoolEntry {
        let (groups, _) = UnitTokenizer::generate_tokens(
            position as u64,
            1,
            UnitTokenizer::count_units(text),
            0,
            0,
        );
        let last = groups.last();

        PoolEntry {
            name: format!("{POOL_ENTRY_NAME_PREFIX} {position}"),
            text: text.to_string(),
            tokens: PoolTokens {
                total: groups.total,
            },
            last_child: last,
            end: last,
            checksum: checksum(text),
        }
    }

    /// Re-ingest every entry under its current 1-based position.
    #[must_use]
    pub fn renumber_all(entries: Vec<PoolEntry>) -> Vec<PoolEntry> {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Self::ingest(index + 1, &entry.text))
            .collect()
    }

    /// Append a text. A blank text is a skip and returns `None`.
    ///
    /// Returns the new entry's position.
    pub fn add(&mut self, text: &str) -> Option<usize> {
        if text.trim().is_empty() {
            return None;
        }
        let position = self.entries.len() + 1;
        self.entries.push(Self::ingest(position, text));
        Some(position)
    }

    /// Append an entry exactly as it was persisted.
    pub(crate) fn push_loaded(&mut self, entry: PoolEntry) {
        self.entries.push(entry);
    }

    /// Replace the text at `position`, retokenizing that entry.
    ///
    /// A blank text is a skip: the entry is returned unchanged.
    pub fn edit(&mut self, position: usize, text: &str) -> Result<&PoolEntry, InsepaError> {
        let slot = Self::index(position)
            .and_then(|index| self.entries.get_mut(index))
            .ok_or(InsepaError::PoolEntryNotFound(position))?;
        if !text.trim().is_empty() {
            *slot = Self::ingest(position, text);
        }
        Ok(slot)
    }

    /// Remove the entry at `position` and renumber everything after it.
    pub fn remove(&mut self, position: usize) -> Result<PoolEntry, InsepaError> {
        let index = Self::index(position)
            .filter(|&index| index < self.entries.len())
            .ok_or(InsepaError::PoolEntryNotFound(position))?;
        let removed = self.entries.remove(index);
        self.entries = Self::renumber_all(std::mem::take(&mut self.entries));
        Ok(removed)
    }

    /// Get the entry at a 1-based position.
    pub fn get(&self, position: usize) -> Result<&PoolEntry, InsepaError> {
        Self::index(position)
            .and_then(|index| self.entries.get(index))
            .ok_or(InsepaError::PoolEntryNotFound(position))
    }

    /// All entries in position order.
    #[must_use]
    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn index(position: usize) -> Option<usize> {
        position.checked_sub(1)
    }
}

// =============================================================================
// TESTS
// =============================================================================
