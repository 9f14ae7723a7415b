//! # Session Module
//!
//! The explicit store object owning both documents plus the volatile trigger
//! buffers.
//!
//! - Namespace registry and text pool are the persisted state
//! - Trigger buffers are session-local, never serialized
//! - Every operation validates all of its inputs before it mutates
//!
//! Persistence is not done here. The caller loads a session, applies one
//! operation, and writes both documents back only if the operation
//! succeeded.

use crate::cursor::NamespaceCursor;
use crate::lifecycle::BlockLifecycle;
use crate::tokenizer::UnitTokenizer;
use crate::trigger::{self, TriggerSetMatcher};
use crate::{
    Block, CbConfig, CbStatus, EntradaField, InsepaError, Namespace, NamespaceRegistry, Passage,
    PoolEntry, SaidaField, TextPool, Token,
};

/// A Session combines both documents with the volatile trigger buffers.
#[derive(Debug, Clone, Default)]
pub struct Session {
    namespaces: NamespaceRegistry,
    pool: TextPool,
    triggers: TriggerSetMatcher,
}

impl Session {
    /// Create a session with the default namespace and an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session over already-loaded documents.
    #[must_use]
    pub fn with_documents(namespaces: NamespaceRegistry, pool: TextPool) -> Self {
        Self {
            namespaces,
            pool,
            triggers: TriggerSetMatcher::new(),
        }
    }

    /// The namespace document.
    #[must_use]
    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    /// The pool document.
    #[must_use]
    pub fn pool(&self) -> &TextPool {
        &self.pool
    }

    /// Split both documents out of the session, dropping trigger state.
    #[must_use]
    pub fn into_documents(self) -> (NamespaceRegistry, TextPool) {
        (self.namespaces, self.pool)
    }

    /// Look up a namespace.
    pub fn namespace(&self, id: u64) -> Result<&Namespace, InsepaError> {
        self.namespaces.get(id)
    }

    /// Look up a block.
    pub fn block(&self, namespace_id: u64, block_id: u64) -> Result<&Block, InsepaError> {
        self.namespaces
            .get(namespace_id)?
            .block(block_id)
            .ok_or(InsepaError::BlockNotFound {
                namespace: namespace_id,
                block: block_id,
            })
    }

    fn block_mut(&mut self, namespace_id: u64, block_id: u64) -> Result<&mut Block, InsepaError> {
        self.namespaces
            .get_mut(namespace_id)?
            .block_mut(block_id)
            .ok_or(InsepaError::BlockNotFound {
                namespace: namespace_id,
                block: block_id,
            })
    }

    // =========================================================================
    // NAMESPACES
    // =========================================================================

    /// Add a namespace. A blank name is a skip.
    pub fn add_namespace(&mut self, name: &str) -> Option<u64> {
        self.namespaces.add(name)
    }

    /// Remove a namespace. Identifiers shift, so every trigger buffer is
    /// discarded.
    pub fn remove_namespace(&mut self, id: u64) -> Result<Namespace, InsepaError> {
        let removed = self.namespaces.remove(id)?;
        self.triggers.clear_all();
        Ok(removed)
    }

    /// Rename a namespace. Returns `true` if the name changed.
    pub fn rename_namespace(&mut self, id: u64, name: &str) -> Result<bool, InsepaError> {
        self.namespaces.rename(id, name)
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    /// Create a block from `input` and append every non-blank output
    /// fragment, all sharing `output_reaction` and `output_context`.
    ///
    /// Returns the new block id, or `None` when the input text is blank.
    /// The namespace's advisory `ultimo_child` is set to the last token
    /// issued.
    pub fn save_block(
        &mut self,
        namespace_id: u64,
        input: &Passage,
        outputs: &[String],
        output_reaction: &str,
        output_context: &str,
    ) -> Result<Option<u64>, InsepaError> {
        let namespace = self.namespaces.get_mut(namespace_id)?;
        if input.is_blank() {
            return Ok(None);
        }

        let (mut block, mut last_index) =
            BlockLifecycle::open_block(namespace_id, namespace, input);
        for text in outputs.iter().filter(|t| !t.trim().is_empty()) {
            let output = Passage::new(text.as_str(), output_reaction, output_context);
            last_index =
                BlockLifecycle::append_output(namespace_id, &mut block, last_index, &output);
        }

        let block_id = block.id;
        namespace.blocks.push(block);
        namespace.last_child = Token::new(namespace_id, last_index).to_string();
        Ok(Some(block_id))
    }

    /// Append one output to an existing block.
    ///
    /// Allocation continues from the recomputed namespace cursor, so the new
    /// tokens sit above every index the namespace has used. A blank output
    /// text is a skip and returns `None`; otherwise the new last index.
    pub fn extend_block(
        &mut self,
        namespace_id: u64,
        block_id: u64,
        output: &Passage,
    ) -> Result<Option<u64>, InsepaError> {
        let namespace = self.namespaces.get_mut(namespace_id)?;
        let last_index = NamespaceCursor::last_index(namespace);
        let block = namespace
            .block_mut(block_id)
            .ok_or(InsepaError::BlockNotFound {
                namespace: namespace_id,
                block: block_id,
            })?;
        if output.is_blank() {
            return Ok(None);
        }

        let new_last = BlockLifecycle::append_output(namespace_id, block, last_index, output);
        namespace.last_child = Token::new(namespace_id, new_last).to_string();
        Ok(Some(new_last))
    }

    /// Remove one block and renumber the rest.
    pub fn remove_block(&mut self, namespace_id: u64, block_id: u64) -> Result<Block, InsepaError> {
        let namespace = self.namespaces.get_mut(namespace_id)?;
        BlockLifecycle::remove_block(namespace_id, namespace, block_id)
    }

    /// Remove the blocks of a `start-end` range. Returns how many were removed.
    pub fn remove_range(&mut self, namespace_id: u64, expr: &str) -> Result<usize, InsepaError> {
        let namespace = self.namespaces.get_mut(namespace_id)?;
        BlockLifecycle::remove_range(namespace_id, namespace, expr)
    }

    /// Overwrite one entrada field.
    ///
    /// A blank primary text is a skip; reaction and context may be cleared.
    pub fn edit_entrada(
        &mut self,
        namespace_id: u64,
        block_id: u64,
        field: EntradaField,
        value: &str,
    ) -> Result<(), InsepaError> {
        let block = self.block_mut(namespace_id, block_id)?;
        if field == EntradaField::Text && value.trim().is_empty() {
            return Ok(());
        }
        BlockLifecycle::edit_entrada(block, field, value);
        Ok(())
    }

    /// Overwrite one field of a block's output (1-based `output`).
    ///
    /// A blank fragment is a skip, but the indices are still validated.
    pub fn edit_saida(
        &mut self,
        namespace_id: u64,
        block_id: u64,
        output: usize,
        field: SaidaField,
        value: &str,
    ) -> Result<(), InsepaError> {
        let block = self.block_mut(namespace_id, block_id)?;
        if let SaidaField::FragmentAt(fragment) = field
            && value.trim().is_empty()
        {
            let saida = output
                .checked_sub(1)
                .and_then(|index| block.saidas.get(index))
                .ok_or(InsepaError::OutputNotFound {
                    block: block_id,
                    output,
                })?;
            return match fragment.checked_sub(1).and_then(|i| saida.texts.get(i)) {
                Some(_) => Ok(()),
                None => Err(InsepaError::FragmentNotFound { output, fragment }),
            };
        }
        BlockLifecycle::edit_saida(block, output, field, value)
    }

    // =========================================================================
    // TRIGGERS
    // =========================================================================

    /// Configure a namespace's CB from a status and a bids list (`"3, 5"`).
    ///
    /// The namespace's trigger buffer is discarded since the target set may
    /// have changed.
    pub fn set_cb(
        &mut self,
        namespace_id: u64,
        status: CbStatus,
        bids_expr: &str,
    ) -> Result<&CbConfig, InsepaError> {
        let bids = TriggerSetMatcher::parse_bids(bids_expr)?;
        let namespace = self.namespaces.get_mut(namespace_id)?;
        self.triggers.clear(namespace_id);
        Ok(&*namespace.cb.insert(CbConfig::new(status, bids)))
    }

    /// Observe a block for the namespace's CB. Returns `true` on a firing.
    pub fn register_trigger(&mut self, namespace_id: u64, block_id: u64) -> Result<bool, InsepaError> {
        let namespace = self.namespaces.get(namespace_id)?;
        Ok(self
            .triggers
            .register(namespace_id, block_id, namespace.cb.as_ref()))
    }

    /// The namespace's current trigger window, in observation order.
    #[must_use]
    pub fn trigger_sequence(&self, namespace_id: u64) -> &[u64] {
        self.triggers.sequence(namespace_id)
    }

    /// Discard the namespace's trigger window.
    pub fn clear_trigger(&mut self, namespace_id: u64) {
        self.triggers.clear(namespace_id);
    }

    /// Store a CBC from a comma-separated list of block ids.
    pub fn add_cbc(&mut self, namespace_id: u64, ids_expr: &str) -> Result<Option<Vec<u64>>, InsepaError> {
        let ids = TriggerSetMatcher::parse_bids(ids_expr)?;
        let namespace = self.namespaces.get_mut(namespace_id)?;
        trigger::add_cbc(namespace_id, namespace, &ids)
    }

    /// Remove a namespace's CBC at 1-based `index`.
    pub fn remove_cbc(&mut self, namespace_id: u64, index: usize) -> Result<Vec<u64>, InsepaError> {
        let namespace = self.namespaces.get_mut(namespace_id)?;
        trigger::remove_cbc(namespace, index)
    }

    // =========================================================================
    // POOL
    // =========================================================================

    /// Add a text to the pool. A blank text is a skip.
    pub fn pool_add(&mut self, text: &str) -> Option<usize> {
        self.pool.add(text)
    }

    /// Replace the text at a pool position.
    pub fn pool_edit(&mut self, position: usize, text: &str) -> Result<&PoolEntry, InsepaError> {
        self.pool.edit(position, text)
    }

    /// Remove a pool entry and renumber the ones after it.
    pub fn pool_remove(&mut self, position: usize) -> Result<PoolEntry, InsepaError> {
        self.pool.remove(position)
    }

    /// Sentence suggestions for a text.
    #[must_use]
    pub fn segments(text: &str) -> Vec<String> {
        UnitTokenizer::segments(text)
    }
}

// =============================================================================
// TESTS
// =============================================================================
