//! # Block Lifecycle
//!
//! Creation of input-only blocks, appending of outputs, removal, and typed
//! field edits.
//!
//! - New allocations always start at the namespace cursor + 1
//! - Reaction and context are whole-field units (one token each, if present)
//! - Consecutive outputs with the same reaction and context share one record
//! - Removal renumbers block ids densely from 1
//!
//! Every operation that can fail validates all of its inputs first, so a
//! rejected call never leaves a half-applied change behind.

use crate::checksum::checksum;
use crate::cursor::NamespaceCursor;
use crate::tokenizer::UnitTokenizer;
use crate::{
    Block, Entrada, EntradaField, EntradaTokens, InsepaError, Namespace, Passage, Saida,
    SaidaField, SaidaTokens,
};

/// The BlockLifecycle implements the block state transitions.
pub struct BlockLifecycle;

impl BlockLifecycle {
    /// Build a new input-only block for `namespace`.
    ///
    /// Tokens start at `last_index(namespace) + 1`; the block id is the
    /// current block count + 1. The block is not attached to the namespace:
    /// the caller pushes it and stores the returned last index as the cursor.
    #[must_use]
    pub fn open_block(scope: u64, namespace: &Namespace, input: &Passage) -> (Block, u64) {
        let start = NamespaceCursor::next_index(namespace);
        let (groups, last_index) = UnitTokenizer::generate_tokens(
            scope,
            start,
            UnitTokenizer::count_units(&input.text),
            UnitTokenizer::count_field(&input.reaction),
            UnitTokenizer::count_field(&input.context),
        );

        let entrada = Entrada {
            text: input.text.clone(),
            reaction: input.reaction.clone(),
            context: input.context.clone(),
            end: groups.last(),
            tokens: EntradaTokens::from(groups),
            checksum: checksum(&input.text),
        };

        let block = Block {
            id: namespace.blocks.len() as u64 + 1,
            entrada,
            saidas: Vec::new(),
            open: true,
        };

        (block, last_index)
    }

    /// Check whether `output` opens a new output record on `block`.
    ///
    /// True when the block has no output yet, or when the most recent
    /// output's reaction or context differs from the supplied ones.
    #[must_use]
    pub fn is_first_of_kind(block: &Block, output: &Passage) -> bool {
        block.saidas.last().is_none_or(|last| {
            last.reaction != output.reaction || last.context != output.context
        })
    }

    /// Append one output fragment to `block`, continuing from `last_index`.
    ///
    /// A first-of-kind output allocates primary, reaction and context tokens
    /// and opens a new record. Otherwise only the primary tokens are
    /// allocated and merged into the last record. Returns the new last index.
    ///
    /// The caller guarantees that `block` belongs to the namespace whose
    /// cursor `last_index` is.
    pub fn append_output(scope: u64, block: &mut Block, last_index: u64, output: &Passage) -> u64 {
        let first = Self::is_first_of_kind(block, output);
        let (count_re, count_ce) = if first {
            (
                UnitTokenizer::count_field(&output.reaction),
                UnitTokenizer::count_field(&output.context),
            )
        } else {
            (0, 0)
        };

        let (groups, new_last) = UnitTokenizer::generate_tokens(
            scope,
            last_index.saturating_add(1),
            UnitTokenizer::count_units(&output.text),
            count_re,
            count_ce,
        );

        match block.saidas.last_mut() {
            Some(existing) if !first => {
                existing.texts.push(output.text.clone());
                existing.tokens.text.extend_from_slice(&groups.primary);
                existing.tokens.total.extend_from_slice(&groups.primary);
                if let Some(end) = groups.primary.last() {
                    existing.end = Some(*end);
                }
                existing.checksum = existing.checksum.saturating_add(checksum(&output.text));
            }
            _ => {
                block.saidas.push(Saida {
                    texts: vec![output.text.clone()],
                    reaction: output.reaction.clone(),
                    context: output.context.clone(),
                    end: groups.last(),
                    tokens: SaidaTokens::from(groups),
                    checksum: checksum(&output.text),
                });
            }
        }

        new_last
    }

    // =========================================================================
    // REMOVAL
    // =========================================================================

    /// Remove one block and renumber the rest.
    pub fn remove_block(
        scope: u64,
        namespace: &mut Namespace,
        block_id: u64,
    ) -> Result<Block, InsepaError> {
        if namespace.block(block_id).is_none() {
            return Err(InsepaError::BlockNotFound {
                namespace: scope,
                block: block_id,
            });
        }
        // Validated above: block ids are dense and 1-based.
        let removed = namespace.blocks.remove(block_id as usize - 1);
        namespace.renumber_blocks();
        Ok(removed)
    }

    /// Parse a `start-end` range expression (surrounding spaces allowed).
    pub fn parse_range(expr: &str) -> Result<(u64, u64), InsepaError> {
        let malformed = || InsepaError::MalformedRange(expr.to_string());

        let (start, end) = expr.split_once('-').ok_or_else(malformed)?;
        let start: u64 = start.trim().parse().map_err(|_| malformed())?;
        let end: u64 = end.trim().parse().map_err(|_| malformed())?;

        if start == 0 || start > end {
            return Err(malformed());
        }
        Ok((start, end))
    }

    /// Remove every block whose id lies in the inclusive range, then renumber.
    ///
    /// Both ends must name existing blocks. Returns the number removed.
    pub fn remove_range(
        scope: u64,
        namespace: &mut Namespace,
        expr: &str,
    ) -> Result<usize, InsepaError> {
        let (start, end) = Self::parse_range(expr)?;
        if namespace.block(end).is_none() {
            return Err(InsepaError::BlockNotFound {
                namespace: scope,
                block: end,
            });
        }

        let before = namespace.blocks.len();
        namespace
            .blocks
            .retain(|block| !(start..=end).contains(&block.id));
        namespace.renumber_blocks();
        Ok(before - namespace.blocks.len())
    }

    // =========================================================================
    // FIELD EDITS
    // =========================================================================

    /// Overwrite one entrada field in place.
    ///
    /// Tokens are not reallocated: the block keeps its place on the index
    /// line. Editing the text refreshes the checksum.
    pub fn edit_entrada(block: &mut Block, field: EntradaField, value: &str) {
        let entrada = &mut block.entrada;
        match field {
            EntradaField::Text => {
                entrada.text = value.to_string();
                entrada.checksum = checksum(value);
            }
            EntradaField::Reaction => entrada.reaction = value.to_string(),
            EntradaField::Context => entrada.context = value.to_string(),
        }
    }

    /// Overwrite one field of the output at 1-based position `output`.
    pub fn edit_saida(
        block: &mut Block,
        output: usize,
        field: SaidaField,
        value: &str,
    ) -> Result<(), InsepaError> {
        let block_id = block.id;
        let saida = output
            .checked_sub(1)
            .and_then(|index| block.saidas.get_mut(index))
            .ok_or(InsepaError::OutputNotFound {
                block: block_id,
                output,
            })?;

        match field {
            SaidaField::Reaction => saida.reaction = value.to_string(),
            SaidaField::Context => saida.context = value.to_string(),
            SaidaField::FragmentAt(fragment) => {
                let slot = fragment
                    .checked_sub(1)
                    .and_then(|index| saida.texts.get_mut(index))
                    .ok_or(InsepaError::FragmentNotFound { output, fragment })?;
                *slot = value.to_string();
                saida.checksum = saida.texts.iter().map(|t| checksum(t)).sum();
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
