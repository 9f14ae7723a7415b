//! # Unit Tokenizer
//!
//! Segmentation of text into units and allocation of dotted sequential tokens.
//!
//! - A unit is a maximal run of word characters or one non-space symbol
//! - Tokens are allocated in a fixed group order: primary, secondary, tertiary
//! - No linguistic analysis: this is a two-class character classification

use crate::primitives::{SENTENCE_BOUNDARY_PATTERN, UNIT_PATTERN};
use crate::{Token, TokenGroups};
use regex::Regex;
use std::sync::LazyLock;

static UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(UNIT_PATTERN).expect("UNIT_PATTERN is a valid regex"));

static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(SENTENCE_BOUNDARY_PATTERN).expect("SENTENCE_BOUNDARY_PATTERN is a valid regex")
});

/// The UnitTokenizer splits text and allocates token ranges.
pub struct UnitTokenizer;

impl UnitTokenizer {
    /// Split a text into its units, in order.
    #[must_use]
    pub fn units(text: &str) -> Vec<&str> {
        UNIT_RE.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Count the units of a text without collecting them.
    #[must_use]
    pub fn count_units(text: &str) -> usize {
        UNIT_RE.find_iter(text).count()
    }

    /// Count a whole-field unit: 1 if the field is non-empty, 0 otherwise.
    ///
    /// Reaction and context fields are never decomposed in the block path.
    #[must_use]
    pub fn count_field(field: &str) -> usize {
        usize::from(!field.is_empty())
    }

    /// Allocate `count_e + count_re + count_ce` consecutive tokens in `scope`.
    ///
    /// Tokens start at `start` and are assigned primary first, then secondary,
    /// then tertiary. Returns the groups and the last index consumed
    /// (`start + total - 1`; `start - 1` when nothing was allocated).
    #[must_use]
    pub fn generate_tokens(
        scope: u64,
        start: u64,
        count_e: usize,
        count_re: usize,
        count_ce: usize,
    ) -> (TokenGroups, u64) {
        let mut next = start;
        let mut take = |count: usize| -> Vec<Token> {
            let group: Vec<Token> = (next..)
                .take(count)
                .map(|sequence| Token::new(scope, sequence))
                .collect();
            next = next.saturating_add(count as u64);
            group
        };

        let primary = take(count_e);
        let secondary = take(count_re);
        let tertiary = take(count_ce);

        let total = primary
            .iter()
            .chain(&secondary)
            .chain(&tertiary)
            .copied()
            .collect();

        let groups = TokenGroups {
            primary,
            secondary,
            tertiary,
            total,
        };
        (groups, next.saturating_sub(1))
    }

    /// Split a text into sentence suggestions.
    ///
    /// A sentence ends at `.`, `?` or `!` followed by whitespace. Pieces are
    /// trimmed and blank pieces dropped.
    #[must_use]
    pub fn segments(text: &str) -> Vec<String> {
        let text = text.trim();
        let mut pieces = Vec::new();
        let mut from = 0;

        for boundary in SENTENCE_RE.find_iter(text) {
            // The terminal mark is one ASCII byte and stays with the sentence.
            let cut = boundary.start() + 1;
            pieces.push(&text[from..cut]);
            from = boundary.end();
        }
        pieces.push(&text[from..]);

        pieces
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
