//! # Checksum ("alnulu")
//!
//! A fixed-table character-weight sum over an uppercased, accent-folded
//! string.
//!
//! The table is part of the persisted data: stored `alnulu` values are
//! compared against freshly computed ones, so the weights (including the four
//! negated letters) and the folding set must never change.

/// Fold the supported accented capitals onto their base letter.
///
/// Only this set is folded; any other accented letter weighs 0.
const fn fold(c: char) -> char {
    match c {
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'É' | 'Ê' | 'È' => 'E',
        'Í' | 'Ì' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        'Ñ' => 'N',
        other => other,
    }
}

/// Weight of one folded, uppercased character.
const fn weight(c: char) -> i64 {
    match c {
        // J, M, V and Y carry their position negated.
        'J' => -10,
        'M' => -13,
        'V' => -22,
        'Y' => -25,
        'A'..='Z' => (c as i64) - ('A' as i64) + 1,
        '0'..='9' => (c as i64) - ('0' as i64),
        '.' => 2,
        '!' => 3,
        '?' => 4,
        ',' | ';' | ':' | '-' => 1,
        _ => 0,
    }
}

/// Compute the checksum of a text.
///
/// Pure and total. The sum is additive over concatenation:
/// `checksum(a + b) == checksum(a) + checksum(b)`.
#[must_use]
pub fn checksum(text: &str) -> i64 {
    text.to_uppercase()
        .chars()
        .map(|c| weight(fold(c)))
        .fold(0i64, i64::saturating_add)
}

// =============================================================================
// TESTS
// =============================================================================
