//! # Trigger Set Matcher (CB)
//!
//! Detects when every block of a namespace's configured target set has been
//! observed among the most recent observations, in any order.
//!
//! - Only enabled configurations observe anything
//! - Only block ids in the target set enter the buffer
//! - The buffer is a sliding window of `|bids|` entries, oldest dropped first
//! - Firing is set equality between the window and the target set
//!
//! The buffers are volatile session state. They are never serialized and do
//! not survive a namespace reindex.
//!
//! CBC records live here too, as plain storage with no trigger behavior.

use crate::{CbConfig, InsepaError, Namespace};
use std::collections::{BTreeMap, BTreeSet};

/// Per-namespace sliding buffers of observed block ids.
#[derive(Debug, Clone, Default)]
pub struct TriggerSetMatcher {
    buffers: BTreeMap<u64, Vec<u64>>,
}

impl TriggerSetMatcher {
    /// Create a matcher with no observations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `block_id` in namespace `namespace_id`.
    ///
    /// Returns `true` iff, after trimming the window, the set of buffered ids
    /// equals the target set. Disabled or absent configurations and ids
    /// outside the target set are no-ops returning `false`.
    pub fn register(
        &mut self,
        namespace_id: u64,
        block_id: u64,
        config: Option<&CbConfig>,
    ) -> bool {
        let Some(config) = config.filter(|c| c.is_enabled()) else {
            return false;
        };
        if !config.bids.contains(&block_id) {
            return false;
        }

        let buffer = self.buffers.entry(namespace_id).or_default();
        buffer.push(block_id);
        let window = config.bids.len();
        if buffer.len() > window {
            buffer.drain(..buffer.len() - window);
        }

        let seen: BTreeSet<u64> = buffer.iter().copied().collect();
        let target: BTreeSet<u64> = config.bids.iter().copied().collect();
        seen == target
    }

    /// The current window of a namespace, in observation order.
    #[must_use]
    pub fn sequence(&self, namespace_id: u64) -> &[u64] {
        self.buffers
            .get(&namespace_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Discard a namespace's window, typically after acting on a firing.
    pub fn clear(&mut self, namespace_id: u64) {
        self.buffers.remove(&namespace_id);
    }

    /// Discard every window.
    pub fn clear_all(&mut self) {
        self.buffers.clear();
    }

    /// Parse a comma-separated list of block ids (`"3, 5,8"`).
    ///
    /// Blank entries are ignored; any other non-numeric entry rejects the
    /// whole list.
    pub fn parse_bids(expr: &str) -> Result<Vec<u64>, InsepaError> {
        expr.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| InsepaError::MalformedIdList(expr.to_string()))
            })
            .collect()
    }
}

// =============================================================================
// CBC STORAGE
// =============================================================================

/// Store a CBC on `namespace`. Returns the stored (sorted, deduplicated) ids,
/// or `None` for an empty selection (a skip).
///
/// Every id must name an existing block.
pub fn add_cbc(
    namespace_id: u64,
    namespace: &mut Namespace,
    ids: &[u64],
) -> Result<Option<Vec<u64>>, InsepaError> {
    if ids.is_empty() {
        return Ok(None);
    }
    if let Some(&missing) = ids.iter().find(|&&id| namespace.block(id).is_none()) {
        return Err(InsepaError::BlockNotFound {
            namespace: namespace_id,
            block: missing,
        });
    }

    let cbc: Vec<u64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    namespace
        .cbcs
        .get_or_insert_with(Vec::new)
        .push(cbc.clone());
    Ok(Some(cbc))
}

/// Remove the CBC at 1-based `index`.
pub fn remove_cbc(namespace: &mut Namespace, index: usize) -> Result<Vec<u64>, InsepaError> {
    let cbcs = namespace
        .cbcs
        .as_mut()
        .filter(|cbcs| (1..=cbcs.len()).contains(&index))
        .ok_or(InsepaError::CbcNotFound(index))?;
    Ok(cbcs.remove(index - 1))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CbStatus;

    fn enabled(bids: &[u64]) -> CbConfig {
        CbConfig::new(CbStatus::Enabled, bids.to_vec())
    }

    #[test]
    fn fires_once_all_targets_seen() {
        let mut matcher = TriggerSetMatcher::new();
        let cfg = enabled(&[3, 5]);

        assert!(!matcher.register(0, 3, Some(&cfg)));
        assert!(matcher.register(0, 5, Some(&cfg)));
        assert_eq!(matcher.sequence(0), &[3, 5]);
    }

    #[test]
    fn window_trims_oldest_first() {
        let mut matcher = TriggerSetMatcher::new();
        let cfg = enabled(&[3, 5]);

        assert!(!matcher.register(0, 3, Some(&cfg)));
        assert!(!matcher.register(0, 3, Some(&cfg)));
        assert!(matcher.register(0, 5, Some(&cfg)));
        assert_eq!(matcher.sequence(0), &[3, 5]);
    }

    #[test]
    fn order_inside_window_is_irrelevant() {
        let mut matcher = TriggerSetMatcher::new();
        let cfg = enabled(&[1, 2, 3]);

        matcher.register(0, 3, Some(&cfg));
        matcher.register(0, 1, Some(&cfg));
        assert!(matcher.register(0, 2, Some(&cfg)));
    }

    #[test]
    fn non_target_never_buffered() {
        let mut matcher = TriggerSetMatcher::new();
        let cfg = enabled(&[3, 5]);

        matcher.register(0, 3, Some(&cfg));
        assert!(!matcher.register(0, 7, Some(&cfg)));
        assert_eq!(matcher.sequence(0), &[3]);
    }

    #[test]
    fn disabled_or_missing_config_is_noop() {
        let mut matcher = TriggerSetMatcher::new();
        let cfg = CbConfig::new(CbStatus::Disabled, vec![3]);

        assert!(!matcher.register(0, 3, Some(&cfg)));
        assert!(!matcher.register(0, 3, None));
        assert!(matcher.sequence(0).is_empty());
    }

    #[test]
    fn namespaces_have_separate_windows() {
        let mut matcher = TriggerSetMatcher::new();
        let cfg = enabled(&[3, 5]);

        matcher.register(0, 3, Some(&cfg));
        assert!(!matcher.register(1, 5, Some(&cfg)));
        assert!(matcher.register(0, 5, Some(&cfg)));
    }

    #[test]
    fn clear_discards_window() {
        let mut matcher = TriggerSetMatcher::new();
        let cfg = enabled(&[3, 5]);

        matcher.register(0, 3, Some(&cfg));
        matcher.clear(0);
        assert!(matcher.sequence(0).is_empty());
        assert!(!matcher.register(0, 5, Some(&cfg)));
    }

    #[test]
    fn parse_bids_lists() {
        assert_eq!(TriggerSetMatcher::parse_bids("3, 5,8").expect("parse"), vec![3, 5, 8]);
        assert_eq!(TriggerSetMatcher::parse_bids("4,").expect("parse"), vec![4]);
        assert!(TriggerSetMatcher::parse_bids("").expect("parse").is_empty());
        assert!(matches!(
            TriggerSetMatcher::parse_bids("3,x"),
            Err(InsepaError::MalformedIdList(_))
        ));
        assert!(TriggerSetMatcher::parse_bids("-1").is_err());
    }

    #[test]
    fn cbc_add_and_remove() {
        let mut ns = Namespace::new(0, "Interações");
        for text in ["a", "b", "c"] {
            let (block, _) = crate::lifecycle::BlockLifecycle::open_block(
                0,
                &ns,
                &crate::Passage::new(text, "", ""),
            );
            ns.blocks.push(block);
        }

        assert_eq!(add_cbc(0, &mut ns, &[3, 1, 3]).expect("add"), Some(vec![1, 3]));
        assert_eq!(add_cbc(0, &mut ns, &[]).expect("skip"), None);
        assert!(add_cbc(0, &mut ns, &[4]).is_err());
        assert_eq!(ns.cbcs.as_ref().map(Vec::len), Some(1));

        assert!(matches!(remove_cbc(&mut ns, 2), Err(InsepaError::CbcNotFound(2))));
        assert_eq!(remove_cbc(&mut ns, 1).expect("remove"), vec![1, 3]);
        assert_eq!(ns.cbcs, Some(Vec::new()));
    }
}
