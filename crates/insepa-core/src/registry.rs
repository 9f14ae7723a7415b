//! # Namespace Registry
//!
//! Owns the set of namespaces and keeps their identifiers dense.
//!
//! After every mutation the registry is normalized: identifiers become the
//! contiguous range `0..N-1`, preserving the relative order of the previous
//! integer identifiers, and an empty registry receives the default namespace.
//! Identifiers are therefore NOT stable across removals. Any read-modify-write
//! keyed by an identifier is completed before the reindex pass runs.

use crate::primitives::{DEFAULT_NAMESPACE_ID, DEFAULT_NAMESPACE_NAME};
use crate::{InsepaError, Namespace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The set of namespaces, keyed by integer identifier.
///
/// Uses `BTreeMap` so iteration is always in identifier order. Serialized as
/// a JSON object whose keys are the identifiers as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceRegistry {
    namespaces: BTreeMap<u64, Namespace>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::reindex(BTreeMap::new())
    }
}

impl NamespaceRegistry {
    /// Create a registry holding only the default namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a normalized registry from namespaces under arbitrary ids.
    ///
    /// Sorts by identifier, reassigns `0..N-1` in that order, and synthesizes
    /// the default namespace if nothing is left.
    #[must_use]
    pub fn reindex(namespaces: BTreeMap<u64, Namespace>) -> Self {
        let mut dense: BTreeMap<u64, Namespace> = namespaces
            .into_values()
            .zip(0u64..)
            .map(|(ns, id)| (id, ns))
            .collect();

        if dense.is_empty() {
            dense.insert(
                DEFAULT_NAMESPACE_ID,
                Namespace::new(DEFAULT_NAMESPACE_ID, DEFAULT_NAMESPACE_NAME),
            );
        }

        Self { namespaces: dense }
    }

    /// Normalize this registry in place.
    fn normalize(&mut self) {
        let namespaces = std::mem::take(&mut self.namespaces);
        *self = Self::reindex(namespaces);
    }

    /// Add a namespace and return its identifier.
    ///
    /// The new identifier is `max + 1`. A blank name is a skip and returns
    /// `None` without touching the registry.
    pub fn add(&mut self, name: &str) -> Option<u64> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let id = self
            .namespaces
            .keys()
            .next_back()
            .map_or(DEFAULT_NAMESPACE_ID, |max| max.saturating_add(1));
        self.namespaces.insert(id, Namespace::new(id, name));
        self.normalize();

        // Ids were already dense, so the new namespace is the last one.
        self.namespaces.keys().next_back().copied()
    }

    /// Remove a namespace, then reindex. Returns the removed namespace.
    pub fn remove(&mut self, id: u64) -> Result<Namespace, InsepaError> {
        let removed = self
            .namespaces
            .remove(&id)
            .ok_or(InsepaError::NamespaceNotFound(id))?;
        self.normalize();
        Ok(removed)
    }

    /// Rename a namespace in place. A blank name is a skip.
    ///
    /// Returns `true` if the name changed.
    pub fn rename(&mut self, id: u64, name: &str) -> Result<bool, InsepaError> {
        let ns = self.get_mut(id)?;
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        ns.name = name.to_string();
        Ok(true)
    }

    /// Get a namespace by identifier.
    pub fn get(&self, id: u64) -> Result<&Namespace, InsepaError> {
        self.namespaces
            .get(&id)
            .ok_or(InsepaError::NamespaceNotFound(id))
    }

    /// Get a namespace mutably by identifier.
    pub fn get_mut(&mut self, id: u64) -> Result<&mut Namespace, InsepaError> {
        self.namespaces
            .get_mut(&id)
            .ok_or(InsepaError::NamespaceNotFound(id))
    }

    /// Identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.namespaces.keys().copied()
    }

    /// Iterate `(id, namespace)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Namespace)> {
        self.namespaces.iter().map(|(id, ns)| (*id, ns))
    }

    /// Number of namespaces (never 0).
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Always `false`: a normalized registry holds at least one namespace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
