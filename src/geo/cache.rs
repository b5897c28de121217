//! Run-scoped lookup caches.
//!
//! Both caches are owned by the orchestrator and passed explicitly to the
//! resolver; nothing here is global. They live for one run and are rebuilt
//! from batch snapshots on resumption.

use std::collections::HashMap;

use super::types::Coord;

/// Place QID -> resolved coordinate, with explicit "known absent" entries
/// so a place that yielded nothing is never re-queried within a run.
#[derive(Debug, Default)]
pub struct CoordCache {
    entries: HashMap<String, Option<Coord>>,
}

impl CoordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this place has been looked up already (hit or known-absent).
    pub fn known(&self, qid: &str) -> bool {
        self.entries.contains_key(qid)
    }

    /// The resolved coordinate, if the place is known and has one.
    pub fn get(&self, qid: &str) -> Option<Coord> {
        self.entries.get(qid).copied().flatten()
    }

    pub fn insert(&mut self, qid: impl Into<String>, coord: Coord) {
        self.entries.insert(qid.into(), Some(coord));
    }

    /// Record that a lookup found no coordinate. Never downgrades an
    /// already-cached hit.
    pub fn mark_missing(&mut self, qid: impl Into<String>) {
        self.entries.entry(qid.into()).or_insert(None);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Place QID -> direct administrative parents, in returned row order.
///
/// Order matters: the resolver accepts the first parent with a cached
/// coordinate, so reordering here would change which ancestor wins.
#[derive(Debug, Default)]
pub struct ParentCache {
    entries: HashMap<String, Vec<String>>,
}

impl ParentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether parents were already fetched for this place.
    pub fn known(&self, qid: &str) -> bool {
        self.entries.contains_key(qid)
    }

    pub fn parents(&self, qid: &str) -> &[String] {
        self.entries.get(qid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mark a place as fetched, with no parents found yet.
    pub fn mark_fetched(&mut self, qid: impl Into<String>) {
        self.entries.entry(qid.into()).or_default();
    }

    pub fn add_parent(&mut self, qid: impl Into<String>, parent: impl Into<String>) {
        self.entries.entry(qid.into()).or_default().push(parent.into());
    }
}
