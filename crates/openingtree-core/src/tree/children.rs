use std::collections::BTreeMap;

use crate::tree::ids::{MoveKey, NodeId};

/// Outgoing edges of one node, keyed by canonical move.
/// Holds at most one edge per `MoveKey`, so siblings can never share a move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Children {
    edges: BTreeMap<MoveKey, NodeId>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the child reached by `key`.
    pub fn get(&self, key: MoveKey) -> Option<NodeId> {
        self.edges.get(&key).copied()
    }

    /// Insert a new edge.
    /// Returns Option<NodeId>, with Some(child_id) in case the insert worked
    /// and None when the key already had a child.
    pub fn insert(&mut self, key: MoveKey, child_id: NodeId) -> Option<NodeId> {
        if self.edges.contains_key(&key) {
            return None;
        }
        self.edges.insert(key, child_id);
        Some(child_id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges in move key order.
    pub fn iter(&self) -> impl Iterator<Item = (MoveKey, NodeId)> + '_ {
        self.edges.iter().map(|(key, id)| (*key, *id))
    }
}
