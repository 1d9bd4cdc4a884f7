use std::fmt;

use crate::tree::ids::{MoveKey, NodeId};

/// Error type for opening tree construction, merging and snapshot restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Attempted to access a node id that does not exist in the arena.
    MissingNode { node_id: NodeId },
    /// Attempted to add a second edge for a move a node already has.
    DuplicateEdge { node_id: NodeId, move_key: MoveKey },
    /// Attempted to merge trees built with different depth limits.
    ParameterConflict {
        base_max_depth: usize,
        delta_max_depth: usize,
    },
    /// Snapshot was written by an incompatible schema.
    UnsupportedSchema { found: u32, expected: u32 },
    /// Snapshot content breaks a tree invariant.
    InvalidSnapshot { node_id: usize, reason: String },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::MissingNode { node_id } => {
                write!(f, "missing node with id {}", node_id.index())
            }
            TreeError::DuplicateEdge { node_id, move_key } => {
                write!(f, "node {} already has an edge for {move_key}", node_id.index())
            }
            TreeError::ParameterConflict {
                base_max_depth,
                delta_max_depth,
            } => write!(
                f,
                "cannot merge a tree of max depth {delta_max_depth} into a tree of max depth {base_max_depth}"
            ),
            TreeError::UnsupportedSchema { found, expected } => write!(
                f,
                "unsupported snapshot schema version {found}, expected {expected}"
            ),
            TreeError::InvalidSnapshot { node_id, reason } => {
                write!(f, "invalid snapshot at node {node_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// One game's notation could not be replayed. The game is skipped, the batch goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDataError {
    pub game_id: String,
    pub reason: String,
}

impl fmt::Display for SourceDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game {} has unreadable notation: {}", self.game_id, self.reason)
    }
}

impl std::error::Error for SourceDataError {}
