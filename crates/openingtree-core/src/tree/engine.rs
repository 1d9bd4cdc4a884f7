use std::fmt;

use crate::tree::ids::MoveKey;

/// FEN of the standard initial position, the position key of every root.
pub const INITIAL_POSITION_KEY: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One replayed half-move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ply {
    pub move_key: MoveKey,
    /// Display notation of the move.
    pub san: String,
    /// Canonical board state after the move.
    pub position_key: String,
}

/// Notation could not be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    /// Zero based ply at which replay failed.
    pub ply_index: usize,
    pub reason: String,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ply {}: {}", self.ply_index, self.reason)
    }
}

impl std::error::Error for EngineError {}

/// Interface to whatever understands move notation.
/// The tree never parses notation itself, it only consumes replayed plies.
pub trait MoveEngine {
    /// Replay `notation` from the initial position, returning at most `limit` plies.
    fn replay(&self, notation: &str, limit: usize) -> Result<Vec<Ply>, EngineError>;
}

impl<E: MoveEngine + ?Sized> MoveEngine for &E {
    fn replay(&self, notation: &str, limit: usize) -> Result<Vec<Ply>, EngineError> {
        (**self).replay(notation, limit)
    }
}
