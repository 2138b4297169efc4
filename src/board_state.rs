use std::fmt;

use crate::tessellation::Position;

/// Snapshot of piece positions, indexed by piece id.
///
/// Solutions produced by [`crate::BoardManager::solutions`] carry no pushers.
/// `zobrist_hash` is only known for snapshots taken from a hashed manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BoardState {
    pub pushers_positions: Vec<Position>,
    pub boxes_positions: Vec<Position>,
    pub zobrist_hash: Option<u64>,
}

impl BoardState {
    pub fn new(pushers_positions: Vec<Position>, boxes_positions: Vec<Position>) -> Self {
        BoardState {
            pushers_positions,
            boxes_positions,
            zobrist_hash: None,
        }
    }

    pub fn with_hash(self, hash: u64) -> Self {
        BoardState {
            zobrist_hash: Some(hash),
            ..self
        }
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pushers: {:?}, boxes: {:?}",
            self.pushers_positions, self.boxes_positions
        )?;
        if let Some(hash) = self.zobrist_hash {
            write!(f, ", hash: {:016x}", hash)?;
        }
        Ok(())
    }
}
