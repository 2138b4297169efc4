//! Error type shared by every engine component.

use derive_more::{Display, Error};

use crate::board_manager::PieceKind;
use crate::tessellation::Position;

/// Failures reported by board, manager and mover operations.
///
/// Every variant describes a caller-correctable precondition violation.
/// Operations that fail leave the state they were called on untouched.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum Error {
    #[display("position {position} is off the board")]
    InvalidPosition { position: Position },

    #[display("invalid board: {reason}")]
    InvalidBoard { reason: String },

    #[display("invalid character {character:?}")]
    InvalidCharacter { character: char },

    #[display("cell {position} is already occupied")]
    CellAlreadyOccupied { position: Position },

    #[display("{kind} {id} not found")]
    PieceNotFound { kind: PieceKind, id: usize },

    #[display("illegal move: {reason}")]
    IllegalMove { reason: String },

    #[display("board is not playable: {reason}")]
    NonPlayableBoard { reason: String },

    #[display("cannot switch boxes and goals: {reason}")]
    BoxGoalSwitch { reason: String },

    #[display("invalid Sokoban+ data: {reason}")]
    SokobanPlusData { reason: String },
}

impl Error {
    pub(crate) fn illegal_move(reason: impl Into<String>) -> Self {
        Error::IllegalMove {
            reason: reason.into(),
        }
    }

    pub(crate) fn sokoban_plus(reason: impl Into<String>) -> Self {
        Error::SokobanPlusData {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::PieceNotFound {
            kind: PieceKind::Box,
            id: 3,
        };
        assert_eq!(err.to_string(), "box 3 not found");

        let err = Error::illegal_move("wall ahead");
        assert_eq!(err.to_string(), "illegal move: wall ahead");

        let err = Error::InvalidCharacter { character: 'x' };
        assert_eq!(err.to_string(), "invalid character 'x'");
    }

    #[test]
    fn test_errors_have_no_source() {
        use std::error::Error as _;
        let err = Error::sokoban_plus("ids differ");
        assert!(err.source().is_none());
    }
}
