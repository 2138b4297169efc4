//! Board model and move engine for Sokoban and its hexagonal, triangular and
//! octagonal variants.

pub mod board_cell;
pub mod board_graph;
pub mod board_manager;
pub mod board_state;
pub mod error;
pub mod hashed_board_manager;
mod matching;
pub mod mover;
pub mod pusher_step;
pub mod sokoban_plus;
pub mod tessellation;
mod zobrist;

pub use board_cell::BoardCell;
pub use board_graph::BoardGraph;
pub use board_manager::{BoardManager, PieceKind};
pub use board_state::BoardState;
pub use error::{Error, Result};
pub use hashed_board_manager::HashedBoardManager;
pub use mover::{Mover, MoverState, SolvingMode};
pub use pusher_step::PusherStep;
pub use sokoban_plus::{DEFAULT_PLUS_ID, PlusId, SokobanPlus};
pub use tessellation::{CellOrientation, Direction, Position, Tessellation};
