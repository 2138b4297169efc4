use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use crate::board_graph::BoardGraph;
use crate::board_manager::BoardManager;
use crate::board_state::BoardState;
use crate::error::{Error, Result};
use crate::sokoban_plus::PlusId;
use crate::tessellation::Position;
use crate::zobrist::Zobrist;

/// [`BoardManager`] that keeps a Zobrist hash of its box and goal layout.
///
/// Read access goes through `Deref`. Every mutation has to go through this
/// type so the hash stays in sync; it always equals [`Self::recompute_hash`].
#[derive(Debug, Clone)]
pub struct HashedBoardManager {
    manager: BoardManager,
    keys: Arc<Zobrist>,
    slots: Vec<PlusId>,
    state_hash: u64,
    solutions_hashes: OnceLock<BTreeSet<u64>>,
}

impl HashedBoardManager {
    pub fn new(board: BoardGraph) -> Self {
        Self::from_manager(BoardManager::new(board))
    }

    pub fn from_manager(manager: BoardManager) -> Self {
        let mut hashed = HashedBoardManager {
            manager,
            keys: Arc::new(Zobrist::new(0, 0)),
            slots: Vec::new(),
            state_hash: 0,
            solutions_hashes: OnceLock::new(),
        };
        hashed.rehash();
        hashed
    }

    pub fn manager(&self) -> &BoardManager {
        &self.manager
    }

    pub fn into_manager(self) -> BoardManager {
        self.manager
    }

    /// Regenerates keys for the current plus ids and hashes from scratch.
    fn rehash(&mut self) {
        let plus = self.manager.sokoban_plus();
        let slots: BTreeSet<PlusId> = plus
            .box_plus_ids()
            .into_iter()
            .chain(plus.goal_plus_ids())
            .collect();
        let slots: Vec<PlusId> = slots.into_iter().collect();
        let slot_count = slots.len().max(1);

        if self.keys.size() != self.manager.board().size() || self.keys.slots() != slot_count {
            self.keys = Arc::new(Zobrist::new(self.manager.board().size(), slot_count));
        }
        self.slots = slots;
        self.solutions_hashes = OnceLock::new();
        self.state_hash = self.recompute_hash();
        debug!(hash = self.state_hash, slots = slot_count, "rehashed board");
    }

    fn slot(&self, plus_id: PlusId) -> usize {
        self.slots.binary_search(&plus_id).unwrap_or(0)
    }

    fn box_key(&self, id: usize, position: Position) -> u64 {
        let plus_id = self.manager.sokoban_plus().box_plus_id(id).unwrap_or_default();
        self.keys.box_hash(position, self.slot(plus_id))
    }

    fn goal_key(&self, id: usize, position: Position) -> u64 {
        let plus_id = self.manager.sokoban_plus().goal_plus_id(id).unwrap_or_default();
        self.keys.goal_hash(position, self.slot(plus_id))
    }

    fn hash_layout(&self, boxes: &[Position]) -> u64 {
        let mut hash = self.keys.initial_hash();
        for (id, &position) in boxes.iter().enumerate() {
            hash ^= self.box_key(id, position);
        }
        for (id, &position) in self.manager.goals_positions().iter().enumerate() {
            hash ^= self.goal_key(id, position);
        }
        hash
    }

    /// Hash of the current box and goal layout, ignoring pushers.
    pub fn state_hash(&self) -> u64 {
        self.state_hash
    }

    /// Hash of an empty board.
    pub fn initial_state_hash(&self) -> u64 {
        self.keys.initial_hash()
    }

    /// Full recomputation of [`Self::state_hash`].
    pub fn recompute_hash(&self) -> u64 {
        self.hash_layout(self.manager.boxes_positions())
    }

    /// Hash the board would have with boxes on `boxes` (indexed by box id)
    /// and the current goals.
    pub fn external_state_hash(&self, boxes: &[Position]) -> Result<u64> {
        if boxes.len() != self.manager.boxes_count() {
            return Err(Error::InvalidBoard {
                reason: format!(
                    "{} box positions given for {} boxes",
                    boxes.len(),
                    self.manager.boxes_count()
                ),
            });
        }
        if let Some(&position) = boxes.iter().find(|&&p| !self.manager.board().contains(p)) {
            return Err(Error::InvalidPosition { position });
        }
        Ok(self.hash_layout(boxes))
    }

    /// State hash that also tells pusher areas apart: each distinct pusher
    /// area contributes the key of its smallest position.
    pub fn normalized_state_hash(&self) -> u64 {
        let board = self.manager.board();
        let areas: BTreeSet<Position> = self
            .manager
            .pushers_positions()
            .iter()
            .map(|&position| board.normalized_pusher_position(position))
            .collect();
        areas
            .into_iter()
            .fold(self.state_hash, |hash, position| hash ^ self.keys.pusher_hash(position))
    }

    /// Current positions together with [`Self::state_hash`].
    pub fn state(&self) -> BoardState {
        self.manager.state().with_hash(self.state_hash)
    }

    /// State hashes of every solved layout, built from
    /// [`BoardManager::solutions`] on first use and kept until Sokoban+ or
    /// the box/goal roles change.
    pub fn solutions_hashes(&self) -> &BTreeSet<u64> {
        self.solutions_hashes.get_or_init(|| {
            let hashes: BTreeSet<u64> = self
                .manager
                .solutions()
                .iter()
                .map(|solution| self.hash_layout(&solution.boxes_positions))
                .collect();
            debug!(count = hashes.len(), "cached solution hashes");
            hashes
        })
    }

    pub fn move_pusher(&mut self, id: usize, position: Position) -> Result<()> {
        self.manager.move_pusher(id, position)
    }

    pub fn move_pusher_from(&mut self, old: Position, new: Position) -> Result<()> {
        self.manager.move_pusher_from(old, new)
    }

    pub fn move_box(&mut self, id: usize, position: Position) -> Result<()> {
        let old = self.manager.box_position(id)?;
        self.manager.move_box(id, position)?;
        if old != position {
            self.state_hash ^= self.box_key(id, old);
            self.state_hash ^= self.box_key(id, position);
            trace!(id, old, position, hash = self.state_hash, "moved box");
        }
        Ok(())
    }

    pub fn move_box_from(&mut self, old: Position, new: Position) -> Result<()> {
        let id = self
            .manager
            .box_id_on(old)
            .ok_or_else(|| Error::illegal_move(format!("no box on {}", old)))?;
        self.move_box(id, new)
    }

    pub fn switch_boxes_and_goals(&mut self) -> Result<()> {
        self.manager.switch_boxes_and_goals()?;
        self.rehash();
        Ok(())
    }

    pub fn set_sokoban_plus(&mut self, boxorder: &str, goalorder: &str) {
        self.manager.set_sokoban_plus(boxorder, goalorder);
        self.rehash();
    }

    pub fn enable_sokoban_plus(&mut self) -> Result<()> {
        self.manager.enable_sokoban_plus()?;
        self.rehash();
        Ok(())
    }

    pub fn disable_sokoban_plus(&mut self) {
        self.manager.disable_sokoban_plus();
        self.rehash();
    }
}

// The solutions cache is derived data and doesn't take part in equality.
impl PartialEq for HashedBoardManager {
    fn eq(&self, other: &Self) -> bool {
        self.manager == other.manager
            && self.keys == other.keys
            && self.slots == other.slots
            && self.state_hash == other.state_hash
    }
}

impl Eq for HashedBoardManager {}

impl Deref for HashedBoardManager {
    type Target = BoardManager;

    fn deref(&self) -> &BoardManager {
        &self.manager
    }
}

impl fmt::Display for HashedBoardManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.manager)
    }
}
