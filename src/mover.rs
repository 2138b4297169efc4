//! Move execution with undo and redo.
//!
//! The history is a stack of units. A unit is either a single move, push or
//! pull step, or the whole path of one jump or pusher selection, so that undo
//! and redo always act on what the caller did in one call.

use std::fmt;

use tracing::{debug, trace};

use crate::board_graph::BoardGraph;
use crate::error::{Error, Result};
use crate::hashed_board_manager::HashedBoardManager;
use crate::pusher_step::PusherStep;
use crate::tessellation::{Direction, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolvingMode {
    /// Ordinary play.
    #[default]
    Forward,
    /// Play backwards from the solved position. Boxes and goals start
    /// switched and walking into a box pulls it.
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverState {
    Ready,
    Solved,
}

#[derive(Debug, Clone)]
pub struct Mover {
    manager: HashedBoardManager,
    mode: SolvingMode,
    state: MoverState,
    selected_pusher: usize,
    history: Vec<Vec<PusherStep>>,
    redo: Vec<Vec<PusherStep>>,
    last_move: Vec<PusherStep>,
}

impl Mover {
    pub fn new(board: BoardGraph, mode: SolvingMode) -> Result<Self> {
        Self::from_manager(HashedBoardManager::new(board), mode)
    }

    /// Takes over a manager, which lets the caller configure Sokoban+ first.
    pub fn from_manager(mut manager: HashedBoardManager, mode: SolvingMode) -> Result<Self> {
        if !manager.is_playable() {
            return Err(Error::NonPlayableBoard {
                reason: format!(
                    "{} pushers, {} boxes, {} goals",
                    manager.pushers_count(),
                    manager.boxes_count(),
                    manager.goals_count()
                ),
            });
        }

        if mode == SolvingMode::Reverse {
            manager.switch_boxes_and_goals()?;
        }

        let mut mover = Mover {
            manager,
            mode,
            state: MoverState::Ready,
            selected_pusher: 0,
            history: Vec::new(),
            redo: Vec::new(),
            last_move: Vec::new(),
        };
        mover.update_state();
        debug!(?mode, state = ?mover.state, "created mover");
        Ok(mover)
    }

    pub fn manager(&self) -> &HashedBoardManager {
        &self.manager
    }

    pub fn into_manager(self) -> HashedBoardManager {
        self.manager
    }

    pub fn mode(&self) -> SolvingMode {
        self.mode
    }

    pub fn state(&self) -> MoverState {
        self.state
    }

    pub fn is_solved(&self) -> bool {
        self.state == MoverState::Solved
    }

    pub fn selected_pusher(&self) -> usize {
        self.selected_pusher
    }

    pub fn state_hash(&self) -> u64 {
        self.manager.state_hash()
    }

    /// Applied steps, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &PusherStep> {
        self.history.iter().flatten()
    }

    /// Number of operations that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Number of operations that can be redone.
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Steps produced by the most recent operation.
    pub fn last_move(&self) -> &[PusherStep] {
        &self.last_move
    }

    fn update_state(&mut self) {
        self.state = if self.manager.is_solved() {
            MoverState::Solved
        } else {
            MoverState::Ready
        };
    }

    fn record(&mut self, unit: Vec<PusherStep>) {
        self.redo.clear();
        self.last_move = unit.clone();
        self.history.push(unit);
        self.update_state();
    }

    fn pusher_position(&self) -> Result<Position> {
        self.manager.pusher_position(self.selected_pusher)
    }

    pub fn select_pusher(&mut self, id: usize) -> Result<()> {
        let to = self.manager.pusher_position(id)?;
        if id == self.selected_pusher {
            return Ok(());
        }

        let from = self.pusher_position()?;
        let board = self.manager.board();
        let path = board
            .find_jump_path(from, to)
            .ok_or_else(|| Error::illegal_move(format!("no path from pusher on {} to {}", from, to)))?;
        let unit: Vec<PusherStep> = board
            .positions_path_to_directions_path(&path)?
            .into_iter()
            .map(|direction| PusherStep::selection(direction, id))
            .collect();

        self.selected_pusher = id;
        debug!(id, "selected pusher");
        self.record(unit);
        Ok(())
    }

    /// Moves the selected pusher one cell, pushing or pulling a box when one
    /// is in the way.
    ///
    /// In forward mode the box ahead is pushed. In reverse mode the pusher
    /// steps back and drags the box ahead into the cell it left; the returned
    /// step then points the way both pieces travelled.
    pub fn make_move(&mut self, direction: Direction) -> Result<PusherStep> {
        match self.plan_move(direction) {
            Ok(step) => {
                self.apply(&step)?;
                trace!(%step, hash = self.manager.state_hash(), "applied step");
                self.record(vec![step]);
                Ok(step)
            }
            Err(err) => {
                debug!(%direction, %err, "rejected move");
                Err(err)
            }
        }
    }

    /// Plays back a recorded move, push or pull step.
    ///
    /// A reverse-mode pull is recorded along the way the pieces travelled,
    /// so it is replayed by walking toward the box. Fails without touching
    /// the board when the step would not be a push or pull exactly when the
    /// recorded one was.
    pub fn replay_step(&mut self, recorded: &PusherStep) -> Result<PusherStep> {
        if recorded.is_jump() || recorded.is_pusher_selection() {
            return Err(Error::illegal_move(format!("can't replay {} as a single step", recorded)));
        }

        let requested = match self.mode {
            SolvingMode::Reverse if recorded.is_push() => recorded.direction().opposite(),
            _ => recorded.direction(),
        };
        let step = self.plan_move(requested)?;
        if step.is_push() != recorded.is_push() || step.direction() != recorded.direction() {
            return Err(Error::illegal_move(format!(
                "recorded {} replays as {}",
                recorded, step
            )));
        }

        self.apply(&step)?;
        trace!(%step, hash = self.manager.state_hash(), "replayed step");
        self.record(vec![step]);
        Ok(step)
    }

    fn plan_move(&self, direction: Direction) -> Result<PusherStep> {
        let board = self.manager.board();
        let from = self.pusher_position()?;
        let to = board
            .neighbor(from, direction)
            .ok_or_else(|| Error::illegal_move(format!("can't move {} from {}", direction, from)))?;

        let target = board.cell(to)?;
        if target.is_wall() {
            return Err(Error::illegal_move(format!("wall on {}", to)));
        }
        if target.has_pusher() {
            return Err(Error::illegal_move(format!("another pusher on {}", to)));
        }

        let step = PusherStep::new(direction);
        let Some(box_id) = self.manager.box_id_on(to) else {
            return Ok(step.with_pieces(self.selected_pusher, None));
        };

        match self.mode {
            SolvingMode::Forward => {
                let beyond = board
                    .neighbor(to, direction)
                    .ok_or_else(|| Error::illegal_move(format!("can't push box on {} off the board", to)))?;
                if !board.cell(beyond)?.can_put_pusher_or_box() {
                    return Err(Error::illegal_move(format!("box on {} is blocked", to)));
                }
                Ok(step.with_pieces(self.selected_pusher, Some(box_id)))
            }
            SolvingMode::Reverse => {
                let back = direction.opposite();
                let behind = board
                    .neighbor(from, back)
                    .ok_or_else(|| Error::illegal_move(format!("no room behind pusher on {}", from)))?;
                if !board.cell(behind)?.can_put_pusher_or_box() {
                    return Err(Error::illegal_move(format!("pull from {} is blocked", from)));
                }
                Ok(PusherStep::new(back).with_pieces(self.selected_pusher, Some(box_id)))
            }
        }
    }

    /// Moves the step's pusher, and its box if any, one cell along the step
    /// direction. Whichever piece is in front moves first.
    fn apply(&mut self, step: &PusherStep) -> Result<()> {
        let direction = step.direction();
        let pusher_id = step.pusher_id().unwrap_or(self.selected_pusher);
        let board = self.manager.board();

        let pusher_from = self.manager.pusher_position(pusher_id)?;
        let pusher_to = board
            .neighbor(pusher_from, direction)
            .ok_or_else(|| Error::illegal_move(format!("can't move {} from {}", direction, pusher_from)))?;

        let Some(box_id) = step.moved_box_id() else {
            if !board.cell(pusher_to)?.can_put_pusher_or_box() {
                return Err(Error::illegal_move(format!("{} is blocked", pusher_to)));
            }
            return self.manager.move_pusher(pusher_id, pusher_to);
        };

        let box_from = self.manager.box_position(box_id)?;
        let box_to = board
            .neighbor(box_from, direction)
            .ok_or_else(|| Error::illegal_move(format!("can't move box {} from {}", direction, box_from)))?;

        if pusher_to == box_from {
            if !board.cell(box_to)?.can_put_pusher_or_box() {
                return Err(Error::illegal_move(format!("{} is blocked", box_to)));
            }
            self.manager.move_box(box_id, box_to)?;
            self.manager.move_pusher(pusher_id, pusher_to)
        } else if box_to == pusher_from {
            if !board.cell(pusher_to)?.can_put_pusher_or_box() {
                return Err(Error::illegal_move(format!("{} is blocked", pusher_to)));
            }
            self.manager.move_pusher(pusher_id, pusher_to)?;
            self.manager.move_box(box_id, box_to)
        } else {
            Err(Error::illegal_move(format!(
                "box on {} is not next to pusher on {}",
                box_from, pusher_from
            )))
        }
    }

    /// Replays a unit, or its inverse when `undo` is set, and returns the
    /// steps actually applied.
    fn apply_unit(&mut self, unit: &[PusherStep], undo: bool) -> Result<Vec<PusherStep>> {
        let steps: Vec<PusherStep> = if undo {
            unit.iter().rev().map(PusherStep::inverse).collect()
        } else {
            unit.to_vec()
        };

        if steps.first().is_some_and(PusherStep::is_pusher_selection) {
            let directions: Vec<Direction> = steps.iter().map(PusherStep::direction).collect();
            let from = self.pusher_position()?;
            let to = self.manager.board().path_destination(from, &directions)?;
            self.selected_pusher = self
                .manager
                .pusher_id_on(to)
                .ok_or_else(|| Error::illegal_move(format!("no pusher on {}", to)))?;
        } else {
            for step in &steps {
                self.apply(step)?;
            }
        }

        Ok(steps)
    }

    /// Undoes the last operation. Returns the inverse of the most recent
    /// step, flagged as an undo.
    pub fn undo_last(&mut self) -> Result<PusherStep> {
        let unit = self
            .history
            .last()
            .cloned()
            .ok_or_else(|| Error::illegal_move("nothing to undo"))?;

        let applied = self.apply_unit(&unit, true)?;
        self.history.pop();
        self.redo.push(unit);
        self.last_move = applied;
        self.update_state();
        trace!(hash = self.manager.state_hash(), "undid last operation");

        self.last_move
            .first()
            .copied()
            .ok_or_else(|| Error::illegal_move("nothing to undo"))
    }

    /// Re-applies the most recently undone operation. Later undone
    /// operations stay available until a new move is made.
    pub fn redo_last(&mut self) -> Result<PusherStep> {
        let unit = self
            .redo
            .last()
            .cloned()
            .ok_or_else(|| Error::illegal_move("nothing to redo"))?;

        let applied = self.apply_unit(&unit, false)?;
        self.redo.pop();
        self.history.push(unit);
        self.last_move = applied;
        self.update_state();
        trace!(hash = self.manager.state_hash(), "redid last operation");

        self.last_move
            .last()
            .copied()
            .ok_or_else(|| Error::illegal_move("nothing to redo"))
    }

    /// Reverts whatever the most recent operation did, including a previous
    /// undo.
    pub fn undo_last_move(&mut self) -> Result<PusherStep> {
        match self.last_move.first() {
            None => Err(Error::illegal_move("no last move")),
            Some(step) if step.is_undo() => self.redo_last(),
            Some(_) => self.undo_last(),
        }
    }

    /// Relocates the selected pusher to any cell it can walk to without
    /// pushing. The walk is recorded as jump steps.
    pub fn jump(&mut self, position: Position) -> Result<Vec<PusherStep>> {
        let board = self.manager.board();
        let from = self.pusher_position()?;
        if !board.contains(position) {
            return Err(Error::InvalidPosition { position });
        }
        if position == from {
            return Ok(Vec::new());
        }
        if !board.cell(position)?.can_put_pusher_or_box() {
            return Err(Error::illegal_move(format!("can't jump onto occupied {}", position)));
        }

        let path = board
            .find_move_path(from, position)
            .ok_or_else(|| Error::illegal_move(format!("{} is not reachable from {}", position, from)))?;
        let unit: Vec<PusherStep> = board
            .positions_path_to_directions_path(&path)?
            .into_iter()
            .map(|direction| PusherStep::jump(direction, self.selected_pusher))
            .collect();

        self.manager.move_pusher(self.selected_pusher, position)?;
        debug!(from, to = position, steps = unit.len(), "jumped");
        self.record(unit.clone());
        Ok(unit)
    }
}

impl fmt::Display for Mover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.manager)
    }
}
