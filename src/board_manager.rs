use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use derive_more::Display;
use tracing::debug;

use crate::board_graph::BoardGraph;
use crate::board_state::BoardState;
use crate::error::{Error, Result};
use crate::matching::perfect_matching;
use crate::sokoban_plus::{DEFAULT_PLUS_ID, PlusId, SokobanPlus, is_compatible};
use crate::tessellation::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum PieceKind {
    #[display("pusher")]
    Pusher,
    #[display("box")]
    Box,
    #[display("goal")]
    Goal,
}

/// Positions of one kind of piece, indexed by id, plus the reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Pieces {
    positions: Vec<Position>,
    index: BTreeMap<Position, usize>,
}

impl Pieces {
    fn add(&mut self, position: Position) {
        self.index.insert(position, self.positions.len());
        self.positions.push(position);
    }

    fn len(&self) -> usize {
        self.positions.len()
    }

    fn position(&self, id: usize) -> Option<Position> {
        self.positions.get(id).copied()
    }

    fn id_on(&self, position: Position) -> Option<usize> {
        self.index.get(&position).copied()
    }

    fn move_piece(&mut self, id: usize, to: Position) {
        let from = self.positions[id];
        self.index.remove(&from);
        self.index.insert(to, id);
        self.positions[id] = to;
    }

    fn replace_all(&mut self, positions: Vec<Position>) {
        self.index = positions.iter().enumerate().map(|(id, &p)| (p, id)).collect();
        self.positions = positions;
    }
}

/// Board plus the id <-> position mappings of every pusher, box and goal.
///
/// Ids are handed out in row-major scan order starting from 0 and stay
/// stable for the lifetime of the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardManager {
    board: BoardGraph,
    pushers: Pieces,
    boxes: Pieces,
    goals: Pieces,
    sokoban_plus: SokobanPlus,
}

impl BoardManager {
    pub fn new(board: BoardGraph) -> Self {
        let mut pushers = Pieces::default();
        let mut boxes = Pieces::default();
        let mut goals = Pieces::default();

        for (position, cell) in board.cells() {
            if cell.has_pusher() {
                pushers.add(position);
            }
            if cell.has_box() {
                boxes.add(position);
            }
            if cell.has_goal() {
                goals.add(position);
            }
        }

        debug!(
            pushers = pushers.len(),
            boxes = boxes.len(),
            goals = goals.len(),
            "indexed board pieces"
        );

        let sokoban_plus = SokobanPlus::new(boxes.len(), "", "");
        BoardManager {
            board,
            pushers,
            boxes,
            goals,
            sokoban_plus,
        }
    }

    pub fn board(&self) -> &BoardGraph {
        &self.board
    }

    fn pieces(&self, kind: PieceKind) -> &Pieces {
        match kind {
            PieceKind::Pusher => &self.pushers,
            PieceKind::Box => &self.boxes,
            PieceKind::Goal => &self.goals,
        }
    }

    pub fn pieces_count(&self, kind: PieceKind) -> usize {
        self.pieces(kind).len()
    }

    pub fn position_of(&self, kind: PieceKind, id: usize) -> Result<Position> {
        self.pieces(kind)
            .position(id)
            .ok_or(Error::PieceNotFound { kind, id })
    }

    pub fn id_on(&self, kind: PieceKind, position: Position) -> Option<usize> {
        self.pieces(kind).id_on(position)
    }

    pub fn pushers_count(&self) -> usize {
        self.pushers.len()
    }

    pub fn pusher_ids(&self) -> impl Iterator<Item = usize> + use<> {
        0..self.pushers.len()
    }

    /// Pusher positions indexed by pusher id.
    pub fn pushers_positions(&self) -> &[Position] {
        &self.pushers.positions
    }

    pub fn pusher_position(&self, id: usize) -> Result<Position> {
        self.position_of(PieceKind::Pusher, id)
    }

    pub fn pusher_id_on(&self, position: Position) -> Option<usize> {
        self.pushers.id_on(position)
    }

    pub fn has_pusher_on(&self, position: Position) -> bool {
        self.pushers.id_on(position).is_some()
    }

    pub fn boxes_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn box_ids(&self) -> impl Iterator<Item = usize> + use<> {
        0..self.boxes.len()
    }

    pub fn boxes_positions(&self) -> &[Position] {
        &self.boxes.positions
    }

    pub fn box_position(&self, id: usize) -> Result<Position> {
        self.position_of(PieceKind::Box, id)
    }

    pub fn box_id_on(&self, position: Position) -> Option<usize> {
        self.boxes.id_on(position)
    }

    pub fn has_box_on(&self, position: Position) -> bool {
        self.boxes.id_on(position).is_some()
    }

    pub fn goals_count(&self) -> usize {
        self.goals.len()
    }

    pub fn goal_ids(&self) -> impl Iterator<Item = usize> + use<> {
        0..self.goals.len()
    }

    pub fn goals_positions(&self) -> &[Position] {
        &self.goals.positions
    }

    pub fn goal_position(&self, id: usize) -> Result<Position> {
        self.position_of(PieceKind::Goal, id)
    }

    pub fn goal_id_on(&self, position: Position) -> Option<usize> {
        self.goals.id_on(position)
    }

    pub fn has_goal_on(&self, position: Position) -> bool {
        self.goals.id_on(position).is_some()
    }

    pub fn walls_positions(&self) -> Vec<Position> {
        self.board.wall_positions()
    }

    /// At least one pusher and one box, and exactly as many goals as boxes.
    pub fn is_playable(&self) -> bool {
        self.pushers.len() > 0 && self.boxes.len() > 0 && self.boxes.len() == self.goals.len()
    }

    /// Checks that `position` is on the board and free for a pusher or box.
    fn check_destination(&self, from: Position, to: Position) -> Result<()> {
        let cell = self.board.cell(to)?;
        if from != to && !cell.can_put_pusher_or_box() {
            return Err(Error::CellAlreadyOccupied { position: to });
        }
        Ok(())
    }

    pub fn move_pusher(&mut self, id: usize, position: Position) -> Result<()> {
        let old = self.pusher_position(id)?;
        self.check_destination(old, position)?;
        if old == position {
            return Ok(());
        }

        self.board.cell_mut(old)?.remove_pusher();
        self.board.cell_mut(position)?.put_pusher();
        self.pushers.move_piece(id, position);
        Ok(())
    }

    pub fn move_pusher_from(&mut self, old: Position, new: Position) -> Result<()> {
        let id = self
            .pusher_id_on(old)
            .ok_or_else(|| Error::illegal_move(format!("no pusher on {}", old)))?;
        self.move_pusher(id, new)
    }

    pub fn move_box(&mut self, id: usize, position: Position) -> Result<()> {
        let old = self.box_position(id)?;
        self.check_destination(old, position)?;
        if old == position {
            return Ok(());
        }

        self.board.cell_mut(old)?.remove_box();
        self.board.cell_mut(position)?.put_box();
        self.boxes.move_piece(id, position);
        Ok(())
    }

    pub fn move_box_from(&mut self, old: Position, new: Position) -> Result<()> {
        let id = self
            .box_id_on(old)
            .ok_or_else(|| Error::illegal_move(format!("no box on {}", old)))?;
        self.move_box(id, new)
    }

    pub fn sokoban_plus(&self) -> &SokobanPlus {
        &self.sokoban_plus
    }

    /// Replaces the Sokoban+ orders. The new data starts out disabled.
    pub fn set_sokoban_plus(&mut self, boxorder: &str, goalorder: &str) {
        self.sokoban_plus = SokobanPlus::new(self.boxes.len(), boxorder, goalorder);
    }

    pub fn enable_sokoban_plus(&mut self) -> Result<()> {
        self.sokoban_plus.enable()
    }

    pub fn disable_sokoban_plus(&mut self) {
        self.sokoban_plus.disable();
    }

    /// Every box sits on a goal. With Sokoban+ enabled the plus ids of each
    /// box and the goal under it must also be compatible.
    pub fn is_solved(&self) -> bool {
        if self.boxes.len() != self.goals.len() {
            return false;
        }

        if !self.sokoban_plus.is_enabled() {
            return self
                .boxes
                .positions
                .iter()
                .all(|&position| self.goals.id_on(position).is_some());
        }

        let boxes: Vec<(usize, Position)> = self.boxes.positions.iter().copied().enumerate().collect();
        let goals: Vec<(usize, Position)> = self.goals.positions.iter().copied().enumerate().collect();
        self.sokoban_plus.is_valid_solution(&boxes, &goals)
    }

    /// Current pusher and box positions, indexed by id.
    pub fn state(&self) -> BoardState {
        BoardState::new(self.pushers.positions.clone(), self.boxes.positions.clone())
    }

    /// Every box layout that solves the board, as box positions indexed by
    /// box id. Layouts are listed in lexicographic order.
    ///
    /// The count grows factorially with the number of boxes.
    pub fn solutions(&self) -> Vec<BoardState> {
        if self.boxes.len() != self.goals.len() {
            return Vec::new();
        }

        let box_ids = self.sokoban_plus.box_plus_ids();
        let goal_ids = self.sokoban_plus.goal_plus_ids();
        let mut goals: Vec<(Position, PlusId)> = self
            .goals
            .positions
            .iter()
            .enumerate()
            .map(|(id, &position)| (position, goal_ids.get(id).copied().unwrap_or(DEFAULT_PLUS_ID)))
            .collect();
        goals.sort_unstable();

        let mut found = Vec::new();
        let mut layout = Vec::with_capacity(goals.len());
        let mut used = vec![false; goals.len()];
        Self::collect_solutions(&box_ids, &goals, &mut used, &mut layout, &mut found);
        debug!(count = found.len(), "enumerated solutions");
        found
    }

    fn collect_solutions(
        box_ids: &[PlusId],
        goals: &[(Position, PlusId)],
        used: &mut [bool],
        layout: &mut Vec<Position>,
        found: &mut Vec<BoardState>,
    ) {
        if layout.len() == goals.len() {
            found.push(BoardState::new(Vec::new(), layout.clone()));
            return;
        }

        let box_plus_id = box_ids.get(layout.len()).copied().unwrap_or(DEFAULT_PLUS_ID);
        for (index, &(position, goal_plus_id)) in goals.iter().enumerate() {
            if used[index] || !is_compatible(box_plus_id, goal_plus_id) {
                continue;
            }
            used[index] = true;
            layout.push(position);
            Self::collect_solutions(box_ids, goals, used, layout, found);
            layout.pop();
            used[index] = false;
        }
    }

    /// Box id paired with each goal when boxes and goals trade places.
    fn box_goal_pairing(&self) -> Result<Vec<usize>> {
        if self.boxes.len() != self.goals.len() {
            return Err(Error::BoxGoalSwitch {
                reason: format!(
                    "{} boxes and {} goals",
                    self.boxes.len(),
                    self.goals.len()
                ),
            });
        }

        if !self.sokoban_plus.is_enabled() {
            return Ok((0..self.boxes.len()).collect());
        }

        let box_ids = self.sokoban_plus.box_plus_ids();
        let goal_ids = self.sokoban_plus.goal_plus_ids();
        perfect_matching(box_ids.len(), goal_ids.len(), |b, g| is_compatible(box_ids[b], goal_ids[g]))
            .ok_or_else(|| Error::BoxGoalSwitch {
                reason: "no pairing of boxes and goals respects their plus ids".to_string(),
            })
    }

    /// Swaps every box with its paired goal. Pushers left standing on a new
    /// box position are moved to the position that box came from.
    pub fn switch_boxes_and_goals(&mut self) -> Result<()> {
        let pairing = self.box_goal_pairing()?;

        let mut new_boxes = vec![0; self.boxes.len()];
        let mut new_goals = vec![0; self.goals.len()];
        for (box_id, &goal_id) in pairing.iter().enumerate() {
            new_boxes[box_id] = self.goals.positions[goal_id];
            new_goals[goal_id] = self.boxes.positions[box_id];
        }

        let occupied: BTreeSet<Position> = new_boxes.iter().copied().collect();
        let mut new_pushers = self.pushers.positions.clone();
        for pusher in new_pushers.iter_mut() {
            if let Some(box_id) = new_boxes.iter().position(|p| p == pusher) {
                *pusher = self.boxes.positions[box_id];
            }
        }
        let distinct: BTreeSet<Position> = new_pushers.iter().copied().collect();
        if distinct.len() != new_pushers.len() || new_pushers.iter().any(|p| occupied.contains(p)) {
            return Err(Error::BoxGoalSwitch {
                reason: "pushers can't be placed clear of the switched boxes".to_string(),
            });
        }

        for &position in self.boxes.positions.iter().chain(&self.goals.positions) {
            let cell = self.board.cell_mut(position)?;
            cell.remove_box();
            cell.remove_goal();
        }
        for &position in &self.pushers.positions {
            self.board.cell_mut(position)?.remove_pusher();
        }
        for &position in &new_boxes {
            self.board.cell_mut(position)?.put_box();
        }
        for &position in &new_goals {
            self.board.cell_mut(position)?.put_goal();
        }
        for &position in &new_pushers {
            self.board.cell_mut(position)?.put_pusher();
        }

        self.boxes.replace_all(new_boxes);
        self.goals.replace_all(new_goals);
        self.pushers.replace_all(new_pushers);
        debug!("switched boxes and goals");
        Ok(())
    }
}

impl fmt::Display for BoardManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tessellation::{Tessellation, to_position};

    fn manager(text: &str) -> BoardManager {
        BoardManager::new(BoardGraph::from_text(text, Tessellation::Sokoban).unwrap())
    }

    #[test]
    fn test_ids_follow_scan_order() {
        let input = "#######\n\
                     #@$ . #\n\
                     # *$@.#\n\
                     #######";
        let m = manager(input);
        assert_eq!(m.pushers_positions(), &[to_position(1, 1, 7), to_position(2, 4, 7)]);
        assert_eq!(m.boxes_positions(), &[to_position(1, 2, 7), to_position(2, 2, 7), to_position(2, 3, 7)]);
        assert_eq!(m.goals_positions(), &[to_position(1, 4, 7), to_position(2, 2, 7), to_position(2, 5, 7)]);
        assert_eq!(m.box_id_on(to_position(2, 3, 7)), Some(2));
        assert_eq!(m.pusher_id_on(to_position(2, 4, 7)), Some(1));
        assert!(m.has_goal_on(to_position(2, 2, 7)));
        assert_eq!(m.pusher_ids().collect::<Vec<_>>(), vec![0, 1]);
        assert!(m.is_playable());
    }

    #[test]
    fn test_not_playable() {
        assert!(!manager("#@$.#\n#  .#").is_playable());
        assert!(!manager("# $.#").is_playable());
        assert!(!manager("#@  #").is_playable());
    }

    #[test]
    fn test_move_box_updates_both_views() {
        let mut m = manager("#@$  #");
        m.move_box(0, 4).unwrap();
        assert_eq!(m.box_position(0).unwrap(), 4);
        assert_eq!(m.box_id_on(4), Some(0));
        assert_eq!(m.box_id_on(2), None);
        assert!(m.board().cell(4).unwrap().has_box());
        assert!(!m.board().cell(2).unwrap().has_box());
    }

    #[test]
    fn test_move_errors_leave_state() {
        let mut m = manager("#@$$ #");
        let before = m.clone();

        assert_eq!(m.move_box(0, 3), Err(Error::CellAlreadyOccupied { position: 3 }));
        assert_eq!(m.move_box(0, 1), Err(Error::CellAlreadyOccupied { position: 1 }));
        assert_eq!(m.move_box(0, 0), Err(Error::CellAlreadyOccupied { position: 0 }));
        assert_eq!(m.move_box(0, 42), Err(Error::InvalidPosition { position: 42 }));
        assert_eq!(
            m.move_box(5, 4),
            Err(Error::PieceNotFound { kind: PieceKind::Box, id: 5 })
        );
        assert_eq!(
            m.move_pusher(1, 4),
            Err(Error::PieceNotFound { kind: PieceKind::Pusher, id: 1 })
        );
        assert!(m.move_box_from(4, 5).is_err());
        assert_eq!(m, before);

        // moving onto its own cell is a no-op
        m.move_pusher(0, 1).unwrap();
        assert_eq!(m, before);
    }

    #[test]
    fn test_move_pusher_onto_goal() {
        let mut m = manager("#@ .$#");
        m.move_pusher_from(1, 3).unwrap();
        assert_eq!(m.pusher_position(0).unwrap(), 3);
        assert_eq!(m.board().cell(3).unwrap().to_char(), '+');
    }

    #[test]
    fn test_is_solved() {
        assert!(manager("#*@#").is_solved());
        assert!(!manager("#$.@#").is_solved());
        assert!(!manager("#*.@#").is_solved());
    }

    #[test]
    fn test_is_solved_with_sokoban_plus() {
        let mut m = manager("#@**#");
        m.set_sokoban_plus("1 2", "2 1");
        assert!(m.is_solved());
        m.enable_sokoban_plus().unwrap();
        assert!(!m.is_solved());

        m.set_sokoban_plus("1 2", "1 2");
        m.enable_sokoban_plus().unwrap();
        assert!(m.is_solved());

        m.set_sokoban_plus("1 2", "1");
        m.enable_sokoban_plus().unwrap();
        assert!(m.is_solved());
    }

    #[test]
    fn test_state() {
        let m = manager("#@$$..#");
        let state = m.state();
        assert_eq!(state.pushers_positions, vec![1]);
        assert_eq!(state.boxes_positions, vec![2, 3]);
        assert_eq!(state.zobrist_hash, None);
    }

    #[test]
    fn test_solutions() {
        let mut m = manager("#@$$..#");
        let layouts: Vec<Vec<Position>> = m.solutions().into_iter().map(|s| s.boxes_positions).collect();
        assert_eq!(layouts, vec![vec![4, 5], vec![5, 4]]);
        assert!(m.solutions().iter().all(|s| s.pushers_positions.is_empty()));

        // box 0 (plus 1) only fits goal 1, box 1 (plus 2) only goal 0
        m.set_sokoban_plus("1 2", "2 1");
        m.enable_sokoban_plus().unwrap();
        let layouts: Vec<Vec<Position>> = m.solutions().into_iter().map(|s| s.boxes_positions).collect();
        assert_eq!(layouts, vec![vec![5, 4]]);

        assert!(manager("#@$$.#").solutions().is_empty());
    }

    #[test]
    fn test_switch_boxes_and_goals() {
        let mut m = manager("#@$ .#");
        m.switch_boxes_and_goals().unwrap();
        assert_eq!(m.boxes_positions(), &[4]);
        assert_eq!(m.goals_positions(), &[2]);
        assert_eq!(m.to_string().trim_end(), "#@. $#");
    }

    #[test]
    fn test_switch_moves_pusher_off_new_box() {
        let mut m = manager("#$ +#");
        m.switch_boxes_and_goals().unwrap();
        assert_eq!(m.boxes_positions(), &[3]);
        assert_eq!(m.pushers_positions(), &[1]);
        assert_eq!(m.to_string().trim_end(), "#+ $#");
    }

    #[test]
    fn test_switch_with_sokoban_plus_pairs_by_id() {
        let mut m = manager("#@$$..#");
        m.set_sokoban_plus("1 2", "2 1");
        m.enable_sokoban_plus().unwrap();
        m.switch_boxes_and_goals().unwrap();
        // box 0 (plus 1) lands on goal 1, box 1 (plus 2) on goal 0
        assert_eq!(m.boxes_positions(), &[5, 4]);
        assert_eq!(m.goals_positions(), &[3, 2]);
    }

    #[test]
    fn test_switch_requires_equal_counts() {
        let mut m = manager("#@$$.#");
        let before = m.clone();
        assert!(matches!(
            m.switch_boxes_and_goals(),
            Err(Error::BoxGoalSwitch { .. })
        ));
        assert_eq!(m, before);
    }
}
