use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use arrayvec::ArrayVec;
use tracing::debug;

use crate::board_cell::BoardCell;
use crate::error::{Error, Result};
use crate::tessellation::{Direction, Position, Tessellation, to_row_column};

pub const MAX_WIDTH: usize = 4096;
pub const MAX_HEIGHT: usize = 4096;

type Edges = [Option<Position>; 8];

/// Board cells plus the directed adjacency between them.
///
/// Edges are computed once from the tessellation and never change afterwards.
/// Only cell contents are mutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardGraph {
    cells: Vec<BoardCell>,
    edges: Vec<Edges>,
    width: usize,
    height: usize,
    tessellation: Tessellation,
}

impl BoardGraph {
    /// Board of empty floor cells.
    pub fn new(width: usize, height: usize, tessellation: Tessellation) -> Result<Self> {
        Self::from_cells(width, height, tessellation, vec![BoardCell::new(); width * height])
    }

    /// Board overlaid with a cell layout given in row-major order.
    pub fn from_cells(
        width: usize,
        height: usize,
        tessellation: Tessellation,
        mut cells: Vec<BoardCell>,
    ) -> Result<Self> {
        if width > MAX_WIDTH {
            return Err(Error::InvalidBoard {
                reason: format!("width {} exceeds maximum {}", width, MAX_WIDTH),
            });
        }
        if height > MAX_HEIGHT {
            return Err(Error::InvalidBoard {
                reason: format!("height {} exceeds maximum {}", height, MAX_HEIGHT),
            });
        }
        if cells.len() != width * height {
            return Err(Error::InvalidBoard {
                reason: format!(
                    "{} cells supplied for a {}x{} board",
                    cells.len(),
                    width,
                    height
                ),
            });
        }

        let mut edges = Vec::with_capacity(cells.len());
        for (position, cell) in cells.iter_mut().enumerate() {
            cell.set_orientation(tessellation.cell_orientation(position, width, height));
            let mut out: Edges = [None; 8];
            for &direction in tessellation.legal_directions() {
                out[direction.index()] = tessellation.neighbor(position, direction, width, height);
            }
            edges.push(out);
        }

        let graph = BoardGraph {
            cells,
            edges,
            width,
            height,
            tessellation,
        };
        debug_assert!(graph.edges_are_symmetric());
        debug!(width, height, %tessellation, "built board graph");
        Ok(graph)
    }

    /// Parses a board from rows of cell characters.
    ///
    /// Rows shorter than the widest one are padded with floor. A trailing
    /// newline is ignored.
    pub fn from_text(text: &str, tessellation: Tessellation) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let height = lines.len();
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        let mut cells = Vec::with_capacity(width * height);
        for line in &lines {
            let mut count = 0;
            for ch in line.chars() {
                cells.push(tessellation.parse_cell_char(ch)?);
                count += 1;
            }
            cells.extend(std::iter::repeat_n(BoardCell::new(), width - count));
        }

        Self::from_cells(width, height, tessellation, cells)
    }

    fn edges_are_symmetric(&self) -> bool {
        self.edges.iter().enumerate().all(|(source, out)| {
            self.tessellation.legal_directions().iter().all(|&direction| {
                match out[direction.index()] {
                    Some(target) => self.edges[target][direction.opposite().index()] == Some(source),
                    None => true,
                }
            })
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn tessellation(&self) -> Tessellation {
        self.tessellation
    }

    pub fn contains(&self, position: Position) -> bool {
        position < self.cells.len()
    }

    pub fn row_column(&self, position: Position) -> (usize, usize) {
        to_row_column(position, self.width)
    }

    pub fn cell(&self, position: Position) -> Result<&BoardCell> {
        self.cells
            .get(position)
            .ok_or(Error::InvalidPosition { position })
    }

    pub fn cell_mut(&mut self, position: Position) -> Result<&mut BoardCell> {
        self.cells
            .get_mut(position)
            .ok_or(Error::InvalidPosition { position })
    }

    pub fn cells(&self) -> impl Iterator<Item = (Position, &BoardCell)> {
        self.cells.iter().enumerate()
    }

    pub fn neighbor(&self, position: Position, direction: Direction) -> Option<Position> {
        self.edges.get(position)?[direction.index()]
    }

    /// All outgoing edges of a cell. Trioban boards may list the same target
    /// under several directions.
    pub fn neighbors(&self, position: Position) -> ArrayVec<(Direction, Position), 8> {
        let mut out = ArrayVec::new();
        if let Some(edges) = self.edges.get(position) {
            for &direction in self.tessellation.legal_directions() {
                if let Some(target) = edges[direction.index()] {
                    out.push((direction, target));
                }
            }
        }
        out
    }

    pub fn wall_positions(&self) -> Vec<Position> {
        self.cells()
            .filter(|(_, cell)| cell.is_wall())
            .map(|(position, _)| position)
            .collect()
    }

    /// Breadth-first flood fill from `from` through cells accepted by `passable`.
    /// The start cell is always part of the result.
    fn reachables(&self, from: Position, passable: impl Fn(&BoardCell) -> bool) -> BTreeSet<Position> {
        let mut visited = BTreeSet::new();
        if !self.contains(from) {
            return visited;
        }

        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(position) = queue.pop_front() {
            for (_, next) in self.neighbors(position) {
                if !visited.contains(&next) && passable(&self.cells[next]) {
                    visited.insert(next);
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// Cells a pusher standing on `from` can walk to without pushing.
    /// Walls, boxes and other pushers block; goals don't.
    pub fn positions_reachable_by_pusher(&self, from: Position) -> BTreeSet<Position> {
        self.reachables(from, BoardCell::can_put_pusher_or_box)
    }

    /// Smallest position in the pusher's reachable area, used to identify the
    /// area independently of where exactly the pusher stands.
    pub fn normalized_pusher_position(&self, from: Position) -> Position {
        self.positions_reachable_by_pusher(from)
            .first()
            .copied()
            .unwrap_or(from)
    }

    /// Cells the box on `box_position` could be pushed to, ignoring where the
    /// pusher currently is. Every push needs the target cell and the cell
    /// behind the box to be free of walls and other boxes.
    pub fn positions_reachable_by_pushes(&self, box_position: Position) -> BTreeSet<Position> {
        let mut visited = BTreeSet::new();
        if !self.contains(box_position) {
            return visited;
        }

        let blocked = |position: Position| {
            let cell = &self.cells[position];
            cell.is_wall() || (cell.has_box() && position != box_position)
        };

        let mut queue = VecDeque::new();
        visited.insert(box_position);
        queue.push_back(box_position);

        while let Some(position) = queue.pop_front() {
            for (direction, target) in self.neighbors(position) {
                let Some(pusher_side) = self.neighbor(position, direction.opposite()) else {
                    continue;
                };
                if blocked(target) || blocked(pusher_side) || visited.contains(&target) {
                    continue;
                }
                visited.insert(target);
                queue.push_back(target);
            }
        }

        visited
    }

    fn bfs_path(
        &self,
        from: Position,
        to: Position,
        passable: impl Fn(&BoardCell) -> bool,
    ) -> Option<Vec<Position>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }

        let mut previous: Vec<Option<Position>> = vec![None; self.cells.len()];
        let mut visited = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();
        visited[from] = true;
        queue.push_back(from);

        while let Some(position) = queue.pop_front() {
            if position == to {
                let mut path = vec![to];
                let mut current = to;
                while let Some(prev) = previous[current] {
                    path.push(prev);
                    current = prev;
                }
                path.reverse();
                return Some(path);
            }
            for (_, next) in self.neighbors(position) {
                if !visited[next] && passable(&self.cells[next]) {
                    visited[next] = true;
                    previous[next] = Some(position);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Shortest path over non-wall cells, ignoring pieces.
    pub fn shortest_path(&self, from: Position, to: Position) -> Option<Vec<Position>> {
        self.bfs_path(from, to, |cell| !cell.is_wall())
    }

    /// Shortest path over every edge, whatever the cells hold.
    pub fn find_jump_path(&self, from: Position, to: Position) -> Option<Vec<Position>> {
        self.bfs_path(from, to, |_| true)
    }

    /// Shortest path a pusher on `from` can walk to `to` without pushing.
    pub fn find_move_path(&self, from: Position, to: Position) -> Option<Vec<Position>> {
        self.bfs_path(from, to, BoardCell::can_put_pusher_or_box)
    }

    pub fn positions_path_to_directions_path(&self, path: &[Position]) -> Result<Vec<Direction>> {
        path.windows(2)
            .map(|pair| {
                self.neighbors(pair[0])
                    .iter()
                    .find(|(_, target)| *target == pair[1])
                    .map(|(direction, _)| *direction)
                    .ok_or_else(|| {
                        Error::illegal_move(format!(
                            "positions {} and {} are not adjacent",
                            pair[0], pair[1]
                        ))
                    })
            })
            .collect()
    }

    /// Follows `directions` from `from`, stopping at the first missing edge.
    pub fn path_destination(&self, from: Position, directions: &[Direction]) -> Result<Position> {
        if !self.contains(from) {
            return Err(Error::InvalidPosition { position: from });
        }
        let mut position = from;
        for &direction in directions {
            match self.neighbor(position, direction) {
                Some(next) => position = next,
                None => break,
            }
        }
        Ok(position)
    }

    /// Flags every non-wall cell connected to a box or a pusher.
    pub fn mark_play_area(&mut self) {
        let mut area = BTreeSet::new();
        for (position, cell) in self.cells() {
            if (cell.has_box() || cell.has_pusher()) && !area.contains(&position) {
                area.extend(self.reachables(position, |c| !c.is_wall()));
            }
        }
        for (position, cell) in self.cells.iter_mut().enumerate() {
            cell.set_in_playable_area(area.contains(&position));
        }
    }
}

impl fmt::Display for BoardGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            let line: String = row
                .iter()
                .map(|cell| self.tessellation.cell_char(cell))
                .collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
