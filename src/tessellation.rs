use std::fmt;

use crate::board_cell::BoardCell;
use crate::error::{Error, Result};
use crate::pusher_step::PusherStep;

/// Packed cell index, `row * width + column`.
pub type Position = usize;

/// Packs a `(row, column)` pair into a [`Position`].
pub fn to_position(row: usize, column: usize, width: usize) -> Position {
    row * width + column
}

/// Unpacks a [`Position`] into its `(row, column)` pair.
pub fn to_row_column(position: Position, width: usize) -> (usize, usize) {
    if width == 0 {
        return (0, 0);
    }
    (position / width, position % width)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    NorthEast,
    Right,
    SouthEast,
    Down,
    SouthWest,
    Left,
    NorthWest,
}

pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::Up,
    Direction::NorthEast,
    Direction::Right,
    Direction::SouthEast,
    Direction::Down,
    Direction::SouthWest,
    Direction::Left,
    Direction::NorthWest,
];

impl Direction {
    pub fn index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::NorthEast => 1,
            Direction::Right => 2,
            Direction::SouthEast => 3,
            Direction::Down => 4,
            Direction::SouthWest => 5,
            Direction::Left => 6,
            Direction::NorthWest => 7,
        }
    }

    pub fn from_index(idx: usize) -> Direction {
        ALL_DIRECTIONS[idx % ALL_DIRECTIONS.len()]
    }

    /// Directions are laid out clockwise, so the opposite is half a turn away.
    pub fn opposite(&self) -> Direction {
        Direction::from_index(self.index() + 4)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::NorthEast => write!(f, "NorthEast"),
            Direction::Right => write!(f, "Right"),
            Direction::SouthEast => write!(f, "SouthEast"),
            Direction::Down => write!(f, "Down"),
            Direction::SouthWest => write!(f, "SouthWest"),
            Direction::Left => write!(f, "Left"),
            Direction::NorthWest => write!(f, "NorthWest"),
        }
    }
}

/// Shape tag of a cell. Only Trioban uses it to gate movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellOrientation {
    #[default]
    Default,
    TriangleDown,
    Octagon,
}

const SOKOBAN_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

const HEXOBAN_DIRECTIONS: [Direction; 6] = [
    Direction::Left,
    Direction::Right,
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

const TRIANGLE_DOWN_DIRECTIONS: [Direction; 7] = [
    Direction::Up,
    Direction::NorthEast,
    Direction::Right,
    Direction::SouthEast,
    Direction::SouthWest,
    Direction::Left,
    Direction::NorthWest,
];

const TRIANGLE_UP_DIRECTIONS: [Direction; 7] = [
    Direction::NorthEast,
    Direction::Right,
    Direction::SouthEast,
    Direction::Down,
    Direction::SouthWest,
    Direction::Left,
    Direction::NorthWest,
];

const SOKOBAN_STEP_CHARS: [(char, Direction); 4] = [
    ('l', Direction::Left),
    ('u', Direction::Up),
    ('r', Direction::Right),
    ('d', Direction::Down),
];

const HEXOBAN_STEP_CHARS: [(char, Direction); 6] = [
    ('l', Direction::Left),
    ('r', Direction::Right),
    ('u', Direction::NorthWest),
    ('d', Direction::SouthEast),
    ('n', Direction::NorthEast),
    ('s', Direction::SouthWest),
];

// Up and Down only exist between vertically stacked triangles. They take the
// two step letters the six sloped directions leave free.
const TRIOBAN_STEP_CHARS: [(char, Direction); 8] = [
    ('l', Direction::Left),
    ('r', Direction::Right),
    ('n', Direction::NorthEast),
    ('u', Direction::NorthWest),
    ('d', Direction::SouthEast),
    ('s', Direction::SouthWest),
    ('w', Direction::Up),
    ('e', Direction::Down),
];

const OCTOBAN_STEP_CHARS: [(char, Direction); 8] = [
    ('l', Direction::Left),
    ('u', Direction::Up),
    ('r', Direction::Right),
    ('d', Direction::Down),
    ('w', Direction::NorthWest),
    ('e', Direction::SouthEast),
    ('n', Direction::NorthEast),
    ('s', Direction::SouthWest),
];

/// Board geometry. Decides the direction vocabulary, cell adjacency and the
/// text alphabets used for cells and pusher steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tessellation {
    #[default]
    Sokoban,
    /// Hexagonal cells, odd rows shifted half a cell to the right.
    Hexoban,
    /// Alternating up and down triangles.
    Trioban,
    /// Octagons and squares, movable in all eight directions.
    Octoban,
}

impl Tessellation {
    pub fn legal_directions(&self) -> &'static [Direction] {
        match self {
            Tessellation::Sokoban => &SOKOBAN_DIRECTIONS,
            Tessellation::Hexoban => &HEXOBAN_DIRECTIONS,
            Tessellation::Trioban | Tessellation::Octoban => &ALL_DIRECTIONS,
        }
    }

    /// Directions usable when leaving a cell with the given orientation.
    pub fn legal_directions_for(&self, orientation: CellOrientation) -> &'static [Direction] {
        match (self, orientation) {
            (Tessellation::Trioban, CellOrientation::TriangleDown) => &TRIANGLE_DOWN_DIRECTIONS,
            (Tessellation::Trioban, _) => &TRIANGLE_UP_DIRECTIONS,
            _ => self.legal_directions(),
        }
    }

    pub fn is_legal_direction(&self, direction: Direction, orientation: CellOrientation) -> bool {
        self.legal_directions_for(orientation).contains(&direction)
    }

    pub fn cell_orientation(&self, position: Position, width: usize, height: usize) -> CellOrientation {
        if position >= width * height {
            return CellOrientation::Default;
        }
        let (row, column) = to_row_column(position, width);
        let checkered = (column + row % 2) % 2 == 0;
        match self {
            Tessellation::Trioban if checkered => CellOrientation::TriangleDown,
            Tessellation::Octoban if checkered => CellOrientation::Octagon,
            _ => CellOrientation::Default,
        }
    }

    /// Cell reached by leaving `position` in `direction`, if the direction is
    /// usable there and the result stays on the board.
    pub fn neighbor(
        &self,
        position: Position,
        direction: Direction,
        width: usize,
        height: usize,
    ) -> Option<Position> {
        if position >= width * height {
            return None;
        }
        let orientation = self.cell_orientation(position, width, height);
        if !self.is_legal_direction(direction, orientation) {
            return None;
        }

        let (row, column) = to_row_column(position, width);
        let (dr, dc) = self.delta(row, orientation, direction);
        let new_row = row as i64 + dr;
        let new_column = column as i64 + dc;

        if new_row >= 0 && new_column >= 0 && new_row < height as i64 && new_column < width as i64 {
            Some(to_position(new_row as usize, new_column as usize, width))
        } else {
            None
        }
    }

    /// Row and column offsets for a direction already known to be legal.
    fn delta(&self, row: usize, orientation: CellOrientation, direction: Direction) -> (i64, i64) {
        use Direction::*;

        match self {
            Tessellation::Sokoban | Tessellation::Octoban => match direction {
                Up => (-1, 0),
                NorthEast => (-1, 1),
                Right => (0, 1),
                SouthEast => (1, 1),
                Down => (1, 0),
                SouthWest => (1, -1),
                Left => (0, -1),
                NorthWest => (-1, -1),
            },
            Tessellation::Hexoban => {
                let east_shift = (row % 2) as i64;
                let west_shift = ((row + 1) % 2) as i64;
                match direction {
                    Left => (0, -1),
                    Right => (0, 1),
                    NorthEast => (-1, east_shift),
                    NorthWest => (-1, -west_shift),
                    SouthEast => (1, east_shift),
                    SouthWest => (1, -west_shift),
                    Up | Down => (0, 0),
                }
            }
            Tessellation::Trioban => match (orientation, direction) {
                (_, Left) => (0, -1),
                (_, Right) => (0, 1),
                (CellOrientation::TriangleDown, Up | NorthEast | NorthWest) => (-1, 0),
                (CellOrientation::TriangleDown, SouthEast) => (0, 1),
                (CellOrientation::TriangleDown, SouthWest) => (0, -1),
                (CellOrientation::TriangleDown, Down) => (0, 0),
                (_, Down | SouthEast | SouthWest) => (1, 0),
                (_, NorthEast) => (0, 1),
                (_, NorthWest) => (0, -1),
                (_, Up) => (0, 0),
            },
        }
    }

    pub fn parse_cell_char(&self, ch: char) -> Result<BoardCell> {
        BoardCell::from_char(ch)
    }

    pub fn cell_char(&self, cell: &BoardCell) -> char {
        cell.to_char()
    }

    fn step_chars(&self) -> &'static [(char, Direction)] {
        match self {
            Tessellation::Sokoban => &SOKOBAN_STEP_CHARS,
            Tessellation::Hexoban => &HEXOBAN_STEP_CHARS,
            Tessellation::Trioban => &TRIOBAN_STEP_CHARS,
            Tessellation::Octoban => &OCTOBAN_STEP_CHARS,
        }
    }

    /// Lowercase letters are moves, uppercase letters are pushes.
    pub fn char_to_pusher_step(&self, ch: char) -> Result<PusherStep> {
        let lower = ch.to_ascii_lowercase();
        let direction = self
            .step_chars()
            .iter()
            .find(|(c, _)| *c == lower)
            .map(|(_, d)| *d)
            .ok_or(Error::InvalidCharacter { character: ch })?;

        let step = PusherStep::new(direction);
        if ch.is_ascii_uppercase() {
            Ok(step.with_push(true))
        } else {
            Ok(step)
        }
    }

    pub fn pusher_step_to_char(&self, step: &PusherStep) -> Result<char> {
        let ch = self
            .step_chars()
            .iter()
            .find(|(_, d)| *d == step.direction())
            .map(|(c, _)| *c)
            .ok_or_else(|| {
                Error::illegal_move(format!(
                    "{} is not a {} direction",
                    step.direction(),
                    self
                ))
            })?;

        if step.is_push() {
            Ok(ch.to_ascii_uppercase())
        } else {
            Ok(ch)
        }
    }
}

impl fmt::Display for Tessellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tessellation::Sokoban => write!(f, "Sokoban"),
            Tessellation::Hexoban => write!(f, "Hexoban"),
            Tessellation::Trioban => write!(f, "Trioban"),
            Tessellation::Octoban => write!(f, "Octoban"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TESSELLATIONS: [Tessellation; 4] = [
        Tessellation::Sokoban,
        Tessellation::Hexoban,
        Tessellation::Trioban,
        Tessellation::Octoban,
    ];

    #[test]
    fn test_opposite_is_involution() {
        for d in ALL_DIRECTIONS {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::NorthEast.opposite(), Direction::SouthWest);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }

    #[test]
    fn test_position_packing() {
        assert_eq!(to_position(2, 3, 5), 13);
        assert_eq!(to_row_column(13, 5), (2, 3));
    }

    #[test]
    fn test_sokoban_neighbors() {
        let t = Tessellation::Sokoban;
        // 3x3 board, center is 4
        assert_eq!(t.neighbor(4, Direction::Up, 3, 3), Some(1));
        assert_eq!(t.neighbor(4, Direction::Down, 3, 3), Some(7));
        assert_eq!(t.neighbor(4, Direction::Left, 3, 3), Some(3));
        assert_eq!(t.neighbor(4, Direction::Right, 3, 3), Some(5));
        assert_eq!(t.neighbor(4, Direction::NorthEast, 3, 3), None);
        assert_eq!(t.neighbor(0, Direction::Up, 3, 3), None);
        assert_eq!(t.neighbor(2, Direction::Right, 3, 3), None);
        assert_eq!(t.neighbor(9, Direction::Up, 3, 3), None);
    }

    #[test]
    fn test_hexoban_neighbors() {
        let t = Tessellation::Hexoban;
        let w = 5;
        // even row 2, column 2
        let even = to_position(2, 2, w);
        assert_eq!(t.neighbor(even, Direction::NorthEast, w, 5), Some(to_position(1, 2, w)));
        assert_eq!(t.neighbor(even, Direction::NorthWest, w, 5), Some(to_position(1, 1, w)));
        assert_eq!(t.neighbor(even, Direction::SouthEast, w, 5), Some(to_position(3, 2, w)));
        assert_eq!(t.neighbor(even, Direction::SouthWest, w, 5), Some(to_position(3, 1, w)));
        // odd row 1, column 2
        let odd = to_position(1, 2, w);
        assert_eq!(t.neighbor(odd, Direction::NorthEast, w, 5), Some(to_position(0, 3, w)));
        assert_eq!(t.neighbor(odd, Direction::NorthWest, w, 5), Some(to_position(0, 2, w)));
        assert_eq!(t.neighbor(odd, Direction::Up, w, 5), None);
    }

    #[test]
    fn test_trioban_orientation_gating() {
        let t = Tessellation::Trioban;
        let w = 4;
        let down = to_position(1, 1, w);
        let up = to_position(1, 2, w);
        assert_eq!(t.cell_orientation(down, w, 4), CellOrientation::TriangleDown);
        assert_eq!(t.cell_orientation(up, w, 4), CellOrientation::Default);

        assert_eq!(t.neighbor(down, Direction::Down, w, 4), None);
        assert_eq!(t.neighbor(down, Direction::Up, w, 4), Some(to_position(0, 1, w)));
        assert_eq!(t.neighbor(up, Direction::Up, w, 4), None);
        assert_eq!(t.neighbor(up, Direction::Down, w, 4), Some(to_position(2, 2, w)));
        assert_eq!(t.neighbor(up, Direction::NorthEast, w, 4), Some(to_position(1, 3, w)));
    }

    #[test]
    fn test_neighbor_symmetry_all_tessellations() {
        let (w, h) = (7, 6);
        for t in TESSELLATIONS {
            for position in 0..w * h {
                for &d in t.legal_directions() {
                    if let Some(n) = t.neighbor(position, d, w, h) {
                        assert_eq!(
                            t.neighbor(n, d.opposite(), w, h),
                            Some(position),
                            "{} {} from {}",
                            t,
                            d,
                            position
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_step_chars() {
        let t = Tessellation::Sokoban;
        let step = t.char_to_pusher_step('R').unwrap();
        assert_eq!(step.direction(), Direction::Right);
        assert!(step.is_push());
        assert_eq!(t.pusher_step_to_char(&step).unwrap(), 'R');
        assert!(t.char_to_pusher_step('n').is_err());

        let t = Tessellation::Hexoban;
        assert_eq!(t.char_to_pusher_step('u').unwrap().direction(), Direction::NorthWest);
        assert!(
            t.pusher_step_to_char(&PusherStep::new(Direction::Up))
                .is_err()
        );

        let t = Tessellation::Octoban;
        assert_eq!(t.char_to_pusher_step('e').unwrap().direction(), Direction::SouthEast);
    }

    #[test]
    fn test_trioban_step_chars() {
        let t = Tessellation::Trioban;
        let expected = [
            ('l', Direction::Left),
            ('r', Direction::Right),
            ('n', Direction::NorthEast),
            ('u', Direction::NorthWest),
            ('d', Direction::SouthEast),
            ('s', Direction::SouthWest),
            ('w', Direction::Up),
            ('e', Direction::Down),
        ];
        for (ch, direction) in expected {
            let step = t.char_to_pusher_step(ch).unwrap();
            assert_eq!(step.direction(), direction, "{}", ch);
            assert!(!step.is_push());
            assert_eq!(t.pusher_step_to_char(&step).unwrap(), ch);

            let push = t.char_to_pusher_step(ch.to_ascii_uppercase()).unwrap();
            assert!(push.is_push());
            assert_eq!(t.pusher_step_to_char(&push).unwrap(), ch.to_ascii_uppercase());
        }
        assert!(t.char_to_pusher_step('x').is_err());
    }
}
