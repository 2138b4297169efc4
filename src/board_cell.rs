use std::fmt;

use crate::error::{Error, Result};
use crate::tessellation::CellOrientation;

pub const WALL: char = '#';
pub const FLOOR: char = ' ';
pub const VISIBLE_FLOORS: [char; 2] = ['-', '_'];
pub const PUSHER: char = '@';
pub const ALT_PUSHERS: [char; 2] = ['p', 'm'];
pub const PUSHER_ON_GOAL: char = '+';
pub const ALT_PUSHERS_ON_GOAL: [char; 2] = ['P', 'M'];
pub const BOX: char = '$';
pub const ALT_BOX: char = 'b';
pub const BOX_ON_GOAL: char = '*';
pub const ALT_BOX_ON_GOAL: char = 'B';
pub const GOAL: char = '.';
pub const ALT_GOAL: char = 'o';

/// Terrain and occupancy of a single board cell.
///
/// A wall never holds anything else. A box and a pusher never share a cell,
/// either of them may stand on a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardCell {
    is_wall: bool,
    has_box: bool,
    has_goal: bool,
    has_pusher: bool,
    orientation: CellOrientation,
    is_in_playable_area: bool,
}

impl BoardCell {
    /// Empty floor.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wall() -> Self {
        BoardCell {
            is_wall: true,
            ..Self::default()
        }
    }

    /// Parses one board character.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - ` `, `-`, `_` = Floor
    /// - `.`, `o` = Goal
    /// - `$`, `b` = Box
    /// - `*`, `B` = Box on goal
    /// - `@`, `p`, `m` = Pusher
    /// - `+`, `P`, `M` = Pusher on goal
    pub fn from_char(ch: char) -> Result<Self> {
        let mut cell = BoardCell::new();
        match ch {
            WALL => cell.set_wall(true),
            FLOOR => {}
            c if VISIBLE_FLOORS.contains(&c) => {}
            GOAL | ALT_GOAL => cell.put_goal(),
            BOX | ALT_BOX => cell.put_box(),
            BOX_ON_GOAL | ALT_BOX_ON_GOAL => {
                cell.put_box();
                cell.put_goal();
            }
            c if c == PUSHER || ALT_PUSHERS.contains(&c) => cell.put_pusher(),
            c if c == PUSHER_ON_GOAL || ALT_PUSHERS_ON_GOAL.contains(&c) => {
                cell.put_pusher();
                cell.put_goal();
            }
            _ => return Err(Error::InvalidCharacter { character: ch }),
        }
        Ok(cell)
    }

    pub fn to_char(&self) -> char {
        if self.is_wall {
            WALL
        } else if self.has_pusher {
            if self.has_goal { PUSHER_ON_GOAL } else { PUSHER }
        } else if self.has_box {
            if self.has_goal { BOX_ON_GOAL } else { BOX }
        } else if self.has_goal {
            GOAL
        } else {
            FLOOR
        }
    }

    pub fn is_wall(&self) -> bool {
        self.is_wall
    }

    /// Turning a cell into a wall drops every piece on it.
    pub fn set_wall(&mut self, is_wall: bool) {
        self.is_wall = is_wall;
        if is_wall {
            self.has_box = false;
            self.has_goal = false;
            self.has_pusher = false;
        }
    }

    pub fn has_box(&self) -> bool {
        self.has_box
    }

    pub fn put_box(&mut self) {
        self.has_box = true;
        self.has_pusher = false;
        self.is_wall = false;
    }

    pub fn remove_box(&mut self) {
        self.has_box = false;
    }

    pub fn has_goal(&self) -> bool {
        self.has_goal
    }

    pub fn put_goal(&mut self) {
        self.has_goal = true;
        self.is_wall = false;
    }

    pub fn remove_goal(&mut self) {
        self.has_goal = false;
    }

    pub fn has_pusher(&self) -> bool {
        self.has_pusher
    }

    pub fn put_pusher(&mut self) {
        self.has_pusher = true;
        self.has_box = false;
        self.is_wall = false;
    }

    pub fn remove_pusher(&mut self) {
        self.has_pusher = false;
    }

    pub fn has_piece(&self) -> bool {
        self.has_box || self.has_goal || self.has_pusher
    }

    pub fn is_empty_floor(&self) -> bool {
        !self.is_wall && !self.has_piece()
    }

    pub fn can_put_pusher_or_box(&self) -> bool {
        !self.is_wall && !self.has_box && !self.has_pusher
    }

    /// Removes every piece, keeping terrain and orientation.
    pub fn clear(&mut self) {
        self.has_box = false;
        self.has_goal = false;
        self.has_pusher = false;
    }

    pub fn orientation(&self) -> CellOrientation {
        self.orientation
    }

    pub(crate) fn set_orientation(&mut self, orientation: CellOrientation) {
        self.orientation = orientation;
    }

    pub fn is_in_playable_area(&self) -> bool {
        self.is_in_playable_area
    }

    pub(crate) fn set_in_playable_area(&mut self, value: bool) {
        self.is_in_playable_area = value;
    }
}

impl fmt::Display for BoardCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_characters() {
        assert!(BoardCell::from_char('#').unwrap().is_wall());
        assert!(BoardCell::from_char(' ').unwrap().is_empty_floor());
        assert!(BoardCell::from_char('-').unwrap().is_empty_floor());
        assert!(BoardCell::from_char('_').unwrap().is_empty_floor());

        let cell = BoardCell::from_char('*').unwrap();
        assert!(cell.has_box() && cell.has_goal());

        let cell = BoardCell::from_char('+').unwrap();
        assert!(cell.has_pusher() && cell.has_goal());

        let cell = BoardCell::from_char('M').unwrap();
        assert!(cell.has_pusher() && cell.has_goal());

        assert!(BoardCell::from_char('b').unwrap().has_box());
        assert!(BoardCell::from_char('o').unwrap().has_goal());
        assert!(BoardCell::from_char('p').unwrap().has_pusher());

        assert_eq!(
            BoardCell::from_char('x'),
            Err(Error::InvalidCharacter { character: 'x' })
        );
    }

    #[test]
    fn test_render_uses_primary_characters() {
        for (input, output) in [
            ('#', '#'),
            ('_', ' '),
            ('o', '.'),
            ('b', '$'),
            ('B', '*'),
            ('m', '@'),
            ('P', '+'),
        ] {
            assert_eq!(BoardCell::from_char(input).unwrap().to_char(), output);
        }
    }

    #[test]
    fn test_wall_clears_pieces() {
        let mut cell = BoardCell::from_char('*').unwrap();
        cell.set_wall(true);
        assert!(cell.is_wall());
        assert!(!cell.has_box());
        assert!(!cell.has_goal());
        assert!(!cell.can_put_pusher_or_box());
    }

    #[test]
    fn test_box_and_pusher_exclusive() {
        let mut cell = BoardCell::new();
        cell.put_goal();
        cell.put_box();
        cell.put_pusher();
        assert!(cell.has_pusher());
        assert!(!cell.has_box());
        assert!(cell.has_goal());
        assert_eq!(cell.to_char(), '+');

        cell.put_box();
        assert!(!cell.has_pusher());
        assert_eq!(cell.to_char(), '*');
    }

    #[test]
    fn test_goal_does_not_block() {
        let mut cell = BoardCell::new();
        cell.put_goal();
        assert!(cell.can_put_pusher_or_box());
        assert!(!cell.is_empty_floor());
    }
}
