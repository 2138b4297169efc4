use std::fmt;

use crate::error::{Error, Result};
use crate::tessellation::Direction;

/// One atomic board mutation recorded by the mover.
///
/// `direction` is the way the pusher travelled. For pushes and pulls the box
/// travelled the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PusherStep {
    direction: Direction,
    is_push: bool,
    is_jump: bool,
    is_pusher_selection: bool,
    is_undo: bool,
    pusher_id: Option<usize>,
    moved_box_id: Option<usize>,
}

impl PusherStep {
    /// Plain pusher move.
    pub fn new(direction: Direction) -> Self {
        PusherStep {
            direction,
            is_push: false,
            is_jump: false,
            is_pusher_selection: false,
            is_undo: false,
            pusher_id: None,
            moved_box_id: None,
        }
    }

    /// Builds a step from raw flags, rejecting combinations that can't
    /// describe a single mutation.
    pub fn from_flags(
        direction: Direction,
        is_push: bool,
        is_jump: bool,
        is_pusher_selection: bool,
    ) -> Result<Self> {
        if [is_push, is_jump, is_pusher_selection].iter().filter(|f| **f).count() > 1 {
            return Err(Error::illegal_move(
                "a step is at most one of push, jump or pusher selection",
            ));
        }
        Ok(PusherStep {
            is_push,
            is_jump,
            is_pusher_selection,
            ..PusherStep::new(direction)
        })
    }

    pub fn with_push(self, is_push: bool) -> Self {
        PusherStep {
            is_push,
            is_jump: self.is_jump && !is_push,
            is_pusher_selection: self.is_pusher_selection && !is_push,
            ..self
        }
    }

    pub(crate) fn jump(direction: Direction, pusher_id: usize) -> Self {
        PusherStep {
            is_jump: true,
            pusher_id: Some(pusher_id),
            ..PusherStep::new(direction)
        }
    }

    pub(crate) fn selection(direction: Direction, pusher_id: usize) -> Self {
        PusherStep {
            is_pusher_selection: true,
            pusher_id: Some(pusher_id),
            ..PusherStep::new(direction)
        }
    }

    pub(crate) fn with_pieces(self, pusher_id: usize, moved_box_id: Option<usize>) -> Self {
        PusherStep {
            pusher_id: Some(pusher_id),
            moved_box_id,
            is_push: moved_box_id.is_some(),
            ..self
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_push(&self) -> bool {
        self.is_push
    }

    /// Reverse mode reads pushes as pulls.
    pub fn is_pull(&self) -> bool {
        self.is_push
    }

    pub fn is_push_or_pull(&self) -> bool {
        self.is_push
    }

    pub fn is_move(&self) -> bool {
        !self.is_push && !self.is_jump && !self.is_pusher_selection
    }

    pub fn is_jump(&self) -> bool {
        self.is_jump
    }

    pub fn is_pusher_selection(&self) -> bool {
        self.is_pusher_selection
    }

    pub fn is_undo(&self) -> bool {
        self.is_undo
    }

    pub fn pusher_id(&self) -> Option<usize> {
        self.pusher_id
    }

    pub fn moved_box_id(&self) -> Option<usize> {
        self.moved_box_id
    }

    /// Same mutation played backwards.
    pub fn inverse(&self) -> Self {
        PusherStep {
            direction: self.direction.opposite(),
            is_undo: !self.is_undo,
            ..*self
        }
    }
}

impl fmt::Display for PusherStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_push {
            "push"
        } else if self.is_jump {
            "jump"
        } else if self.is_pusher_selection {
            "select"
        } else {
            "move"
        };
        write!(f, "{} {}", kind, self.direction)?;
        if let Some(id) = self.moved_box_id {
            write!(f, " box #{}", id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_flags_rejected() {
        assert!(PusherStep::from_flags(Direction::Up, true, true, false).is_err());
        assert!(PusherStep::from_flags(Direction::Up, true, false, true).is_err());
        assert!(PusherStep::from_flags(Direction::Up, false, true, true).is_err());

        let step = PusherStep::from_flags(Direction::Up, false, true, false).unwrap();
        assert!(step.is_jump());
        assert!(!step.is_move());
    }

    #[test]
    fn test_inverse() {
        let step = PusherStep::new(Direction::Left).with_pieces(0, Some(2));
        let inverse = step.inverse();
        assert_eq!(inverse.direction(), Direction::Right);
        assert!(inverse.is_push());
        assert!(inverse.is_undo());
        assert_eq!(inverse.moved_box_id(), Some(2));
        assert_eq!(inverse.inverse(), step);
    }

    #[test]
    fn test_kinds() {
        let step = PusherStep::new(Direction::Down);
        assert!(step.is_move());
        assert!(!step.is_push_or_pull());

        let step = step.with_push(true);
        assert!(step.is_push_or_pull());
        assert!(!step.is_move());

        let step = PusherStep::selection(Direction::Up, 1);
        assert!(step.is_pusher_selection());
        assert_eq!(step.pusher_id(), Some(1));
        assert_eq!(step.to_string(), "select Up");
    }

    #[test]
    fn test_display() {
        let step = PusherStep::new(Direction::Right).with_pieces(0, Some(3));
        assert_eq!(step.to_string(), "push Right box #3");
    }
}
