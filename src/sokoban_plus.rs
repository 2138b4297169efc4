//! Sokoban+ overlay: boxes and goals tagged with plus ids, where a box only
//! counts as solved on a goal carrying a compatible id.

use tracing::debug;

use crate::board_manager::PieceKind;
use crate::error::{Error, Result};
use crate::matching::perfect_matching;
use crate::tessellation::Position;

pub type PlusId = u32;

/// Matches any counterpart.
pub const DEFAULT_PLUS_ID: PlusId = 0;

/// Older puzzle files wrote the default id as 99.
pub const LEGACY_DEFAULT_PLUS_ID: PlusId = 99;

/// Two plus ids may share a cell when they are equal or either one is the
/// default id.
pub fn is_compatible(box_plus_id: PlusId, goal_plus_id: PlusId) -> bool {
    box_plus_id == goal_plus_id || box_plus_id == DEFAULT_PLUS_ID || goal_plus_id == DEFAULT_PLUS_ID
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SokobanPlus {
    pieces_count: usize,
    boxorder: String,
    goalorder: String,
    box_plus_ids: Vec<PlusId>,
    goal_plus_ids: Vec<PlusId>,
    is_enabled: bool,
}

impl SokobanPlus {
    /// Stores whitespace separated plus id lists for `pieces_count` boxes and
    /// as many goals. Nothing is parsed until [`SokobanPlus::validate`] or
    /// [`SokobanPlus::enable`].
    pub fn new(pieces_count: usize, boxorder: impl Into<String>, goalorder: impl Into<String>) -> Self {
        SokobanPlus {
            pieces_count,
            boxorder: boxorder.into(),
            goalorder: goalorder.into(),
            ..Self::default()
        }
    }

    pub fn from_ids(box_plus_ids: &[PlusId], goal_plus_ids: &[PlusId]) -> Self {
        let render = |ids: &[PlusId]| {
            ids.iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        Self::new(box_plus_ids.len(), render(box_plus_ids), render(goal_plus_ids))
    }

    pub fn pieces_count(&self) -> usize {
        self.pieces_count
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Parses one order string. Trailing default ids are optional.
    fn parse_order(&self, order: &str) -> Result<Vec<PlusId>> {
        let mut ids = order
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<PlusId>()
                    .map_err(|_| Error::sokoban_plus(format!("can't parse plus id {:?}", token)))
            })
            .collect::<Result<Vec<_>>>()?;

        if self.pieces_count < LEGACY_DEFAULT_PLUS_ID as usize {
            for id in ids.iter_mut().filter(|id| **id == LEGACY_DEFAULT_PLUS_ID) {
                *id = DEFAULT_PLUS_ID;
            }
        }

        while ids.last() == Some(&DEFAULT_PLUS_ID) {
            ids.pop();
        }

        if ids.len() > self.pieces_count {
            return Err(Error::sokoban_plus(format!(
                "{} plus ids given for {} pieces",
                ids.len(),
                self.pieces_count
            )));
        }

        ids.resize(self.pieces_count, DEFAULT_PLUS_ID);
        Ok(ids)
    }

    fn parsed(&self) -> Result<(Vec<PlusId>, Vec<PlusId>)> {
        let boxes = self.parse_order(&self.boxorder)?;
        let goals = self.parse_order(&self.goalorder)?;

        if perfect_matching(boxes.len(), goals.len(), |b, g| is_compatible(boxes[b], goals[g])).is_none() {
            return Err(Error::sokoban_plus(format!(
                "box plus ids [{}] can't be paired with goal plus ids [{}]",
                self.boxorder.trim(),
                self.goalorder.trim()
            )));
        }

        Ok((boxes, goals))
    }

    /// Checks that both orders parse and that every box plus id can be paired
    /// with a distinct goal plus id.
    pub fn validate(&self) -> Result<()> {
        self.parsed().map(|_| ())
    }

    pub fn enable(&mut self) -> Result<()> {
        let (boxes, goals) = self.parsed()?;
        self.box_plus_ids = boxes;
        self.goal_plus_ids = goals;
        self.is_enabled = true;
        debug!(pieces = self.pieces_count, "enabled Sokoban+");
        Ok(())
    }

    pub fn disable(&mut self) {
        self.is_enabled = false;
    }

    fn plus_id(&self, kind: PieceKind, ids: &[PlusId], id: usize) -> Result<PlusId> {
        if id >= self.pieces_count {
            return Err(Error::PieceNotFound { kind, id });
        }
        if !self.is_enabled {
            return Ok(DEFAULT_PLUS_ID);
        }
        Ok(ids[id])
    }

    pub fn box_plus_id(&self, id: usize) -> Result<PlusId> {
        self.plus_id(PieceKind::Box, &self.box_plus_ids, id)
    }

    pub fn goal_plus_id(&self, id: usize) -> Result<PlusId> {
        self.plus_id(PieceKind::Goal, &self.goal_plus_ids, id)
    }

    /// Plus ids of all boxes in id order; all default while disabled.
    pub fn box_plus_ids(&self) -> Vec<PlusId> {
        if self.is_enabled {
            self.box_plus_ids.clone()
        } else {
            vec![DEFAULT_PLUS_ID; self.pieces_count]
        }
    }

    pub fn goal_plus_ids(&self) -> Vec<PlusId> {
        if self.is_enabled {
            self.goal_plus_ids.clone()
        } else {
            vec![DEFAULT_PLUS_ID; self.pieces_count]
        }
    }

    /// True when every box can be paired with a distinct goal on its own cell
    /// and with a compatible plus id.
    ///
    /// Both slices hold `(id, position)` pairs.
    pub fn is_valid_solution(&self, boxes: &[(usize, Position)], goals: &[(usize, Position)]) -> bool {
        if boxes.len() != goals.len() {
            return false;
        }

        let plus_id = |ids: &[PlusId], id: usize| {
            if self.is_enabled {
                ids.get(id).copied().unwrap_or(DEFAULT_PLUS_ID)
            } else {
                DEFAULT_PLUS_ID
            }
        };

        perfect_matching(boxes.len(), goals.len(), |b, g| {
            let (box_id, box_position) = boxes[b];
            let (goal_id, goal_position) = goals[g];
            box_position == goal_position
                && is_compatible(
                    plus_id(&self.box_plus_ids, box_id),
                    plus_id(&self.goal_plus_ids, goal_id),
                )
        })
        .is_some()
    }

    fn render(ids: &[PlusId]) -> String {
        let significant = ids
            .iter()
            .rposition(|id| *id != DEFAULT_PLUS_ID)
            .map_or(0, |last| last + 1);
        ids[..significant]
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalized box order while enabled, the stored string otherwise.
    pub fn boxorder(&self) -> String {
        if self.is_enabled {
            Self::render(&self.box_plus_ids)
        } else {
            self.boxorder.clone()
        }
    }

    pub fn goalorder(&self) -> String {
        if self.is_enabled {
            Self::render(&self.goal_plus_ids)
        } else {
            self.goalorder.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_ids_fail_validation() {
        let plus = SokobanPlus::from_ids(&[1, 2], &[1, 1]);
        assert!(matches!(plus.validate(), Err(Error::SokobanPlusData { .. })));
    }

    #[test]
    fn test_default_id_matches_anything() {
        let plus = SokobanPlus::from_ids(&[1, 2], &[0, 1]);
        assert!(plus.validate().is_ok());

        let plus = SokobanPlus::from_ids(&[1, 2, 2], &[2, 1, 2]);
        assert!(plus.validate().is_ok());
    }

    #[test]
    fn test_parse_orders() {
        let mut plus = SokobanPlus::new(4, "1 99 2 0", "2 1");
        plus.enable().unwrap();
        assert_eq!(plus.box_plus_ids(), vec![1, 0, 2, 0]);
        assert_eq!(plus.goal_plus_ids(), vec![2, 1, 0, 0]);
        assert_eq!(plus.boxorder(), "1 0 2");
        assert_eq!(plus.goalorder(), "2 1");
    }

    #[test]
    fn test_legacy_id_kept_for_large_puzzles() {
        let plus = SokobanPlus::new(100, "99", "99");
        let (boxes, goals) = plus.parsed().unwrap();
        assert_eq!(boxes[0], 99);
        assert_eq!(goals[0], 99);
    }

    #[test]
    fn test_parse_errors() {
        let plus = SokobanPlus::new(2, "1 x", "1");
        assert!(plus.validate().is_err());

        let plus = SokobanPlus::new(1, "1 2", "1 2");
        assert!(plus.validate().is_err());
    }

    #[test]
    fn test_enable_requires_valid_data() {
        let mut plus = SokobanPlus::from_ids(&[3], &[4]);
        assert!(plus.enable().is_err());
        assert!(!plus.is_enabled());
    }

    #[test]
    fn test_disabled_ids_are_default() {
        let mut plus = SokobanPlus::from_ids(&[1, 2], &[2, 1]);
        assert_eq!(plus.box_plus_id(1).unwrap(), DEFAULT_PLUS_ID);
        plus.enable().unwrap();
        assert_eq!(plus.box_plus_id(1).unwrap(), 2);
        assert_eq!(plus.goal_plus_id(0).unwrap(), 2);
        assert!(matches!(
            plus.box_plus_id(2),
            Err(Error::PieceNotFound { kind: PieceKind::Box, id: 2 })
        ));
        plus.disable();
        assert_eq!(plus.goal_plus_id(0).unwrap(), DEFAULT_PLUS_ID);
        assert_eq!(plus.boxorder(), "1 2");
    }

    #[test]
    fn test_is_valid_solution() {
        let mut plus = SokobanPlus::from_ids(&[1, 2], &[2, 1]);
        // box 0 on goal 1, box 1 on goal 0
        let crossed_boxes = [(0, 10), (1, 20)];
        let crossed_goals = [(0, 20), (1, 10)];
        // box 0 on goal 0, box 1 on goal 1
        let straight_goals = [(0, 10), (1, 20)];

        assert!(plus.is_valid_solution(&crossed_boxes, &crossed_goals));
        assert!(plus.is_valid_solution(&crossed_boxes, &straight_goals));

        plus.enable().unwrap();
        assert!(plus.is_valid_solution(&crossed_boxes, &crossed_goals));
        assert!(!plus.is_valid_solution(&crossed_boxes, &straight_goals));

        // one box off its goal
        assert!(!plus.is_valid_solution(&[(0, 10), (1, 30)], &crossed_goals));
    }
}
