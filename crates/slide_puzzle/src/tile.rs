use std::fmt::{self, Display, Formatter};

use bevy::prelude::*;

use crate::direction::Direction;

/// Stable identity of a puzzle piece, as handed out by the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

impl Display for TileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset from `self` to `other`, `x` being columns and `y` rows.
    pub fn offset_to(self, other: Self) -> IVec2 {
        IVec2::new(
            other.col as i32 - self.col as i32,
            other.row as i32 - self.row as i32,
        )
    }

    /// The neighbouring cell in `dir`, if it lies on a `size`x`size` board.
    pub fn step(self, dir: Direction, size: usize) -> Option<Self> {
        let offset = dir.offset();
        let row = self.row.checked_add_signed(offset.y as isize)?;
        let col = self.col.checked_add_signed(offset.x as isize)?;
        (row < size && col < size).then_some(Self { row, col })
    }
}

impl Display for GridPos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A tile as the level declares it: who it is and where it belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpec {
    pub id: TileId,
    pub correct: GridPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    id: TileId,
    correct: GridPos,
    current: GridPos,
    is_hole: bool,
}

impl Tile {
    /// Tiles start out at their correct position.
    pub const fn new(spec: TileSpec) -> Self {
        Self {
            id: spec.id,
            correct: spec.correct,
            current: spec.correct,
            is_hole: false,
        }
    }

    pub const fn id(&self) -> TileId {
        self.id
    }

    pub const fn correct(&self) -> GridPos {
        self.correct
    }

    pub const fn current(&self) -> GridPos {
        self.current
    }

    pub const fn is_hole(&self) -> bool {
        self.is_hole
    }

    /// The hole never counts against the solution.
    pub fn is_in_place(&self) -> bool {
        self.is_hole || self.current == self.correct
    }

    pub(crate) const fn set_current(&mut self, pos: GridPos) {
        self.current = pos;
    }

    pub(crate) const fn make_hole(&mut self) {
        self.is_hole = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_stays_on_board() {
        let corner = GridPos::new(0, 0);
        assert_eq!(corner.step(Direction::Up, 4), None);
        assert_eq!(corner.step(Direction::Left, 4), None);
        assert_eq!(corner.step(Direction::Right, 4), Some(GridPos::new(0, 1)));
        assert_eq!(corner.step(Direction::Down, 4), Some(GridPos::new(1, 0)));

        let far = GridPos::new(3, 3);
        assert_eq!(far.step(Direction::Down, 4), None);
        assert_eq!(far.step(Direction::Right, 4), None);
    }

    #[test]
    fn offset_uses_columns_for_x() {
        let from = GridPos::new(1, 1);
        assert_eq!(from.offset_to(GridPos::new(1, 3)), IVec2::new(2, 0));
        assert_eq!(from.offset_to(GridPos::new(0, 1)), IVec2::new(0, -1));
    }

    #[test]
    fn hole_is_always_in_place() {
        let mut tile = Tile::new(TileSpec {
            id: TileId(7),
            correct: GridPos::new(1, 2),
        });
        assert!(tile.is_in_place());
        tile.set_current(GridPos::new(0, 0));
        assert!(!tile.is_in_place());
        tile.make_hole();
        assert!(tile.is_in_place());
    }
}
