use std::fmt::{self, Display, Formatter};

use bevy::prelude::*;
use bevy::utils::HashMap;

use crate::direction::{Axis, Direction};
use crate::error::PuzzleError;
use crate::tile::{GridPos, Tile, TileId, TileSpec};

/// A resolved move: the tiles that slid and where the hole went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    /// Clicked tile first, tile that was next to the hole last
    pub run: Vec<TileId>,
    /// Direction every tile of the run slid in
    pub direction: Direction,
    pub hole_from: GridPos,
    pub hole_to: GridPos,
}

impl Move {
    pub fn clicked(&self) -> Option<TileId> {
        self.run.first().copied()
    }

    pub fn run_length(&self) -> usize {
        self.run.len()
    }
}

/// Square grid of tiles with a single hole.
///
/// Tiles live in `tiles` and never move there; `cells` maps every cell,
/// row by row, to the index of the tile occupying it.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    tiles: Vec<Tile>,
    cells: Vec<usize>,
    slots: HashMap<TileId, usize>,
    hole: Option<usize>,
}

impl Board {
    pub fn new(size: usize, specs: impl IntoIterator<Item = TileSpec>) -> Result<Self, PuzzleError> {
        if size < 2 {
            return Err(PuzzleError::PuzzleTooSmall(size));
        }

        let tiles: Vec<Tile> = specs.into_iter().map(Tile::new).collect();
        let expected = size * size;
        if tiles.len() != expected {
            return Err(PuzzleError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }

        let mut slots = HashMap::default();
        let mut cells: Vec<Option<usize>> = vec![None; expected];
        for (slot, tile) in tiles.iter().enumerate() {
            if slots.insert(tile.id(), slot).is_some() {
                return Err(PuzzleError::DuplicateTile(tile.id()));
            }

            let pos = tile.correct();
            if pos.row >= size || pos.col >= size {
                return Err(PuzzleError::PositionOutOfBounds {
                    tile: tile.id(),
                    pos,
                    size,
                });
            }

            let cell = cells.get_mut(pos.row * size + pos.col).ok_or_else(|| {
                PuzzleError::InvariantViolation(format!("no cell for {pos} on a {size}x{size} board"))
            })?;
            if let Some(other) = *cell {
                return Err(PuzzleError::DuplicatePosition {
                    first: tiles.get(other).map_or(tile.id(), Tile::id),
                    second: tile.id(),
                    pos,
                });
            }
            *cell = Some(slot);
        }

        // N² tiles on N² distinct cells leave no cell empty.
        let cells = cells
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PuzzleError::InvariantViolation("empty cell after setup".into()))?;

        Ok(Self {
            size,
            tiles,
            cells,
            slots,
            hole: None,
        })
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.slots.get(&id).and_then(|&slot| self.tiles.get(slot))
    }

    pub fn tile_at(&self, pos: GridPos) -> Option<&Tile> {
        self.cell_index(pos)
            .and_then(|index| self.cells.get(index))
            .and_then(|&slot| self.tiles.get(slot))
    }

    pub fn hole(&self) -> Option<&Tile> {
        self.hole.and_then(|slot| self.tiles.get(slot))
    }

    /// Tiles row by row, as they currently sit on the board.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().filter_map(|&slot| self.tiles.get(slot))
    }

    /// Promotes `id` to be the hole. Happens once per game.
    pub fn select_hole(&mut self, id: TileId) -> Result<(), PuzzleError> {
        if let Some(hole) = self.hole() {
            return Err(PuzzleError::HoleAlreadySelected(hole.id()));
        }
        let slot = *self.slots.get(&id).ok_or(PuzzleError::UnknownTile(id))?;
        self.tiles
            .get_mut(slot)
            .ok_or_else(|| PuzzleError::InvariantViolation(format!("tile {id} has no slot")))?
            .make_hole();
        self.hole = Some(slot);
        Ok(())
    }

    /// Whether the tile shares the hole's row or column. `false` while
    /// there is no hole or for an unknown tile.
    pub fn is_aligned(&self, id: TileId) -> bool {
        let (Some(tile), Some(hole)) = (self.tile(id), self.hole()) else {
            return false;
        };
        tile.current().row == hole.current().row || tile.current().col == hole.current().col
    }

    /// Tiles sharing the hole's row or column, hole excluded.
    pub fn line_through_hole(&self, axis: Axis) -> Vec<&Tile> {
        let Some(hole) = self.hole() else {
            return Vec::new();
        };
        let center = hole.current();
        (0..self.size)
            .map(|i| match axis {
                Axis::Row => GridPos::new(center.row, i),
                Axis::Column => GridPos::new(i, center.col),
            })
            .filter(|&pos| pos != center)
            .filter_map(|pos| self.tile_at(pos))
            .collect()
    }

    /// Computes the run a click on `id` would slide without touching the board.
    pub fn plan_move(&self, id: TileId) -> Result<Move, PuzzleError> {
        let hole = self.hole().ok_or(PuzzleError::NoHole)?;
        let tile = self.tile(id).ok_or(PuzzleError::UnknownTile(id))?;
        if tile.is_hole() {
            return Err(PuzzleError::ClickedHole(id));
        }

        let (from, to) = (tile.current(), hole.current());
        let delta = from.offset_to(to);
        let Some(direction) = Direction::from_offset(delta) else {
            return Err(PuzzleError::Misaligned {
                tile: id,
                pos: from,
                hole: to,
            });
        };

        let run_length = (delta.x.unsigned_abs() + delta.y.unsigned_abs()) as usize;
        let mut run = Vec::with_capacity(run_length);
        let mut pos = from;
        for _ in 0..run_length {
            let occupant = self.tile_at(pos).ok_or_else(|| {
                PuzzleError::InvariantViolation(format!("no tile at {pos} in run from {from}"))
            })?;
            if occupant.is_hole() {
                return Err(PuzzleError::InvariantViolation(format!(
                    "hole found at {pos} inside run from {from}"
                )));
            }
            run.push(occupant.id());
            pos = pos.step(direction, self.size).ok_or_else(|| {
                PuzzleError::InvariantViolation(format!(
                    "run from {from} left the board at {pos} heading {direction}"
                ))
            })?;
        }
        if pos != to {
            return Err(PuzzleError::InvariantViolation(format!(
                "run from {from} ended at {pos} but the hole is at {to}"
            )));
        }

        Ok(Move {
            run,
            direction,
            hole_from: to,
            hole_to: from,
        })
    }

    /// Slides the run between `id` and the hole one cell toward the hole.
    /// Either the whole run moves or the board is left untouched.
    pub fn resolve_move(&mut self, id: TileId) -> Result<Move, PuzzleError> {
        let mv = self.plan_move(id)?;
        self.apply(&mv)?;
        debug_assert_eq!(self.check_invariants(), Ok(()));
        Ok(mv)
    }

    /// Resolves every placement before writing any, so a lookup failure
    /// leaves the board as it was.
    fn apply(&mut self, mv: &Move) -> Result<(), PuzzleError> {
        let hole_slot = self
            .cell_index(mv.hole_from)
            .and_then(|index| self.cells.get(index).copied())
            .ok_or_else(|| PuzzleError::InvariantViolation(format!("no cell at {}", mv.hole_from)))?;

        let mut placements = Vec::with_capacity(mv.run.len() + 1);
        let mut target = mv.hole_from;
        for id in mv.run.iter().rev() {
            let tile = self.tile(*id).ok_or(PuzzleError::UnknownTile(*id))?;
            let slot = *self.slots.get(id).ok_or(PuzzleError::UnknownTile(*id))?;
            placements.push((slot, target));
            target = tile.current();
        }
        placements.push((hole_slot, target));

        for &(_, pos) in &placements {
            self.cell_index(pos).ok_or_else(|| {
                PuzzleError::InvariantViolation(format!("move lands outside the board at {pos}"))
            })?;
        }
        for (slot, pos) in placements {
            self.place(slot, pos)?;
        }
        Ok(())
    }

    fn place(&mut self, slot: usize, pos: GridPos) -> Result<(), PuzzleError> {
        let index = self.cell_index(pos);
        let (Some(cell), Some(tile)) = (
            index.and_then(|index| self.cells.get_mut(index)),
            self.tiles.get_mut(slot),
        ) else {
            return Err(PuzzleError::InvariantViolation(format!(
                "cannot place slot {slot} at {pos}"
            )));
        };
        *cell = slot;
        tile.set_current(pos);
        Ok(())
    }

    /// True once every tile except the hole sits on its correct cell.
    pub fn is_solved(&self) -> bool {
        self.tiles.iter().all(Tile::is_in_place)
    }

    pub fn check_invariants(&self) -> Result<(), PuzzleError> {
        let mut seen = vec![false; self.tiles.len()];
        for (index, &slot) in self.cells.iter().enumerate() {
            let pos = GridPos::new(index / self.size, index % self.size);
            let Some(tile) = self.tiles.get(slot) else {
                return Err(PuzzleError::InvariantViolation(format!(
                    "cell {pos} points at missing tile slot {slot}"
                )));
            };
            if seen.get_mut(slot).is_some_and(|flag| std::mem::replace(flag, true)) {
                return Err(PuzzleError::InvariantViolation(format!(
                    "tile {} occupies more than one cell",
                    tile.id()
                )));
            }
            if tile.current() != pos {
                return Err(PuzzleError::InvariantViolation(format!(
                    "tile {} sits at {pos} but believes it is at {}",
                    tile.id(),
                    tile.current()
                )));
            }
        }

        let holes = self.tiles.iter().filter(|tile| tile.is_hole()).count();
        let expected = usize::from(self.hole.is_some());
        if holes != expected {
            return Err(PuzzleError::InvariantViolation(format!(
                "{holes} hole tiles, expected {expected}"
            )));
        }
        if self.hole().is_some_and(|hole| !hole.is_hole()) {
            return Err(PuzzleError::InvariantViolation(
                "hole reference points at a regular tile".into(),
            ));
        }
        Ok(())
    }

    /// Row-major index of `pos`, `None` off the board.
    fn cell_index(&self, pos: GridPos) -> Option<usize> {
        (pos.row < self.size && pos.col < self.size).then_some(pos.col + pos.row * self.size)
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, tile) in self.iter().enumerate() {
            if tile.is_hole() {
                write!(f, "   ")?;
            } else {
                write!(f, "{:>3}", tile.id().0)?;
            }
            if index % self.size == self.size - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::standard_tiles;

    fn board(size: usize) -> Board {
        Board::new(size, standard_tiles(size)).unwrap()
    }

    fn id_at(board: &Board, row: usize, col: usize) -> TileId {
        board.tile_at(GridPos::new(row, col)).unwrap().id()
    }

    fn with_hole_at(size: usize, row: usize, col: usize) -> Board {
        let mut board = board(size);
        let id = id_at(&board, row, col);
        board.select_hole(id).unwrap();
        board
    }

    #[test]
    fn new_lays_tiles_on_their_correct_cells() {
        let board = board(4);
        board.check_invariants().unwrap();
        assert!(board.is_solved());
        assert!(board.hole().is_none());
        for tile in board.iter() {
            assert_eq!(tile.current(), tile.correct());
        }
    }

    #[test]
    fn new_accepts_tiles_in_any_order() {
        let mut specs = standard_tiles(3);
        specs.reverse();
        let board = Board::new(3, specs).unwrap();
        assert_eq!(id_at(&board, 0, 0), TileId(1));
        assert_eq!(id_at(&board, 2, 2), TileId(9));
    }

    #[test]
    fn new_rejects_bad_levels() {
        assert_eq!(
            Board::new(1, standard_tiles(1)),
            Err(PuzzleError::PuzzleTooSmall(1))
        );
        assert_eq!(
            Board::new(3, standard_tiles(2)),
            Err(PuzzleError::TileCountMismatch {
                expected: 9,
                actual: 4
            })
        );

        let mut duplicate_id = standard_tiles(2);
        duplicate_id[3].id = TileId(1);
        assert_eq!(
            Board::new(2, duplicate_id),
            Err(PuzzleError::DuplicateTile(TileId(1)))
        );

        let mut out_of_bounds = standard_tiles(2);
        out_of_bounds[3].correct = GridPos::new(2, 0);
        assert_eq!(
            Board::new(2, out_of_bounds),
            Err(PuzzleError::PositionOutOfBounds {
                tile: TileId(4),
                pos: GridPos::new(2, 0),
                size: 2
            })
        );

        let mut shared_cell = standard_tiles(2);
        shared_cell[3].correct = GridPos::new(0, 0);
        assert_eq!(
            Board::new(2, shared_cell),
            Err(PuzzleError::DuplicatePosition {
                first: TileId(1),
                second: TileId(4),
                pos: GridPos::new(0, 0)
            })
        );
    }

    #[test]
    fn hole_is_selected_once() {
        let mut board = board(3);
        assert_eq!(board.select_hole(TileId(99)), Err(PuzzleError::UnknownTile(TileId(99))));
        board.select_hole(TileId(5)).unwrap();
        assert_eq!(board.hole().map(Tile::id), Some(TileId(5)));
        assert_eq!(
            board.select_hole(TileId(1)),
            Err(PuzzleError::HoleAlreadySelected(TileId(5)))
        );
        board.check_invariants().unwrap();
    }

    #[test]
    fn row_run_slides_toward_the_hole() {
        let mut board = with_hole_at(4, 0, 0);
        let hole = board.hole().unwrap().id();

        let mv = board.resolve_move(TileId(4)).unwrap();
        assert_eq!(mv.run, vec![TileId(4), TileId(3), TileId(2)]);
        assert_eq!(mv.direction, Direction::Left);
        assert_eq!(mv.hole_from, GridPos::new(0, 0));
        assert_eq!(mv.hole_to, GridPos::new(0, 3));
        assert_eq!(mv.clicked(), Some(TileId(4)));

        assert_eq!(board.hole().unwrap().current(), GridPos::new(0, 3));
        assert_eq!(id_at(&board, 0, 3), hole);
        assert_eq!(board.tile(TileId(4)).unwrap().current(), GridPos::new(0, 2));
        assert_eq!(board.tile(TileId(3)).unwrap().current(), GridPos::new(0, 1));
        assert_eq!(board.tile(TileId(2)).unwrap().current(), GridPos::new(0, 0));
        board.check_invariants().unwrap();
    }

    #[test]
    fn column_run_slides_toward_the_hole() {
        let mut board = with_hole_at(4, 3, 1);
        let mv = board.resolve_move(TileId(6)).unwrap();
        assert_eq!(mv.run, vec![TileId(6), TileId(10)]);
        assert_eq!(mv.direction, Direction::Down);
        assert_eq!(board.hole().unwrap().current(), GridPos::new(1, 1));
        assert_eq!(board.tile(TileId(6)).unwrap().current(), GridPos::new(2, 1));
        assert_eq!(board.tile(TileId(10)).unwrap().current(), GridPos::new(3, 1));
    }

    #[test]
    fn adjacent_tile_makes_a_run_of_one() {
        let mut board = with_hole_at(3, 1, 1);
        let mv = board.resolve_move(TileId(4)).unwrap();
        assert_eq!(mv.run_length(), 1);
        assert_eq!(mv.direction, Direction::Right);
    }

    #[test]
    fn misaligned_click_leaves_board_untouched() {
        let mut board = with_hole_at(4, 0, 0);
        let before = board.clone();
        assert!(!board.is_aligned(TileId(6)));
        assert_eq!(
            board.resolve_move(TileId(6)),
            Err(PuzzleError::Misaligned {
                tile: TileId(6),
                pos: GridPos::new(1, 1),
                hole: GridPos::new(0, 0)
            })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn hole_and_missing_hole_are_rejected() {
        let mut board = board(3);
        assert_eq!(board.resolve_move(TileId(2)), Err(PuzzleError::NoHole));
        assert!(!board.is_aligned(TileId(2)));

        board.select_hole(TileId(1)).unwrap();
        let before = board.clone();
        assert_eq!(board.resolve_move(TileId(1)), Err(PuzzleError::ClickedHole(TileId(1))));
        assert_eq!(
            board.resolve_move(TileId(42)),
            Err(PuzzleError::UnknownTile(TileId(42)))
        );
        assert_eq!(board, before);
    }

    #[test]
    fn alignment_is_pure() {
        let board = with_hole_at(4, 2, 1);
        for _ in 0..3 {
            assert!(board.is_aligned(TileId(9)));
            assert!(board.is_aligned(TileId(2)));
            assert!(!board.is_aligned(TileId(1)));
        }
    }

    #[test]
    fn line_through_hole_excludes_hole() {
        let board = with_hole_at(4, 1, 2);
        let row: Vec<_> = board.line_through_hole(Axis::Row).iter().map(|t| t.id()).collect();
        let col: Vec<_> = board
            .line_through_hole(Axis::Column)
            .iter()
            .map(|t| t.id())
            .collect();
        assert_eq!(row, vec![TileId(5), TileId(6), TileId(8)]);
        assert_eq!(col, vec![TileId(3), TileId(11), TileId(15)]);
    }

    #[test]
    fn clicking_the_previous_hole_cell_undoes_a_move() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut board = with_hole_at(5, 4, 4);
        for _ in 0..200 {
            let axis = if rng.bool() { Axis::Row } else { Axis::Column };
            let candidates = board.line_through_hole(axis);
            let clicked = candidates[rng.usize(..candidates.len())].id();
            let before = board.clone();

            let mv = board.resolve_move(clicked).unwrap();
            let undo_tile = board.tile_at(mv.hole_from).unwrap().id();
            let undo = board.resolve_move(undo_tile).unwrap();

            assert_eq!(board, before);
            assert_eq!(undo.direction, mv.direction.reversed());
            assert_eq!(undo.run_length(), mv.run_length());

            // Keep walking so the next round starts from a new state.
            board.resolve_move(clicked).unwrap();
            board.check_invariants().unwrap();
        }
    }

    #[test]
    fn invariants_hold_on_a_long_random_walk() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut board = with_hole_at(4, 0, 3);
        for _ in 0..1000 {
            let target = board.iter().nth(rng.usize(..16)).unwrap().id();
            match board.resolve_move(target) {
                Ok(_) => {}
                Err(err) => assert!(err.is_recoverable(), "unexpected {err}"),
            }
            board.check_invariants().unwrap();
            assert_eq!(board.iter().filter(|t| t.is_hole()).count(), 1);
        }
    }

    #[test]
    fn solved_tracks_the_hole_position() {
        let mut board = with_hole_at(3, 2, 2);
        assert!(board.is_solved());
        let mv = board.resolve_move(TileId(7)).unwrap();
        assert!(!board.is_solved());
        let undo = board.tile_at(mv.hole_from).unwrap().id();
        board.resolve_move(undo).unwrap();
        assert!(board.is_solved());
    }

    #[test]
    fn display_leaves_the_hole_blank() {
        let board = with_hole_at(2, 1, 1);
        assert_eq!(board.to_string(), "  1  2\n  3   \n");
    }
}
