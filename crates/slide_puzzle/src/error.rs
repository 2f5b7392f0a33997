use thiserror::Error;

use crate::events::AnimationTicket;
use crate::tile::{GridPos, TileId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("Puzzle size must be at least 2, got {0}")]
    PuzzleTooSmall(usize),

    #[error("Tile count mismatch - expected {expected} tiles, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },

    #[error("Tile {0} appears more than once in the level")]
    DuplicateTile(TileId),

    #[error("Tile {tile} has correct position {pos} outside of a {size}x{size} board")]
    PositionOutOfBounds {
        tile: TileId,
        pos: GridPos,
        size: usize,
    },

    #[error("Tiles {first} and {second} share correct position {pos}")]
    DuplicatePosition {
        first: TileId,
        second: TileId,
        pos: GridPos,
    },

    #[error("Unknown tile {0}")]
    UnknownTile(TileId),

    #[error("No hole has been selected yet")]
    NoHole,

    #[error("Hole already selected: tile {0}")]
    HoleAlreadySelected(TileId),

    #[error("Tile {0} is the hole and cannot be moved")]
    ClickedHole(TileId),

    #[error("Tile {tile} at {pos} is not aligned with the hole at {hole}")]
    Misaligned {
        tile: TileId,
        pos: GridPos,
        hole: GridPos,
    },

    #[error("Board invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Blocking counter decremented below zero")]
    CounterUnderflow,

    #[error("Unknown animation ticket {0}")]
    UnknownTicket(AnimationTicket),

    #[error("Animation {0} reported started twice")]
    DuplicateStart(AnimationTicket),

    #[error("Animation {0} completed before it started")]
    CompletedBeforeStart(AnimationTicket),
}

impl PuzzleError {
    /// Whether the error comes from player input the game can simply reject.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Misaligned { .. } | Self::ClickedHole(_) | Self::UnknownTile(_)
        )
    }
}
