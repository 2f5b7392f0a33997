use std::time::Duration;

use bevy::prelude::*;

use crate::board::Board;
use crate::error::PuzzleError;
use crate::tile::{GridPos, TileId, TileSpec};

/// When a requested animation starts counting against the blocking counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockingPolicy {
    /// Count the animation as soon as the core requests it. The counter
    /// then always covers a move whose logical effect has already landed.
    #[default]
    OnRequest,
    /// Count the animation only once the player reports it started. Leaves
    /// a window where a landed move is not yet reflected in the counter.
    OnStart,
}

/// Everything a level needs to know to build and run its board.
#[derive(Resource, Debug, Clone)]
pub struct LevelSettings {
    /// Number of tiles in each row or column
    pub puzzle_size: usize,
    /// Every tile of the level with its correct position, in any order
    pub tiles: Vec<TileSpec>,
    /// How long the shuffle keeps making moves once the hole is chosen
    pub shuffle_duration: Duration,
    /// Forbid a shuffle move that recreates the previous hole position
    pub avoid_backtrack: bool,
    /// When animations start blocking input
    pub blocking_policy: BlockingPolicy,
    /// Seed for the shuffle, random when unset
    pub seed: Option<u64>,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self::square(4)
    }
}

impl LevelSettings {
    /// A `size`x`size` level with tiles numbered row by row starting at 1.
    pub fn square(size: usize) -> Self {
        Self {
            puzzle_size: size,
            tiles: standard_tiles(size),
            shuffle_duration: Duration::from_secs(3),
            avoid_backtrack: true,
            blocking_policy: BlockingPolicy::default(),
            seed: None,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_shuffle_duration(mut self, duration: Duration) -> Self {
        self.shuffle_duration = duration;
        self
    }

    #[must_use]
    pub const fn with_blocking_policy(mut self, policy: BlockingPolicy) -> Self {
        self.blocking_policy = policy;
        self
    }

    /// Validates the level and lays every tile on its correct cell.
    pub fn build_board(&self) -> Result<Board, PuzzleError> {
        Board::new(self.puzzle_size, self.tiles.iter().copied())
    }

    pub fn rng(&self) -> fastrand::Rng {
        self.seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed)
    }
}

pub fn standard_tiles(size: usize) -> Vec<TileSpec> {
    (0..size * size)
        .map(|i| TileSpec {
            id: TileId(i as u32 + 1),
            correct: GridPos::new(i / size, i % size),
        })
        .collect()
}
