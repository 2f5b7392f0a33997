use std::fmt::{self, Display, Formatter};

use bevy::prelude::*;

use crate::direction::Direction;
use crate::tile::TileId;

/// Player input: a tile was clicked or tapped.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileClicked {
    pub tile: TileId,
}

/// Handle for one requested animation. The player reports back with the
/// same ticket when it starts and when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationTicket(pub u64);

impl Display for AnimationTicket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "anim-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Player,
    Shuffle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationKind {
    /// Feedback for a tile that cannot move
    Shake { tile: TileId },
    /// The chosen tile leaves the board to become the hole
    RemoveHole { tile: TileId },
    /// Every tile of the run moves one cell in `direction`
    Slide {
        run: Vec<TileId>,
        direction: Direction,
        source: MoveSource,
    },
}

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct AnimationRequest {
    pub ticket: AnimationTicket,
    pub kind: AnimationKind,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationStarted {
    pub ticket: AnimationTicket,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationCompleted {
    pub ticket: AnimationTicket,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoleSelected {
    pub tile: TileId,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongClick {
    pub tile: TileId,
}

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct MoveStarted {
    pub ticket: AnimationTicket,
    pub run: Vec<TileId>,
    pub direction: Direction,
    pub source: MoveSource,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCompleted {
    pub ticket: AnimationTicket,
    pub source: MoveSource,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleStarted;

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleCompleted {
    pub moves: usize,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelWon {
    pub player_moves: u32,
}

pub(crate) fn register(app: &mut App) {
    app.add_event::<TileClicked>()
        .add_event::<AnimationRequest>()
        .add_event::<AnimationStarted>()
        .add_event::<AnimationCompleted>()
        .add_event::<HoleSelected>()
        .add_event::<WrongClick>()
        .add_event::<MoveStarted>()
        .add_event::<MoveCompleted>()
        .add_event::<ShuffleStarted>()
        .add_event::<ShuffleCompleted>()
        .add_event::<LevelWon>();
}
