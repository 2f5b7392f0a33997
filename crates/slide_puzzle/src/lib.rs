use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

mod animation;
mod autoplay;
mod blocking;
mod board;
mod config;
mod direction;
mod error;
mod events;
mod game;
mod shuffle;
mod tile;
mod win;

pub use animation::{
    AnimationLedger, AnimationPlugin, AnimationTimings, Animations, TimedAnimationPlugin,
};
pub use autoplay::AutoplayPlugin;
pub use blocking::BlockingCounter;
pub use board::{Board, Move};
pub use config::{standard_tiles, BlockingPolicy, LevelSettings};
pub use direction::{Axis, Direction};
pub use error::PuzzleError;
pub use events::*;
pub use game::{GamePhase, GamePlugin, GameProgress};
pub use shuffle::{ShufflePlugin, Shuffler};
pub use tile::{GridPos, Tile, TileId, TileSpec};
pub use win::{is_won, WinPlugin};

const FRAME_TIME: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Order of the puzzle systems within a frame. Notifications from the
/// animation player are applied before input so a click in the same frame
/// as a completion is accepted.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum PuzzleSet {
    Track,
    Input,
    Shuffle,
    Detect,
}

/// The puzzle core. Add an animation player next to it: either a visual
/// one answering [`AnimationRequest`]s or [`TimedAnimationPlugin`].
pub struct SlidePuzzlePlugin {
    settings: LevelSettings,
    board: Board,
}

impl SlidePuzzlePlugin {
    pub fn new(settings: LevelSettings) -> Result<Self, PuzzleError> {
        let board = settings.build_board()?;
        Ok(Self { settings, board })
    }
}

impl Plugin for SlidePuzzlePlugin {
    fn build(&self, app: &mut App) {
        events::register(app);
        app.configure_sets(
            Update,
            (
                PuzzleSet::Track,
                PuzzleSet::Input,
                PuzzleSet::Shuffle,
                PuzzleSet::Detect,
            )
                .chain(),
        )
        .insert_resource(self.settings.clone())
        .insert_resource(self.board.clone())
        .insert_resource(Shuffler::new(
            self.settings.rng(),
            self.settings.avoid_backtrack,
        ))
        .insert_resource(AnimationLedger::new(self.settings.blocking_policy))
        .init_resource::<BlockingCounter>()
        .add_plugins((GamePlugin, ShufflePlugin, WinPlugin, AnimationPlugin));
    }
}

/// Runs a default 4x4 level headless until autoplay has solved it.
pub fn run() -> AppExit {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(FRAME_TIME)),
        LogPlugin::default(),
        StatesPlugin,
    ));

    let settings = LevelSettings::default();
    // The bottom right tile is the classic hole.
    let Some(hole) = settings.tiles.iter().max_by_key(|spec| spec.correct) else {
        error!("Level has no tiles");
        return AppExit::error();
    };
    let first_click = hole.id;

    let puzzle = match SlidePuzzlePlugin::new(settings) {
        Ok(puzzle) => puzzle,
        Err(err) => {
            error!("Invalid level: {err}");
            return AppExit::error();
        }
    };

    app.add_plugins((
        puzzle,
        TimedAnimationPlugin::default(),
        AutoplayPlugin::new(first_click),
    ))
    .run()
}
