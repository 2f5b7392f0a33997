use bevy::prelude::*;

use crate::animation::Animations;
use crate::board::Board;
use crate::events::{AnimationKind, HoleSelected, MoveSource, TileClicked, WrongClick};
use crate::PuzzleSet;

#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// Waiting for the first click, which picks the hole
    #[default]
    Idle,
    Shuffling,
    Playing,
    Won,
}

#[derive(Resource, Debug, Default)]
pub struct GameProgress {
    /// The first tile was clicked and became the hole
    pub game_begun: bool,
    /// The shuffle ran to completion; only now can the level be won
    pub board_shuffled: bool,
    /// Moves made by the player after the shuffle
    pub player_moves: u32,
}

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GamePhase>()
            .init_resource::<GameProgress>()
            .add_systems(Update, handle_clicks.in_set(PuzzleSet::Input));
    }
}

/// Accepts clicks only while no animation is blocking. Clicks that arrive
/// while blocked, shuffling or after the win are dropped.
fn handle_clicks(
    phase: Res<State<GamePhase>>,
    mut clicks: EventReader<TileClicked>,
    mut board: ResMut<Board>,
    mut progress: ResMut<GameProgress>,
    mut animations: Animations,
    mut hole_selected: EventWriter<HoleSelected>,
    mut wrong_click: EventWriter<WrongClick>,
    mut next_phase: ResMut<NextState<GamePhase>>,
) {
    for &TileClicked { tile } in clicks.read() {
        if animations.is_blocked() {
            debug!("Board busy, ignoring click on {tile}");
            continue;
        }

        match phase.get() {
            GamePhase::Idle if !progress.game_begun => {
                if let Err(err) = board.select_hole(tile) {
                    warn!("Cannot start with {tile}: {err}");
                    continue;
                }
                info!("Tile {tile} becomes the hole");
                progress.game_begun = true;
                hole_selected.send(HoleSelected { tile });
                animations.request(AnimationKind::RemoveHole { tile });
                next_phase.set(GamePhase::Shuffling);
            }
            GamePhase::Playing => {
                let Some(clicked) = board.tile(tile) else {
                    warn!("Click on unknown tile {tile}");
                    continue;
                };
                if clicked.is_hole() {
                    debug!("Click on the hole ignored");
                    continue;
                }
                if !board.is_aligned(tile) {
                    debug!("Tile {tile} at {} cannot move", clicked.current());
                    wrong_click.send(WrongClick { tile });
                    animations.request(AnimationKind::Shake { tile });
                    continue;
                }

                match board.resolve_move(tile) {
                    Ok(mv) => {
                        progress.player_moves += 1;
                        debug!("Moved {:?} {}\n{}", mv.run, mv.direction, *board);
                        animations.request(AnimationKind::Slide {
                            run: mv.run,
                            direction: mv.direction,
                            source: MoveSource::Player,
                        });
                    }
                    Err(err) if err.is_recoverable() => warn!("Move of {tile} rejected: {err}"),
                    Err(err) => error!("Move of {tile} aborted: {err}"),
                }
            }
            _ => debug!("Ignoring click on {tile} while {:?}", phase.get()),
        }
    }
}
