use bevy::prelude::*;

use crate::animation::AnimationLedger;
use crate::blocking::BlockingCounter;
use crate::board::Board;
use crate::events::{AnimationCompleted, LevelWon};
use crate::game::{GamePhase, GameProgress};
use crate::PuzzleSet;

/// A level is won only after the shuffle has run: the untouched board is
/// solved too.
pub fn is_won(board: &Board, progress: &GameProgress) -> bool {
    progress.board_shuffled && board.hole().is_some() && board.is_solved()
}

pub struct WinPlugin;

impl Plugin for WinPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            detect_win
                .in_set(PuzzleSet::Detect)
                .run_if(in_state(GamePhase::Playing)),
        );
    }
}

/// Checked whenever an animation finishes, once the board has come to rest.
/// A move whose animation has not reported started yet still counts as in
/// flight, even when the counter reads zero.
fn detect_win(
    mut completed: EventReader<AnimationCompleted>,
    counter: Res<BlockingCounter>,
    ledger: Res<AnimationLedger>,
    board: Res<Board>,
    progress: Res<GameProgress>,
    mut level_won: EventWriter<LevelWon>,
    mut next_phase: ResMut<NextState<GamePhase>>,
) {
    if completed.read().count() == 0 || !counter.is_zero() || !ledger.is_settled() {
        return;
    }
    if is_won(&board, &progress) {
        info!("Level won in {} moves", progress.player_moves);
        level_won.send(LevelWon {
            player_moves: progress.player_moves,
        });
        next_phase.set(GamePhase::Won);
    }
}
