use bevy::prelude::*;

use crate::animation::Animations;
use crate::board::Board;
use crate::events::TileClicked;
use crate::game::{GamePhase, GameProgress};
use crate::shuffle::Shuffler;
use crate::tile::{GridPos, TileId};
use crate::PuzzleSet;

/// Plays a level without a human: opens it with one click, then undoes the
/// shuffle move by move and exits once the level is won.
pub struct AutoplayPlugin {
    pub first_click: TileId,
}

impl AutoplayPlugin {
    pub const fn new(first_click: TileId) -> Self {
        Self { first_click }
    }
}

#[derive(Resource, Debug)]
struct Autoplay {
    first_click: TileId,
    opened: bool,
    /// Hole positions to restore, last one first
    solution: Vec<GridPos>,
}

impl Plugin for AutoplayPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Autoplay {
            first_click: self.first_click,
            opened: false,
            solution: Vec::new(),
        })
        .add_systems(OnEnter(GamePhase::Playing), plan_solution)
        .add_systems(OnEnter(GamePhase::Won), finish)
        .add_systems(
            Update,
            (
                open_level.run_if(in_state(GamePhase::Idle)),
                replay_solution.run_if(in_state(GamePhase::Playing)),
            )
                .after(PuzzleSet::Track)
                .before(PuzzleSet::Input),
        );
    }
}

fn open_level(mut autoplay: ResMut<Autoplay>, mut clicks: EventWriter<TileClicked>) {
    if autoplay.opened {
        return;
    }
    autoplay.opened = true;
    info!("Autoplay opens the level with {}", autoplay.first_click);
    clicks.send(TileClicked {
        tile: autoplay.first_click,
    });
}

fn plan_solution(mut autoplay: ResMut<Autoplay>, shuffler: Res<Shuffler>) {
    autoplay.solution = shuffler.history().to_vec();
    info!("Autoplay will undo {} shuffle moves", autoplay.solution.len());
}

/// One click per settled board: the tile now sitting where the hole was
/// before the matching shuffle move.
fn replay_solution(
    mut autoplay: ResMut<Autoplay>,
    animations: Animations,
    board: Res<Board>,
    mut clicks: EventWriter<TileClicked>,
    mut exit: EventWriter<AppExit>,
) {
    // A solved board is left for the win check.
    if animations.is_blocked() || !animations.is_settled() || board.is_solved() {
        return;
    }
    let Some(previous_hole) = autoplay.solution.pop() else {
        error!("Autoplay ran out of moves before the level was won\n{}", *board);
        exit.send(AppExit::error());
        return;
    };
    match board.tile_at(previous_hole) {
        Some(tile) => {
            clicks.send(TileClicked { tile: tile.id() });
        }
        None => {
            error!("No tile at {previous_hole}");
            exit.send(AppExit::error());
        }
    }
}

fn finish(progress: Res<GameProgress>, board: Res<Board>, mut exit: EventWriter<AppExit>) {
    info!(
        "Autoplay solved the board in {} moves\n{}",
        progress.player_moves, *board
    );
    exit.send(AppExit::Success);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::TimedAnimationPlugin;
    use crate::config::{BlockingPolicy, LevelSettings};
    use crate::testing::{self, Journal};

    use std::time::Duration;

    fn autoplay_app(settings: LevelSettings) -> App {
        let mut app = testing::app(settings);
        app.add_plugins((
            TimedAnimationPlugin::default(),
            AutoplayPlugin::new(TileId(16)),
        ));
        app
    }

    fn run_to_exit(app: &mut App) -> AppExit {
        for _ in 0..2_000 {
            app.update();
            if let Some(exit) = app.should_exit() {
                return exit;
            }
        }
        panic!("autoplay never finished");
    }

    #[test]
    fn autoplay_wins_the_level() {
        let settings = LevelSettings::square(4)
            .with_seed(11)
            .with_shuffle_duration(Duration::from_secs(3));
        let mut app = autoplay_app(settings);

        assert_eq!(run_to_exit(&mut app), AppExit::Success);
        assert_eq!(testing::phase(&app), GamePhase::Won);
        assert!(app.world().resource::<Board>().is_solved());

        let journal = app.world().resource::<Journal>();
        assert_eq!(journal.wins.len(), 1);
        assert_eq!(journal.shuffles_completed.len(), 1);
        assert!(journal.max_pending <= 1);
    }

    #[test]
    fn autoplay_wins_with_late_blocking() {
        let settings = LevelSettings::square(3)
            .with_seed(4)
            .with_shuffle_duration(Duration::from_secs(2))
            .with_blocking_policy(BlockingPolicy::OnStart);
        let mut app = testing::app(settings);
        let mut timed = TimedAnimationPlugin::default();
        timed.timings.start_delay_frames = 2;
        app.add_plugins((timed, AutoplayPlugin::new(TileId(9))));

        assert_eq!(run_to_exit(&mut app), AppExit::Success);
        assert!(app.world().resource::<Board>().is_solved());
        app.world().resource::<Board>().check_invariants().unwrap();
    }
}
