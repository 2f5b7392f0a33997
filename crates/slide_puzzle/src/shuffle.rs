use std::time::Duration;

use bevy::prelude::*;

use crate::animation::Animations;
use crate::board::{Board, Move};
use crate::config::LevelSettings;
use crate::direction::Axis;
use crate::error::PuzzleError;
use crate::events::{AnimationKind, MoveSource, ShuffleCompleted, ShuffleStarted};
use crate::game::{GamePhase, GameProgress};
use crate::tile::{GridPos, TileId};
use crate::PuzzleSet;

/// Scrambles the board through ordinary moves, so any shuffled board can be
/// solved by undoing them.
#[derive(Resource, Debug)]
pub struct Shuffler {
    rng: fastrand::Rng,
    next_axis: Axis,
    avoid_backtrack: bool,
    /// Hole position before every shuffle move, oldest first
    history: Vec<GridPos>,
    timer: Timer,
}

impl Shuffler {
    pub fn new(rng: fastrand::Rng, avoid_backtrack: bool) -> Self {
        Self {
            rng,
            next_axis: Axis::Row,
            avoid_backtrack,
            history: Vec::new(),
            timer: Timer::new(Duration::ZERO, TimerMode::Once),
        }
    }

    /// Tiles on `axis` through the hole that may be clicked next.
    pub fn candidates(&self, board: &Board, axis: Axis) -> Vec<TileId> {
        let previous_hole = self.history.last().copied().filter(|_| self.avoid_backtrack);
        board
            .line_through_hole(axis)
            .into_iter()
            .filter(|tile| Some(tile.current()) != previous_hole)
            .map(|tile| tile.id())
            .collect()
    }

    /// Picks the next tile to click, scanning the hole's row and column in
    /// turn. Falls back to the other line, then to allowing a backtrack,
    /// so a board with a hole always yields a move.
    pub fn choose(&mut self, board: &Board) -> Option<TileId> {
        let axis = self.next_axis;
        self.next_axis = axis.other();

        let mut candidates = self.candidates(board, axis);
        if candidates.is_empty() {
            // The other line moves now, so the skipped one goes next.
            candidates = self.candidates(board, axis.other());
            self.next_axis = axis;
        }
        if candidates.is_empty() {
            candidates = board
                .line_through_hole(axis)
                .into_iter()
                .map(|tile| tile.id())
                .collect();
        }
        self.rng.choice(candidates)
    }

    /// Makes one random move on the board and records it.
    pub fn step(&mut self, board: &mut Board) -> Result<Move, PuzzleError> {
        let hole = board.hole().ok_or(PuzzleError::NoHole)?.current();
        let tile = self.choose(board).ok_or(PuzzleError::NoHole)?;
        let mv = board.resolve_move(tile)?;
        self.history.push(hole);
        Ok(mv)
    }

    pub fn history(&self) -> &[GridPos] {
        &self.history
    }

    pub fn start(&mut self, duration: Duration) {
        self.timer = Timer::new(duration, TimerMode::Once);
        self.history.clear();
    }

    /// Advances the shuffle clock, returning whether the deadline passed.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.timer.tick(delta).finished()
    }
}

pub struct ShufflePlugin;

impl Plugin for ShufflePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GamePhase::Shuffling), start_shuffle)
            .add_systems(
                Update,
                step_shuffle
                    .in_set(PuzzleSet::Shuffle)
                    .run_if(in_state(GamePhase::Shuffling)),
            );
    }
}

fn start_shuffle(
    mut shuffler: ResMut<Shuffler>,
    settings: Res<LevelSettings>,
    mut shuffle_started: EventWriter<ShuffleStarted>,
) {
    info!(
        "Shuffling for {:.1}s",
        settings.shuffle_duration.as_secs_f32()
    );
    shuffler.start(settings.shuffle_duration);
    shuffle_started.send(ShuffleStarted);
}

/// One shuffle move per tick while nothing is animating. Once the deadline
/// has passed the shuffle waits for every outstanding animation, including
/// ones not yet reported as started, before handing the board to the player.
fn step_shuffle(
    time: Res<Time>,
    mut shuffler: ResMut<Shuffler>,
    mut board: ResMut<Board>,
    mut animations: Animations,
    mut progress: ResMut<GameProgress>,
    mut shuffle_completed: EventWriter<ShuffleCompleted>,
    mut next_phase: ResMut<NextState<GamePhase>>,
) {
    let deadline_passed = shuffler.tick(time.delta());
    if animations.is_blocked() {
        return;
    }

    if deadline_passed {
        if !animations.is_settled() {
            return;
        }
        let moves = shuffler.history().len();
        info!("Board shuffled in {moves} moves\n{}", *board);
        progress.board_shuffled = true;
        shuffle_completed.send(ShuffleCompleted { moves });
        next_phase.set(GamePhase::Playing);
        return;
    }

    match shuffler.step(&mut board) {
        Ok(mv) => {
            animations.request(AnimationKind::Slide {
                run: mv.run,
                direction: mv.direction,
                source: MoveSource::Shuffle,
            });
        }
        Err(err) => error!("Shuffle move aborted: {err}"),
    }
}
