use std::time::Duration;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::utils::HashMap;

use crate::blocking::BlockingCounter;
use crate::config::BlockingPolicy;
use crate::error::PuzzleError;
use crate::events::{
    AnimationCompleted, AnimationKind, AnimationRequest, AnimationStarted, AnimationTicket,
    MoveCompleted, MoveStarted,
};
use crate::PuzzleSet;

#[derive(Debug)]
struct InFlight {
    kind: AnimationKind,
    started: bool,
}

/// Bookkeeping for every animation the core requested and has not seen
/// complete yet. Keeps the blocking counter balanced even when the player
/// misbehaves.
#[derive(Resource, Debug, Default)]
pub struct AnimationLedger {
    policy: BlockingPolicy,
    next_ticket: u64,
    in_flight: HashMap<AnimationTicket, InFlight>,
}

impl AnimationLedger {
    pub fn new(policy: BlockingPolicy) -> Self {
        Self {
            policy,
            ..default()
        }
    }

    pub const fn policy(&self) -> BlockingPolicy {
        self.policy
    }

    pub fn issue(&mut self, kind: AnimationKind, counter: &mut BlockingCounter) -> AnimationTicket {
        let ticket = AnimationTicket(self.next_ticket);
        self.next_ticket += 1;
        if self.policy == BlockingPolicy::OnRequest {
            counter.increment();
        }
        self.in_flight.insert(
            ticket,
            InFlight {
                kind,
                started: false,
            },
        );
        ticket
    }

    pub fn start(
        &mut self,
        ticket: AnimationTicket,
        counter: &mut BlockingCounter,
    ) -> Result<&AnimationKind, PuzzleError> {
        let policy = self.policy;
        let entry = self
            .in_flight
            .get_mut(&ticket)
            .ok_or(PuzzleError::UnknownTicket(ticket))?;
        if entry.started {
            return Err(PuzzleError::DuplicateStart(ticket));
        }
        entry.started = true;
        if policy == BlockingPolicy::OnStart {
            counter.increment();
        }
        Ok(&entry.kind)
    }

    pub fn complete(
        &mut self,
        ticket: AnimationTicket,
        counter: &mut BlockingCounter,
    ) -> Result<AnimationKind, PuzzleError> {
        match self.in_flight.get(&ticket) {
            None => return Err(PuzzleError::UnknownTicket(ticket)),
            Some(entry) if !entry.started => {
                return Err(PuzzleError::CompletedBeforeStart(ticket));
            }
            Some(_) => {}
        }
        let entry = self
            .in_flight
            .remove(&ticket)
            .ok_or(PuzzleError::UnknownTicket(ticket))?;
        counter.decrement()?;
        Ok(entry.kind)
    }

    /// Requested animations that have not completed.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Requested animations the player has not reported as started.
    pub fn unstarted(&self) -> usize {
        self.in_flight.values().filter(|entry| !entry.started).count()
    }

    pub fn is_settled(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn tickets(&self) -> impl Iterator<Item = (AnimationTicket, bool)> + '_ {
        self.in_flight
            .iter()
            .map(|(&ticket, entry)| (ticket, entry.started))
    }
}

/// What board-driving systems use to ask for animations and to check
/// whether they may act.
#[derive(SystemParam)]
pub struct Animations<'w> {
    ledger: ResMut<'w, AnimationLedger>,
    counter: ResMut<'w, BlockingCounter>,
    requests: EventWriter<'w, AnimationRequest>,
}

impl Animations<'_> {
    pub fn request(&mut self, kind: AnimationKind) -> AnimationTicket {
        let ticket = self.ledger.issue(kind.clone(), &mut self.counter);
        debug!("Requesting {ticket}: {kind:?}");
        self.requests.send(AnimationRequest { ticket, kind });
        ticket
    }

    pub fn is_blocked(&self) -> bool {
        !self.counter.is_zero()
    }

    pub fn is_settled(&self) -> bool {
        self.ledger.is_settled()
    }
}

/// Registers the systems that turn player notifications into counter
/// updates and move notifications.
pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, track_animations.in_set(PuzzleSet::Track));
    }
}

fn track_animations(
    mut started: EventReader<AnimationStarted>,
    mut completed: EventReader<AnimationCompleted>,
    mut ledger: ResMut<AnimationLedger>,
    mut counter: ResMut<BlockingCounter>,
    mut move_started: EventWriter<MoveStarted>,
    mut move_completed: EventWriter<MoveCompleted>,
) {
    for &AnimationStarted { ticket } in started.read() {
        match ledger.start(ticket, &mut counter) {
            Ok(AnimationKind::Slide {
                run,
                direction,
                source,
            }) => {
                move_started.send(MoveStarted {
                    ticket,
                    run: run.clone(),
                    direction: *direction,
                    source: *source,
                });
            }
            Ok(_) => {}
            Err(err) => error!("Ignoring start notification: {err}"),
        }
    }

    for &AnimationCompleted { ticket } in completed.read() {
        match ledger.complete(ticket, &mut counter) {
            Ok(AnimationKind::Slide { source, .. }) => {
                move_completed.send(MoveCompleted { ticket, source });
            }
            Ok(_) => {}
            Err(err) => error!("Ignoring completion notification: {err}"),
        }
    }
}

/// Durations used by [`TimedAnimationPlugin`].
#[derive(Resource, Debug, Clone)]
pub struct AnimationTimings {
    /// Overall animation speed multiplier
    pub anim_speed: f32,
    /// Time for one tile to slide into the next cell (seconds)
    pub slide_duration: f32,
    /// Delay between two tiles of a run starting to slide (seconds)
    pub slide_step_time: f32,
    /// Wrong click shake (seconds)
    pub shake_duration: f32,
    /// Hole tile lifting off the board (seconds)
    pub extraction_duration: f32,
    /// Hole tile spinning away (seconds)
    pub rotation_duration: f32,
    /// Frames between receiving a request and reporting it started
    pub start_delay_frames: u32,
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self {
            anim_speed: 1.0,
            slide_duration: 0.5,
            slide_step_time: 0.2,
            shake_duration: 0.6,
            extraction_duration: 0.4,
            rotation_duration: 0.5,
            start_delay_frames: 0,
        }
    }
}

impl AnimationTimings {
    pub fn duration(&self, kind: &AnimationKind) -> Duration {
        let secs = match kind {
            AnimationKind::Shake { .. } => self.shake_duration,
            AnimationKind::RemoveHole { .. } => self.extraction_duration + self.rotation_duration,
            AnimationKind::Slide { run, .. } => {
                let staggered = run.len().saturating_sub(1) as f32;
                staggered.mul_add(self.slide_step_time, self.slide_duration)
            }
        };
        Duration::from_secs_f32(secs / self.anim_speed.max(f32::EPSILON))
    }
}

/// An animation the headless player is running.
#[derive(Component, Debug)]
pub struct PlayingAnimation {
    ticket: AnimationTicket,
    kind: AnimationKind,
    timer: Timer,
    delay_frames: u32,
    started: bool,
}

impl PlayingAnimation {
    pub const fn ticket(&self) -> AnimationTicket {
        self.ticket
    }

    pub const fn kind(&self) -> &AnimationKind {
        &self.kind
    }
}

/// Stand-in for the visual tween player: plays every request for as long
/// as the real animation would take and reports start and completion.
#[derive(Default)]
pub struct TimedAnimationPlugin {
    pub timings: AnimationTimings,
}

impl Plugin for TimedAnimationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.timings.clone()).add_systems(
            Update,
            (queue_requests, play_animations)
                .chain()
                .after(PuzzleSet::Detect),
        );
    }
}

fn queue_requests(
    mut commands: Commands,
    mut requests: EventReader<AnimationRequest>,
    timings: Res<AnimationTimings>,
) {
    for request in requests.read() {
        commands.spawn(PlayingAnimation {
            ticket: request.ticket,
            kind: request.kind.clone(),
            timer: Timer::new(timings.duration(&request.kind), TimerMode::Once),
            delay_frames: timings.start_delay_frames,
            started: false,
        });
    }
}

fn play_animations(
    mut commands: Commands,
    time: Res<Time>,
    mut animations: Query<(Entity, &mut PlayingAnimation)>,
    mut started: EventWriter<AnimationStarted>,
    mut completed: EventWriter<AnimationCompleted>,
) {
    for (entity, mut animation) in &mut animations {
        if !animation.started {
            if animation.delay_frames > 0 {
                animation.delay_frames -= 1;
                continue;
            }
            animation.started = true;
            started.send(AnimationStarted {
                ticket: animation.ticket,
            });
        }

        if animation.timer.tick(time.delta()).finished() {
            completed.send(AnimationCompleted {
                ticket: animation.ticket,
            });
            commands.entity(entity).despawn();
        }
    }
}
