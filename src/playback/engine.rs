//! Playback state machine.

use std::sync::Arc;

use super::actor::{ActorFactory, EventSink, Representation};
use super::cursor::{ActorCursor, for_each_event_between};
use crate::schema::{ConfigError, PlaybackConfig, Recording};

/// Current state of a [`PlaybackEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// A subject being played back: its cursor and the host's representation.
#[derive(Debug)]
pub struct LiveActor<A> {
    pub cursor: ActorCursor,
    pub representation: A,
}

/// Plays a [`Recording`] back through host-built representations.
///
/// Usage:
/// ```ignore
/// let mut engine = PlaybackEngine::new(recording, HeadlessFactory, PlaybackConfig::default())?;
/// engine.play();
/// loop {
///     engine.tick(frame_dt, &mut sink);
/// }
/// ```
pub struct PlaybackEngine<F: ActorFactory> {
    factory: F,
    recording: Arc<Recording>,
    speed: f64,
    looping: bool,
    state: PlaybackState,
    /// Playback time, in `[0, duration]`.
    time: f64,
    actors: Vec<LiveActor<F::Actor>>,
}

impl<F: ActorFactory> PlaybackEngine<F> {
    pub fn new(
        recording: impl Into<Arc<Recording>>,
        factory: F,
        config: PlaybackConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            factory,
            recording: recording.into(),
            speed: config.speed,
            looping: config.looping,
            state: PlaybackState::Stopped,
            time: 0.0,
            actors: Vec::new(),
        })
    }

    pub fn recording(&self) -> &Arc<Recording> {
        &self.recording
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == PlaybackState::Stopped
    }

    /// Current playback time. While stopped, the time playback will start at.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn duration(&self) -> f64 {
        self.recording.duration()
    }

    pub fn playback_speed(&self) -> f64 {
        self.speed
    }

    /// Set the speed multiplier. Negative plays backwards, 0 freezes.
    pub fn set_playback_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        if !speed.is_finite() {
            return Err(ConfigError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Subjects currently being played back.
    pub fn actors(&self) -> impl Iterator<Item = &LiveActor<F::Actor>> {
        self.actors.iter()
    }

    /// Start or resume playback.
    ///
    /// From stopped, builds a representation for every subject the factory
    /// accepts and places it at the current time.
    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Playing => {}
            PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                log::debug!("Playback resumed at {:.3}", self.time);
            }
            PlaybackState::Stopped => {
                self.spawn_actors();
                self.state = PlaybackState::Playing;
                log::debug!(
                    "Playback started at {:.3} with {} actors",
                    self.time,
                    self.actors.len()
                );
            }
        }
    }

    fn spawn_actors(&mut self) {
        let recording = &self.recording;
        for (index, subject) in recording.subjects().iter().enumerate() {
            let Some(mut representation) =
                self.factory
                    .build(subject.id, &subject.name, &subject.metadata)
            else {
                log::warn!(
                    "Subject {} ({}) has no representation, skipping",
                    subject.id,
                    subject.name
                );
                continue;
            };
            let Some(cursor) = ActorCursor::new(Arc::clone(recording), index, self.time) else {
                continue;
            };
            representation.apply(&cursor.pose());
            self.actors.push(LiveActor {
                cursor,
                representation,
            });
        }
    }

    /// Freeze playback at the current time. No-op unless playing.
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.state = PlaybackState::Paused;
            log::debug!("Playback paused at {:.3}", self.time);
        }
    }

    /// Release every representation and rewind. No-op when already stopped.
    pub fn stop(&mut self, immediate: bool) {
        if self.is_stopped() {
            return;
        }
        for actor in self.actors.drain(..) {
            actor.representation.release(immediate);
        }
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
        log::debug!("Playback stopped");
    }

    /// Jump to `time` (clamped to the recording) without firing events.
    ///
    /// While stopped this only sets where the next `play` starts.
    pub fn set_time(&mut self, time: f64) {
        let time = time.clamp(0.0, self.duration().max(0.0));
        self.time = time;
        for actor in &mut self.actors {
            if let Some(pose) = actor.cursor.skip_to(time) {
                actor.representation.apply(&pose);
            }
        }
    }

    /// Advance playback by `real_dt` seconds of host time.
    ///
    /// Events passed on the way are sent to `sink`: session events first,
    /// then each subject's. Reaching either end of the recording fires the
    /// events at that end too, then pauses there or, when looping, wraps to
    /// the opposite end. The part of the tick past the end is dropped.
    pub fn tick<S: EventSink>(&mut self, real_dt: f64, sink: &mut S) {
        if !self.is_playing() {
            return;
        }
        let moved = real_dt * self.speed;
        if moved == 0.0 || !moved.is_finite() {
            return;
        }

        let duration = self.duration().max(0.0);
        let target = self.time + moved;
        let reached_end = if moved > 0.0 {
            target >= duration
        } else {
            target <= 0.0
        };
        if !reached_end {
            self.advance(target, false, sink);
            return;
        }

        let boundary = target.clamp(0.0, duration);
        if boundary != self.time {
            self.advance(boundary, true, sink);
        }

        if self.looping {
            let wrapped = if moved > 0.0 { 0.0 } else { duration };
            log::debug!("Playback looped to {:.3}", wrapped);
            self.set_time(wrapped);
        } else {
            self.state = PlaybackState::Paused;
            log::debug!("Playback reached {:.3}, pausing", boundary);
        }
    }

    fn advance<S: EventSink>(&mut self, to: f64, include_end: bool, sink: &mut S) {
        let offset = self.recording.start_time();
        for_each_event_between(
            self.recording.events(),
            self.time + offset,
            to + offset,
            include_end,
            |event| sink.on_event(None, event),
        );

        for actor in &mut self.actors {
            let pose = if include_end {
                actor.cursor.play_through(to, sink)
            } else {
                actor.cursor.play_to(to, sink)
            };
            if let Some(pose) = pose {
                actor.representation.apply(&pose);
            }
        }
        self.time = to;
    }
}
