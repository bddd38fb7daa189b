//! Session recorder: the Recording / Paused / Stopped state machine.
//!
//! The recorder is driven entirely by its host. Each tick the host hands it
//! the current pose of every tracked subject; the recorder stamps it with
//! the clock, applies the capture-rate throttle and appends it to the
//! subject's timeline. Pause intervals are kept on the raw clock and only
//! removed when a [`Recording`] is built.

use std::collections::HashMap;

use glam::DVec3;

use super::clock::{Clock, SystemClock};
use super::finalize::{PauseInterval, finalize_discrete};
use super::timeline::SubjectTimeline;
use crate::schema::{
    ConfigError, EulerAngles, LifecycleKind, Metadata, NamedEvent, NamedEventSample, Recording,
    RecorderConfig, Sample,
};

/// Current state of a [`SessionRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Recording,
    Paused,
    Stopped,
}

/// Errors from recorder operations.
///
/// A failed operation leaves the recorder exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("A recording is already in progress")]
    AlreadyRecording,
    #[error("No recording is in progress")]
    NotRecording,
    #[error("The recording is not paused")]
    NotPaused,
    #[error("Clock went backwards during pause (paused at {paused_at}, now {now})")]
    InvalidPauseDuration { paused_at: f64, now: f64 },
    #[error("Subject {0} is already registered")]
    DuplicateSubject(i64),
    #[error("Subject {0} is not registered")]
    UnknownSubject(i64),
    #[error("Subjects cannot be cleared while a recording is in progress")]
    SubjectsLocked,
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Records many subjects over one or more sessions.
///
/// Usage:
/// ```ignore
/// let clock = ManualClock::new(0.0);
/// let mut recorder = SessionRecorder::new(clock.clone(), RecorderConfig::default())?;
/// recorder.register_subject(1, "player")?;
/// recorder.start()?;
/// for tick in 0..100 {
///     clock.advance(1.0 / 60.0);
///     recorder.capture_orientation(1, position, rotation)?;
/// }
/// let recording = recorder.finish()?;
/// ```
pub struct SessionRecorder<C: Clock = SystemClock> {
    clock: C,
    config: RecorderConfig,
    state: RecordingState,
    subjects: Vec<SubjectTimeline>,
    /// Subject id to position in `subjects`.
    index: HashMap<i64, usize>,
    events: Vec<NamedEventSample>,
    metadata: Metadata,
    pauses: Vec<PauseInterval>,
    time_started: f64,
    time_paused: f64,
}

impl<C: Clock> SessionRecorder<C> {
    /// Create a stopped recorder.
    pub fn new(clock: C, config: RecorderConfig) -> Result<Self, RecorderError> {
        config.validate()?;
        Ok(Self {
            clock,
            config,
            state: RecordingState::Stopped,
            subjects: Vec::new(),
            index: HashMap::new(),
            events: Vec::new(),
            metadata: Metadata::new(),
            pauses: Vec::new(),
            time_started: 0.0,
            time_paused: 0.0,
        })
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn is_paused(&self) -> bool {
        self.state == RecordingState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == RecordingState::Stopped
    }

    /// Pause intervals closed so far in the current recording.
    pub fn pauses(&self) -> &[PauseInterval] {
        &self.pauses
    }

    /// Raw clock time the current (or last) recording started.
    pub fn time_started(&self) -> f64 {
        self.time_started
    }

    pub fn subjects(&self) -> &[SubjectTimeline] {
        &self.subjects
    }

    pub fn subject(&self, id: i64) -> Option<&SubjectTimeline> {
        self.index.get(&id).map(|&i| &self.subjects[i])
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    // ---- subject registration ----

    /// Start tracking a prepared timeline.
    pub fn register(&mut self, timeline: SubjectTimeline) -> Result<(), RecorderError> {
        let id = timeline.id();
        if self.index.contains_key(&id) {
            return Err(RecorderError::DuplicateSubject(id));
        }
        log::debug!("Registered subject {} ({})", id, timeline.name());
        self.index.insert(id, self.subjects.len());
        self.subjects.push(timeline);
        Ok(())
    }

    /// Start tracking a new subject using the configured compaction threshold.
    pub fn register_subject(
        &mut self,
        id: i64,
        name: impl Into<String>,
    ) -> Result<(), RecorderError> {
        let timeline = SubjectTimeline::with_minimum_delta(id, name, self.config.minimum_delta);
        self.register(timeline)
    }

    /// Forget every subject. Only allowed while stopped.
    pub fn clear_subjects(&mut self) -> Result<(), RecorderError> {
        if !self.is_stopped() {
            return Err(RecorderError::SubjectsLocked);
        }
        self.subjects.clear();
        self.index.clear();
        Ok(())
    }

    fn timeline_mut(&mut self, id: i64) -> Result<&mut SubjectTimeline, RecorderError> {
        match self.index.get(&id) {
            Some(&i) => Ok(&mut self.subjects[i]),
            None => Err(RecorderError::UnknownSubject(id)),
        }
    }

    // ---- state transitions ----

    /// Begin a new recording.
    ///
    /// Clears pauses, session events and every subject's captured samples.
    /// Registrations and metadata carry over.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        if !self.is_stopped() {
            return Err(RecorderError::AlreadyRecording);
        }
        self.pauses.clear();
        self.events.clear();
        for subject in &mut self.subjects {
            subject.clear_samples();
        }
        self.time_started = self.clock.now();
        self.state = RecordingState::Recording;
        log::debug!("Recording started at {:.3}", self.time_started);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), RecorderError> {
        if !self.is_recording() {
            return Err(RecorderError::NotRecording);
        }
        self.time_paused = self.clock.now();
        self.state = RecordingState::Paused;
        log::debug!("Recording paused at {:.3}", self.time_paused);
        Ok(())
    }

    /// Close the open pause interval and continue recording.
    ///
    /// If the clock reads earlier than the pause, the recorder stays paused
    /// and the call can be retried once the clock has caught up.
    pub fn resume(&mut self) -> Result<(), RecorderError> {
        if !self.is_paused() {
            return Err(RecorderError::NotPaused);
        }
        let now = self.clock.now();
        if now < self.time_paused {
            log::warn!(
                "Cannot resume: clock reads {:.3}, before pause at {:.3}",
                now,
                self.time_paused
            );
            return Err(RecorderError::InvalidPauseDuration {
                paused_at: self.time_paused,
                now,
            });
        }
        // A zero-width pause would still swallow samples stamped at its instant.
        if now > self.time_paused {
            self.pauses.push(PauseInterval::new(self.time_paused, now));
        }
        self.state = RecordingState::Recording;
        log::debug!("Recording resumed at {:.3} after {:.3}s", now, now - self.time_paused);
        Ok(())
    }

    /// End the recording and build it.
    ///
    /// A trailing pause is closed first.
    pub fn finish(&mut self) -> Result<Recording, RecorderError> {
        match self.state {
            RecordingState::Stopped => return Err(RecorderError::NotRecording),
            RecordingState::Paused => self.resume()?,
            RecordingState::Recording => {}
        }
        let now = self.clock.now();
        let recording = self.build(now, &self.pauses);
        self.state = RecordingState::Stopped;
        log::info!(
            "Recording finished: {} subjects, {} events, {:.3}s ({} pauses)",
            recording.subjects().len(),
            recording.events().len(),
            recording.duration(),
            self.pauses.len()
        );
        Ok(recording)
    }

    /// Build the recording so far without ending it.
    ///
    /// While paused, the open pause is treated as ending now for this
    /// snapshot only.
    pub fn snapshot(&self) -> Result<Recording, RecorderError> {
        let now = self.clock.now();
        match self.state {
            RecordingState::Stopped => Err(RecorderError::NotRecording),
            RecordingState::Recording => Ok(self.build(now, &self.pauses)),
            RecordingState::Paused => {
                let mut pauses = self.pauses.clone();
                if now > self.time_paused {
                    pauses.push(PauseInterval::new(self.time_paused, now));
                }
                Ok(self.build(now, &pauses))
            }
        }
    }

    fn build(&self, end: f64, pauses: &[PauseInterval]) -> Recording {
        let start = self.time_started;
        let subjects = self
            .subjects
            .iter()
            .map(|s| s.finalize(start, end, pauses))
            .collect();
        let events = finalize_discrete(&self.events, start, end, pauses);
        Recording::new(subjects, events, self.metadata.clone())
            .with_name(self.config.recording_name.clone())
    }

    // ---- subject captures ----

    /// Capture a subject's pose at the current time.
    ///
    /// Returns whether a sample was taken. Nothing is taken while paused or
    /// stopped, or when the capture rate says it is too soon.
    pub fn capture_orientation(
        &mut self,
        id: i64,
        position: DVec3,
        rotation: EulerAngles,
    ) -> Result<bool, RecorderError> {
        if !self.is_recording() {
            return Ok(false);
        }
        let now = self.clock.now();
        let rate = self.config.capture_rate;
        let timeline = self.timeline_mut(id)?;

        match rate {
            Some(fps) if fps == 0.0 => return Ok(false),
            Some(fps) if fps > 0.0 => {
                if let Some(last) = timeline.last_orientation_time() {
                    if now - last < 1.0 / fps {
                        return Ok(false);
                    }
                }
            }
            _ => {}
        }

        timeline.capture_orientation(now, position, rotation);
        Ok(true)
    }

    /// Capture a named event on a subject.
    pub fn capture_subject_event(
        &mut self,
        id: i64,
        name: impl Into<String>,
        contents: impl Into<String>,
    ) -> Result<bool, RecorderError> {
        if !self.is_recording() {
            return Ok(false);
        }
        let now = self.clock.now();
        self.timeline_mut(id)?
            .capture_custom_event(now, name, contents);
        Ok(true)
    }

    pub fn capture_lifecycle_event(
        &mut self,
        id: i64,
        kind: LifecycleKind,
    ) -> Result<bool, RecorderError> {
        if !self.is_recording() {
            return Ok(false);
        }
        let now = self.clock.now();
        self.timeline_mut(id)?.capture_lifecycle_event(now, kind);
        Ok(true)
    }

    /// Set subject metadata. Accepted in every state.
    pub fn set_subject_metadata(
        &mut self,
        id: i64,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), RecorderError> {
        self.timeline_mut(id)?.set_metadata(key, value);
        Ok(())
    }

    // ---- session captures ----

    /// Capture a session-level event, not tied to any subject.
    ///
    /// Fails while stopped; ignored while paused.
    pub fn capture_custom_event(
        &mut self,
        name: impl Into<String>,
        contents: impl Into<String>,
    ) -> Result<bool, RecorderError> {
        match self.state {
            RecordingState::Stopped => Err(RecorderError::NotRecording),
            RecordingState::Paused => Ok(false),
            RecordingState::Recording => {
                let now = self.clock.now();
                self.events
                    .push(Sample::new(now, NamedEvent::new(name, contents)));
                Ok(true)
            }
        }
    }

    /// Set session metadata. Accepted in every state.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn clear_metadata(&mut self) {
        self.metadata.clear();
    }
}
