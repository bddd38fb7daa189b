//! Host seams for playback.
//!
//! The engine never draws anything itself. For every subject it asks an
//! [`ActorFactory`] for a [`Representation`], then pushes interpolated poses
//! and visibility into it each tick. Named events are dispatched to an
//! [`EventSink`].

use glam::{DQuat, DVec3};

use crate::schema::{Metadata, NamedEvent, NamedEventSample, SubjectRecording};

/// Interpolated state of one subject at one playback time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: DVec3,
    pub rotation: DQuat,
    pub visible: bool,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            visible: true,
        }
    }
}

/// Something the host draws for a subject during playback.
pub trait Representation {
    fn set_pose(&mut self, position: DVec3, rotation: DQuat);

    fn set_visible(&mut self, visible: bool);

    /// Tear the representation down when playback stops.
    ///
    /// `immediate` asks for synchronous teardown; otherwise the host may
    /// defer it (for instance to the end of its frame).
    fn release(self, immediate: bool)
    where
        Self: Sized;

    /// Apply a full pose in one call.
    fn apply(&mut self, pose: &Pose) {
        self.set_pose(pose.position, pose.rotation);
        self.set_visible(pose.visible);
    }
}

/// Builds representations for recorded subjects.
pub trait ActorFactory {
    type Actor: Representation;

    /// Build a representation, or `None` to leave the subject out of playback.
    fn build(&mut self, id: i64, name: &str, metadata: &Metadata) -> Option<Self::Actor>;
}

/// Receives named events as playback passes over them.
pub trait EventSink {
    /// `subject` is `None` for session-level events.
    fn on_event(&mut self, subject: Option<&SubjectRecording>, event: &NamedEventSample);
}

/// An event as seen by a recording sink.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredEvent {
    pub subject: Option<i64>,
    pub time: f64,
    pub event: NamedEvent,
}

impl EventSink for Vec<FiredEvent> {
    fn on_event(&mut self, subject: Option<&SubjectRecording>, event: &NamedEventSample) {
        self.push(FiredEvent {
            subject: subject.map(|s| s.id),
            time: event.time,
            event: event.value.clone(),
        });
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _subject: Option<&SubjectRecording>, _event: &NamedEventSample) {}
}

/// A representation that only remembers its latest pose.
///
/// Useful for headless playback, where the interpolated state is read back
/// rather than drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessActor {
    pub id: i64,
    pub name: String,
    pub pose: Pose,
}

impl Representation for HeadlessActor {
    fn set_pose(&mut self, position: DVec3, rotation: DQuat) {
        self.pose.position = position;
        self.pose.rotation = rotation;
    }

    fn set_visible(&mut self, visible: bool) {
        self.pose.visible = visible;
    }

    fn release(self, _immediate: bool) {}
}

/// Builds a [`HeadlessActor`] for every subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessFactory;

impl ActorFactory for HeadlessFactory {
    type Actor = HeadlessActor;

    fn build(&mut self, id: i64, name: &str, _metadata: &Metadata) -> Option<HeadlessActor> {
        Some(HeadlessActor {
            id,
            name: name.to_string(),
            pose: Pose::default(),
        })
    }
}
