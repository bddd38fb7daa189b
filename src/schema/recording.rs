//! Finalized, immutable recordings.

use std::collections::BTreeMap;

use glam::{DQuat, DVec3};

use super::{
    LifecycleEventSample, LifecycleKind, NamedEventSample, RotationSample, Sample, VectorSample,
};

/// Key/value pairs with no timestamp, kept in ascending key order.
pub type Metadata = BTreeMap<String, String>;

/// Pause-free timeline of a single subject.
///
/// Positions and rotations are compacted independently, so the two sequences
/// may differ in length and in the timestamps they retain. Times are on the
/// recorder's clock with pauses removed; they do not necessarily start at 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubjectRecording {
    pub id: i64,
    pub name: String,
    pub metadata: Metadata,
    pub positions: Vec<VectorSample>,
    pub rotations: Vec<RotationSample>,
    pub lifecycle: Vec<LifecycleEventSample>,
    pub events: Vec<NamedEventSample>,
}

fn span<T>(samples: &[Sample<T>]) -> Option<f64> {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => Some(last.time - first.time),
        _ => None,
    }
}

fn first_time<T>(samples: &[Sample<T>]) -> Option<f64> {
    samples.first().map(|s| s.time)
}

impl SubjectRecording {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether any stream holds at least one sample.
    pub fn has_samples(&self) -> bool {
        !(self.positions.is_empty()
            && self.rotations.is_empty()
            && self.lifecycle.is_empty()
            && self.events.is_empty())
    }

    /// Longest first-to-last span across all four streams.
    ///
    /// `None` when the subject captured nothing.
    pub fn duration(&self) -> Option<f64> {
        [
            span(&self.positions),
            span(&self.rotations),
            span(&self.lifecycle),
            span(&self.events),
        ]
        .into_iter()
        .flatten()
        .reduce(f64::max)
    }

    /// Earliest timestamp across all four streams.
    pub fn start_time(&self) -> Option<f64> {
        [
            first_time(&self.positions),
            first_time(&self.rotations),
            first_time(&self.lifecycle),
            first_time(&self.events),
        ]
        .into_iter()
        .flatten()
        .reduce(f64::min)
    }

    pub fn starting_position(&self) -> DVec3 {
        self.positions.first().map_or(DVec3::ZERO, |s| s.value)
    }

    pub fn ending_position(&self) -> DVec3 {
        self.positions.last().map_or(DVec3::ZERO, |s| s.value)
    }

    pub fn starting_rotation(&self) -> DQuat {
        self.rotations
            .first()
            .map_or(DQuat::IDENTITY, |s| s.value.to_quat())
    }

    pub fn ending_rotation(&self) -> DQuat {
        self.rotations
            .last()
            .map_or(DQuat::IDENTITY, |s| s.value.to_quat())
    }

    /// Whether the subject was instantiated during the recording rather than
    /// existing before it began.
    pub fn has_start_event(&self) -> bool {
        self.lifecycle
            .iter()
            .any(|s| s.value == LifecycleKind::Start)
    }
}

/// A complete session: every subject plus session-level events and metadata.
///
/// Built once by the recorder (or the decoder) and never mutated afterwards,
/// so it can be shared freely behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recording {
    name: String,
    subjects: Vec<SubjectRecording>,
    events: Vec<NamedEventSample>,
    metadata: Metadata,
}

impl Recording {
    pub fn new(
        subjects: Vec<SubjectRecording>,
        events: Vec<NamedEventSample>,
        metadata: Metadata,
    ) -> Self {
        Self {
            name: String::new(),
            subjects,
            events,
            metadata,
        }
    }

    /// Same recording under a different name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subjects(&self) -> &[SubjectRecording] {
        &self.subjects
    }

    /// Look a subject up by id.
    pub fn subject(&self, id: i64) -> Option<&SubjectRecording> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Session-level events, not tied to any subject.
    pub fn events(&self) -> &[NamedEventSample] {
        &self.events
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Longest subject duration, or 0 when no subject captured anything.
    pub fn duration(&self) -> f64 {
        self.subjects
            .iter()
            .filter_map(SubjectRecording::duration)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Earliest subject timestamp, or 0 when no subject captured anything.
    ///
    /// Playback time 0 corresponds to this instant.
    pub fn start_time(&self) -> f64 {
        self.subjects
            .iter()
            .filter_map(SubjectRecording::start_time)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NamedEvent;

    fn subject(id: i64, times: &[f64]) -> SubjectRecording {
        let mut s = SubjectRecording::new(id, format!("subject-{id}"));
        s.positions = times
            .iter()
            .map(|&t| Sample::new(t, DVec3::splat(t)))
            .collect();
        s
    }

    #[test]
    fn test_subject_duration_uses_longest_stream() {
        let mut s = subject(1, &[2.0, 3.0]);
        s.events.push(Sample::new(1.0, NamedEvent::new("a", "")));
        s.events.push(Sample::new(5.0, NamedEvent::new("b", "")));
        assert_eq!(s.duration(), Some(4.0));
        assert_eq!(s.start_time(), Some(1.0));
    }

    #[test]
    fn test_empty_subject_has_no_duration() {
        let s = SubjectRecording::new(7, "empty");
        assert!(!s.has_samples());
        assert_eq!(s.duration(), None);
        assert_eq!(s.start_time(), None);
        assert_eq!(s.starting_position(), DVec3::ZERO);
        assert_eq!(s.ending_rotation(), DQuat::IDENTITY);
    }

    #[test]
    fn test_recording_duration_and_start() {
        let recording = Recording::new(
            vec![
                subject(1, &[1.0, 2.0]),
                subject(2, &[0.5, 3.5]),
                SubjectRecording::new(3, "nothing"),
            ],
            vec![],
            Metadata::new(),
        );
        assert_eq!(recording.duration(), 3.0);
        assert_eq!(recording.start_time(), 0.5);
    }

    #[test]
    fn test_recording_without_subjects() {
        let recording = Recording::default();
        assert_eq!(recording.duration(), 0.0);
        assert_eq!(recording.start_time(), 0.0);
        assert!(recording.subject(1).is_none());
    }

    #[test]
    fn test_endpoints() {
        let s = subject(1, &[0.0, 1.0, 4.0]);
        assert_eq!(s.starting_position(), DVec3::ZERO);
        assert_eq!(s.ending_position(), DVec3::splat(4.0));
    }

    #[test]
    fn test_with_name() {
        let r = Recording::default().with_name("take 3");
        assert_eq!(r.name(), "take 3");
    }
}
