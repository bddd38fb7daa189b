//! Per-subject capture streams with online compaction.
//!
//! Playback interpolates linearly between retained samples, so a run of
//! samples moving at constant velocity only needs its two endpoints. Each
//! new orientation sample is compared against the velocity implied by the
//! last two retained samples; if the velocity from the last retained sample
//! to the new one matches (squared difference at most `minimum_delta`), the
//! last sample is replaced rather than kept.
//!
//! Positions and rotations are compacted independently.

use glam::DVec3;

use super::finalize::{PauseInterval, finalize_continuous, finalize_discrete};
use crate::schema::{
    Continuous, DEFAULT_MINIMUM_DELTA, EulerAngles, LifecycleEventSample, LifecycleKind, Metadata,
    NamedEvent, NamedEventSample, RotationSample, Sample, SubjectRecording, VectorSample,
};

/// Append `sample`, replacing the last retained sample when it lies on the
/// trajectory already implied by the two before it.
fn push_compacted<T: Continuous>(
    samples: &mut Vec<Sample<T>>,
    sample: Sample<T>,
    minimum_delta: f64,
) {
    if let [.., before_last, last] = samples.as_slice() {
        let last_velocity = (last.value.as_vector() - before_last.value.as_vector())
            / (last.time - before_last.time);
        let velocity = (sample.value.as_vector() - last.value.as_vector()) / (sample.time - last.time);

        // NaN (repeated timestamps) never compares equal, so the sample is kept.
        if (last_velocity - velocity).length_squared() <= minimum_delta {
            samples.pop();
        }
    }
    samples.push(sample);
}

/// Raw capture streams for one subject.
#[derive(Debug, Clone)]
pub struct SubjectTimeline {
    id: i64,
    name: String,
    metadata: Metadata,
    positions: Vec<VectorSample>,
    rotations: Vec<RotationSample>,
    lifecycle: Vec<LifecycleEventSample>,
    events: Vec<NamedEventSample>,
    minimum_delta: f64,
}

impl SubjectTimeline {
    /// Create an empty timeline with the default compaction threshold.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self::with_minimum_delta(id, name, DEFAULT_MINIMUM_DELTA)
    }

    pub fn with_minimum_delta(id: i64, name: impl Into<String>, minimum_delta: f64) -> Self {
        Self {
            id,
            name: name.into(),
            metadata: Metadata::new(),
            positions: Vec::new(),
            rotations: Vec::new(),
            lifecycle: Vec::new(),
            events: Vec::new(),
            minimum_delta,
        }
    }

    /// Seed the timeline with initial metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn minimum_delta(&self) -> f64 {
        self.minimum_delta
    }

    pub fn positions(&self) -> &[VectorSample] {
        &self.positions
    }

    pub fn rotations(&self) -> &[RotationSample] {
        &self.rotations
    }

    pub fn lifecycle(&self) -> &[LifecycleEventSample] {
        &self.lifecycle
    }

    pub fn events(&self) -> &[NamedEventSample] {
        &self.events
    }

    /// Time of the most recent orientation capture.
    ///
    /// Compaction only ever replaces the last sample with a newer one, so the
    /// last retained position is always the latest capture.
    pub fn last_orientation_time(&self) -> Option<f64> {
        self.positions.last().map(|s| s.time)
    }

    /// Record position and rotation at `time`.
    pub fn capture_orientation(&mut self, time: f64, position: DVec3, rotation: EulerAngles) {
        push_compacted(
            &mut self.positions,
            Sample::new(time, position),
            self.minimum_delta,
        );
        push_compacted(
            &mut self.rotations,
            Sample::new(time, rotation),
            self.minimum_delta,
        );
    }

    pub fn capture_custom_event(
        &mut self,
        time: f64,
        name: impl Into<String>,
        contents: impl Into<String>,
    ) {
        self.events
            .push(Sample::new(time, NamedEvent::new(name, contents)));
    }

    pub fn capture_lifecycle_event(&mut self, time: f64, kind: LifecycleKind) {
        self.lifecycle.push(Sample::new(time, kind));
    }

    /// Insert or overwrite a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Drop every captured sample, keeping identity and metadata.
    pub fn clear_samples(&mut self) {
        self.positions.clear();
        self.rotations.clear();
        self.lifecycle.clear();
        self.events.clear();
    }

    /// Build the pause-free form of everything captured inside `[start, end]`.
    pub fn finalize(&self, start: f64, end: f64, pauses: &[PauseInterval]) -> SubjectRecording {
        SubjectRecording {
            id: self.id,
            name: self.name.clone(),
            metadata: self.metadata.clone(),
            positions: finalize_continuous(&self.positions, start, end, pauses),
            rotations: finalize_continuous(&self.rotations, start, end, pauses),
            lifecycle: finalize_discrete(&self.lifecycle, start, end, pauses),
            events: finalize_discrete(&self.events, start, end, pauses),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Linear interpolation over a finalized stream, clamped at both ends.
    fn sample_at(samples: &[VectorSample], time: f64) -> DVec3 {
        let i = samples.partition_point(|s| s.time <= time);
        if i == 0 {
            return samples[0].value;
        }
        if i == samples.len() {
            return samples[i - 1].value;
        }
        let (a, b) = (&samples[i - 1], &samples[i]);
        a.value.lerp(b.value, (time - a.time) / (b.time - a.time))
    }

    #[test]
    fn test_collinear_samples_collapse_to_endpoints() {
        let mut timeline = SubjectTimeline::new(1, "cube");
        for t in 0..=10 {
            let t = t as f64 * 0.1;
            timeline.capture_orientation(t, DVec3::new(t * 2.0, 0.0, -t), EulerAngles::ZERO);
        }
        assert_eq!(timeline.positions().len(), 2);
        assert_eq!(timeline.positions()[0].time, 0.0);
        assert!((timeline.positions()[1].time - 1.0).abs() < 1e-12);
        assert_eq!(timeline.rotations().len(), 2);
        assert_eq!(timeline.last_orientation_time(), Some(1.0));
    }

    #[test]
    fn test_velocity_change_is_kept() {
        let mut timeline = SubjectTimeline::new(1, "cube");
        timeline.capture_orientation(0.0, DVec3::ZERO, EulerAngles::ZERO);
        timeline.capture_orientation(1.0, DVec3::X, EulerAngles::ZERO);
        timeline.capture_orientation(2.0, DVec3::new(2.0, 0.0, 0.0), EulerAngles::ZERO);
        timeline.capture_orientation(3.0, DVec3::new(2.0, 1.0, 0.0), EulerAngles::ZERO);

        let times: Vec<f64> = timeline.positions().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_positions_and_rotations_compact_independently() {
        let mut timeline = SubjectTimeline::new(1, "spinner");
        timeline.capture_orientation(0.0, DVec3::ZERO, EulerAngles::new(0.0, 0.0, 0.0));
        timeline.capture_orientation(1.0, DVec3::ZERO, EulerAngles::new(0.0, 10.0, 0.0));
        timeline.capture_orientation(2.0, DVec3::ZERO, EulerAngles::new(0.0, 30.0, 0.0));

        // Standing still compacts; the rotation accelerates and does not.
        assert_eq!(timeline.positions().len(), 2);
        assert_eq!(timeline.rotations().len(), 3);
    }

    #[test]
    fn test_zero_minimum_delta_still_compacts_exact_lines() {
        let mut timeline = SubjectTimeline::with_minimum_delta(1, "exact", 0.0);
        for t in 0..5 {
            let t = t as f64;
            timeline.capture_orientation(t, DVec3::new(t, t, t), EulerAngles::ZERO);
        }
        assert_eq!(timeline.positions().len(), 2);
    }

    #[test]
    fn test_repeated_timestamp_is_not_compacted() {
        let mut timeline = SubjectTimeline::new(1, "stutter");
        timeline.capture_orientation(0.0, DVec3::ZERO, EulerAngles::ZERO);
        timeline.capture_orientation(1.0, DVec3::X, EulerAngles::ZERO);
        timeline.capture_orientation(1.0, DVec3::X, EulerAngles::ZERO);
        assert_eq!(timeline.positions().len(), 3);
    }

    #[test]
    fn test_events_are_never_compacted() {
        let mut timeline = SubjectTimeline::new(1, "cube");
        for t in 0..4 {
            timeline.capture_custom_event(t as f64, "tick", "");
            timeline.capture_lifecycle_event(t as f64, LifecycleKind::Enable);
        }
        assert_eq!(timeline.events().len(), 4);
        assert_eq!(timeline.lifecycle().len(), 4);
    }

    #[test]
    fn test_metadata_overwrites() {
        let mut timeline = SubjectTimeline::new(1, "cube");
        timeline.set_metadata("team", "red");
        timeline.set_metadata("team", "blue");
        assert_eq!(timeline.metadata().get("team").map(String::as_str), Some("blue"));
        assert_eq!(timeline.metadata().len(), 1);
    }

    #[test]
    fn test_pause_during_capture_shortens_duration() {
        // Collinear capture at raw 0..3 with the first second paused.
        let mut timeline = SubjectTimeline::new(1, "cube");
        for t in 0..4 {
            let t = t as f64;
            timeline.capture_orientation(t, DVec3::new(t, 0.0, 0.0), EulerAngles::ZERO);
        }
        assert_eq!(timeline.positions().len(), 2);

        let recording = timeline.finalize(0.0, 3.0, &[PauseInterval::new(0.0, 1.0)]);
        assert_eq!(recording.duration(), Some(2.0));
        assert!((recording.starting_position().x - 1.0).abs() < 1e-12);
        assert_eq!(recording.ending_position().x, 3.0);
    }

    #[test]
    fn test_pause_seam_is_continuous_on_each_side() {
        let mut timeline = SubjectTimeline::with_minimum_delta(1, "cube", 0.0);
        for t in 0..5 {
            let t = t as f64;
            // Quadratic path so compaction keeps every sample.
            timeline.capture_orientation(t, DVec3::new(t * t, 0.0, 0.0), EulerAngles::ZERO);
        }
        let recording = timeline.finalize(0.0, 4.0, &[PauseInterval::new(1.5, 2.5)]);
        let positions = &recording.positions;
        assert_eq!(positions.iter().filter(|s| s.time == 1.5).count(), 2);

        let eps = 1e-6;
        let before = sample_at(positions, 1.5 - eps);
        let entry = positions.iter().find(|s| s.time == 1.5).unwrap().value;
        assert!((before - entry).length() < 1e-4);

        let after = sample_at(positions, 1.5 + eps);
        let exit = positions.iter().rev().find(|s| s.time == 1.5).unwrap().value;
        assert!((after - exit).length() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_compaction_is_lossless(
            segments in prop::collection::vec(
                (1usize..6, -5.0f64..5.0, -5.0f64..5.0, -5.0f64..5.0),
                1..6,
            )
        ) {
            // Piecewise-constant velocity sampled on an integer grid.
            let mut raw = Vec::new();
            let mut position = DVec3::ZERO;
            let mut t = 0.0;
            raw.push(Sample::new(t, position));
            for (steps, vx, vy, vz) in segments {
                let velocity = DVec3::new(vx, vy, vz);
                for _ in 0..steps {
                    t += 1.0;
                    position += velocity;
                    raw.push(Sample::new(t, position));
                }
            }

            let mut timeline = SubjectTimeline::with_minimum_delta(1, "prop", 1e-9);
            for s in &raw {
                timeline.capture_orientation(s.time, s.value, EulerAngles::ZERO);
            }
            let recording = timeline.finalize(0.0, t, &[]);

            for s in &raw {
                let replayed = sample_at(&recording.positions, s.time);
                prop_assert!((replayed - s.value).length() < 1e-6,
                    "at t={} expected {:?} got {:?}", s.time, s.value, replayed);
            }
        }
    }
}
