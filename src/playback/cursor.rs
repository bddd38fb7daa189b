//! Per-subject playback cursor.
//!
//! A cursor remembers, for each stream, the index of the last sample at or
//! before its current time. Moving forward steps that index forward and
//! moving backward steps it back, so a tick costs time proportional to the
//! samples actually passed rather than to the length of the stream.
//!
//! Times given to a cursor are playback times: 0 is the recording's start.

use std::sync::Arc;

use glam::{DQuat, DVec3};

use super::actor::{EventSink, NullSink, Pose};
use crate::schema::{NamedEventSample, Recording, Sample, SubjectRecording};

/// Index of the last sample at or before `time`, or 0 if there is none.
fn seek<T>(samples: &[Sample<T>], time: f64) -> usize {
    samples
        .partition_point(|s| s.time <= time)
        .saturating_sub(1)
}

/// Move a resolved index so it is again the last sample at or before `time`.
fn step<T>(samples: &[Sample<T>], mut index: usize, time: f64, forward: bool) -> usize {
    if forward {
        while index + 1 < samples.len() && samples[index + 1].time <= time {
            index += 1;
        }
    } else {
        while index > 0 && samples[index].time > time {
            index -= 1;
        }
    }
    index
}

/// Blend between the sample at `index` and the one after it.
///
/// Before the first sample the first value holds, after the last the last.
fn blend_at<T: Copy, U>(
    samples: &[Sample<T>],
    index: usize,
    time: f64,
    convert: impl Fn(T) -> U,
    blend: impl Fn(U, U, f64) -> U,
) -> Option<U> {
    let a = samples.get(index)?;
    match samples.get(index + 1) {
        Some(b) if time > a.time => {
            let span = b.time - a.time;
            let f = if span <= 0.0 {
                1.0
            } else {
                ((time - a.time) / span).clamp(0.0, 1.0)
            };
            Some(blend(convert(a.value), convert(b.value), f))
        }
        _ => Some(convert(a.value)),
    }
}

/// Call `f` for every event passed when moving from `from` to `to`, in the
/// order playback meets them.
///
/// The range includes `from` and excludes `to` (`[from, to)` forward,
/// `(to, from]` backward), so consecutive moves never report an event twice.
/// With `include_end` the destination is included as well.
pub(crate) fn for_each_event_between(
    events: &[NamedEventSample],
    from: f64,
    to: f64,
    include_end: bool,
    mut f: impl FnMut(&NamedEventSample),
) {
    if to > from {
        let lo = events.partition_point(|e| e.time < from);
        let hi = if include_end {
            events.partition_point(|e| e.time <= to)
        } else {
            events.partition_point(|e| e.time < to)
        };
        for event in events.get(lo..hi).unwrap_or_default() {
            f(event);
        }
    } else if to < from {
        let lo = if include_end {
            events.partition_point(|e| e.time < to)
        } else {
            events.partition_point(|e| e.time <= to)
        };
        let hi = events.partition_point(|e| e.time <= from);
        for event in events.get(lo..hi).unwrap_or_default().iter().rev() {
            f(event);
        }
    }
}

/// Playback state of one subject.
#[derive(Debug, Clone)]
pub struct ActorCursor {
    recording: Arc<Recording>,
    subject: usize,
    /// Recording time at playback time 0.
    offset: f64,
    time: f64,
    position_index: usize,
    rotation_index: usize,
    /// Number of lifecycle events at or before `time`.
    lifecycle_seen: usize,
    has_start: bool,
}

impl ActorCursor {
    /// Cursor for the `subject`-th subject of `recording`, placed at `time`.
    pub fn new(recording: Arc<Recording>, subject: usize, time: f64) -> Option<Self> {
        let s = recording.subjects().get(subject)?;
        let offset = recording.start_time();
        let rt = time + offset;
        let position_index = seek(&s.positions, rt);
        let rotation_index = seek(&s.rotations, rt);
        let lifecycle_seen = s.lifecycle.partition_point(|l| l.time <= rt);
        let has_start = s.has_start_event();
        Some(Self {
            recording,
            subject,
            offset,
            time,
            position_index,
            rotation_index,
            lifecycle_seen,
            has_start,
        })
    }

    pub fn subject(&self) -> &SubjectRecording {
        &self.recording.subjects()[self.subject]
    }

    pub fn recording(&self) -> &Arc<Recording> {
        &self.recording
    }

    /// Current playback time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Interpolated pose at the current time.
    pub fn pose(&self) -> Pose {
        let s = self.subject();
        let rt = self.time + self.offset;
        let position = blend_at(&s.positions, self.position_index, rt, |v| v, DVec3::lerp)
            .unwrap_or(DVec3::ZERO);
        let rotation = blend_at(
            &s.rotations,
            self.rotation_index,
            rt,
            |e| e.to_quat(),
            DQuat::slerp,
        )
        .unwrap_or(DQuat::IDENTITY);
        Pose {
            position,
            rotation,
            visible: self.visible(),
        }
    }

    /// Whether the subject exists and is enabled at the current time.
    ///
    /// A subject with a `Start` event is hidden until its first lifecycle
    /// event; one without is assumed to predate the recording.
    pub fn visible(&self) -> bool {
        match self.subject().lifecycle[..self.lifecycle_seen].last() {
            Some(latest) => !latest.value.hides(),
            None => !self.has_start,
        }
    }

    fn move_to(&mut self, time: f64) -> Option<Pose> {
        if time == self.time {
            return None;
        }
        let forward = time > self.time;
        let rt = time + self.offset;

        let s = &self.recording.subjects()[self.subject];
        self.position_index = step(&s.positions, self.position_index, rt, forward);
        self.rotation_index = step(&s.rotations, self.rotation_index, rt, forward);
        if forward {
            while self.lifecycle_seen < s.lifecycle.len()
                && s.lifecycle[self.lifecycle_seen].time <= rt
            {
                self.lifecycle_seen += 1;
            }
        } else {
            while self.lifecycle_seen > 0 && s.lifecycle[self.lifecycle_seen - 1].time > rt {
                self.lifecycle_seen -= 1;
            }
        }

        self.time = time;
        Some(self.pose())
    }

    fn advance<S: EventSink>(
        &mut self,
        time: f64,
        include_end: bool,
        sink: &mut S,
    ) -> Option<Pose> {
        let from = self.time;
        let pose = self.move_to(time)?;
        let subject = self.subject();
        for_each_event_between(
            &subject.events,
            from + self.offset,
            time + self.offset,
            include_end,
            |event| sink.on_event(Some(subject), event),
        );
        Some(pose)
    }

    /// Move to `time`, reporting the subject's events passed on the way.
    ///
    /// Returns the new pose, or `None` if `time` is the current time.
    pub fn play_to<S: EventSink>(&mut self, time: f64, sink: &mut S) -> Option<Pose> {
        self.advance(time, false, sink)
    }

    /// Like [`play_to`](Self::play_to), but events exactly at `time` are
    /// reported too. Used when playback reaches either end of the recording.
    pub fn play_through<S: EventSink>(&mut self, time: f64, sink: &mut S) -> Option<Pose> {
        self.advance(time, true, sink)
    }

    /// Move to `time` without reporting events.
    pub fn skip_to(&mut self, time: f64) -> Option<Pose> {
        self.advance(time, false, &mut NullSink)
    }
}
