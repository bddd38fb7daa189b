//! Pause removal for captured streams.
//!
//! Finalization takes raw samples, a `[start, end]` window on the recorder's
//! clock and the chronological list of pause intervals, and produces a
//! timeline where every pause has collapsed to zero width. Samples after a
//! pause move left by the total duration of every pause that ended at or
//! before them.
//!
//! Discrete streams simply drop samples that fall inside a pause, ends
//! included. Continuous streams additionally get a synthesized sample on each
//! side of every pause the trajectory crosses, so interpolation is continuous
//! across the seam; a continuous sample taken at the resume instant is its
//! own exit sample.

use crate::schema::{Continuous, Sample};

/// A span of raw recorder time excluded from the finalized timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseInterval {
    pub start: f64,
    pub end: f64,
}

impl PauseInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Inclusive on both ends.
    #[inline]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

#[inline]
fn ordered(start: f64, end: f64) -> (f64, f64) {
    if end < start { (end, start) } else { (start, end) }
}

/// Total duration of pauses that ended inside the window at or before `time`.
fn shift_at(time: f64, window_start: f64, pauses: &[PauseInterval]) -> f64 {
    pauses
        .iter()
        .filter(|p| p.end > window_start && p.end <= time)
        .map(PauseInterval::duration)
        .sum()
}

fn in_pause(time: f64, pauses: &[PauseInterval]) -> bool {
    pauses.iter().any(|p| p.contains(time))
}

/// Continuous samples are swallowed by `[start, end)` only. A sample taken at
/// the instant recording resumes already sits on the seam, so it stays.
fn hidden_by_pause(time: f64, pauses: &[PauseInterval]) -> bool {
    pauses.iter().any(|p| time >= p.start && time < p.end)
}

/// Value of the straight line through `a` and `b` at `time`.
fn interpolate<T: Continuous>(a: &Sample<T>, b: &Sample<T>, time: f64) -> T {
    let span = b.time - a.time;
    if span <= 0.0 {
        return b.value;
    }
    a.value.lerp(&b.value, (time - a.time) / span)
}

/// Finalize a discrete stream (named events, lifecycle events).
pub fn finalize_discrete<T: Clone>(
    samples: &[Sample<T>],
    start: f64,
    end: f64,
    pauses: &[PauseInterval],
) -> Vec<Sample<T>> {
    let (lo, hi) = ordered(start, end);
    samples
        .iter()
        .filter(|s| s.falls_within(lo, hi) && !in_pause(s.time, pauses))
        .map(|s| s.with_time(s.time - shift_at(s.time, lo, pauses)))
        .collect()
}

/// Finalize a continuous stream (positions, rotations).
pub fn finalize_continuous<T: Continuous>(
    samples: &[Sample<T>],
    start: f64,
    end: f64,
    pauses: &[PauseInterval],
) -> Vec<Sample<T>> {
    let (lo, hi) = ordered(start, end);
    let mut out = Vec::with_capacity(samples.len() + 2 * pauses.len());
    let mut prev: Option<&Sample<T>> = None;

    for sample in samples.iter().filter(|s| s.falls_within(lo, hi)) {
        if let Some(prev) = prev {
            // Every pause touched by the segment prev -> sample, in order.
            for pause in pauses
                .iter()
                .filter(|p| p.end >= prev.time && p.start <= sample.time)
            {
                let seam = pause.start - shift_at(pause.start, lo, pauses);
                if prev.time < pause.start {
                    out.push(Sample::new(seam, interpolate(prev, sample, pause.start)));
                }
                if prev.time < pause.end && sample.time > pause.end {
                    out.push(Sample::new(seam, interpolate(prev, sample, pause.end)));
                }
            }
        }

        if !hidden_by_pause(sample.time, pauses) {
            out.push(Sample::new(
                sample.time - shift_at(sample.time, lo, pauses),
                sample.value,
            ));
        }
        prev = Some(sample);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NamedEvent;
    use glam::DVec3;

    fn line(times: &[f64]) -> Vec<Sample<DVec3>> {
        times
            .iter()
            .map(|&t| Sample::new(t, DVec3::new(t, 0.0, 0.0)))
            .collect()
    }

    fn times<T>(samples: &[Sample<T>]) -> Vec<f64> {
        samples.iter().map(|s| s.time).collect()
    }

    #[test]
    fn test_no_pauses_is_identity_within_window() {
        let raw = line(&[0.0, 1.0, 2.0]);
        let out = finalize_continuous(&raw, 0.0, 2.0, &[]);
        assert_eq!(out, raw);
    }

    #[test]
    fn test_window_is_inclusive_and_flips() {
        let raw = line(&[0.0, 1.0, 2.0, 3.0]);
        let out = finalize_continuous(&raw, 2.0, 1.0, &[]);
        assert_eq!(times(&out), vec![1.0, 2.0]);
    }

    #[test]
    fn test_pause_synthesizes_boundaries() {
        let raw = line(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let pause = PauseInterval::new(1.5, 2.5);
        let out = finalize_continuous(&raw, 0.0, 4.0, &[pause]);

        assert_eq!(times(&out), vec![0.0, 1.0, 1.5, 1.5, 2.0, 3.0]);
        // Entry boundary holds the value at raw 1.5, exit the value at raw 2.5.
        assert!((out[2].value.x - 1.5).abs() < 1e-12);
        assert!((out[3].value.x - 2.5).abs() < 1e-12);
        // Samples after the pause keep their values but move left.
        assert_eq!(out[4].value.x, 3.0);
        assert_eq!(out[5].value.x, 4.0);
    }

    #[test]
    fn test_pause_at_window_start() {
        let raw = line(&[0.0, 1.0, 2.0, 3.0]);
        let out = finalize_continuous(&raw, 0.0, 3.0, &[PauseInterval::new(0.0, 1.0)]);
        assert_eq!(times(&out), vec![0.0, 1.0, 2.0]);
        assert_eq!(out[0].value.x, 1.0);
        assert_eq!(out.last().unwrap().time - out[0].time, 2.0);
    }

    #[test]
    fn test_sample_at_resume_instant_is_kept() {
        // Last capture lands exactly when recording resumed.
        let raw = line(&[0.0, 1.0, 3.0]);
        let out = finalize_continuous(&raw, 0.0, 3.0, &[PauseInterval::new(1.0, 3.0)]);
        assert_eq!(times(&out), vec![0.0, 1.0, 1.0]);
        assert_eq!(out[1].value.x, 1.0);
        assert_eq!(out[2].value.x, 3.0);
    }

    #[test]
    fn test_resume_sample_followed_by_more_is_not_duplicated() {
        let raw = line(&[0.0, 1.0, 3.0, 4.0]);
        let out = finalize_continuous(&raw, 0.0, 4.0, &[PauseInterval::new(1.0, 3.0)]);
        assert_eq!(times(&out), vec![0.0, 1.0, 1.0, 2.0]);
        assert_eq!(out[2].value.x, 3.0);
    }

    #[test]
    fn test_first_sample_at_resume_instant_is_kept() {
        let raw = line(&[2.0, 3.0]);
        let out = finalize_continuous(&raw, 0.0, 3.0, &[PauseInterval::new(0.5, 2.0)]);
        assert_eq!(times(&out), vec![0.5, 1.5]);
        assert_eq!(out[0].value.x, 2.0);
    }

    #[test]
    fn test_straddled_pause_gets_both_boundaries() {
        // No raw sample lands inside the pause.
        let raw = line(&[0.0, 4.0]);
        let out = finalize_continuous(&raw, 0.0, 4.0, &[PauseInterval::new(1.0, 2.0)]);
        assert_eq!(times(&out), vec![0.0, 1.0, 1.0, 3.0]);
        assert!((out[1].value.x - 1.0).abs() < 1e-12);
        assert!((out[2].value.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_multiple_pauses_accumulate() {
        let raw = line(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let pauses = [PauseInterval::new(0.5, 1.5), PauseInterval::new(3.5, 4.5)];
        let out = finalize_continuous(&raw, 0.0, 6.0, &pauses);
        assert_eq!(
            times(&out),
            vec![0.0, 0.5, 0.5, 1.0, 2.0, 2.5, 2.5, 3.0, 4.0]
        );
        for pair in out.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[test]
    fn test_discrete_drops_paused_and_shifts() {
        let raw: Vec<_> = [0.5, 1.5, 2.0, 2.5, 3.0]
            .iter()
            .map(|&t| Sample::new(t, NamedEvent::new(format!("e{t}"), "")))
            .collect();
        let out = finalize_discrete(&raw, 0.0, 4.0, &[PauseInterval::new(1.5, 2.5)]);
        assert_eq!(times(&out), vec![0.5, 2.0]);
        assert_eq!(out[1].value.name, "e3");
    }

    #[test]
    fn test_discrete_outside_window_dropped() {
        let raw = vec![Sample::new(-1.0, ()), Sample::new(1.0, ()), Sample::new(9.0, ())];
        let out = finalize_discrete(&raw, 0.0, 5.0, &[]);
        assert_eq!(times(&out), vec![1.0]);
    }
}
