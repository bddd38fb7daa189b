//! Time-stamped capture values.
//!
//! Every stream a subject produces is a sequence of [`Sample`]s sorted by
//! time. The payload decides what kind of stream it is:
//!
//! - [`VectorSample`]: a position in world space
//! - [`RotationSample`]: an orientation as Euler angles in degrees
//! - [`LifecycleEventSample`]: a discrete lifecycle transition
//! - [`NamedEventSample`]: a free-form `(name, contents)` event

use std::fmt;

use glam::{DQuat, DVec3, EulerRot};

/// A value observed at a point in time. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    /// Time the value was observed, in seconds.
    pub time: f64,
    /// The observed value.
    pub value: T,
}

impl<T> Sample<T> {
    pub fn new(time: f64, value: T) -> Self {
        Self { time, value }
    }

    /// Whether this sample falls within `[start, end]` (inclusive).
    ///
    /// A reversed range (`start > end`) is flipped before comparing.
    #[inline]
    pub fn falls_within(&self, start: f64, end: f64) -> bool {
        let (lo, hi) = if end < start { (end, start) } else { (start, end) };
        self.time >= lo && self.time <= hi
    }
}

impl<T: Clone> Sample<T> {
    /// Copy of this sample re-stamped at `time`.
    pub fn with_time(&self, time: f64) -> Self {
        Self {
            time,
            value: self.value.clone(),
        }
    }
}

/// Orientation stored as Euler angles in degrees.
///
/// Angles are applied Z first, then X, then Y (extrinsic), the usual
/// convention for Y-up engines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles(pub DVec3);

impl EulerAngles {
    pub const ZERO: Self = Self(DVec3::ZERO);

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(DVec3::new(x, y, z))
    }

    /// Raw angle vector in degrees.
    #[inline]
    pub fn degrees(&self) -> DVec3 {
        self.0
    }

    /// Convert to a quaternion for spherical interpolation.
    pub fn to_quat(&self) -> DQuat {
        DQuat::from_euler(
            EulerRot::YXZ,
            self.0.y.to_radians(),
            self.0.x.to_radians(),
            self.0.z.to_radians(),
        )
    }
}

impl From<DVec3> for EulerAngles {
    fn from(v: DVec3) -> Self {
        Self(v)
    }
}

/// Lifecycle transitions a recorded subject can go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleKind {
    /// The subject came into existence during the recording.
    Start = 0,
    Enable = 1,
    Disable = 2,
    Destroy = 3,
}

impl LifecycleKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(LifecycleKind::Start),
            1 => Some(LifecycleKind::Enable),
            2 => Some(LifecycleKind::Disable),
            3 => Some(LifecycleKind::Destroy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleKind::Start => "Start",
            LifecycleKind::Enable => "Enable",
            LifecycleKind::Disable => "Disable",
            LifecycleKind::Destroy => "Destroy",
        }
    }

    /// Whether the subject is hidden after this transition.
    #[inline]
    pub fn hides(&self) -> bool {
        matches!(self, LifecycleKind::Disable | LifecycleKind::Destroy)
    }
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A free-form key/value event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NamedEvent {
    pub name: String,
    pub contents: String,
}

impl NamedEvent {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

pub type VectorSample = Sample<DVec3>;
pub type RotationSample = Sample<EulerAngles>;
pub type LifecycleEventSample = Sample<LifecycleKind>;
pub type NamedEventSample = Sample<NamedEvent>;

/// Continuous payloads that can be interpolated and compared by velocity.
pub trait Continuous: Copy {
    /// The payload as a plain vector, used for velocity comparisons.
    fn as_vector(&self) -> DVec3;

    /// Straight-line blend between two payloads.
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Continuous for DVec3 {
    #[inline]
    fn as_vector(&self) -> DVec3 {
        *self
    }

    #[inline]
    fn lerp(&self, other: &Self, t: f64) -> Self {
        DVec3::lerp(*self, *other, t)
    }
}

impl Continuous for EulerAngles {
    #[inline]
    fn as_vector(&self) -> DVec3 {
        self.0
    }

    #[inline]
    fn lerp(&self, other: &Self, t: f64) -> Self {
        EulerAngles(self.0.lerp(other.0, t))
    }
}
