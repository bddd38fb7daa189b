//! replay3d - Record, compact, persist and replay 3D subject state.
//!
//! A host samples the position and rotation of tracked subjects every
//! frame. This crate keeps only the samples that change a subject's
//! velocity, removes paused time when a session ends, stores sessions in
//! compressed `.rap` containers and plays them back with interpolation and
//! event dispatch in either direction.
//!
//! # Architecture
//!
//! - `schema`: Samples, finalized recordings and configuration
//! - `record`: Session recorder, per-subject timelines and pause removal
//! - `package`: The `.rap` binary container
//! - `playback`: Interpolating cursors and the playback engine
//! - `export`: JSON and CSV views of recordings
//!
//! # Example
//!
//! ```rust,no_run
//! use glam::DVec3;
//! use replay3d::{
//!     package,
//!     playback::{HeadlessFactory, NullSink, PlaybackEngine},
//!     record::{ManualClock, SessionRecorder},
//!     schema::{EulerAngles, PlaybackConfig, RecorderConfig},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = ManualClock::new(0.0);
//! let mut recorder = SessionRecorder::new(clock.clone(), RecorderConfig::default())?;
//! recorder.register_subject(1, "ball")?;
//! recorder.start()?;
//! for i in 0..60 {
//!     let t = i as f64 / 60.0;
//!     recorder.capture_orientation(1, DVec3::new(t, 0.0, 0.0), EulerAngles::ZERO)?;
//!     clock.advance(1.0 / 60.0);
//! }
//! let recording = recorder.finish()?;
//!
//! package::write_file("session.rap", std::slice::from_ref(&recording))?;
//!
//! let mut engine = PlaybackEngine::new(recording, HeadlessFactory, PlaybackConfig::default())?;
//! engine.play();
//! engine.tick(0.5, &mut NullSink);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod package;
pub mod playback;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use package::CodecError;
pub use playback::{ActorFactory, EventSink, PlaybackEngine, Pose, Representation};
pub use record::{RecorderError, SessionRecorder, SubjectTimeline};
pub use schema::{PlaybackConfig, Recording, RecorderConfig, SubjectRecording};
