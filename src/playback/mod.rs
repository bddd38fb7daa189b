//! Playback module - Interpolating recordings back onto host representations.

mod actor;
mod cursor;
mod engine;

pub use actor::*;
pub use cursor::*;
pub use engine::*;
