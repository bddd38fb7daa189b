//! Package module - The `.rap` binary container for recordings.

mod codec;
mod format;
mod wire;

pub use codec::*;
pub use format::*;
pub use wire::*;
