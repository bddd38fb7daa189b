//! Record module - Capture, compaction and pause-aware finalization.

mod clock;
mod finalize;
mod recorder;
mod timeline;

pub use clock::*;
pub use finalize::*;
pub use recorder::*;
pub use timeline::*;
