//! Schema module - Capture values, finalized recordings and configuration.

mod capture;
mod config;
mod recording;

pub use capture::*;
pub use config::*;
pub use recording::*;
