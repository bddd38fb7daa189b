//! Export module - One-way text views of recordings.

mod csv;
mod json;

pub use csv::*;
pub use json::*;
