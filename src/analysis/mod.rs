//! Post-processing and run instrumentation.
//!
//! - [`Envelope`]: per-section maxima over an event and their times
//! - [`Performance`]: wall-clock timer and solver counters

mod envelope;
mod performance;

pub use envelope::Envelope;
pub use performance::Performance;
