//! Time marching of a flood event.
//!
//! The event loop couples the steady backwater solve with explicit bed
//! updates under a CFL-limited internal step.

mod event;

pub use event::{EventConfig, EventError, EventResult, compute_event};
