//! Infrastructure: timers and application state assembly.

pub mod scheduler;
pub mod state;
