#![deny(clippy::all)]

//! # recall-algo - spaced repetition scheduling core
//!
//! Pure Rust implementation of the memory-scheduling engine:
//!
//! - **MemoryModel** - per-item scheduling state (stability, difficulty,
//!   review state, counters)
//! - **Scheduler** - pure transition functions mapping (model, rating, now)
//!   to the next model, plus non-committing previews for all four ratings
//!
//! Design goals:
//! - **Pure** - no I/O, no clocks, no ambient randomness; callers pass
//!   `now` and the interval fuzz stream is seeded, so every function is
//!   reproducible
//! - **Self-contained** - the memory model is implemented here rather than
//!   wrapped from a third-party scheduling library
//! - **Fully tested** - every state transition and invariant has unit
//!   coverage
//!
//! Module structure:
//! - [`types`] - memory model, rating scale, review states, errors
//! - [`scheduler`] - forgetting curve, stability/difficulty updates,
//!   learning-step ladder, interval computation

pub mod scheduler;
pub mod types;

pub use scheduler::{retrievability, Scheduler, SchedulerParams, SchedulingPreview};
pub use types::{
    MemoryModel, Rating, ReviewState, SchedulerError, DIFFICULTY_MAX, DIFFICULTY_MIN,
    INITIAL_DIFFICULTY, INITIAL_STABILITY, STABILITY_FLOOR,
};
