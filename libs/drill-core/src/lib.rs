//! Spaced-repetition scheduling for drill questions.
//!
//! Provides:
//! - Question scheduling state and rating types
//! - The review scheduler (an SM-2 variant with learning steps)
//! - Input validation errors

pub mod error;
pub mod scheduler;
pub mod types;

pub use error::{DrillError, Result};
pub use scheduler::{advance, advance_with_label, SchedulingResult};
pub use types::{get_state_name, QuestionState, Rating, ReviewItem};
