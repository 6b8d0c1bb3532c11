//! Lesson progress tracking.
//!
//! The progress module provides:
//! - Per-(student, lesson, course version) progress records
//! - View counting and first-view timestamps
//! - Manual completion
//! - Monotonic watch-duration merging with auto-completion at 90%
//! - A "newly completed" signal that drives completion recomputation

pub mod engine;
pub mod types;

pub use types::{Progress, ProgressKey, ProgressStatus, ProgressUpdate};

pub use engine::{apply_watch, mark_completed, mark_viewed, AUTO_COMPLETE_RATIO};
