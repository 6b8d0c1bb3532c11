//! Completion aggregation.
//!
//! Derives an enrollment's completion percentage from the progress records
//! of its student and course version:
//!
//! ```text
//! completion_percentage = 100 × completed_lessons / total_lessons
//! ```
//!
//! A course version with no lessons reports 0. Reaching 100% only makes an
//! enrollment eligible for completion; it never changes enrollment status.

pub mod engine;
pub mod report;

pub use engine::{completion_percentage, compute_completion, CompletionSummary};
pub use report::{build_report, ChapterProgress, CourseProgressReport, LessonProgressView};
