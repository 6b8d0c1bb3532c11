//! Data structures for lesson progress.

use serde::{Deserialize, Serialize};

use crate::catalog::{CourseVersionId, LessonId, StudentId};

// ---------------------------------------------------------------------------
// Progress status
// ---------------------------------------------------------------------------

/// How far a student has got with one lesson.
///
/// The variants are ordered; a record's status only ever moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    #[default]
    NotViewed,
    Viewed,
    Completed,
}

impl ProgressStatus {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotViewed => "not_viewed",
            Self::Viewed => "viewed",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Progress key
// ---------------------------------------------------------------------------

/// Unique key of a progress record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgressKey {
    pub student_id: StudentId,
    pub lesson_id: LessonId,
    pub course_version_id: CourseVersionId,
}

impl ProgressKey {
    pub fn new(
        student_id: StudentId,
        lesson_id: LessonId,
        course_version_id: CourseVersionId,
    ) -> Self {
        Self {
            student_id,
            lesson_id,
            course_version_id,
        }
    }
}

impl std::fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.student_id, self.course_version_id, self.lesson_id
        )
    }
}

// ---------------------------------------------------------------------------
// Progress record
// ---------------------------------------------------------------------------

/// One student's interaction with one lesson of one course version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(flatten)]
    pub key: ProgressKey,
    pub status: ProgressStatus,
    pub times_viewed: u32,
    pub watched_duration_seconds: u64,
    pub first_viewed_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub last_accessed_at: Option<u64>,
}

impl Progress {
    /// Create an untouched record.
    pub fn new(key: ProgressKey) -> Self {
        Self {
            key,
            status: ProgressStatus::NotViewed,
            times_viewed: 0,
            watched_duration_seconds: 0,
            first_viewed_at: None,
            completed_at: None,
            last_accessed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }

    /// Check the record invariants:
    /// `Completed ⇒ completed_at` is set and `NotViewed ⇒ times_viewed = 0`.
    pub fn is_consistent(&self) -> bool {
        let completed_ok = self.status != ProgressStatus::Completed || self.completed_at.is_some();
        let not_viewed_ok = self.status != ProgressStatus::NotViewed || self.times_viewed == 0;
        completed_ok && not_viewed_ok
    }
}

/// Result of a progress operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub progress: Progress,
    /// True only for the call that moved the record into `Completed`.
    pub newly_completed: bool,
}
