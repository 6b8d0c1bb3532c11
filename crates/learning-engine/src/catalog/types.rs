//! Data structures read from the course catalog.

use serde::{Deserialize, Serialize};

use crate::error::{LearningError, Result};

/// Longest access window a policy may grant: one hundred years.
pub const MAX_DURATION_DAYS: u32 = 36_500;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for a student.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonId(pub String);

impl LessonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for LessonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterId(pub String);

impl ChapterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a published version of a course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseVersionId(pub String);

impl CourseVersionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for CourseVersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Lesson tree
// ---------------------------------------------------------------------------

/// A single lesson as seen by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    #[serde(default)]
    pub title: String,
    /// `None` means non-timed content (documents, quizzes).
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub is_preview: bool,
}

impl Lesson {
    /// Create a timed lesson.
    pub fn timed(id: impl Into<String>, duration_seconds: u32) -> Self {
        Self {
            id: LessonId::new(id),
            title: String::new(),
            duration_seconds: Some(duration_seconds),
            is_preview: false,
        }
    }

    /// Create a lesson without a known duration.
    pub fn untimed(id: impl Into<String>) -> Self {
        Self {
            id: LessonId::new(id),
            title: String::new(),
            duration_seconds: None,
            is_preview: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn preview(mut self) -> Self {
        self.is_preview = true;
        self
    }
}

/// An ordered group of lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(default)]
    pub title: String,
    pub lessons: Vec<Lesson>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, title: impl Into<String>, lessons: Vec<Lesson>) -> Self {
        Self {
            id: ChapterId::new(id),
            title: title.into(),
            lessons,
        }
    }
}

/// The full chapter/lesson tree of one course version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonTree {
    pub course_version: CourseVersionId,
    pub chapters: Vec<Chapter>,
}

impl LessonTree {
    pub fn new(course_version: CourseVersionId, chapters: Vec<Chapter>) -> Self {
        Self {
            course_version,
            chapters,
        }
    }

    /// Iterate every lesson, chapters flattened in order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.chapters.iter().flat_map(|c| c.lessons.iter())
    }

    pub fn total_lessons(&self) -> usize {
        self.chapters.iter().map(|c| c.lessons.len()).sum()
    }

    pub fn find_lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons().find(|l| &l.id == id)
    }

    /// Sum of known lesson durations.
    pub fn total_duration_seconds(&self) -> u64 {
        self.lessons()
            .filter_map(|l| l.duration_seconds)
            .map(u64::from)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Course version policy
// ---------------------------------------------------------------------------

/// Thresholds a course version imposes on completion and certification.
///
/// Scores use the same scale as quiz scores (0–10 by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseVersionPolicy {
    pub pass_score: f64,
    /// Minimum completion percentage, 0–100.
    pub min_progress_pct: f64,
    /// Default final exam weight `k` for enrollments that do not set their own.
    #[serde(default)]
    pub final_weight: Option<f64>,
    /// Access window length. `None` or `0` means unbounded.
    #[serde(default)]
    pub duration_days: Option<u32>,
}

impl CourseVersionPolicy {
    pub fn new(pass_score: f64, min_progress_pct: f64) -> Self {
        Self {
            pass_score,
            min_progress_pct,
            final_weight: None,
            duration_days: None,
        }
    }

    pub fn with_final_weight(mut self, k: f64) -> Self {
        self.final_weight = Some(k);
        self
    }

    pub fn with_duration_days(mut self, days: u32) -> Self {
        self.duration_days = Some(days);
        self
    }

    /// Reject policies that could never be satisfied or are malformed.
    pub fn validate(&self) -> Result<()> {
        if !self.pass_score.is_finite() || self.pass_score < 0.0 {
            return Err(LearningError::InvalidInput(format!(
                "pass score must be a non-negative number, got {}",
                self.pass_score
            )));
        }
        if !(0.0..=100.0).contains(&self.min_progress_pct) {
            return Err(LearningError::InvalidInput(format!(
                "minimum progress must be 0-100, got {}",
                self.min_progress_pct
            )));
        }
        if let Some(k) = self.final_weight {
            crate::score::validate_final_weight(k)?;
        }
        if let Some(days) = self.duration_days {
            if days > MAX_DURATION_DAYS {
                return Err(LearningError::InvalidInput(format!(
                    "access window must be at most {MAX_DURATION_DAYS} days, got {days}"
                )));
            }
        }
        Ok(())
    }
}
