//! Learning engine: lesson progress, completion, enrollment lifecycle and
//! certification for online courses.
//!
//! Tracks per-lesson progress, derives each enrollment's completion
//! percentage, aggregates quiz and final exam scores, gates enrollment
//! completion on progress and score thresholds, and issues, revokes and
//! verifies certificates exactly once per enrollment.

pub mod catalog;
pub mod certificate;
pub mod completion;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod locks;
pub mod progress;
pub mod random;
pub mod score;
pub mod service;
pub mod storage;
pub mod time;

// Re-export primary types
pub use config::EngineConfig;
pub use error::{LearningError, Result};
pub use service::LearningService;

// Re-export catalog types
pub use catalog::{
    Chapter, ChapterId, CourseVersionId, CourseVersionPolicy, Lesson, LessonCatalog, LessonId,
    LessonTree, PolicySource, StaticCatalog, StudentId, MAX_DURATION_DAYS,
};

// Re-export progress and completion types
pub use completion::{ChapterProgress, CourseProgressReport, LessonProgressView};
pub use progress::{Progress, ProgressKey, ProgressStatus, ProgressUpdate};

// Re-export enrollment types
pub use enrollment::{CancellationKind, Enrollment, EnrollmentId, EnrollmentStatus};

// Re-export certificate types
pub use certificate::{
    Certificate, CertificateId, CertificateVerification, EligibilityReport, Grade, IssueResult,
    VerificationStatus,
};

// Re-export storage and report types
pub use service::{CourseStats, CourseSummary, StudentOverview};
pub use storage::{FileStore, LearningStore, MemoryStore};
pub use time::{Clock, ManualClock, SystemClock};
