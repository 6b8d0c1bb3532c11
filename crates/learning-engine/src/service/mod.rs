//! Service layer: locking, persistence and logging around the pure
//! transitions of the domain modules.

pub mod engine;
pub mod reports;

pub use engine::LearningService;
pub use reports::{
    build_course_stats, build_student_overview, CourseStats, CourseSummary, EnrollmentProgress,
    StudentOverview,
};
