//! Course catalog: the read-only collaborators the engine consumes.
//!
//! The engine never owns course content. It asks a [`LessonCatalog`] for the
//! chapter/lesson tree of a course version and a [`PolicySource`] for the
//! thresholds that gate completion and certification.
//!
//! [`StaticCatalog`] is an in-memory implementation of both traits, loadable
//! from a JSON catalog file.

pub mod static_catalog;
pub mod types;

pub use static_catalog::{CourseVersionEntry, StaticCatalog};
pub use types::{
    Chapter, ChapterId, CourseVersionId, CourseVersionPolicy, Lesson, LessonId, LessonTree,
    StudentId, MAX_DURATION_DAYS,
};

use crate::error::{LearningError, Result};

/// Source of a course version's chapter/lesson tree.
pub trait LessonCatalog: Send + Sync {
    /// Return the full lesson tree of a course version.
    fn lesson_tree(&self, course_version: &CourseVersionId) -> Result<LessonTree>;

    /// Return one lesson of a course version.
    fn lesson(&self, course_version: &CourseVersionId, lesson: &LessonId) -> Result<Lesson> {
        self.lesson_tree(course_version)?
            .find_lesson(lesson)
            .cloned()
            .ok_or_else(|| {
                LearningError::NotFound(format!(
                    "lesson {} in course version {}",
                    lesson, course_version
                ))
            })
    }
}

/// Source of course version policy.
pub trait PolicySource: Send + Sync {
    fn policy(&self, course_version: &CourseVersionId) -> Result<CourseVersionPolicy>;
}
