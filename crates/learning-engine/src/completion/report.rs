//! Per-chapter and per-lesson progress breakdown.

use serde::{Deserialize, Serialize};

use crate::catalog::{ChapterId, CourseVersionId, LessonId, LessonTree, StudentId};
use crate::progress::{Progress, ProgressStatus};

use super::engine::{completion_percentage, index_by_lesson};

/// Progress of one lesson as shown to a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgressView {
    pub lesson_id: LessonId,
    pub title: String,
    pub duration_seconds: Option<u32>,
    pub is_preview: bool,
    pub status: ProgressStatus,
    pub times_viewed: u32,
    pub watched_duration_seconds: u64,
    pub completed_at: Option<u64>,
}

/// Progress of one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterProgress {
    pub chapter_id: ChapterId,
    pub title: String,
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub completion_percentage: f64,
    pub lessons: Vec<LessonProgressView>,
}

/// Aggregated progress of a student in a course version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgressReport {
    pub student_id: StudentId,
    pub course_version_id: CourseVersionId,
    pub total_lessons: usize,
    pub completed_lessons: usize,
    /// Lessons with any progress beyond `NotViewed`.
    pub viewed_lessons: usize,
    pub completion_percentage: f64,
    pub total_duration_seconds: u64,
    pub watched_duration_seconds: u64,
    pub average_score: Option<f64>,
    pub chapters: Vec<ChapterProgress>,
}

/// Build the breakdown for one student from the lesson tree and their records.
pub fn build_report(
    student_id: &StudentId,
    tree: &LessonTree,
    progress: &[Progress],
    average_score: Option<f64>,
) -> CourseProgressReport {
    let by_lesson = index_by_lesson(progress);

    let mut chapters = Vec::with_capacity(tree.chapters.len());
    let mut completed_lessons = 0;
    let mut viewed_lessons = 0;
    let mut watched_duration_seconds = 0;

    for chapter in &tree.chapters {
        let mut lessons = Vec::with_capacity(chapter.lessons.len());
        let mut chapter_completed = 0;

        for lesson in &chapter.lessons {
            let view = match by_lesson.get(&lesson.id) {
                Some(p) => {
                    if p.status == ProgressStatus::Completed {
                        chapter_completed += 1;
                    }
                    if p.status != ProgressStatus::NotViewed {
                        viewed_lessons += 1;
                    }
                    watched_duration_seconds += p.watched_duration_seconds;
                    LessonProgressView {
                        lesson_id: lesson.id.clone(),
                        title: lesson.title.clone(),
                        duration_seconds: lesson.duration_seconds,
                        is_preview: lesson.is_preview,
                        status: p.status,
                        times_viewed: p.times_viewed,
                        watched_duration_seconds: p.watched_duration_seconds,
                        completed_at: p.completed_at,
                    }
                }
                None => LessonProgressView {
                    lesson_id: lesson.id.clone(),
                    title: lesson.title.clone(),
                    duration_seconds: lesson.duration_seconds,
                    is_preview: lesson.is_preview,
                    status: ProgressStatus::NotViewed,
                    times_viewed: 0,
                    watched_duration_seconds: 0,
                    completed_at: None,
                },
            };
            lessons.push(view);
        }

        completed_lessons += chapter_completed;
        chapters.push(ChapterProgress {
            chapter_id: chapter.id.clone(),
            title: chapter.title.clone(),
            total_lessons: chapter.lessons.len(),
            completed_lessons: chapter_completed,
            completion_percentage: completion_percentage(chapter_completed, chapter.lessons.len()),
            lessons,
        });
    }

    let total_lessons = tree.total_lessons();
    CourseProgressReport {
        student_id: student_id.clone(),
        course_version_id: tree.course_version.clone(),
        total_lessons,
        completed_lessons,
        viewed_lessons,
        completion_percentage: completion_percentage(completed_lessons, total_lessons),
        total_duration_seconds: tree.total_duration_seconds(),
        watched_duration_seconds,
        average_score,
        chapters,
    }
}
