//! Completion aggregation: percentage of completed lessons in a course version.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{LessonId, LessonTree};
use crate::progress::{Progress, ProgressStatus};

/// Outcome of a completion count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub completion_percentage: f64,
}

/// `100 × completed / total`, or `0` for a course version without lessons.
pub fn completion_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 * 100.0 / total as f64
}

/// Count completed lessons of `tree` among the given progress records.
///
/// Records for lessons no longer in the tree are ignored. The caller is
/// expected to pass only the records of one student.
pub fn compute_completion(tree: &LessonTree, progress: &[Progress]) -> CompletionSummary {
    let by_lesson = index_by_lesson(progress);

    let total_lessons = tree.total_lessons();
    let completed_lessons = tree
        .lessons()
        .filter(|lesson| {
            by_lesson
                .get(&lesson.id)
                .is_some_and(|p| p.status == ProgressStatus::Completed)
        })
        .count();

    CompletionSummary {
        total_lessons,
        completed_lessons,
        completion_percentage: completion_percentage(completed_lessons, total_lessons),
    }
}

/// Index progress records by lesson id.
pub(crate) fn index_by_lesson(progress: &[Progress]) -> HashMap<&LessonId, &Progress> {
    progress.iter().map(|p| (&p.key.lesson_id, p)).collect()
}
