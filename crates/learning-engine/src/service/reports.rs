//! Read-only summaries across enrollments.

use serde::{Deserialize, Serialize};

use crate::catalog::{CourseVersionId, StudentId};
use crate::completion::CompletionSummary;
use crate::enrollment::{Enrollment, EnrollmentId, EnrollmentStatus};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// One line of a [`StudentOverview`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub enrollment_id: EnrollmentId,
    pub course_version_id: CourseVersionId,
    /// Status with lazy expiry applied.
    pub status: EnrollmentStatus,
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub completion_percentage: f64,
    pub average_score: Option<f64>,
    pub certificate_issued: bool,
    pub remaining_days: Option<u64>,
}

/// Everything one student is enrolled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentOverview {
    pub student_id: StudentId,
    pub total_enrollments: usize,
    pub completed_enrollments: usize,
    /// Enrollments that are still functionally `Enrolled`.
    pub in_progress_enrollments: usize,
    /// Mean completion over all enrollments, 0 when there are none.
    pub average_completion: f64,
    pub total_watched_hours: f64,
    /// Mean over the enrollments that have an average score.
    pub average_score: Option<f64>,
    pub courses: Vec<CourseSummary>,
}

/// Enrollment and certification counts for one course version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStats {
    pub course_version_id: CourseVersionId,
    pub total_enrollments: usize,
    pub active_enrollments: usize,
    pub completed_enrollments: usize,
    pub cancelled_enrollments: usize,
    pub expired_enrollments: usize,
    /// Enrolled students with at least one viewed or completed lesson.
    pub students_with_progress: usize,
    /// Share of enrollments that reached `Completed`, in percent.
    pub completion_rate: f64,
    pub average_completion: f64,
    pub average_score: Option<f64>,
    pub certificates_issued: usize,
}

/// Per-enrollment input to [`build_student_overview`].
#[derive(Debug, Clone)]
pub struct EnrollmentProgress {
    pub enrollment: Enrollment,
    pub completion: CompletionSummary,
    pub watched_seconds: u64,
}

pub fn build_student_overview(
    student_id: &StudentId,
    entries: &[EnrollmentProgress],
    now: u64,
) -> StudentOverview {
    let mut courses = Vec::with_capacity(entries.len());
    let mut watched_seconds = 0u64;

    for entry in entries {
        let e = &entry.enrollment;
        watched_seconds += entry.watched_seconds;
        courses.push(CourseSummary {
            enrollment_id: e.id.clone(),
            course_version_id: e.course_version_id.clone(),
            status: e.effective_status(now),
            total_lessons: entry.completion.total_lessons,
            completed_lessons: entry.completion.completed_lessons,
            completion_percentage: entry.completion.completion_percentage,
            average_score: e.average_score,
            certificate_issued: e.certificate_issued,
            remaining_days: e.remaining_days(now),
        });
    }

    let count_status = |status: EnrollmentStatus| courses.iter().filter(|c| c.status == status).count();

    StudentOverview {
        student_id: student_id.clone(),
        total_enrollments: courses.len(),
        completed_enrollments: count_status(EnrollmentStatus::Completed),
        in_progress_enrollments: count_status(EnrollmentStatus::Enrolled),
        average_completion: mean(courses.iter().map(|c| c.completion_percentage)).unwrap_or(0.0),
        total_watched_hours: watched_seconds as f64 / SECONDS_PER_HOUR,
        average_score: mean(courses.iter().filter_map(|c| c.average_score)),
        courses,
    }
}

pub fn build_course_stats(
    course_version_id: &CourseVersionId,
    enrollments: &[Enrollment],
    students_with_progress: usize,
    now: u64,
) -> CourseStats {
    let count_status = |status: EnrollmentStatus| {
        enrollments
            .iter()
            .filter(|e| e.effective_status(now) == status)
            .count()
    };
    let total = enrollments.len();
    let completed = count_status(EnrollmentStatus::Completed);

    CourseStats {
        course_version_id: course_version_id.clone(),
        total_enrollments: total,
        active_enrollments: count_status(EnrollmentStatus::Enrolled),
        completed_enrollments: completed,
        cancelled_enrollments: count_status(EnrollmentStatus::Cancelled),
        expired_enrollments: count_status(EnrollmentStatus::Expired),
        students_with_progress,
        completion_rate: crate::completion::completion_percentage(completed, total),
        average_completion: mean(enrollments.iter().map(|e| e.completion_percentage))
            .unwrap_or(0.0),
        average_score: mean(enrollments.iter().filter_map(|e| e.average_score)),
        certificates_issued: enrollments.iter().filter(|e| e.certificate_issued).count(),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
