//! Stress test: a large course with many students. Completion, reports and
//! course statistics must stay exact at scale.

use std::sync::Arc;

use learning_engine::{
    Chapter, CourseVersionId, CourseVersionPolicy, LearningService, Lesson, LessonId,
    ManualClock, MemoryStore, StaticCatalog, StudentId,
};

const T0: u64 = 1_700_000_000_000_000;
const CHAPTERS: usize = 20;
const LESSONS_PER_CHAPTER: usize = 25;
const STUDENTS: usize = 20;

fn big_course() -> (LearningService, CourseVersionId) {
    let version = CourseVersionId::new("big-v1");
    let chapters = (0..CHAPTERS)
        .map(|c| {
            let lessons = (0..LESSONS_PER_CHAPTER)
                .map(|l| Lesson::timed(format!("c{c}-l{l}"), 60))
                .collect();
            Chapter::new(format!("ch-{c}"), format!("Chapter {c}"), lessons)
        })
        .collect();

    let mut catalog = StaticCatalog::new();
    catalog
        .add_course(version.clone(), CourseVersionPolicy::new(6.0, 50.0), chapters)
        .expect("valid course");
    let service = LearningService::with_catalog(Arc::new(catalog), Arc::new(MemoryStore::new()))
        .with_clock(Arc::new(ManualClock::new(T0)));
    (service, version)
}

#[test]
fn stress_500_lessons_completion_is_exact() {
    let (service, version) = big_course();
    let student = StudentId::new("mallory");
    let e = service.enroll(&student, &version).expect("enroll");
    let total = CHAPTERS * LESSONS_PER_CHAPTER;

    for c in 0..CHAPTERS {
        // Chapter `c` gets its first `c` lessons completed.
        for l in 0..c.min(LESSONS_PER_CHAPTER) {
            service
                .mark_completed(&student, &LessonId::new(format!("c{c}-l{l}")), &version)
                .expect("complete");
        }
    }
    let completed: usize = (0..CHAPTERS).map(|c| c.min(LESSONS_PER_CHAPTER)).sum();

    let e = service.recompute(&e.id).expect("recompute");
    let expected = completed as f64 / total as f64 * 100.0;
    assert!((e.completion_percentage - expected).abs() < 1e-9);

    let report = service.course_progress(&e.id).expect("report");
    assert_eq!(report.total_lessons, total);
    assert_eq!(report.completed_lessons, completed);
    assert_eq!(report.chapters.len(), CHAPTERS);
    for (i, chapter) in report.chapters.iter().enumerate() {
        assert_eq!(chapter.completed_lessons, i.min(LESSONS_PER_CHAPTER));
        assert_eq!(chapter.lessons.len(), LESSONS_PER_CHAPTER);
    }
    assert_eq!(report.total_duration_seconds, (total * 60) as u64);
}

#[test]
fn stress_many_students_course_stats() {
    let (service, version) = big_course();
    let lessons: Vec<LessonId> = (0..CHAPTERS)
        .flat_map(|c| (0..LESSONS_PER_CHAPTER).map(move |l| LessonId::new(format!("c{c}-l{l}"))))
        .collect();

    let mut certified = 0;
    for s in 0..STUDENTS {
        let student = StudentId::new(format!("student-{s:03}"));
        let e = service.enroll(&student, &version).expect("enroll");

        // Even students finish the course, odd ones stop at a quarter.
        let share = if s % 2 == 0 { lessons.len() } else { lessons.len() / 4 };
        for lesson in &lessons[..share] {
            service
                .update_watched_duration(&student, lesson, &version, 60)
                .expect("watch");
        }

        if s % 2 == 0 {
            service.record_quiz_score(&e.id, 8.0, false).expect("quiz");
            service.record_quiz_score(&e.id, 7.0, true).expect("final");
            service.issue_certificate(&e.id).expect("issue");
            certified += 1;
        }
    }

    let stats = service.course_stats(&version).expect("stats");
    assert_eq!(stats.total_enrollments, STUDENTS);
    assert_eq!(stats.completed_enrollments, certified);
    assert_eq!(stats.active_enrollments, STUDENTS - certified);
    assert_eq!(stats.certificates_issued, certified);
    assert_eq!(stats.students_with_progress, STUDENTS);
    assert!((stats.completion_rate - 50.0).abs() < 1e-9);
    assert!((stats.average_completion - 62.5).abs() < 1e-9);

    let certs = service.certificates_for_version(&version).expect("list");
    assert_eq!(certs.len(), certified);
    let mut codes: Vec<&str> = certs.iter().map(|c| c.code.as_str()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), certified, "certificate codes are unique");
}
