//! Stress test: many threads report watch positions and completions for
//! the same student at once. Watched time must end at the maximum report,
//! each lesson completes once, and completion lands on the true count.

use std::sync::Arc;
use std::thread;

use learning_engine::{
    Chapter, CourseVersionId, CourseVersionPolicy, LearningService, Lesson, LessonId,
    ManualClock, MemoryStore, StaticCatalog, StudentId,
};

const T0: u64 = 1_700_000_000_000_000;
const LESSONS: usize = 10;

fn setup() -> (Arc<LearningService>, CourseVersionId, StudentId) {
    let version = CourseVersionId::new("stress-v1");
    let lessons = (0..LESSONS)
        .map(|i| Lesson::timed(format!("l-{i}"), 1000))
        .collect();
    let mut catalog = StaticCatalog::new();
    catalog
        .add_course(
            version.clone(),
            CourseVersionPolicy::new(5.0, 100.0),
            vec![Chapter::new("ch-1", "All", lessons)],
        )
        .expect("valid course");

    let service = LearningService::with_catalog(Arc::new(catalog), Arc::new(MemoryStore::new()))
        .with_clock(Arc::new(ManualClock::new(T0)));
    let student = StudentId::new("ivan");
    service.enroll(&student, &version).expect("enroll");
    (Arc::new(service), version, student)
}

#[test]
fn stress_concurrent_watch_reports_keep_maximum() {
    let (service, version, student) = setup();
    let lesson = LessonId::new("l-0");

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let service = Arc::clone(&service);
            let version = version.clone();
            let student = student.clone();
            let lesson = lesson.clone();
            thread::spawn(move || {
                let mut completions = 0;
                for step in 0..50 {
                    // Positions up to 16 * 50 = 800, below the 900s threshold.
                    let seconds = i64::from(t * 50 + step + 1);
                    let update = service
                        .update_watched_duration(&student, &lesson, &version, seconds)
                        .expect("watch");
                    if update.newly_completed {
                        completions += 1;
                    }
                }
                completions
            })
        })
        .collect();

    let completions: usize = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .sum();
    assert_eq!(completions, 0);

    let progress = service
        .lesson_progress(&student, &lesson, &version)
        .expect("progress");
    assert_eq!(progress.watched_duration_seconds, 800);
    assert_eq!(progress.times_viewed, 0);
    assert!(!progress.is_completed());
}

#[test]
fn stress_concurrent_completions_count_once() {
    let (service, version, student) = setup();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let version = version.clone();
            let student = student.clone();
            thread::spawn(move || {
                let mut newly = 0;
                for i in 0..LESSONS {
                    let lesson = LessonId::new(format!("l-{i}"));
                    let update = service
                        .update_watched_duration(&student, &lesson, &version, 950)
                        .expect("watch");
                    if update.newly_completed {
                        newly += 1;
                    }
                    service
                        .mark_viewed(&student, &lesson, &version)
                        .expect("view");
                }
                newly
            })
        })
        .collect();

    let newly: usize = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .sum();
    assert_eq!(newly, LESSONS, "each lesson completes exactly once");

    let e = service
        .find_enrollment(&student, &version)
        .expect("lookup")
        .expect("enrolled");
    assert_eq!(e.completion_percentage, 100.0);

    for i in 0..LESSONS {
        let p = service
            .lesson_progress(&student, &LessonId::new(format!("l-{i}")), &version)
            .expect("progress");
        assert!(p.is_completed());
        assert_eq!(p.times_viewed, 8);
        assert!(p.is_consistent());
    }
}
