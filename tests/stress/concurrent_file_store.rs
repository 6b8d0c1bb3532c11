//! Stress test: enrollment records on the file store are rewritten by one
//! thread while others look them up. Readers must never see a partial
//! record, so a student can never be enrolled twice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use learning_engine::{
    Chapter, CourseVersionId, CourseVersionPolicy, FileStore, LearningError, LearningService,
    Lesson, LessonId, ManualClock, StaticCatalog, StudentId,
};

const T0: u64 = 1_700_000_000_000_000;
const WRITES: usize = 300;
const READERS: usize = 4;

fn service(dir: &std::path::Path) -> Arc<LearningService> {
    let mut catalog = StaticCatalog::new();
    catalog
        .add_course(
            CourseVersionId::new("fs-v1"),
            CourseVersionPolicy::new(5.0, 50.0),
            vec![Chapter::new(
                "ch-1",
                "Files",
                vec![Lesson::timed("inode", 600), Lesson::untimed("fsync")],
            )],
        )
        .expect("valid course");
    let store = Arc::new(FileStore::new(dir).expect("open store"));
    Arc::new(
        LearningService::with_catalog(Arc::new(catalog), store)
            .with_clock(Arc::new(ManualClock::new(T0))),
    )
}

#[test]
fn stress_rewrites_never_allow_second_enrollment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(dir.path());
    let student = StudentId::new("ivan");
    let version = CourseVersionId::new("fs-v1");
    let e = service.enroll(&student, &version).expect("enroll");

    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let service = Arc::clone(&service);
        let id = e.id.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..WRITES {
                service
                    .record_quiz_score(&id, (i % 11) as f64, false)
                    .expect("quiz");
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let watcher = {
        let service = Arc::clone(&service);
        let student = student.clone();
        let version = version.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut seconds = 0;
            while !done.load(Ordering::SeqCst) {
                seconds = (seconds + 7) % 600;
                service
                    .update_watched_duration(&student, &LessonId::new("inode"), &version, seconds)
                    .expect("watch");
            }
        })
    };

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let service = Arc::clone(&service);
            let student = student.clone();
            let version = version.clone();
            let expected = e.id.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut rounds = 0;
                while !done.load(Ordering::SeqCst) {
                    match service.enroll(&student, &version) {
                        Err(LearningError::AlreadyEnrolled { .. }) => {}
                        other => panic!("second enroll must be refused, got {other:?}"),
                    }
                    let found = service
                        .find_enrollment(&student, &version)
                        .expect("find")
                        .expect("enrollment is visible");
                    assert_eq!(found.id, expected);
                    assert_eq!(service.store().list_enrollments().expect("list").len(), 1);
                    rounds += 1;
                }
                rounds
            })
        })
        .collect();

    writer.join().expect("writer panicked");
    watcher.join().expect("watcher panicked");
    for reader in readers {
        reader.join().expect("reader panicked");
    }

    let enrollments = service.store().list_enrollments().expect("list");
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0].quiz_scores.len(), WRITES);
}

#[test]
fn stress_many_students_enroll_concurrently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = service(dir.path());
    let version = CourseVersionId::new("fs-v1");

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let service = Arc::clone(&service);
            let version = version.clone();
            thread::spawn(move || {
                for s in 0..10 {
                    // Each student is enrolled by two threads at once.
                    for owner in [t, (t + 1) % 8] {
                        let student = StudentId::new(format!("student-{owner}-{s}"));
                        match service.enroll(&student, &version) {
                            Ok(_) | Err(LearningError::AlreadyEnrolled { .. }) => {}
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                        let e = service
                            .find_enrollment(&student, &version)
                            .expect("find")
                            .expect("enrolled");
                        service.record_quiz_score(&e.id, 6.0, false).expect("quiz");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let enrollments = service.store().list_enrollments().expect("list");
    assert_eq!(enrollments.len(), 80);
    for e in &enrollments {
        assert_eq!(e.quiz_scores.len(), 2);
        let found = service
            .find_enrollment(&e.student_id, &version)
            .expect("find")
            .expect("indexed");
        assert_eq!(found.id, e.id);
    }
}
