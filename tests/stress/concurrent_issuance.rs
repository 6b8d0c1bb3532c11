//! Stress test: many threads race to issue the same enrollment's
//! certificate. Exactly one wins; every other caller sees `AlreadyIssued`.

use std::sync::{Arc, Barrier};
use std::thread;

use learning_engine::{
    Chapter, CourseVersionId, CourseVersionPolicy, EnrollmentId, FileStore, LearningError,
    LearningService, LearningStore, Lesson, LessonId, ManualClock, MemoryStore, StaticCatalog,
    StudentId,
};

const T0: u64 = 1_700_000_000_000_000;
const THREADS: usize = 16;

fn service(store: Arc<dyn LearningStore>) -> Arc<LearningService> {
    let mut catalog = StaticCatalog::new();
    catalog
        .add_course(
            CourseVersionId::new("race-v1"),
            CourseVersionPolicy::new(5.0, 100.0),
            vec![Chapter::new("ch-1", "Only", vec![Lesson::untimed("l-1")])],
        )
        .expect("valid course");
    Arc::new(
        LearningService::new(Arc::new(catalog.clone()), Arc::new(catalog), store)
            .with_clock(Arc::new(ManualClock::new(T0))),
    )
}

fn ready_enrollment(service: &LearningService, student: &str) -> EnrollmentId {
    let student = StudentId::new(student);
    let version = CourseVersionId::new("race-v1");
    let e = service.enroll(&student, &version).expect("enroll");
    service
        .mark_completed(&student, &LessonId::new("l-1"), &version)
        .expect("complete");
    service.record_quiz_score(&e.id, 7.0, true).expect("final");
    e.id
}

fn race(service: Arc<LearningService>, id: EnrollmentId) -> (usize, usize) {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let service = Arc::clone(&service);
            let id = id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.issue_certificate(&id)
            })
        })
        .collect();

    let mut issued = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.join().expect("thread panicked") {
            Ok(_) => issued += 1,
            Err(LearningError::AlreadyIssued(_)) => refused += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    (issued, refused)
}

#[test]
fn stress_concurrent_issuance_memory_store() {
    let service = service(Arc::new(MemoryStore::new()));
    let id = ready_enrollment(&service, "judy");

    let (issued, refused) = race(Arc::clone(&service), id.clone());
    assert_eq!(issued, 1);
    assert_eq!(refused, THREADS - 1);

    let certs = service.store().list_certificates().expect("list");
    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0].enrollment_id, id);
}

#[test]
fn stress_concurrent_issuance_file_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileStore::new(dir.path()).expect("open store"));
    let service = service(store);
    let id = ready_enrollment(&service, "ken");

    let (issued, refused) = race(Arc::clone(&service), id.clone());
    assert_eq!(issued, 1);
    assert_eq!(refused, THREADS - 1);

    let e = service.enrollment(&id).expect("load");
    assert!(e.certificate_issued);
    assert_eq!(service.store().list_certificates().expect("list").len(), 1);
}

#[test]
fn stress_two_services_share_one_directory() {
    // Separate service instances do not share locks; the store's exclusive
    // create still admits only one certificate.
    let dir = tempfile::tempdir().expect("tempdir");
    let first = service(Arc::new(FileStore::new(dir.path()).expect("open store")));
    let second = service(Arc::new(FileStore::new(dir.path()).expect("open store")));
    let id = ready_enrollment(&first, "leo");

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [first, second]
        .into_iter()
        .map(|service| {
            let id = id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.issue_certificate(&id).is_ok()
            })
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .filter(|ok| *ok)
        .count();
    assert_eq!(wins, 1);
}
