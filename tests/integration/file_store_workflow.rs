//! Integration test: durable workflow over the file store.
//!
//! State written by one service instance must be visible to the next one
//! opened on the same directory, and a half-finished issuance must be
//! repaired on read.

use std::sync::Arc;

use learning_engine::{
    Chapter, CourseVersionId, CourseVersionPolicy, EnrollmentStatus, FileStore, LearningError,
    LearningService, LearningStore, Lesson, LessonId, ManualClock, StaticCatalog, StudentId,
    VerificationStatus,
};

const T0: u64 = 1_700_000_000_000_000;

fn catalog() -> Arc<StaticCatalog> {
    let mut catalog = StaticCatalog::new();
    catalog
        .add_course(
            CourseVersionId::new("db-v1"),
            CourseVersionPolicy::new(6.0, 100.0),
            vec![Chapter::new(
                "ch-1",
                "Storage",
                vec![Lesson::timed("pages", 300), Lesson::untimed("btree")],
            )],
        )
        .expect("valid course");
    Arc::new(catalog)
}

fn open(dir: &std::path::Path, clock: Arc<ManualClock>) -> (LearningService, Arc<FileStore>) {
    let store = Arc::new(FileStore::new(dir).expect("open store"));
    let service = LearningService::with_catalog(catalog(), store.clone()).with_clock(clock);
    (service, store)
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(T0));
    let version = CourseVersionId::new("db-v1");
    let student = StudentId::new("erin");

    let id = {
        let (service, _) = open(dir.path(), clock.clone());
        let e = service.enroll(&student, &version).expect("enroll");
        service
            .update_watched_duration(&student, &LessonId::new("pages"), &version, 290)
            .expect("watch");
        service.record_quiz_score(&e.id, 7.5, false).expect("quiz");
        e.id
    };

    let (service, _) = open(dir.path(), clock.clone());
    let e = service.enrollment(&id).expect("reload");
    assert_eq!(e.completion_percentage, 50.0);
    assert_eq!(e.quiz_scores, vec![7.5]);
    assert_eq!(e.average_score, None);

    let progress = service
        .lesson_progress(&student, &LessonId::new("pages"), &version)
        .expect("progress");
    assert!(progress.is_completed());
    assert_eq!(progress.watched_duration_seconds, 290);

    // Untouched lessons read as a fresh record.
    let untouched = service
        .lesson_progress(&student, &LessonId::new("btree"), &version)
        .expect("progress");
    assert_eq!(untouched.times_viewed, 0);

    assert!(matches!(
        service.enroll(&student, &version),
        Err(LearningError::AlreadyEnrolled { .. })
    ));
}

#[test]
fn issuance_persists_and_verifies_after_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(T0));
    let version = CourseVersionId::new("db-v1");
    let student = StudentId::new("frank");

    let code = {
        let (service, _) = open(dir.path(), clock.clone());
        let e = service.enroll(&student, &version).expect("enroll");
        for lesson in ["pages", "btree"] {
            service
                .mark_completed(&student, &LessonId::new(lesson), &version)
                .expect("complete");
        }
        service.record_quiz_score(&e.id, 6.0, true).expect("final");
        service.issue_certificate(&e.id).expect("issue").certificate.code
    };

    let (service, _) = open(dir.path(), clock);
    let v = service.verify_certificate(&code).expect("verify");
    assert_eq!(v.status, VerificationStatus::Valid);
    assert_eq!(v.student_id, student);

    let certs = service.certificates_for_student(&student).expect("list");
    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0].code, code);
}

#[test]
fn lost_enrollment_write_is_repaired() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(T0));
    let version = CourseVersionId::new("db-v1");
    let student = StudentId::new("grace");

    let (service, store) = open(dir.path(), clock.clone());
    let e = service.enroll(&student, &version).expect("enroll");
    for lesson in ["pages", "btree"] {
        service
            .mark_completed(&student, &LessonId::new(lesson), &version)
            .expect("complete");
    }
    service.record_quiz_score(&e.id, 9.0, true).expect("final");
    let before = store.load_enrollment(&e.id).expect("load");
    let issued = service.issue_certificate(&e.id).expect("issue");

    // Put back the pre-issuance enrollment, as if the second write was lost.
    store.save_enrollment(&before).expect("rewind");

    let (service, _) = open(dir.path(), clock);
    let repaired = service.enrollment(&e.id).expect("reload");
    assert!(repaired.certificate_issued);
    assert_eq!(repaired.status, EnrollmentStatus::Completed);
    assert_eq!(repaired.completed_at, Some(issued.certificate.issued_at));

    assert!(matches!(
        service.issue_certificate(&e.id),
        Err(LearningError::AlreadyIssued(_))
    ));
}

#[test]
fn edited_certificate_fails_verification() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(T0));
    let version = CourseVersionId::new("db-v1");
    let student = StudentId::new("heidi");

    let (service, store) = open(dir.path(), clock);
    let e = service.enroll(&student, &version).expect("enroll");
    for lesson in ["pages", "btree"] {
        service
            .mark_completed(&student, &LessonId::new(lesson), &version)
            .expect("complete");
    }
    service.record_quiz_score(&e.id, 6.5, true).expect("final");
    let mut cert = service.issue_certificate(&e.id).expect("issue").certificate;

    cert.final_score = 10.0;
    store.save_certificate(&cert).expect("overwrite");

    let v = service.verify_certificate(&cert.code).expect("verify");
    assert_eq!(v.status, VerificationStatus::Tampered);
}
