//! Edge cases across the enrollment lifecycle: input validation, boundary
//! timestamps, terminal states and empty courses.

use std::sync::Arc;

use learning_engine::{
    Chapter, CourseVersionId, CourseVersionPolicy, EngineConfig, EnrollmentStatus, LearningError,
    LearningService, Lesson, LessonId, ManualClock, MemoryStore, StaticCatalog, StudentId,
    MAX_DURATION_DAYS,
};

const T0: u64 = 1_700_000_000_000_000;
const DAY: u64 = 86_400_000_000;

fn setup() -> (LearningService, Arc<ManualClock>) {
    let mut catalog = StaticCatalog::new();
    catalog
        .add_course(
            CourseVersionId::new("edge-v1"),
            CourseVersionPolicy::new(5.0, 50.0).with_duration_days(10),
            vec![Chapter::new(
                "ch-1",
                "Edges",
                vec![
                    Lesson::timed("zero", 0),
                    Lesson::timed("short", 10),
                    Lesson::untimed("text"),
                    Lesson::timed("teaser", 30).preview(),
                ],
            )],
        )
        .expect("valid course");
    catalog
        .add_course(
            CourseVersionId::new("empty-v1"),
            CourseVersionPolicy::new(0.0, 0.0),
            vec![],
        )
        .expect("valid course");

    let clock = Arc::new(ManualClock::new(T0));
    let service = LearningService::with_catalog(Arc::new(catalog), Arc::new(MemoryStore::new()))
        .with_clock(clock.clone());
    (service, clock)
}

fn edge() -> CourseVersionId {
    CourseVersionId::new("edge-v1")
}

#[test]
fn blank_student_is_rejected() {
    let (service, _) = setup();
    assert!(matches!(
        service.enroll(&StudentId::new("   "), &edge()),
        Err(LearningError::InvalidInput(_))
    ));
}

#[test]
fn zero_length_lessons_never_auto_complete() {
    let (service, _) = setup();
    let s = StudentId::new("nina");
    service.enroll(&s, &edge()).expect("enroll");

    let update = service
        .update_watched_duration(&s, &LessonId::new("zero"), &edge(), 500)
        .expect("watch");
    assert!(!update.newly_completed);
    assert_eq!(update.progress.watched_duration_seconds, 0);

    // Untimed lessons only complete explicitly.
    let update = service
        .update_watched_duration(&s, &LessonId::new("text"), &edge(), 10_000)
        .expect("watch");
    assert!(!update.newly_completed);
    let update = service
        .mark_completed(&s, &LessonId::new("text"), &edge())
        .expect("complete");
    assert!(update.newly_completed);
}

#[test]
fn watch_is_capped_at_lesson_length() {
    let (service, _) = setup();
    let s = StudentId::new("oscar");
    service.enroll(&s, &edge()).expect("enroll");

    let update = service
        .update_watched_duration(&s, &LessonId::new("short"), &edge(), 3600)
        .expect("watch");
    assert_eq!(update.progress.watched_duration_seconds, 10);
    assert!(update.newly_completed);

    let repeat = service
        .update_watched_duration(&s, &LessonId::new("short"), &edge(), 3600)
        .expect("watch");
    assert!(!repeat.newly_completed);
}

#[test]
fn unenrolled_students_reach_only_previews() {
    let (service, _) = setup();
    let s = StudentId::new("peggy");

    service
        .mark_viewed(&s, &LessonId::new("teaser"), &edge())
        .expect("preview view");
    assert!(matches!(
        service.mark_viewed(&s, &LessonId::new("short"), &edge()),
        Err(LearningError::IllegalStateTransition(_))
    ));
}

#[test]
fn access_window_boundary_is_inclusive() {
    let (service, clock) = setup();
    let s = StudentId::new("quinn");
    let e = service.enroll(&s, &edge()).expect("enroll");

    clock.set(T0 + 10 * DAY);
    assert_eq!(
        service.effective_status(&e.id).expect("status"),
        EnrollmentStatus::Enrolled
    );
    service
        .mark_viewed(&s, &LessonId::new("short"), &edge())
        .expect("still open at end_at");

    clock.advance(1);
    assert_eq!(
        service.effective_status(&e.id).expect("status"),
        EnrollmentStatus::Expired
    );
    assert!(matches!(
        service.mark_viewed(&s, &LessonId::new("short"), &edge()),
        Err(LearningError::IllegalStateTransition(_))
    ));
    // The failed call persisted the expiry.
    assert_eq!(
        service.enrollment(&e.id).expect("load").status,
        EnrollmentStatus::Expired
    );
}

#[test]
fn score_validation() {
    let (service, _) = setup();
    let s = StudentId::new("rita");
    let e = service.enroll(&s, &edge()).expect("enroll");

    for bad in [-0.1, 10.5, f64::NAN, f64::INFINITY] {
        assert!(
            matches!(
                service.record_quiz_score(&e.id, bad, false),
                Err(LearningError::InvalidInput(_))
            ),
            "score {bad} should be rejected"
        );
    }
    for bad in [0.49, 1.01] {
        assert!(matches!(
            service.set_final_exam_weight(&e.id, bad),
            Err(LearningError::InvalidInput(_))
        ));
    }

    // Quizzes alone leave the average undefined.
    let e = service.record_quiz_score(&e.id, 10.0, false).expect("quiz");
    assert_eq!(e.average_score, None);

    let e = service.set_final_exam_weight(&e.id, 1.0).expect("weight");
    assert_eq!(e.average_score, None);
    let e = service.record_quiz_score(&e.id, 4.0, true).expect("final");
    assert_eq!(e.average_score, Some(7.0));

    // A retaken final exam replaces the previous one.
    let e = service.record_quiz_score(&e.id, 6.0, true).expect("retake");
    assert_eq!(e.final_exam_score, Some(6.0));
    assert_eq!(e.average_score, Some(8.0));
}

#[test]
fn completion_requires_both_thresholds() {
    let (service, _) = setup();
    let s = StudentId::new("sam");
    let e = service.enroll(&s, &edge()).expect("enroll");

    service
        .mark_completed(&s, &LessonId::new("short"), &edge())
        .expect("complete");
    service.record_quiz_score(&e.id, 9.0, true).expect("final");
    // 1 of 4 lessons.
    assert!(matches!(
        service.complete_enrollment(&e.id),
        Err(LearningError::IneligibleForCompletion { .. })
    ));

    service
        .mark_completed(&s, &LessonId::new("text"), &edge())
        .expect("complete");
    let done = service.complete_enrollment(&e.id).expect("complete enrollment");
    assert_eq!(done.status, EnrollmentStatus::Completed);

    // Terminal states reject further transitions.
    assert!(matches!(
        service.complete_enrollment(&e.id),
        Err(LearningError::IllegalStateTransition(_))
    ));
    assert!(matches!(
        service.cancel_enrollment(&e.id, "late"),
        Err(LearningError::IllegalStateTransition(_))
    ));

    // Completed enrollments can still be certified.
    let issued = service.issue_certificate(&e.id).expect("issue");
    assert!(!issued.completed_enrollment);
}

#[test]
fn cancellation_needs_a_reason() {
    let (service, _) = setup();
    let s = StudentId::new("tina");
    let e = service.enroll(&s, &edge()).expect("enroll");

    assert!(matches!(
        service.remove_student(&e.id, "  "),
        Err(LearningError::InvalidInput(_))
    ));
    let removed = service.remove_student(&e.id, "policy violation").expect("remove");
    assert_eq!(removed.status, EnrollmentStatus::Cancelled);
    assert!(matches!(
        service.cancel_enrollment(&e.id, "again"),
        Err(LearningError::IllegalStateTransition(_))
    ));
}

#[test]
fn empty_course_reports_zero_progress() {
    let (service, _) = setup();
    let s = StudentId::new("uma");
    let e = service
        .enroll(&s, &CourseVersionId::new("empty-v1"))
        .expect("enroll");

    let e = service.recompute(&e.id).expect("recompute");
    assert_eq!(e.completion_percentage, 0.0);
    assert_eq!(e.end_at, None);
    assert_eq!(e.remaining_days(T0), None);

    let report = service.course_progress(&e.id).expect("report");
    assert_eq!(report.total_lessons, 0);
    assert_eq!(report.completion_percentage, 0.0);
}

#[test]
fn oversized_access_window_is_rejected() {
    let mut catalog = StaticCatalog::new();
    let result = catalog.add_course(
        CourseVersionId::new("forever-v1"),
        CourseVersionPolicy::new(5.0, 50.0).with_duration_days(4_000_000_000),
        vec![Chapter::new("ch-1", "Long", vec![Lesson::untimed("l-1")])],
    );
    assert!(matches!(result, Err(LearningError::InvalidInput(_))));

    // The longest allowed window still enrolls without overflow.
    catalog
        .add_course(
            CourseVersionId::new("century-v1"),
            CourseVersionPolicy::new(5.0, 50.0).with_duration_days(MAX_DURATION_DAYS),
            vec![Chapter::new("ch-1", "Long", vec![Lesson::untimed("l-1")])],
        )
        .expect("valid course");
    let service = LearningService::with_catalog(Arc::new(catalog), Arc::new(MemoryStore::new()))
        .with_clock(Arc::new(ManualClock::new(T0)));
    let e = service
        .enroll(&StudentId::new("wendy"), &CourseVersionId::new("century-v1"))
        .expect("enroll");
    assert_eq!(e.end_at, Some(T0 + u64::from(MAX_DURATION_DAYS) * DAY));
}

#[test]
fn invalid_config_is_rejected() {
    let (service, _) = setup();
    let config = EngineConfig {
        auto_complete_ratio: 1.5,
        ..EngineConfig::default()
    };
    assert!(matches!(
        service.with_config(config),
        Err(LearningError::InvalidInput(_))
    ));
}

#[test]
fn custom_code_prefix_and_ratio() {
    let (service, _) = setup();
    let config = EngineConfig {
        auto_complete_ratio: 0.5,
        certificate_code_prefix: "EDU".to_string(),
        ..EngineConfig::default()
    };
    let service = service.with_config(config).expect("valid config");
    let s = StudentId::new("victor");
    let e = service.enroll(&s, &edge()).expect("enroll");

    let update = service
        .update_watched_duration(&s, &LessonId::new("short"), &edge(), 5)
        .expect("watch");
    assert!(update.newly_completed);

    service
        .mark_completed(&s, &LessonId::new("text"), &edge())
        .expect("complete");
    service.record_quiz_score(&e.id, 5.0, true).expect("final");
    let cert = service.issue_certificate(&e.id).expect("issue").certificate;
    assert!(cert.code.starts_with("EDU-"));
}
