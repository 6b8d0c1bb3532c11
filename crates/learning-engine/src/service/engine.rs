//! `LearningService`: the operations a host exposes over its routes.
//!
//! The service owns no state of its own beyond per-key locks. Each call
//! loads what it needs from the [`LearningStore`], applies one of the pure
//! transitions from the domain modules, and writes the result back.
//!
//! Lock order is progress key, then enrollment. Nothing ever takes a
//! progress lock while holding an enrollment lock.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::catalog::{
    CourseVersionId, Lesson, LessonCatalog, LessonId, PolicySource, StudentId,
};
use crate::certificate::{
    self, Certificate, CertificateId, CertificateVerification, EligibilityReport, IssueResult,
    VerificationStatus,
};
use crate::completion::{self, CourseProgressReport};
use crate::config::EngineConfig;
use crate::enrollment::{self, CancellationKind, Enrollment, EnrollmentId, EnrollmentStatus};
use crate::error::{LearningError, Result};
use crate::locks::KeyedLocks;
use crate::progress::{self, Progress, ProgressKey, ProgressStatus, ProgressUpdate};
use crate::storage::LearningStore;
use crate::time::{Clock, SystemClock};

use super::reports::{self, CourseStats, EnrollmentProgress, StudentOverview};

/// Progress tracking, enrollment lifecycle and certification over a store.
///
/// `LearningService` is `Send + Sync`; share it across threads behind `Arc`.
pub struct LearningService {
    catalog: Arc<dyn LessonCatalog>,
    policies: Arc<dyn PolicySource>,
    store: Arc<dyn LearningStore>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    progress_locks: KeyedLocks<ProgressKey>,
    enrollment_locks: KeyedLocks<EnrollmentId>,
    registration_locks: KeyedLocks<(StudentId, CourseVersionId)>,
}

impl LearningService {
    pub fn new(
        catalog: Arc<dyn LessonCatalog>,
        policies: Arc<dyn PolicySource>,
        store: Arc<dyn LearningStore>,
    ) -> Self {
        Self {
            catalog,
            policies,
            store,
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
            progress_locks: KeyedLocks::new(),
            enrollment_locks: KeyedLocks::new(),
            registration_locks: KeyedLocks::new(),
        }
    }

    /// Build a service from one value that serves both lessons and policies.
    pub fn with_catalog<C>(catalog: Arc<C>, store: Arc<dyn LearningStore>) -> Self
    where
        C: LessonCatalog + PolicySource + 'static,
    {
        let policies: Arc<dyn PolicySource> = catalog.clone();
        Self::new(catalog, policies, store)
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn LearningStore> {
        &self.store
    }

    fn now(&self) -> u64 {
        self.clock.now_micros()
    }

    // -----------------------------------------------------------------------
    // Enrollment creation
    // -----------------------------------------------------------------------

    /// Enroll a student and open the access window.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown course version, `AlreadyEnrolled` if the
    /// student already has an enrollment in it.
    pub fn enroll(&self, student: &StudentId, course_version: &CourseVersionId) -> Result<Enrollment> {
        if student.0.trim().is_empty() {
            return Err(LearningError::InvalidInput("student id must not be blank".into()));
        }
        let policy = self.policies.policy(course_version)?;

        let registration = (student.clone(), course_version.clone());
        self.registration_locks.with_lock(&registration, || {
            if self.store.find_enrollment(student, course_version)?.is_some() {
                return Err(LearningError::AlreadyEnrolled {
                    student: student.to_string(),
                    course_version: course_version.to_string(),
                });
            }

            let now = self.now();
            let mut e = Enrollment::new(
                EnrollmentId::generate(student, course_version, now),
                student.clone(),
                course_version.clone(),
                now,
            );
            enrollment::start(&mut e, &policy, now)?;
            self.store.save_enrollment(&e)?;

            info!(
                "enrolled {} in {} as {} (ends {:?})",
                student, course_version, e.id, e.end_at
            );
            Ok(e)
        })
    }

    // -----------------------------------------------------------------------
    // Progress tracking
    // -----------------------------------------------------------------------

    /// Record that the student opened a lesson.
    pub fn mark_viewed(
        &self,
        student: &StudentId,
        lesson: &LessonId,
        course_version: &CourseVersionId,
    ) -> Result<ProgressUpdate> {
        self.track(student, lesson, course_version, |record, _, now| {
            Ok(progress::mark_viewed(record, now))
        })
    }

    /// Mark a lesson completed regardless of watch time.
    pub fn mark_completed(
        &self,
        student: &StudentId,
        lesson: &LessonId,
        course_version: &CourseVersionId,
    ) -> Result<ProgressUpdate> {
        self.track(student, lesson, course_version, |record, _, now| {
            Ok(progress::mark_completed(record, now))
        })
    }

    /// Merge a watch-position report, completing the lesson at the
    /// configured watch ratio.
    pub fn update_watched_duration(
        &self,
        student: &StudentId,
        lesson: &LessonId,
        course_version: &CourseVersionId,
        watched_seconds: i64,
    ) -> Result<ProgressUpdate> {
        if watched_seconds < 0 {
            return Err(LearningError::InvalidInput(format!(
                "watched duration must be >= 0, got {watched_seconds}"
            )));
        }
        let ratio = self.config.auto_complete_ratio;
        self.track(student, lesson, course_version, |record, lesson, now| {
            progress::apply_watch(record, lesson, watched_seconds, ratio, now)
        })
    }

    /// Current progress on one lesson; an untouched default if none exists.
    pub fn lesson_progress(
        &self,
        student: &StudentId,
        lesson: &LessonId,
        course_version: &CourseVersionId,
    ) -> Result<Progress> {
        self.catalog.lesson(course_version, lesson)?;
        let key = ProgressKey::new(student.clone(), lesson.clone(), course_version.clone());
        Ok(self
            .store
            .load_progress(&key)?
            .unwrap_or_else(|| Progress::new(key)))
    }

    fn track<F>(
        &self,
        student: &StudentId,
        lesson_id: &LessonId,
        course_version: &CourseVersionId,
        op: F,
    ) -> Result<ProgressUpdate>
    where
        F: FnOnce(&mut Progress, &Lesson, u64) -> Result<bool>,
    {
        let lesson = self.catalog.lesson(course_version, lesson_id)?;
        let key = ProgressKey::new(student.clone(), lesson_id.clone(), course_version.clone());

        self.progress_locks.with_lock(&key, || {
            let enrollment = self.store.find_enrollment(student, course_version)?;

            // Non-preview lessons are tracked under the enrollment lock, so a
            // concurrent cancel or expiry cannot slip in after the check.
            let (record, newly_completed) = match &enrollment {
                _ if lesson.is_preview => self.apply_progress(&key, &lesson, self.now(), op)?,
                Some(e) => self.locked_enrollment(&e.id, |e, now| {
                    enrollment::ensure_active(&e, "track progress in", now)?;
                    self.apply_progress(&key, &lesson, now, op)
                })?,
                None => {
                    return Err(LearningError::IllegalStateTransition(format!(
                        "student {student} is not enrolled in course version {course_version}"
                    )));
                }
            };

            if newly_completed {
                info!("lesson {} completed by {} in {}", lesson_id, student, course_version);
                if let Some(e) = &enrollment {
                    self.recompute(&e.id)?;
                }
            } else {
                debug!(
                    "progress {} now {} ({} views, {}s watched)",
                    key, record.status, record.times_viewed, record.watched_duration_seconds
                );
            }

            Ok(ProgressUpdate {
                progress: record,
                newly_completed,
            })
        })
    }

    /// Load, update and store one progress record. Caller holds its lock.
    fn apply_progress<F>(
        &self,
        key: &ProgressKey,
        lesson: &Lesson,
        now: u64,
        op: F,
    ) -> Result<(Progress, bool)>
    where
        F: FnOnce(&mut Progress, &Lesson, u64) -> Result<bool>,
    {
        let mut record = self
            .store
            .load_progress(key)?
            .unwrap_or_else(|| Progress::new(key.clone()));
        let newly_completed = op(&mut record, lesson, now)?;
        self.store.save_progress(&record)?;
        Ok((record, newly_completed))
    }

    // -----------------------------------------------------------------------
    // Completion aggregation
    // -----------------------------------------------------------------------

    /// Recount completed lessons and store the enrollment's percentage.
    ///
    /// Never changes enrollment status. Terminal enrollments are recounted
    /// too, for reporting.
    pub fn recompute(&self, enrollment_id: &EnrollmentId) -> Result<Enrollment> {
        self.enrollment_locks.with_lock(enrollment_id, || {
            let mut e = self.store.load_enrollment(enrollment_id)?;
            if let Some(previous) = self.refresh_completion(&mut e)? {
                debug!(
                    "enrollment {} completion {:.1}% -> {:.1}%",
                    e.id, previous, e.completion_percentage
                );
                self.store.save_enrollment(&e)?;
            }
            Ok(e)
        })
    }

    /// Recount in place; returns the previous percentage if it changed.
    fn refresh_completion(&self, e: &mut Enrollment) -> Result<Option<f64>> {
        let tree = self.catalog.lesson_tree(&e.course_version_id)?;
        let records = self.store.list_progress(&e.student_id, &e.course_version_id)?;
        let summary = completion::compute_completion(&tree, &records);

        if (summary.completion_percentage - e.completion_percentage).abs() <= f64::EPSILON {
            return Ok(None);
        }
        let previous = e.completion_percentage;
        e.completion_percentage = summary.completion_percentage;
        Ok(Some(previous))
    }

    /// Recount before a decision. A stored value that disagrees is logged
    /// and replaced.
    fn refresh_for_decision(&self, e: &mut Enrollment) -> Result<()> {
        if let Some(previous) = self.refresh_completion(e)? {
            warn!(
                "enrollment {} had stale completion {:.1}%, recomputed {:.1}%",
                e.id, previous, e.completion_percentage
            );
            self.store.save_enrollment(e)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Enrollment lifecycle
    // -----------------------------------------------------------------------

    /// Run `f` on a freshly loaded enrollment under its lock.
    ///
    /// Lazy expiry observed here is persisted before `f` runs.
    fn locked_enrollment<R>(
        &self,
        id: &EnrollmentId,
        f: impl FnOnce(Enrollment, u64) -> Result<R>,
    ) -> Result<R> {
        self.enrollment_locks.with_lock(id, || {
            let mut e = self.store.load_enrollment(id)?;
            let now = self.now();
            if enrollment::mark_expired(&mut e, now) {
                info!("enrollment {} expired", e.id);
                self.store.save_enrollment(&e)?;
            }
            f(e, now)
        })
    }

    pub fn enrollment(&self, id: &EnrollmentId) -> Result<Enrollment> {
        self.store.load_enrollment(id)
    }

    pub fn find_enrollment(
        &self,
        student: &StudentId,
        course_version: &CourseVersionId,
    ) -> Result<Option<Enrollment>> {
        self.store.find_enrollment(student, course_version)
    }

    pub fn enrollments_for_student(&self, student: &StudentId) -> Result<Vec<Enrollment>> {
        self.store.list_enrollments_for_student(student)
    }

    /// Status with lazy expiry applied. Does not write.
    pub fn effective_status(&self, id: &EnrollmentId) -> Result<EnrollmentStatus> {
        Ok(self.store.load_enrollment(id)?.effective_status(self.now()))
    }

    pub fn remaining_days(&self, id: &EnrollmentId) -> Result<Option<u64>> {
        Ok(self.store.load_enrollment(id)?.remaining_days(self.now()))
    }

    /// Persist lazy expiry. Returns true if the stored status changed.
    pub fn mark_expired(&self, id: &EnrollmentId) -> Result<bool> {
        self.enrollment_locks.with_lock(id, || {
            let mut e = self.store.load_enrollment(id)?;
            let changed = enrollment::mark_expired(&mut e, self.now());
            if changed {
                info!("enrollment {} expired", e.id);
                self.store.save_enrollment(&e)?;
            }
            Ok(changed)
        })
    }

    /// Move an eligible enrollment to `Completed`.
    pub fn complete_enrollment(&self, id: &EnrollmentId) -> Result<Enrollment> {
        self.locked_enrollment(id, |mut e, now| {
            self.refresh_for_decision(&mut e)?;
            let policy = self.policies.policy(&e.course_version_id)?;
            enrollment::complete(&mut e, &policy, now)?;
            self.store.save_enrollment(&e)?;
            info!(
                "enrollment {} completed at {:.1}% with score {:?}",
                e.id, e.completion_percentage, e.average_score
            );
            Ok(e)
        })
    }

    /// The student withdraws.
    pub fn cancel_enrollment(&self, id: &EnrollmentId, reason: &str) -> Result<Enrollment> {
        self.end_enrollment(id, reason, CancellationKind::Withdrawn)
    }

    /// An instructor or administrator removes the student.
    pub fn remove_student(&self, id: &EnrollmentId, reason: &str) -> Result<Enrollment> {
        self.end_enrollment(id, reason, CancellationKind::Removed)
    }

    fn end_enrollment(
        &self,
        id: &EnrollmentId,
        reason: &str,
        kind: CancellationKind,
    ) -> Result<Enrollment> {
        self.locked_enrollment(id, |mut e, now| {
            enrollment::cancel(&mut e, reason, kind, now)?;
            self.store.save_enrollment(&e)?;
            info!("enrollment {} cancelled ({:?}): {}", e.id, kind, reason.trim());
            Ok(e)
        })
    }

    // -----------------------------------------------------------------------
    // Scores
    // -----------------------------------------------------------------------

    /// Record a quiz or final exam score and store the new average.
    pub fn record_quiz_score(
        &self,
        id: &EnrollmentId,
        score: f64,
        is_final_exam: bool,
    ) -> Result<Enrollment> {
        self.locked_enrollment(id, |mut e, now| {
            let policy = self.policies.policy(&e.course_version_id)?;
            let average = enrollment::record_score(
                &mut e,
                score,
                is_final_exam,
                &policy,
                self.config.default_final_weight,
                self.config.max_score,
                now,
            )?;
            self.store.save_enrollment(&e)?;
            info!(
                "recorded {} score {} for enrollment {}, average {:?}",
                if is_final_exam { "final exam" } else { "quiz" },
                score,
                e.id,
                average
            );
            Ok(e)
        })
    }

    /// Override the final exam weight for one enrollment.
    pub fn set_final_exam_weight(&self, id: &EnrollmentId, weight: f64) -> Result<Enrollment> {
        self.locked_enrollment(id, |mut e, now| {
            enrollment::ensure_active(&e, "reweight", now)?;
            enrollment::set_final_exam_weight(&mut e, weight)?;
            self.store.save_enrollment(&e)?;
            info!("enrollment {} final exam weight set to {}", e.id, weight);
            Ok(e)
        })
    }

    /// Whether the student has progressed far enough to sit the final exam.
    pub fn final_exam_eligibility(&self, id: &EnrollmentId) -> Result<bool> {
        self.locked_enrollment(id, |mut e, _| {
            self.refresh_for_decision(&mut e)?;
            let policy = self.policies.policy(&e.course_version_id)?;
            Ok(enrollment::can_take_final_exam(&e, &policy))
        })
    }

    // -----------------------------------------------------------------------
    // Certificates
    // -----------------------------------------------------------------------

    /// Evaluate every certification condition against fresh completion.
    pub fn check_eligibility(&self, id: &EnrollmentId) -> Result<EligibilityReport> {
        self.locked_enrollment(id, |mut e, now| {
            self.refresh_for_decision(&mut e)?;
            let policy = self.policies.policy(&e.course_version_id)?;
            Ok(certificate::check_eligibility(&e, &policy, now))
        })
    }

    /// Issue the enrollment's certificate, completing it if needed.
    ///
    /// # Errors
    ///
    /// `AlreadyIssued` on a second call (including a concurrent one),
    /// `NotEligible` when any condition fails.
    pub fn issue_certificate(&self, id: &EnrollmentId) -> Result<IssueResult> {
        self.locked_enrollment(id, |mut e, now| {
            self.refresh_for_decision(&mut e)?;
            let policy = self.policies.policy(&e.course_version_id)?;
            let result = certificate::issue(
                &mut e,
                &policy,
                self.config.default_final_weight,
                &self.config.certificate_code_prefix,
                now,
            )?;
            self.store.save_issuance(&result.certificate, &e)?;
            info!(
                "issued certificate {} ({}) to {} for {}, grade {}",
                result.certificate.code,
                result.certificate.id,
                e.student_id,
                e.course_version_id,
                result.certificate.grade
            );
            Ok(result)
        })
    }

    /// Revoke a certificate. The enrollment keeps its issued flag.
    pub fn revoke_certificate(
        &self,
        id: &CertificateId,
        reason: &str,
        actor: &str,
    ) -> Result<Certificate> {
        let enrollment_id = self.store.load_certificate(id)?.enrollment_id;
        self.enrollment_locks.with_lock(&enrollment_id, || {
            let mut cert = self.store.load_certificate(id)?;
            certificate::revoke(&mut cert, reason, actor, self.now())?;
            self.store.save_certificate(&cert)?;
            info!("certificate {} revoked by {}: {}", cert.code, actor, reason.trim());
            Ok(cert)
        })
    }

    /// Public lookup by code.
    pub fn verify_certificate(&self, code: &str) -> Result<CertificateVerification> {
        let cert = self
            .store
            .find_certificate_by_code(code.trim())?
            .ok_or_else(|| LearningError::NotFound(format!("certificate code {code}")))?;
        let verification = certificate::verify(&cert, self.now());
        if verification.status == VerificationStatus::Tampered {
            warn!("certificate {} failed its integrity check", cert.code);
        }
        Ok(verification)
    }

    pub fn certificate(&self, id: &CertificateId) -> Result<Certificate> {
        self.store.load_certificate(id)
    }

    pub fn certificate_for_enrollment(&self, id: &EnrollmentId) -> Result<Option<Certificate>> {
        self.store.find_certificate_by_enrollment(id)
    }

    pub fn certificates_for_student(&self, student: &StudentId) -> Result<Vec<Certificate>> {
        Ok(self
            .store
            .list_certificates()?
            .into_iter()
            .filter(|c| &c.student_id == student)
            .collect())
    }

    pub fn certificates_for_version(
        &self,
        course_version: &CourseVersionId,
    ) -> Result<Vec<Certificate>> {
        Ok(self
            .store
            .list_certificates()?
            .into_iter()
            .filter(|c| &c.course_version_id == course_version)
            .collect())
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Per-chapter and per-lesson breakdown for one enrollment.
    pub fn course_progress(&self, id: &EnrollmentId) -> Result<CourseProgressReport> {
        let e = self.store.load_enrollment(id)?;
        let tree = self.catalog.lesson_tree(&e.course_version_id)?;
        let records = self.store.list_progress(&e.student_id, &e.course_version_id)?;
        Ok(completion::build_report(
            &e.student_id,
            &tree,
            &records,
            e.average_score,
        ))
    }

    pub fn student_overview(&self, student: &StudentId) -> Result<StudentOverview> {
        let mut entries = Vec::new();
        for e in self.store.list_enrollments_for_student(student)? {
            let tree = self.catalog.lesson_tree(&e.course_version_id)?;
            let records = self.store.list_progress(student, &e.course_version_id)?;
            entries.push(EnrollmentProgress {
                completion: completion::compute_completion(&tree, &records),
                watched_seconds: records.iter().map(|p| p.watched_duration_seconds).sum(),
                enrollment: e,
            });
        }
        Ok(reports::build_student_overview(student, &entries, self.now()))
    }

    pub fn course_stats(&self, course_version: &CourseVersionId) -> Result<CourseStats> {
        let enrollments = self.store.list_enrollments_for_version(course_version)?;
        let mut students_with_progress = 0;
        for e in &enrollments {
            let records = self.store.list_progress(&e.student_id, course_version)?;
            if records.iter().any(|p| p.status != ProgressStatus::NotViewed) {
                students_with_progress += 1;
            }
        }
        Ok(reports::build_course_stats(
            course_version,
            &enrollments,
            students_with_progress,
            self.now(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
