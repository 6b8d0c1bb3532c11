//! Enrollment state machine.
//!
//! ```text
//! Enrolled ──complete──▶ Completed
//!    │ ├─────cancel───▶ Cancelled
//!    │ └─────remove───▶ Cancelled (kind = Removed)
//!    └──end_at passes─▶ Expired   (derived lazily, persisted on write paths)
//! ```
//!
//! Each transition has a pure `validate_*` check that runs before any field
//! is touched, so a rejected call leaves the enrollment unchanged.

use crate::catalog::CourseVersionPolicy;
use crate::error::{LearningError, Result};
use crate::score;

use super::types::*;

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// Open the access window: `start_at = now`, `end_at = now + duration_days`.
///
/// A second call is a no-op. A policy without a duration (or with 0 days)
/// leaves `end_at` unset. Fails with `InvalidInput`, leaving the enrollment
/// untouched, if `end_at` would not fit in a timestamp.
pub fn start(enrollment: &mut Enrollment, policy: &CourseVersionPolicy, now: u64) -> Result<()> {
    if enrollment.start_at.is_some() {
        return Ok(());
    }
    let end_at = match policy.duration_days {
        Some(days) if days > 0 => Some(
            crate::time::days_to_micros(days)
                .and_then(|window| now.checked_add(window))
                .ok_or_else(|| {
                    LearningError::InvalidInput(format!(
                        "an access window of {days} days is out of range"
                    ))
                })?,
        ),
        _ => None,
    };
    enrollment.start_at = Some(now);
    enrollment.end_at = end_at;
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared legality check
// ---------------------------------------------------------------------------

/// Fail unless the enrollment is functionally `Enrolled`.
pub fn ensure_active(enrollment: &Enrollment, action: &str, now: u64) -> Result<()> {
    if enrollment.is_active(now) {
        return Ok(());
    }
    match enrollment.effective_status(now) {
        EnrollmentStatus::Expired => Err(LearningError::IllegalStateTransition(format!(
            "cannot {action} enrollment {}: access window ended",
            enrollment.id
        ))),
        other => Err(LearningError::IllegalStateTransition(format!(
            "cannot {action} enrollment {} in state {other}",
            enrollment.id
        ))),
    }
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// Progress and score thresholds for completion. Expiry is not checked here.
pub fn meets_thresholds(enrollment: &Enrollment, policy: &CourseVersionPolicy) -> bool {
    enrollment.completion_percentage >= policy.min_progress_pct
        && enrollment
            .average_score
            .is_some_and(|avg| avg >= policy.pass_score)
}

/// Check that `complete` would succeed.
pub fn validate_complete(
    enrollment: &Enrollment,
    policy: &CourseVersionPolicy,
    now: u64,
) -> Result<()> {
    ensure_active(enrollment, "complete", now)?;
    if !meets_thresholds(enrollment, policy) {
        return Err(LearningError::IneligibleForCompletion {
            progress_pct: enrollment.completion_percentage,
            required_pct: policy.min_progress_pct,
            average_score: enrollment.average_score,
            pass_score: policy.pass_score,
        });
    }
    Ok(())
}

/// Move an eligible enrollment to `Completed`.
pub fn complete(enrollment: &mut Enrollment, policy: &CourseVersionPolicy, now: u64) -> Result<()> {
    validate_complete(enrollment, policy, now)?;
    enrollment.status = EnrollmentStatus::Completed;
    enrollment.completed_at = Some(now);
    Ok(())
}

// ---------------------------------------------------------------------------
// Cancel / remove
// ---------------------------------------------------------------------------

/// Check that `cancel` would succeed.
pub fn validate_cancel(enrollment: &Enrollment, reason: &str, now: u64) -> Result<()> {
    if reason.trim().is_empty() {
        return Err(LearningError::InvalidInput(
            "cancellation reason must not be blank".to_string(),
        ));
    }
    ensure_active(enrollment, "cancel", now)
}

/// End an enrollment early, recording who ended it and why.
pub fn cancel(
    enrollment: &mut Enrollment,
    reason: &str,
    kind: CancellationKind,
    now: u64,
) -> Result<()> {
    validate_cancel(enrollment, reason, now)?;
    enrollment.status = EnrollmentStatus::Cancelled;
    enrollment.cancellation_reason = Some(reason.trim().to_string());
    enrollment.cancellation_kind = Some(kind);
    enrollment.cancelled_at = Some(now);
    Ok(())
}

// ---------------------------------------------------------------------------
// Expire
// ---------------------------------------------------------------------------

/// Persistable form of lazy expiry. Returns true if the status changed.
pub fn mark_expired(enrollment: &mut Enrollment, now: u64) -> bool {
    if enrollment.is_expired(now) {
        enrollment.status = EnrollmentStatus::Expired;
        return true;
    }
    false
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Record a quiz or final exam score and recompute the weighted average.
///
/// Regular scores are appended; a final exam score replaces the previous
/// one. Returns the new average (`None` until a final exam exists).
pub fn record_score(
    enrollment: &mut Enrollment,
    value: f64,
    is_final_exam: bool,
    policy: &CourseVersionPolicy,
    fallback_weight: f64,
    max_score: f64,
    now: u64,
) -> Result<Option<f64>> {
    ensure_active(enrollment, "score", now)?;
    score::validate_score(value, max_score)?;

    let k = score::resolve_final_weight(
        enrollment.final_exam_weight,
        policy.final_weight,
        fallback_weight,
    );

    let mut quiz_scores = enrollment.quiz_scores.clone();
    let mut final_exam = enrollment.final_exam_score;
    if is_final_exam {
        final_exam = Some(value);
    } else {
        quiz_scores.push(value);
    }

    let average = score::weighted_average(&quiz_scores, final_exam, k)?;

    enrollment.quiz_scores = quiz_scores;
    enrollment.final_exam_score = final_exam;
    enrollment.average_score = average;
    Ok(average)
}

/// Set the enrollment's own final exam weight and recompute the average.
pub fn set_final_exam_weight(enrollment: &mut Enrollment, k: f64) -> Result<Option<f64>> {
    score::validate_final_weight(k)?;
    let average = score::weighted_average(&enrollment.quiz_scores, enrollment.final_exam_score, k)?;
    enrollment.final_exam_weight = Some(k);
    enrollment.average_score = average;
    Ok(average)
}

/// A student may sit the final exam once progress reaches the policy minimum.
pub fn can_take_final_exam(enrollment: &Enrollment, policy: &CourseVersionPolicy) -> bool {
    enrollment.completion_percentage >= policy.min_progress_pct
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
