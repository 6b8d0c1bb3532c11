//! Certificate engine: eligibility, issuance, revocation and verification.

use sha2::{Digest, Sha256};

use crate::catalog::CourseVersionPolicy;
use crate::enrollment::{self, Enrollment, EnrollmentStatus};
use crate::error::{LearningError, Result};
use crate::score;

use super::types::*;

// ---------------------------------------------------------------------------
// Grade table
// ---------------------------------------------------------------------------

/// Score at or above which a certificate is graded `Excellent`.
pub const EXCELLENT_FROM: f64 = 9.0;
/// Score at or above which a certificate is graded `Good`.
pub const GOOD_FROM: f64 = 8.0;
/// Score at or above which a certificate is graded `Average`.
pub const AVERAGE_FROM: f64 = 7.0;

/// Map a final score to a grade. Total over all inputs.
///
/// Below `pass_score` is always `Fail`; at or above it the fixed bands
/// apply, with `Pass` covering the rest.
pub fn grade_for(final_score: f64, pass_score: f64) -> Grade {
    if final_score.is_nan() || final_score < pass_score {
        Grade::Fail
    } else if final_score >= EXCELLENT_FROM {
        Grade::Excellent
    } else if final_score >= GOOD_FROM {
        Grade::Good
    } else if final_score >= AVERAGE_FROM {
        Grade::Average
    } else {
        Grade::Pass
    }
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Evaluate every eligibility condition and collect the failures.
pub fn check_eligibility(
    enrollment: &Enrollment,
    policy: &CourseVersionPolicy,
    now: u64,
) -> EligibilityReport {
    let mut errors = Vec::new();

    let meets_progress = enrollment.completion_percentage >= policy.min_progress_pct;
    if !meets_progress {
        errors.push(format!(
            "Progress not met: required {:.1}%, actual {:.1}%",
            policy.min_progress_pct, enrollment.completion_percentage
        ));
    }

    let has_score = enrollment.average_score.is_some();
    let meets_score = match enrollment.average_score {
        Some(avg) => {
            let meets = avg >= policy.pass_score;
            if !meets {
                errors.push(format!(
                    "Score not met: required {:.2}, actual {:.2}",
                    policy.pass_score, avg
                ));
            }
            meets
        }
        None => {
            errors.push("No average score yet: final exam not taken".to_string());
            false
        }
    };

    let not_expired = enrollment.effective_status(now) != EnrollmentStatus::Expired;
    if !not_expired {
        errors.push("Enrollment access window has ended".to_string());
    }

    let status_allows = matches!(
        enrollment.status,
        EnrollmentStatus::Enrolled | EnrollmentStatus::Completed
    );
    if !status_allows {
        errors.push(format!("Enrollment is {}", enrollment.status));
    }

    let is_eligible = meets_progress && has_score && meets_score && not_expired && status_allows;

    EligibilityReport {
        enrollment_id: enrollment.id.clone(),
        meets_progress,
        has_score,
        meets_score,
        not_expired,
        status_allows,
        is_eligible,
        errors,
    }
}

/// Progress, score and expiry gate for certification.
pub fn is_eligible(enrollment: &Enrollment, policy: &CourseVersionPolicy, now: u64) -> bool {
    check_eligibility(enrollment, policy, now).is_eligible
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// Issue a certificate for an enrollment, mutating the enrollment in place.
///
/// A completable `Enrolled` enrollment is completed as part of issuance.
/// On success `enrollment.certificate_issued` is set; the caller must persist
/// the enrollment and the certificate as one unit.
///
/// # Errors
///
/// `AlreadyIssued` if a certificate exists for the enrollment, `NotEligible`
/// if any eligibility condition fails.
pub fn issue(
    enrollment: &mut Enrollment,
    policy: &CourseVersionPolicy,
    fallback_weight: f64,
    code_prefix: &str,
    now: u64,
) -> Result<IssueResult> {
    if enrollment.certificate_issued {
        return Err(LearningError::AlreadyIssued(enrollment.id.to_string()));
    }

    let report = check_eligibility(enrollment, policy, now);
    if !report.is_eligible {
        return Err(LearningError::NotEligible(report.errors.join("; ")));
    }
    let final_score = enrollment.average_score.ok_or_else(|| {
        LearningError::NotEligible("No average score yet: final exam not taken".to_string())
    })?;

    let mut completed_enrollment = false;
    if enrollment.status == EnrollmentStatus::Enrolled {
        enrollment::complete(enrollment, policy, now)?;
        completed_enrollment = true;
    }

    let nonce: [u8; 16] = crate::random::random_bytes();
    let seed = format!(
        "certificate:{}:{}:{}",
        enrollment.id.0,
        now,
        hex::encode(nonce)
    );
    let seed_hash = Sha256::digest(seed.as_bytes());
    let id = CertificateId(format!(
        "cert_{}",
        bs58::encode(&seed_hash[..16]).into_string()
    ));
    let code = format!(
        "{}-{}",
        code_prefix,
        bs58::encode(&seed_hash[16..28]).into_string()
    );

    let mut certificate = Certificate {
        id,
        code,
        enrollment_id: enrollment.id.clone(),
        student_id: enrollment.student_id.clone(),
        course_version_id: enrollment.course_version_id.clone(),
        final_score,
        grade: grade_for(final_score, policy.pass_score),
        issued_at: now,
        quiz_count: enrollment.quiz_scores.len(),
        final_exam_score: enrollment.final_exam_score,
        final_exam_weight: score::resolve_final_weight(
            enrollment.final_exam_weight,
            policy.final_weight,
            fallback_weight,
        ),
        content_hash: String::new(),
        is_revoked: false,
        revoke_reason: None,
        revoked_at: None,
        revoked_by: None,
    };
    certificate.content_hash = content_hash(&certificate);

    enrollment.certificate_issued = true;

    Ok(IssueResult {
        certificate,
        should_notify: true,
        completed_enrollment,
    })
}

/// Hex SHA-256 over the fields fixed at issuance.
pub fn content_hash(certificate: &Certificate) -> String {
    let hash_input = format!(
        "{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
        certificate.id.0,
        certificate.code,
        certificate.enrollment_id.0,
        certificate.student_id.0,
        certificate.course_version_id.0,
        certificate.final_score,
        certificate.grade.as_str(),
        certificate.issued_at,
        certificate.quiz_count,
        certificate
            .final_exam_score
            .map(|s| s.to_string())
            .unwrap_or_default(),
        certificate.final_exam_weight,
    );
    hex::encode(Sha256::digest(hash_input.as_bytes()))
}

// ---------------------------------------------------------------------------
// Revoke
// ---------------------------------------------------------------------------

/// Revoke a certificate. Allowed once; the enrollment is left untouched.
pub fn revoke(certificate: &mut Certificate, reason: &str, actor: &str, now: u64) -> Result<()> {
    if certificate.is_revoked {
        return Err(LearningError::AlreadyRevoked(certificate.id.to_string()));
    }
    if reason.trim().is_empty() {
        return Err(LearningError::InvalidInput(
            "revocation reason must not be blank".to_string(),
        ));
    }
    certificate.is_revoked = true;
    certificate.revoke_reason = Some(reason.trim().to_string());
    certificate.revoked_at = Some(now);
    certificate.revoked_by = Some(actor.to_string());
    Ok(())
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// Check a certificate's integrity and revocation state.
pub fn verify(certificate: &Certificate, now: u64) -> CertificateVerification {
    let status = if content_hash(certificate) != certificate.content_hash {
        VerificationStatus::Tampered
    } else if certificate.is_revoked {
        VerificationStatus::Revoked
    } else {
        VerificationStatus::Valid
    };

    CertificateVerification {
        certificate_id: certificate.id.clone(),
        code: certificate.code.clone(),
        student_id: certificate.student_id.clone(),
        course_version_id: certificate.course_version_id.clone(),
        final_score: certificate.final_score,
        grade: certificate.grade,
        issued_at: certificate.issued_at,
        status,
        revoke_reason: certificate.revoke_reason.clone(),
        verified_at: now,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
