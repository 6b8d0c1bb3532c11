//! Data structures for certificates.

use serde::{Deserialize, Serialize};

use crate::catalog::{CourseVersionId, StudentId};
use crate::enrollment::EnrollmentId;

// ---------------------------------------------------------------------------
// Certificate id
// ---------------------------------------------------------------------------

/// Unique identifier for a certificate record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertificateId(pub String);

impl CertificateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Grade
// ---------------------------------------------------------------------------

/// Grade printed on a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Excellent,
    Good,
    Average,
    Pass,
    Fail,
}

impl Grade {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Average => "average",
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Certificate
// ---------------------------------------------------------------------------

/// A certificate of completion.
///
/// Every field except the revocation group is fixed at issuance and covered
/// by `content_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub code: String,
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub course_version_id: CourseVersionId,
    pub final_score: f64,
    pub grade: Grade,
    pub issued_at: u64,
    pub quiz_count: usize,
    pub final_exam_score: Option<f64>,
    pub final_exam_weight: f64,
    pub content_hash: String,
    pub is_revoked: bool,
    pub revoke_reason: Option<String>,
    pub revoked_at: Option<u64>,
    pub revoked_by: Option<String>,
}

/// Returned by issuance. The host dispatches notifications when
/// `should_notify` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueResult {
    pub certificate: Certificate,
    pub should_notify: bool,
    /// True when issuance also moved the enrollment to `Completed`.
    pub completed_enrollment: bool,
}

// ---------------------------------------------------------------------------
// Eligibility and verification
// ---------------------------------------------------------------------------

/// Breakdown of the certificate eligibility check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub enrollment_id: EnrollmentId,
    pub meets_progress: bool,
    pub has_score: bool,
    pub meets_score: bool,
    pub not_expired: bool,
    pub status_allows: bool,
    pub is_eligible: bool,
    pub errors: Vec<String>,
}

/// Outcome of looking up a certificate by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Valid,
    Revoked,
    /// Stored fields no longer match the issuance hash.
    Tampered,
}

/// Public verification of a certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateVerification {
    pub certificate_id: CertificateId,
    pub code: String,
    pub student_id: StudentId,
    pub course_version_id: CourseVersionId,
    pub final_score: f64,
    pub grade: Grade,
    pub issued_at: u64,
    pub status: VerificationStatus,
    pub revoke_reason: Option<String>,
    pub verified_at: u64,
}
