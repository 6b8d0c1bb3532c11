//! Data structures for enrollments.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::{CourseVersionId, StudentId};

// ---------------------------------------------------------------------------
// Enrollment id
// ---------------------------------------------------------------------------

/// Unique identifier for an enrollment.
///
/// Format: `enr_` + base58 of the first 16 bytes of a SHA-256 over the
/// student, course version, creation time and fresh entropy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnrollmentId(pub String);

impl EnrollmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a fresh id for a new enrollment.
    pub fn generate(student: &StudentId, course_version: &CourseVersionId, now: u64) -> Self {
        let nonce: [u8; 16] = crate::random::random_bytes();
        let id_input = format!(
            "enrollment:{}:{}:{}:{}",
            student.0,
            course_version.0,
            now,
            hex::encode(nonce)
        );
        let id_hash = Sha256::digest(id_input.as_bytes());
        let id_encoded = bs58::encode(&id_hash[..16]).into_string();
        Self(format!("enr_{id_encoded}"))
    }
}

impl std::fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of an enrollment. Everything except `Enrolled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Enrolled,
    Completed,
    Cancelled,
    Expired,
}

impl EnrollmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Enrolled)
    }

    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enrolled => "enrolled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who ended an enrollment early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationKind {
    /// The student withdrew.
    Withdrawn,
    /// An instructor or administrator removed the student.
    Removed,
}

// ---------------------------------------------------------------------------
// Enrollment record
// ---------------------------------------------------------------------------

/// One student's registration in one course version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_version_id: CourseVersionId,
    pub status: EnrollmentStatus,
    pub enrolled_at: u64,
    pub start_at: Option<u64>,
    /// `None` means the access window is unbounded.
    pub end_at: Option<u64>,
    pub completion_percentage: f64,
    pub average_score: Option<f64>,
    /// Regular quiz scores in the order they were recorded.
    pub quiz_scores: Vec<f64>,
    pub final_exam_score: Option<f64>,
    pub final_exam_weight: Option<f64>,
    pub certificate_issued: bool,
    pub completed_at: Option<u64>,
    pub cancellation_reason: Option<String>,
    pub cancellation_kind: Option<CancellationKind>,
    pub cancelled_at: Option<u64>,
}

impl Enrollment {
    /// Create an enrollment in the `Enrolled` state. Call
    /// [`crate::enrollment::start`] before handing it out.
    pub fn new(
        id: EnrollmentId,
        student_id: StudentId,
        course_version_id: CourseVersionId,
        enrolled_at: u64,
    ) -> Self {
        Self {
            id,
            student_id,
            course_version_id,
            status: EnrollmentStatus::Enrolled,
            enrolled_at,
            start_at: None,
            end_at: None,
            completion_percentage: 0.0,
            average_score: None,
            quiz_scores: Vec::new(),
            final_exam_score: None,
            final_exam_weight: None,
            certificate_issued: false,
            completed_at: None,
            cancellation_reason: None,
            cancellation_kind: None,
            cancelled_at: None,
        }
    }

    /// True iff still `Enrolled` and `now` is past `end_at`.
    ///
    /// Expiry is computed lazily; the stored status may still read
    /// `Enrolled`.
    pub fn is_expired(&self, now: u64) -> bool {
        !self.status.is_terminal() && self.end_at.is_some_and(|end| now > end)
    }

    /// Status with lazy expiry applied.
    pub fn effective_status(&self, now: u64) -> EnrollmentStatus {
        if self.is_expired(now) {
            EnrollmentStatus::Expired
        } else {
            self.status
        }
    }

    /// Enrolled and not expired.
    pub fn is_active(&self, now: u64) -> bool {
        self.effective_status(now) == EnrollmentStatus::Enrolled
    }

    /// Whole days left in the access window, floored at zero.
    pub fn remaining_days(&self, now: u64) -> Option<u64> {
        self.end_at
            .map(|end| end.saturating_sub(now) / crate::time::MICROS_PER_DAY)
    }
}
