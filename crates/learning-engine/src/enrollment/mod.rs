//! Enrollment lifecycle.
//!
//! The enrollment module provides:
//! - Enrollment records and identifiers
//! - Access windows derived from the course duration policy
//! - Completion, cancellation and removal with legality checks
//! - Lazy expiry (`is_expired`, `effective_status`)
//! - Quiz and final exam score recording

pub mod state;
pub mod types;

pub use types::{CancellationKind, Enrollment, EnrollmentId, EnrollmentStatus};

pub use state::{
    can_take_final_exam, cancel, complete, ensure_active, mark_expired, meets_thresholds,
    record_score, set_final_exam_weight, start, validate_cancel, validate_complete,
};
