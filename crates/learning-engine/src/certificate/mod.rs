//! Certificate eligibility and issuance.
//!
//! The certificate module provides:
//! - The eligibility gate (progress, score, expiry)
//! - Exactly-once issuance with a unique code and a fixed grade table
//! - One-time revocation that preserves issuance history
//! - Public verification by code with tamper detection

pub mod engine;
pub mod types;

pub use types::{
    Certificate, CertificateId, CertificateVerification, EligibilityReport, Grade, IssueResult,
    VerificationStatus,
};

pub use engine::{check_eligibility, content_hash, grade_for, is_eligible, issue, revoke, verify};
