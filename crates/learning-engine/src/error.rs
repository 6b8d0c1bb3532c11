//! Error types for the learning engine.
//!
//! Every failure is a local, recoverable condition returned to the caller.
//! Hosts map the variants onto their own status codes.

/// Learning engine error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum LearningError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Illegal state transition: {0}")]
    IllegalStateTransition(String),

    #[error(
        "Enrollment cannot be completed: progress {progress_pct:.1}% (required {required_pct:.1}%), score {score} (required {pass_score:.2})",
        score = display_score(.average_score)
    )]
    IneligibleForCompletion {
        progress_pct: f64,
        required_pct: f64,
        average_score: Option<f64>,
        pass_score: f64,
    },

    #[error("Not eligible for a certificate: {0}")]
    NotEligible(String),

    #[error("Certificate already issued for enrollment {0}")]
    AlreadyIssued(String),

    #[error("Certificate already revoked: {0}")]
    AlreadyRevoked(String),

    #[error("Student {student} is already enrolled in course version {course_version}")]
    AlreadyEnrolled {
        student: String,
        course_version: String,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_score(score: &Option<f64>) -> String {
    match score {
        Some(s) => format!("{s:.2}"),
        None => "none".to_string(),
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, LearningError>;
