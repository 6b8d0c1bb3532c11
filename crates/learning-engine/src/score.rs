//! Score aggregation: the weighted average used for completion and grading.
//!
//! ```text
//! average = (Σ quiz_scores[i] + final_exam × k) / (n + k)
//! ```
//!
//! `n` is the number of regular quiz scores and `k` the final exam weight,
//! `0.5 ≤ k ≤ 1.0`. Without a final exam the average is undefined and is
//! reported as `None`; score-gated decisions treat `None` as "not yet
//! eligible", never as zero.

use crate::error::{LearningError, Result};

/// Smallest accepted final exam weight.
pub const MIN_FINAL_WEIGHT: f64 = 0.5;

/// Largest accepted final exam weight.
pub const MAX_FINAL_WEIGHT: f64 = 1.0;

/// Final exam weight used when neither the enrollment nor the policy sets one.
pub const DEFAULT_FINAL_WEIGHT: f64 = 0.6;

/// Upper bound of the default score scale.
pub const DEFAULT_MAX_SCORE: f64 = 10.0;

/// Check that `k` lies within `[0.5, 1.0]`.
pub fn validate_final_weight(k: f64) -> Result<()> {
    if !k.is_finite() || !(MIN_FINAL_WEIGHT..=MAX_FINAL_WEIGHT).contains(&k) {
        return Err(LearningError::InvalidInput(format!(
            "final exam weight must be {MIN_FINAL_WEIGHT}-{MAX_FINAL_WEIGHT}, got {k}"
        )));
    }
    Ok(())
}

/// Check that a quiz or exam score lies within `[0, max_score]`.
pub fn validate_score(score: f64, max_score: f64) -> Result<()> {
    if !score.is_finite() || score < 0.0 || score > max_score {
        return Err(LearningError::InvalidInput(format!(
            "score must be 0-{max_score}, got {score}"
        )));
    }
    Ok(())
}

/// Compute the weighted average score.
///
/// Returns `Ok(None)` when no final exam score exists. With no regular
/// quizzes the result degenerates to the final exam score.
///
/// # Errors
///
/// Returns `LearningError::InvalidInput` if `k` is outside `[0.5, 1.0]`.
pub fn weighted_average(quiz_scores: &[f64], final_exam: Option<f64>, k: f64) -> Result<Option<f64>> {
    validate_final_weight(k)?;

    let Some(final_exam) = final_exam else {
        return Ok(None);
    };

    let n = quiz_scores.len() as f64;
    let sum: f64 = quiz_scores.iter().sum();
    Ok(Some((sum + final_exam * k) / (n + k)))
}

/// Pick the final exam weight: enrollment override, then policy, then fallback.
pub fn resolve_final_weight(
    enrollment_weight: Option<f64>,
    policy_weight: Option<f64>,
    fallback: f64,
) -> f64 {
    enrollment_weight.or(policy_weight).unwrap_or(fallback)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
