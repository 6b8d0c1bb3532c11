//! Progress transitions: view, complete and watch-duration rules.
//!
//! These functions mutate a [`Progress`] in place and report whether the
//! call moved it into `Completed`. Loading, locking and persisting the record
//! is the caller's job (see [`crate::service`]).

use crate::catalog::Lesson;
use crate::error::{LearningError, Result};

use super::types::*;

/// Watch ratio at which a timed lesson completes itself.
pub const AUTO_COMPLETE_RATIO: f64 = 0.90;

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Record a view of the lesson.
///
/// Always increments `times_viewed`. Moves `NotViewed` to `Viewed` and never
/// downgrades. Returns `false`: a view never completes a lesson.
pub fn mark_viewed(progress: &mut Progress, now: u64) -> bool {
    progress.times_viewed = progress.times_viewed.saturating_add(1);
    if progress.first_viewed_at.is_none() {
        progress.first_viewed_at = Some(now);
    }
    if progress.status == ProgressStatus::NotViewed {
        progress.status = ProgressStatus::Viewed;
    }
    progress.last_accessed_at = Some(now);
    false
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// Force the lesson to `Completed`.
///
/// Counts as a view. On an already completed record nothing else changes.
/// Returns `true` only when the status actually changed.
pub fn mark_completed(progress: &mut Progress, now: u64) -> bool {
    progress.times_viewed = progress.times_viewed.saturating_add(1);
    if progress.first_viewed_at.is_none() {
        progress.first_viewed_at = Some(now);
    }
    progress.last_accessed_at = Some(now);
    complete(progress, now)
}

fn complete(progress: &mut Progress, now: u64) -> bool {
    if progress.status == ProgressStatus::Completed {
        return false;
    }
    progress.status = ProgressStatus::Completed;
    if progress.completed_at.is_none() {
        progress.completed_at = Some(now);
    }
    true
}

// ---------------------------------------------------------------------------
// Watch duration
// ---------------------------------------------------------------------------

/// Apply a watch-position report from a video player.
///
/// The stored duration is `max(current, reported)`, capped to the lesson
/// length when it is known, so a late shorter report never rewinds progress.
/// Once the watched share reaches `auto_complete_ratio` of a timed lesson the
/// record completes. Otherwise the first non-zero report moves `NotViewed`
/// to `Viewed`.
///
/// # Errors
///
/// Returns `LearningError::InvalidInput` for a negative report.
pub fn apply_watch(
    progress: &mut Progress,
    lesson: &Lesson,
    reported_seconds: i64,
    auto_complete_ratio: f64,
    now: u64,
) -> Result<bool> {
    if reported_seconds < 0 {
        return Err(LearningError::InvalidInput(format!(
            "watched duration must be >= 0, got {reported_seconds}"
        )));
    }

    let mut reported = reported_seconds as u64;
    if let Some(duration) = lesson.duration_seconds {
        reported = reported.min(u64::from(duration));
    }
    progress.watched_duration_seconds = progress.watched_duration_seconds.max(reported);
    progress.last_accessed_at = Some(now);

    let watched = progress.watched_duration_seconds;
    let reached_threshold = match lesson.duration_seconds {
        Some(duration) if duration > 0 => watched as f64 / f64::from(duration) >= auto_complete_ratio,
        _ => false,
    };

    if reached_threshold {
        if progress.first_viewed_at.is_none() {
            progress.first_viewed_at = Some(now);
        }
        return Ok(complete(progress, now));
    }

    if watched > 0 && progress.status == ProgressStatus::NotViewed {
        progress.status = ProgressStatus::Viewed;
        if progress.first_viewed_at.is_none() {
            progress.first_viewed_at = Some(now);
        }
    }
    Ok(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
