//! Memory model types and constants
//!
//! Shared data structures for the scheduling engine: the per-item memory
//! model, the recall-quality rating scale, and the review state enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==================== Constants ====================

/// Lower bound of the difficulty range
pub const DIFFICULTY_MIN: f64 = 1.0;

/// Upper bound of the difficulty range
pub const DIFFICULTY_MAX: f64 = 10.0;

/// Floor below which stability is never allowed to fall
pub const STABILITY_FLOOR: f64 = 0.1;

/// Stability assigned to a freshly authored item, before its first grading
pub const INITIAL_STABILITY: f64 = 4.0;

/// Difficulty assigned to a freshly authored item, before its first grading
pub const INITIAL_DIFFICULTY: f64 = 5.0;

// ==================== Errors ====================

/// Input rejection reasons for the scheduler.
///
/// Both variants are caller errors: they are raised before any computation
/// and the input model is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Rating value outside the closed 1..=4 set.
    #[error("invalid rating value {0}, expected 1 (Again) through 4 (Easy)")]
    InvalidRating(i64),
    /// Memory model violates an invariant (non-positive stability,
    /// out-of-range difficulty, non-finite fields).
    #[error("invalid card state: {0}")]
    InvalidCardState(String),
}

// ==================== Rating ====================

/// Self-assessed recall quality for one grading event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    /// All ratings in ascending order, for preview fan-out.
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Whether this rating counts as a successful recall.
    pub fn is_success(self) -> bool {
        self != Rating::Again
    }

    /// Map a correctness observation plus response latency onto a rating.
    pub fn from_correct(is_correct: bool, response_time_ms: i64) -> Self {
        if !is_correct {
            return Self::Again;
        }
        if response_time_ms < 2000 {
            Self::Easy
        } else if response_time_ms < 5000 {
            Self::Good
        } else {
            Self::Hard
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = SchedulerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            other => Err(SchedulerError::InvalidRating(other)),
        }
    }
}

// ==================== Review state ====================

/// Lifecycle phase of one learnable item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Learning => "Learning",
            Self::Review => "Review",
            Self::Relearning => "Relearning",
        }
    }
}

// ==================== Memory model ====================

/// Scheduling state of one learnable item.
///
/// Created once at item-authoring time and thereafter mutated only by
/// [`crate::Scheduler::commit`]; every field the persistence layer stores is
/// here, timestamps serialize as ISO-8601.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryModel {
    pub state: ReviewState,
    /// Next time this item should be presented.
    pub due: DateTime<Utc>,
    /// Estimated days until recall probability decays to the reference
    /// retention level.
    pub stability: f64,
    /// Bounded scalar in [1, 10] capturing how hard the item is to retain.
    pub difficulty: f64,
    /// Days since `last_review` at the moment of the most recent grading.
    pub elapsed_days: u32,
    /// Interval scheduled at the most recent grading; 0 for sub-day steps.
    pub scheduled_days: u32,
    /// Short learning steps completed while in Learning/Relearning.
    pub learning_steps: u32,
    /// Total gradings applied to this item.
    pub reps: u32,
    /// Times a mature (Review) item was rated Again.
    pub lapses: u32,
    pub last_review: Option<DateTime<Utc>>,
}

impl MemoryModel {
    /// Fresh model for a newly authored item, due immediately.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: ReviewState::New,
            due: now,
            stability: INITIAL_STABILITY,
            difficulty: INITIAL_DIFFICULTY,
            elapsed_days: 0,
            scheduled_days: 0,
            learning_steps: 0,
            reps: 0,
            lapses: 0,
            last_review: None,
        }
    }

    /// Check the invariants every scheduler input must satisfy.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !self.stability.is_finite() || self.stability <= 0.0 {
            return Err(SchedulerError::InvalidCardState(format!(
                "stability must be a positive finite number, got {}",
                self.stability
            )));
        }
        if !self.difficulty.is_finite()
            || !(DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&self.difficulty)
        {
            return Err(SchedulerError::InvalidCardState(format!(
                "difficulty must be within [{DIFFICULTY_MIN}, {DIFFICULTY_MAX}], got {}",
                self.difficulty
            )));
        }
        Ok(())
    }

    /// Whether the item is eligible for review at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }

    /// Full days elapsed since the previous grading, 0 if never reviewed.
    pub fn days_since_review(&self, now: DateTime<Utc>) -> u32 {
        match self.last_review {
            Some(last) => (now - last).num_days().max(0) as u32,
            None => 0,
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    // ============ Rating ============

    #[test]
    fn test_rating_try_from_valid() {
        assert_eq!(Rating::try_from(1), Ok(Rating::Again));
        assert_eq!(Rating::try_from(2), Ok(Rating::Hard));
        assert_eq!(Rating::try_from(3), Ok(Rating::Good));
        assert_eq!(Rating::try_from(4), Ok(Rating::Easy));
    }

    #[test]
    fn test_rating_try_from_invalid() {
        assert_eq!(Rating::try_from(0), Err(SchedulerError::InvalidRating(0)));
        assert_eq!(Rating::try_from(5), Err(SchedulerError::InvalidRating(5)));
        assert_eq!(Rating::try_from(-1), Err(SchedulerError::InvalidRating(-1)));
    }

    #[test]
    fn test_rating_from_correct() {
        assert_eq!(Rating::from_correct(false, 100), Rating::Again);
        assert_eq!(Rating::from_correct(false, 10_000), Rating::Again);
        assert_eq!(Rating::from_correct(true, 1_500), Rating::Easy);
        assert_eq!(Rating::from_correct(true, 3_000), Rating::Good);
        assert_eq!(Rating::from_correct(true, 8_000), Rating::Hard);
    }

    #[test]
    fn test_rating_is_success() {
        assert!(!Rating::Again.is_success());
        assert!(Rating::Hard.is_success());
        assert!(Rating::Good.is_success());
        assert!(Rating::Easy.is_success());
    }

    // ============ MemoryModel ============

    #[test]
    fn test_new_model_defaults() {
        let now = fixed_now();
        let model = MemoryModel::new(now);

        assert_eq!(model.state, ReviewState::New);
        assert_eq!(model.due, now);
        assert_eq!(model.stability, INITIAL_STABILITY);
        assert_eq!(model.difficulty, INITIAL_DIFFICULTY);
        assert_eq!(model.reps, 0);
        assert_eq!(model.lapses, 0);
        assert_eq!(model.learning_steps, 0);
        assert_eq!(model.last_review, None);
        assert!(model.is_due(now));
    }

    #[test]
    fn test_validate_rejects_bad_stability() {
        let mut model = MemoryModel::new(fixed_now());
        model.stability = 0.0;
        assert!(matches!(
            model.validate(),
            Err(SchedulerError::InvalidCardState(_))
        ));

        model.stability = -2.5;
        assert!(model.validate().is_err());

        model.stability = f64::NAN;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_difficulty() {
        let mut model = MemoryModel::new(fixed_now());
        model.difficulty = 0.5;
        assert!(model.validate().is_err());

        model.difficulty = 10.5;
        assert!(model.validate().is_err());

        model.difficulty = DIFFICULTY_MAX;
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_days_since_review() {
        let now = fixed_now();
        let mut model = MemoryModel::new(now);
        assert_eq!(model.days_since_review(now), 0);

        model.last_review = Some(now - chrono::Duration::days(9));
        assert_eq!(model.days_since_review(now), 9);

        // A clock running slightly behind the last review clamps to zero.
        model.last_review = Some(now + chrono::Duration::hours(1));
        assert_eq!(model.days_since_review(now), 0);
    }

    // ============ Serialization contract ============

    #[test]
    fn test_model_serializes_camel_case_iso_timestamps() {
        let now = fixed_now();
        let model = MemoryModel::new(now);
        let json = serde_json::to_value(&model).expect("serialize");

        assert_eq!(json["state"], "New");
        assert_eq!(json["due"], "2024-03-01T12:00:00Z");
        assert!(json["lastReview"].is_null());
        assert_eq!(json["elapsedDays"], 0);
        assert_eq!(json["scheduledDays"], 0);
        assert_eq!(json["learningSteps"], 0);
        assert_eq!(json["reps"], 0);
        assert_eq!(json["lapses"], 0);
        assert_eq!(json["stability"], INITIAL_STABILITY);
        assert_eq!(json["difficulty"], INITIAL_DIFFICULTY);
    }

    #[test]
    fn test_model_deserialize_round_trip() {
        let model = MemoryModel::new(fixed_now());
        let json = serde_json::to_string(&model).expect("serialize");
        let back: MemoryModel = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(model, back);
    }
}
