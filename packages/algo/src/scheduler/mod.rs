//! Spaced repetition scheduler
//!
//! Core theory:
//! - Per-item memory is summarized by stability S (days until recall
//!   probability decays to the reference retention) and difficulty D
//!   (bounded scalar in [1, 10])
//! - Retrievability follows a power forgetting curve:
//!   R(t, S) = (1 + F·t/S)^C with C = -0.5 and F = 19/81, normalized so
//!   that R(S, S) equals the 0.9 reference retention
//! - Successful recall multiplies stability, with a larger reward when
//!   pre-review retrievability was low; a lapse shrinks stability and sends
//!   the item through a short relearning ladder
//! - The next interval inverts the forgetting curve at the desired
//!   retention: I(S) = S/F · (r^(1/C) − 1)
//!
//! Items start in a sub-day learning ladder with fixed step offsets and are
//! promoted to curve-driven scheduling once the configured steps complete.
//!
//! References:
//! - Ye, J., Su, J., & Cao, Y. (2022). A stochastic shortest path algorithm
//!   for optimizing spaced repetition schedules. KDD '22.
//! - Settles, B., & Meeder, B. (2016). A trainable spaced repetition model
//!   for language learning. ACL '16.

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{
    MemoryModel, Rating, ReviewState, SchedulerError, DIFFICULTY_MAX, DIFFICULTY_MIN,
    STABILITY_FLOOR,
};

// ==================== Constants ====================

/// Forgetting curve exponent
const DECAY: f64 = -0.5;

/// Forgetting curve factor; with DECAY = -0.5 this pins R(S, S) to 0.9
const FACTOR: f64 = 19.0 / 81.0;

/// Relative spread applied by interval fuzz
const FUZZ_RANGE: f64 = 0.05;

/// Intervals shorter than this are never fuzzed
const FUZZ_MIN_INTERVAL_DAYS: u32 = 3;

// ==================== Parameters ====================

/// Tunable weights and bounds for the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerParams {
    /// Model weight vector: w0-w3 initial stability per rating, w4-w7
    /// difficulty dynamics, w8-w16 stability growth and lapse shape.
    pub w: [f64; 17],
    /// Retention level the next interval is solved for.
    pub desired_retention: f64,
    pub min_interval_days: u32,
    pub max_interval_days: u32,
    /// Sub-day ladder for items entering from New, in minutes.
    pub learning_step_minutes: Vec<i64>,
    /// Sub-day ladder for lapsed items, in minutes.
    pub relearning_step_minutes: Vec<i64>,
    /// Spread computed intervals to avoid many items bunching on one day.
    pub enable_fuzz: bool,
    /// Seed for the fuzz stream; fixing it makes schedules reproducible.
    pub fuzz_seed: u64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            w: [
                0.4, 0.6, 2.4, 5.8, // w0-w3: initial stability
                4.93, 0.94, 0.86, 0.01, 1.49, // w4-w8
                0.14, 0.94, 2.18, 0.05, 0.34, // w9-w13
                1.26, 0.29, 2.61, // w14-w16
            ],
            desired_retention: 0.9,
            min_interval_days: 1,
            max_interval_days: 36_500,
            learning_step_minutes: vec![1, 10],
            relearning_step_minutes: vec![10],
            enable_fuzz: false,
            fuzz_seed: 0,
        }
    }
}

// ==================== Preview ====================

/// Candidate next models for all four rating choices, computed without
/// committing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingPreview {
    pub again: MemoryModel,
    pub hard: MemoryModel,
    pub good: MemoryModel,
    pub easy: MemoryModel,
}

impl SchedulingPreview {
    pub fn get(&self, rating: Rating) -> &MemoryModel {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }

    /// Scheduled interval in days for one choice, for "due in ..." labels.
    pub fn interval_days(&self, rating: Rating) -> u32 {
        self.get(rating).scheduled_days
    }
}

// ==================== Forgetting curve ====================

/// Predicted recall probability after `elapsed_days` at the given stability.
pub fn retrievability(stability: f64, elapsed_days: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let safe_elapsed = elapsed_days.max(0.0);
    (1.0 + FACTOR * safe_elapsed / stability).powf(DECAY)
}

// ==================== Scheduler ====================

/// Pure scheduling engine. Holds only parameters; both [`Self::preview`] and
/// [`Self::commit`] map an input model to fresh output models without
/// touching the input.
#[derive(Debug, Clone)]
pub struct Scheduler {
    params: SchedulerParams,
}

impl Scheduler {
    pub fn new(params: SchedulerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Predicted recall probability for `model` at `now`.
    pub fn current_retrievability(&self, model: &MemoryModel, now: DateTime<Utc>) -> f64 {
        retrievability(model.stability, f64::from(model.days_since_review(now)))
    }

    /// Candidate outcomes for every rating. Pure: identical inputs always
    /// produce identical output and `model` is never mutated.
    pub fn preview(
        &self,
        model: &MemoryModel,
        now: DateTime<Utc>,
    ) -> Result<SchedulingPreview, SchedulerError> {
        model.validate()?;
        Ok(SchedulingPreview {
            again: self.apply(model, Rating::Again, now),
            hard: self.apply(model, Rating::Hard, now),
            good: self.apply(model, Rating::Good, now),
            easy: self.apply(model, Rating::Easy, now),
        })
    }

    /// Apply one grading event. Equals `preview(model, now)` at `rating`;
    /// the caller is responsible for persisting the result.
    pub fn commit(
        &self,
        model: &MemoryModel,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<MemoryModel, SchedulerError> {
        model.validate()?;
        Ok(self.apply(model, rating, now))
    }

    /// [`Self::commit`] for rating values arriving untyped from a
    /// collaborator (1..=4); anything else is an [`SchedulerError::InvalidRating`].
    pub fn commit_raw(
        &self,
        model: &MemoryModel,
        rating: i64,
        now: DateTime<Utc>,
    ) -> Result<MemoryModel, SchedulerError> {
        let rating = Rating::try_from(rating)?;
        self.commit(model, rating, now)
    }

    /// Previews for a batch of models, fanned out across threads.
    pub fn batch_preview(
        &self,
        models: &[MemoryModel],
        now: DateTime<Utc>,
    ) -> Result<Vec<SchedulingPreview>, SchedulerError> {
        models
            .par_iter()
            .map(|model| self.preview(model, now))
            .collect()
    }

    // ==================== Transition core ====================

    /// Single-rating transition. Callers have already validated `model`.
    fn apply(&self, model: &MemoryModel, rating: Rating, now: DateTime<Utc>) -> MemoryModel {
        let elapsed = model.days_since_review(now);
        let recall = retrievability(model.stability, f64::from(elapsed));

        let mut next = model.clone();
        next.reps = model.reps + 1;
        next.elapsed_days = elapsed;
        next.last_review = Some(now);

        match model.state {
            ReviewState::New => self.grade_new(&mut next, rating, now),
            ReviewState::Learning | ReviewState::Relearning => {
                next.difficulty = self.next_difficulty(model.difficulty, rating);
                self.grade_step(&mut next, model, rating, recall, now);
            }
            ReviewState::Review => {
                next.difficulty = self.next_difficulty(model.difficulty, rating);
                self.grade_review(&mut next, model, rating, recall, now);
            }
        }

        next
    }

    /// First grading: bootstrap stability/difficulty and enter the ladder.
    fn grade_new(&self, next: &mut MemoryModel, rating: Rating, now: DateTime<Utc>) {
        next.stability = self.initial_stability(rating);
        next.difficulty = self.initial_difficulty(rating);

        let steps = &self.params.learning_step_minutes;
        if steps.is_empty() {
            let stability = next.stability;
            self.promote_to_review(next, stability, now);
            return;
        }

        next.state = ReviewState::Learning;
        next.scheduled_days = 0;
        if rating.is_success() {
            // The first successful grading completes the first step.
            if steps.len() == 1 {
                let stability = next.stability;
                self.promote_to_review(next, stability, now);
            } else {
                next.learning_steps = 1;
                next.due = now + step_offset(steps[1]);
            }
        } else {
            next.learning_steps = 0;
            next.due = now + step_offset(steps[0]);
        }
    }

    /// Step-ladder grading for Learning and Relearning items.
    fn grade_step(
        &self,
        next: &mut MemoryModel,
        model: &MemoryModel,
        rating: Rating,
        recall: f64,
        now: DateTime<Utc>,
    ) {
        let steps = match model.state {
            ReviewState::Relearning => &self.params.relearning_step_minutes,
            _ => &self.params.learning_step_minutes,
        };
        if steps.is_empty() {
            let stability = if rating.is_success() {
                self.recall_stability(model, recall, rating)
            } else {
                model.stability
            };
            self.promote_to_review(next, stability, now);
            return;
        }

        match rating {
            Rating::Again => {
                next.learning_steps = 0;
                next.scheduled_days = 0;
                next.due = now + step_offset(steps[0]);
            }
            Rating::Hard if model.state == ReviewState::Relearning => {
                // Repeat the current relearning step without advancing.
                let index = (model.learning_steps as usize).min(steps.len() - 1);
                next.scheduled_days = 0;
                next.due = now + step_offset(steps[index]);
            }
            _ => {
                let completed = model.learning_steps + 1;
                if completed as usize >= steps.len() {
                    let stability = self.recall_stability(model, recall, rating);
                    self.promote_to_review(next, stability, now);
                } else {
                    next.learning_steps = completed;
                    next.scheduled_days = 0;
                    next.due = now + step_offset(steps[completed as usize]);
                }
            }
        }
    }

    /// Curve-driven grading for mature items.
    fn grade_review(
        &self,
        next: &mut MemoryModel,
        model: &MemoryModel,
        rating: Rating,
        recall: f64,
        now: DateTime<Utc>,
    ) {
        if rating.is_success() {
            let stability = self.recall_stability(model, recall, rating);
            self.promote_to_review(next, stability, now);
            return;
        }

        next.lapses = model.lapses + 1;
        next.stability = self.forget_stability(model, recall);

        let steps = &self.params.relearning_step_minutes;
        if steps.is_empty() {
            let stability = next.stability;
            self.promote_to_review(next, stability, now);
        } else {
            next.state = ReviewState::Relearning;
            next.learning_steps = 0;
            next.scheduled_days = 0;
            next.due = now + step_offset(steps[0]);
        }
    }

    /// Move `next` onto curve-driven scheduling with the given stability.
    fn promote_to_review(&self, next: &mut MemoryModel, stability: f64, now: DateTime<Utc>) {
        let interval = self.fuzzed_interval_days(self.next_interval_days(stability), next.reps);
        next.state = ReviewState::Review;
        next.stability = stability;
        next.learning_steps = 0;
        next.scheduled_days = interval;
        next.due = now + Duration::days(i64::from(interval));
    }

    // ==================== Model formulas ====================

    fn initial_stability(&self, rating: Rating) -> f64 {
        self.params.w[rating as usize - 1].max(STABILITY_FLOOR)
    }

    fn initial_difficulty(&self, rating: Rating) -> f64 {
        let w = &self.params.w;
        let d = w[4] - (rating as i64 - 3) as f64 * w[5];
        d.clamp(DIFFICULTY_MIN, DIFFICULTY_MAX)
    }

    /// Bounded difficulty update: Again pushes up, Easy pushes down, and the
    /// result is reverted toward the long-run mean before re-clamping.
    fn next_difficulty(&self, difficulty: f64, rating: Rating) -> f64 {
        let w = &self.params.w;
        let shifted = difficulty - w[6] * (rating as i64 - 3) as f64;
        let reverted = w[7] * w[4] + (1.0 - w[7]) * shifted;
        reverted.clamp(DIFFICULTY_MIN, DIFFICULTY_MAX)
    }

    /// Post-success stability. Growth scales with how close the item was to
    /// being forgotten; Hard dampens it and Easy amplifies it.
    fn recall_stability(&self, model: &MemoryModel, recall: f64, rating: Rating) -> f64 {
        let w = &self.params.w;
        let hard_penalty = if rating == Rating::Hard { w[15] } else { 1.0 };
        let easy_bonus = if rating == Rating::Easy { w[16] } else { 1.0 };

        let grown = model.stability
            * (1.0
                + w[8].exp()
                    * (11.0 - model.difficulty)
                    * model.stability.powf(-w[9])
                    * ((1.0 - recall) * w[10]).exp_m1()
                    * hard_penalty
                    * easy_bonus);
        grown.max(STABILITY_FLOOR)
    }

    /// Post-lapse stability, never above the pre-lapse value.
    fn forget_stability(&self, model: &MemoryModel, recall: f64) -> f64 {
        let w = &self.params.w;
        let shrunk = w[11]
            * model.difficulty.powf(-w[12])
            * ((model.stability + 1.0).powf(w[13]) - 1.0)
            * ((1.0 - recall) * w[14]).exp();
        let floor = STABILITY_FLOOR.min(model.stability);
        shrunk.clamp(floor, model.stability)
    }

    /// Invert the forgetting curve at the desired retention, in whole days.
    fn next_interval_days(&self, stability: f64) -> u32 {
        let retention = self.params.desired_retention.clamp(0.0001, 0.9999);
        let interval = stability / FACTOR * (retention.powf(1.0 / DECAY) - 1.0);
        interval.round().clamp(
            f64::from(self.params.min_interval_days),
            f64::from(self.params.max_interval_days),
        ) as u32
    }

    /// Deterministic interval spread. The generator is keyed by the
    /// configured seed, the rep count, and the unfuzzed interval, so a given
    /// (params, model) pair always yields the same schedule and
    /// preview/commit stay in exact agreement.
    fn fuzzed_interval_days(&self, interval: u32, reps: u32) -> u32 {
        if !self.params.enable_fuzz || interval < FUZZ_MIN_INTERVAL_DAYS {
            return interval;
        }

        let seed = self.params.fuzz_seed ^ (u64::from(reps) << 32) ^ u64::from(interval);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let spread = (f64::from(interval) * FUZZ_RANGE).max(1.0);
        let delta: f64 = rng.gen_range(-spread..=spread);

        (f64::from(interval) + delta).round().clamp(
            f64::from(self.params.min_interval_days),
            f64::from(self.params.max_interval_days),
        ) as u32
    }
}

/// Minutes to a time offset; degenerate configs still move time forward.
fn step_offset(minutes: i64) -> Duration {
    Duration::minutes(minutes.max(1))
}

// ==================== Tests ====================
