//! Review session state machine.
//!
//! One session walks a fixed queue of due cards through
//! question → answering → evaluating → feedback, accumulating results until
//! the queue is consumed or the learner exits. The machine is a single
//! exclusively-owned value; every transition is the pure [`step`] function
//! applied to (phase, event), so transitions are testable in isolation and
//! there is no shared mutable session state.
//!
//! The only suspension point is the grader call inside
//! [`ReviewSession::submit_answer`]; the scheduler itself never suspends.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use recall_algo::{Rating, Scheduler};

use crate::error::ReviewError;
use crate::grader::Grader;
use crate::queue::ReviewQueue;
use crate::store::{ItemId, ReviewCard, Store};

// ==================== Phases and events ====================

/// Session lifecycle phase. `Complete` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Question,
    Answering,
    Evaluating,
    Feedback,
    Complete,
}

/// Events driving the machine. `last` marks whether the current card is the
/// final one, which decides between advancing and completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    BeginAnswering,
    Submit,
    GradeAccepted,
    GradeFailed,
    Skip { last: bool },
    Next { last: bool },
    Exit,
}

impl SessionEvent {
    fn name(self) -> &'static str {
        match self {
            Self::BeginAnswering => "beginAnswering",
            Self::Submit => "submitAnswer",
            Self::GradeAccepted => "gradeAccepted",
            Self::GradeFailed => "gradeFailed",
            Self::Skip { .. } => "skip",
            Self::Next { .. } => "next",
            Self::Exit => "exit",
        }
    }
}

/// Pure transition function: old phase × event → new phase.
pub fn step(phase: SessionPhase, event: SessionEvent) -> Result<SessionPhase, ReviewError> {
    use SessionEvent::*;
    use SessionPhase::*;

    let next = match (phase, event) {
        (Question, BeginAnswering) => Answering,
        (Answering, Submit) => Evaluating,
        (Evaluating, GradeAccepted) => Feedback,
        (Evaluating, GradeFailed) => Answering,
        (Question | Answering, Skip { last }) => {
            if last {
                Complete
            } else {
                Question
            }
        }
        (Feedback, Next { last }) => {
            if last {
                Complete
            } else {
                Question
            }
        }
        (phase, Exit) if phase != Complete => Complete,
        (phase, event) => {
            return Err(ReviewError::IllegalTransition {
                phase,
                event: event.name(),
            })
        }
    };
    Ok(next)
}

// ==================== Results ====================

/// One graded card, appended to the session's result log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub item_id: ItemId,
    pub rating: Rating,
    pub feedback: String,
    pub time_spent_ms: i64,
    /// When the committed model comes due again.
    pub next_due: DateTime<Utc>,
}

/// Aggregate view of a completed session.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub reviewed: usize,
    /// Fraction of graded cards rated better than Again.
    pub accuracy: f64,
    pub avg_time_ms: f64,
}

// ==================== Session ====================

/// Per-learner review session. Exclusively owned; one session at a time per
/// learner is assumed, and the store's revision check turns any overlapping
/// writer into an explicit conflict.
pub struct ReviewSession {
    store: Arc<dyn Store>,
    grader: Arc<dyn Grader>,
    scheduler: Scheduler,
    queue: ReviewQueue,
    index: usize,
    phase: SessionPhase,
    results: Vec<ReviewResult>,
    draft: Option<String>,
    shown_at: DateTime<Utc>,
    epoch: u64,
}

impl ReviewSession {
    /// Start a session over an already-materialized queue. An empty queue
    /// is born complete.
    pub fn start(
        store: Arc<dyn Store>,
        grader: Arc<dyn Grader>,
        scheduler: Scheduler,
        queue: ReviewQueue,
        now: DateTime<Utc>,
    ) -> Self {
        let phase = if queue.is_empty() {
            SessionPhase::Complete
        } else {
            SessionPhase::Question
        };
        tracing::debug!(cards = queue.len(), "review session started");

        Self {
            store,
            grader,
            scheduler,
            queue,
            index: 0,
            phase,
            results: Vec::new(),
            draft: None,
            shown_at: now,
            epoch: 0,
        }
    }

    // ==================== Read surface ====================

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_card(&self) -> Option<&ReviewCard> {
        match self.phase {
            SessionPhase::Complete => None,
            _ => self.queue.get(self.index),
        }
    }

    /// Fraction of the queue consumed so far, 0-100.
    pub fn progress(&self) -> u8 {
        let total = self.queue.len();
        if total == 0 {
            return 100;
        }
        let consumed = self.index + usize::from(self.phase == SessionPhase::Feedback);
        (consumed * 100 / total) as u8
    }

    pub fn results(&self) -> &[ReviewResult] {
        &self.results
    }

    /// Last submitted answer, retained across a failed evaluation so a
    /// retry does not lose the learner's text.
    pub fn draft_answer(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Scheduling candidates for the current card, for the rating choice
    /// labels shown before the learner commits.
    pub fn current_previews(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<recall_algo::SchedulingPreview>, ReviewError> {
        match self.current_card() {
            Some(card) => Ok(Some(self.scheduler.preview(&card.memory, now)?)),
            None => Ok(None),
        }
    }

    /// Aggregate results; only available once the session is complete.
    pub fn summary(&self) -> Option<SessionSummary> {
        if self.phase != SessionPhase::Complete {
            return None;
        }
        let reviewed = self.results.len();
        let (accuracy, avg_time_ms) = if reviewed == 0 {
            (0.0, 0.0)
        } else {
            let recalled = self
                .results
                .iter()
                .filter(|result| result.rating.is_success())
                .count();
            let total_ms: i64 = self.results.iter().map(|result| result.time_spent_ms).sum();
            (
                recalled as f64 / reviewed as f64,
                total_ms as f64 / reviewed as f64,
            )
        };
        Some(SessionSummary {
            reviewed,
            accuracy,
            avg_time_ms,
        })
    }

    // ==================== Transitions ====================

    /// Question → Answering.
    pub fn begin_answering(&mut self) -> Result<(), ReviewError> {
        self.phase = step(self.phase, SessionEvent::BeginAnswering)?;
        Ok(())
    }

    /// Answering → Evaluating → Feedback (or back to Answering on any
    /// failure). On success exactly one model update is committed to the
    /// store and exactly one result is appended.
    pub async fn submit_answer(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult, ReviewError> {
        let card = self
            .current_card()
            .cloned()
            .ok_or(ReviewError::IllegalTransition {
                phase: self.phase,
                event: "submitAnswer",
            })?;
        self.phase = step(self.phase, SessionEvent::Submit)?;
        self.draft = Some(text.to_string());
        let epoch = self.epoch;

        let graded = self
            .grader
            .evaluate(&card.prompt, &card.answer, text)
            .await;

        if self.epoch != epoch || self.phase != SessionPhase::Evaluating {
            // The session exited while the grader was in flight; the result
            // must be discarded rather than applied.
            tracing::debug!(item = card.id, "discarding grade for exited session");
            return Err(ReviewError::IllegalTransition {
                phase: self.phase,
                event: "submitAnswer",
            });
        }

        let graded = match graded {
            Ok(graded) => graded,
            Err(err) => {
                self.phase = step(self.phase, SessionEvent::GradeFailed)?;
                tracing::warn!(item = card.id, error = %err, "grading failed, answer kept for retry");
                return Err(err.into());
            }
        };

        let rating = match Rating::try_from(graded.rating) {
            Ok(rating) => rating,
            Err(err) => {
                self.phase = step(self.phase, SessionEvent::GradeFailed)?;
                tracing::warn!(item = card.id, rating = graded.rating, "grader returned an invalid rating");
                return Err(err.into());
            }
        };

        let updated = match self.scheduler.commit(&card.memory, rating, now) {
            Ok(updated) => updated,
            Err(err) => {
                self.phase = step(self.phase, SessionEvent::GradeFailed)?;
                return Err(err.into());
            }
        };

        if let Err(err) = self.store.save(card.id, &updated, card.revision).await {
            self.phase = step(self.phase, SessionEvent::GradeFailed)?;
            tracing::warn!(item = card.id, error = %err, "write-back failed, card left untouched");
            return Err(err);
        }

        let result = ReviewResult {
            item_id: card.id,
            rating,
            feedback: graded.feedback,
            time_spent_ms: (now - self.shown_at).num_milliseconds().max(0),
            next_due: updated.due,
        };
        self.results.push(result.clone());
        self.draft = None;
        self.phase = step(self.phase, SessionEvent::GradeAccepted)?;
        tracing::debug!(
            item = card.id,
            rating = graded.rating,
            state = updated.state.as_str(),
            next_due = %updated.due,
            "review committed"
        );
        Ok(result)
    }

    /// Advance past the current card without grading it. The card's memory
    /// model is not touched.
    pub fn skip(&mut self, now: DateTime<Utc>) -> Result<(), ReviewError> {
        let last = self.index + 1 >= self.queue.len();
        self.phase = step(self.phase, SessionEvent::Skip { last })?;
        self.advance(now);
        Ok(())
    }

    /// Feedback → next Question, or Complete after the last card.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<(), ReviewError> {
        let last = self.index + 1 >= self.queue.len();
        self.phase = step(self.phase, SessionEvent::Next { last })?;
        self.advance(now);
        Ok(())
    }

    /// End the session immediately from any non-terminal phase. Results
    /// already committed stay committed; nothing is rolled back.
    pub fn exit(&mut self) -> Result<(), ReviewError> {
        if self.phase == SessionPhase::Feedback {
            // The current card was already graded; count it as consumed.
            self.index += 1;
        }
        self.phase = step(self.phase, SessionEvent::Exit)?;
        self.epoch += 1;
        tracing::debug!(reviewed = self.results.len(), "review session exited");
        Ok(())
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        self.index += 1;
        self.draft = None;
        self.shown_at = now;
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    // The pure transition table; end-to-end flows live in tests/.

    #[test]
    fn legal_transitions() {
        use SessionEvent::*;
        use SessionPhase::*;

        assert_eq!(step(Question, BeginAnswering).unwrap(), Answering);
        assert_eq!(step(Answering, Submit).unwrap(), Evaluating);
        assert_eq!(step(Evaluating, GradeAccepted).unwrap(), Feedback);
        assert_eq!(step(Evaluating, GradeFailed).unwrap(), Answering);
        assert_eq!(step(Question, Skip { last: false }).unwrap(), Question);
        assert_eq!(step(Answering, Skip { last: true }).unwrap(), Complete);
        assert_eq!(step(Feedback, Next { last: false }).unwrap(), Question);
        assert_eq!(step(Feedback, Next { last: true }).unwrap(), Complete);
    }

    #[test]
    fn exit_is_legal_from_every_non_terminal_phase() {
        use SessionPhase::*;
        for phase in [Question, Answering, Evaluating, Feedback] {
            assert_eq!(step(phase, SessionEvent::Exit).unwrap(), Complete);
        }
        assert!(step(Complete, SessionEvent::Exit).is_err());
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        use SessionEvent::*;
        use SessionPhase::*;

        for (phase, event) in [
            (Question, Submit),
            (Question, Next { last: false }),
            (Answering, BeginAnswering),
            (Feedback, Submit),
            (Feedback, Skip { last: false }),
            (Complete, BeginAnswering),
            (Evaluating, Submit),
        ] {
            let err = step(phase, event).expect_err("must reject");
            assert!(matches!(err, ReviewError::IllegalTransition { .. }));
        }
    }
}
