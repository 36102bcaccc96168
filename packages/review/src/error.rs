use thiserror::Error;

use recall_algo::SchedulerError;

use crate::grader::GraderError;
use crate::session::SessionPhase;
use crate::store::ItemId;

/// Error taxonomy of the review engine.
///
/// `NotFound`, `GradingFailure` and `ConcurrencyConflict` come back from
/// collaborators; scheduler rejections pass through unchanged; an
/// `IllegalTransition` is the session state machine refusing an event that
/// is not legal in its current phase.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("card {0} not found")]
    NotFound(ItemId),

    /// Recoverable: the session reverts to Answering and the submission can
    /// be retried; the card's memory model is untouched.
    #[error("grading failed: {0}")]
    GradingFailure(#[from] GraderError),

    /// Fatal to this writer: re-read the card and decide whether to retry.
    #[error("conflicting write for card {item}: expected revision {expected}, found {found}")]
    ConcurrencyConflict {
        item: ItemId,
        expected: u64,
        found: u64,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("{event} is not valid in the {phase:?} phase")]
    IllegalTransition {
        phase: SessionPhase,
        event: &'static str,
    },
}
