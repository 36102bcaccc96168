pub mod config;
pub mod error;
pub mod grader;
pub mod logging;
pub mod queue;
pub mod seed;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::ReviewError;
pub use grader::{GradedAnswer, Grader, GraderError, LexicalGrader};
pub use queue::ReviewQueue;
pub use session::{ReviewResult, ReviewSession, SessionPhase, SessionSummary};
pub use store::{DueForecast, ItemId, MemoryStore, ReviewCard, Store};
