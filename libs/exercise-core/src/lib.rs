//! Interactive exercise engine shared by the player and the backend.
//!
//! Provides:
//! - Exercise definition types and JSON loading
//! - Answer matching (exact, contains, regex, Levenshtein similarity)
//! - Per-action evaluation and the retry/failure policy
//! - Score aggregation and the session state machine
//! - The progress reporting boundary

pub mod error;
pub mod evaluator;
pub mod matching;
pub mod parser;
pub mod policy;
pub mod progress;
pub mod scoring;
pub mod session;
pub mod types;

pub use error::{ExerciseError, Result};
pub use evaluator::{evaluate, Evaluation};
pub use matching::{compare_text, levenshtein_distance, normalize, similarity, TextMatch};
pub use parser::parse_exercise;
pub use policy::{decide, Attempts, ErrorDecision};
pub use progress::{MemoryReporter, NoopReporter, ProgressReporter, ProgressUpdate};
pub use scoring::{aggregate, ScoreSummary};
pub use session::{
    Completion, ExerciseSession, IgnoreReason, ScheduledAdvance, SessionConfig, SessionState,
    SubmitOutcome, Transition,
};
pub use types::{
    Action, ActionKey, ButtonAction, CommentAction, Exercise, Geometry, LearnerInput,
    OnErrorAction, Response, ResponseMap, ScoringMode, Step, TextInputAction,
};
