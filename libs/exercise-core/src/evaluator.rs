//! Evaluation of a single learner response against one action.

use crate::matching::compare_text;
use crate::types::{Action, Response, ScoringMode};
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub is_correct: bool,
    /// Whether the action counts towards the maximum score.
    pub is_scoring: bool,
    /// Share of one point earned, between 0.0 and 1.0.
    pub contribution: f64,
    /// Similarity percentage for similarity-mode text inputs.
    pub similarity: Option<u8>,
}

impl Evaluation {
    fn incorrect(is_scoring: bool) -> Self {
        Self {
            is_correct: false,
            is_scoring,
            contribution: 0.0,
            similarity: None,
        }
    }

    fn graded(is_correct: bool) -> Self {
        Self {
            is_correct,
            is_scoring: true,
            contribution: if is_correct { 1.0 } else { 0.0 },
            similarity: None,
        }
    }
}

/// Evaluate raw learner input against an action.
///
/// Buttons ignore `raw_input`. Returns `None` for comments, which are never evaluated.
pub fn evaluate(action: &Action, raw_input: &str) -> Option<Evaluation> {
    match action {
        Action::Button(button) => Some(if button.is_scoring() {
            Evaluation::graded(true)
        } else {
            Evaluation::incorrect(false)
        }),
        Action::TextInput(input) if input.is_decoy() => Some(Evaluation::incorrect(false)),
        Action::TextInput(input) => {
            let result = compare_text(
                raw_input,
                &input.correct_answer,
                input.scoring_mode,
                input.is_case_sensitive,
            );
            Some(match (input.scoring_mode, result.similarity) {
                (ScoringMode::Similarity, Some(similarity)) => Evaluation {
                    is_correct: true,
                    is_scoring: true,
                    contribution: f64::from(similarity) / 100.0,
                    similarity: Some(similarity),
                },
                _ => Evaluation::graded(result.is_correct),
            })
        }
        Action::Comment(_) => None,
    }
}

/// Score contribution of an already recorded response.
///
/// Partial responses and responses of non-scoring actions contribute nothing.
pub fn contribution(action: &Action, response: &Response) -> f64 {
    if !action.is_scoring() {
        return 0.0;
    }

    match (action, response) {
        (Action::Button(_), Response::Clicked { value }) => {
            if *value {
                1.0
            } else {
                0.0
            }
        }
        (Action::TextInput(input), Response::Text { value, similarity }) => {
            match (input.scoring_mode, similarity) {
                (ScoringMode::Similarity, Some(similarity)) => f64::from(*similarity) / 100.0,
                _ => evaluate(action, value).map_or(0.0, |e| e.contribution),
            }
        }
        _ => 0.0,
    }
}
