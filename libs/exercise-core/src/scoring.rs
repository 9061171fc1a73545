//! Whole-exercise score aggregation.

use crate::evaluator::contribution;
use crate::types::{Exercise, ResponseMap};
use serde::{Deserialize, Serialize};

/// Aggregated score of an exercise attempt.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: f64,
    pub max_score: u32,
    /// Rounded `score / max_score` as a percentage, 0 when nothing is scorable.
    pub percentage: u8,
}

/// Recompute the score from every recorded response.
///
/// Pure function of its inputs, safe to call after each action and at completion.
pub fn aggregate(exercise: &Exercise, responses: &ResponseMap) -> ScoreSummary {
    let mut score = 0.0;
    let mut max_score = 0u32;

    for action in exercise.actions().filter(|a| a.is_scoring()) {
        max_score += 1;
        if let Some(response) = responses.get(&action.key()) {
            score += contribution(action, response);
        }
    }

    let percentage = if max_score > 0 {
        (score / f64::from(max_score) * 100.0).round().clamp(0.0, 100.0) as u8
    } else {
        0
    };

    ScoreSummary {
        score,
        max_score,
        percentage,
    }
}
