//! Loading and validation of exercise definitions.
//!
//! # Format
//! ```json
//! {
//!   "id": 7,
//!   "title": "Find the capital",
//!   "steps": [
//!     {
//!       "id": 1,
//!       "background_image_ref": "https://cdn.example.com/map.png",
//!       "actions": [
//!         { "action_type": "button", "id": 1, "step_id": 1,
//!           "position_x": 40, "position_y": 25, "width": 10, "height": 6,
//!           "correct_answer": "true" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::error::{ExerciseError, Result};
use crate::types::Exercise;
use std::collections::HashSet;

/// Parse and validate a JSON exercise definition.
pub fn parse_exercise(content: &str) -> Result<Exercise> {
    let exercise: Exercise = serde_json::from_str(content)?;
    validate(&exercise)?;
    Ok(exercise)
}

/// Check the structural invariants the session relies on.
pub fn validate(exercise: &Exercise) -> Result<()> {
    let mut seen_steps = HashSet::new();

    for step in &exercise.steps {
        if !seen_steps.insert(step.id) {
            return Err(ExerciseError::DuplicateStep { step_id: step.id });
        }

        let mut seen_actions = HashSet::new();
        for action in &step.actions {
            if action.step_id() != step.id {
                return Err(ExerciseError::StepMismatch {
                    step_id: step.id,
                    action_id: action.id(),
                    declared: action.step_id(),
                });
            }
            if !seen_actions.insert(action.id()) {
                return Err(ExerciseError::DuplicateAction {
                    step_id: step.id,
                    action_id: action.id(),
                });
            }
        }
    }

    Ok(())
}
