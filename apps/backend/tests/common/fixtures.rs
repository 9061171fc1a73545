//! Test fixtures and factory functions for creating test data.

use serde_json::json;

/// Create a learner register request body.
pub fn learner_register_request(name: Option<&str>) -> serde_json::Value {
    match name {
        Some(n) => json!({ "name": n }),
        None => json!({}),
    }
}

/// Two-step exercise with one scoring button and one similarity field.
pub fn sample_exercise(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Find the capital",
        "description": "Click the capital, then name it",
        "steps": [
            {
                "id": 1,
                "background_image_ref": "https://cdn.example.com/map.png",
                "actions": [
                    {
                        "action_type": "button", "id": 1, "step_id": 1,
                        "position_x": 40, "position_y": 25, "width": 10, "height": 6,
                        "correct_answer": "true"
                    },
                    {
                        "action_type": "button", "id": 2, "step_id": 1,
                        "position_x": 70, "position_y": 60, "width": 10, "height": 6,
                        "correct_answer": "false", "max_attempts": 1,
                        "error_message": "That is not the capital"
                    }
                ]
            },
            {
                "id": 2,
                "actions": [
                    {
                        "action_type": "text_input", "id": 3, "step_id": 2,
                        "position_x": 10, "position_y": 80, "width": 50, "height": 8,
                        "correct_answer": "Madrid", "scoring_mode": "similarity"
                    }
                ]
            }
        ]
    })
}

/// Exercise whose action points at a step it is not placed in.
pub fn mismatched_exercise(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Broken",
        "steps": [
            {
                "id": 1,
                "actions": [
                    {
                        "action_type": "comment", "id": 1, "step_id": 2,
                        "position_x": 0, "position_y": 0, "width": 1, "height": 1
                    }
                ]
            }
        ]
    })
}

/// Create a progress request body.
pub fn progress_request(is_completed: bool, score: i32) -> serde_json::Value {
    json!({ "is_completed": is_completed, "score": score })
}
