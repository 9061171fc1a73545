//! Core types for image-anchored interactive exercises.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Button `correct_answer` values (trimmed, lowercased) that make a button the scoring one.
pub const TRUTHY_ANSWERS: [&str; 6] = ["true", "1", "correct", "yes", "si", "sí"];

/// Text input `correct_answer` sentinel marking the field as a decoy.
pub const DECOY_ANSWER: &str = "wrong";

/// Content type reported to the progress store for these exercises.
pub const CONTENT_TYPE: &str = "interactive";

/// A complete exercise definition as fetched from the content service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Exercise {
    /// Position of the step with the given id.
    pub fn step_index(&self, step_id: i64) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    /// Look up an action by its key.
    pub fn action(&self, key: &ActionKey) -> Option<&Action> {
        self.steps
            .iter()
            .find(|s| s.id == key.step_id)
            .and_then(|s| s.actions.iter().find(|a| a.id() == key.action_id))
    }

    /// Iterate over every action of every step, in step order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.steps.iter().flat_map(|s| s.actions.iter())
    }

    /// Number of actions that count towards the maximum score.
    pub fn scoring_action_count(&self) -> usize {
        self.actions().filter(|a| a.is_scoring()).count()
    }
}

/// One image-backed step of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: i64,
    #[serde(default)]
    pub background_image_ref: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Placement of an action, in percentages of the rendered step image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Pixel rectangle produced from a percentage [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    /// Map the percentage box onto an image rendered at `rendered_width` x `rendered_height` pixels.
    pub fn to_pixels(&self, rendered_width: f64, rendered_height: f64) -> PixelRect {
        PixelRect {
            x: self.position_x / 100.0 * rendered_width,
            y: self.position_y / 100.0 * rendered_height,
            width: self.width / 100.0 * rendered_width,
            height: self.height / 100.0 * rendered_height,
        }
    }
}

/// What happens when a learner gets an action wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnErrorAction {
    ShowMessage,
    NextStep,
    #[serde(alias = "next_exercise")]
    EndExercise,
}

impl Default for OnErrorAction {
    fn default() -> Self {
        Self::ShowMessage
    }
}

/// How a text answer is compared with the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    Exact,
    Contains,
    Regex,
    Similarity,
}

impl Default for ScoringMode {
    fn default() -> Self {
        Self::Exact
    }
}

impl ScoringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::Regex => "regex",
            Self::Similarity => "similarity",
        }
    }
}

/// Clickable answer area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonAction {
    pub id: i64,
    pub step_id: i64,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub max_attempts: u32,
    #[serde(default)]
    pub on_error_action: OnErrorAction,
    #[serde(default)]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_style: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl ButtonAction {
    /// Whether this button is the right answer of its step rather than a decoy.
    pub fn is_scoring(&self) -> bool {
        let answer = self.correct_answer.trim().to_lowercase();
        TRUTHY_ANSWERS.contains(&answer.as_str())
    }
}

/// Free-text answer field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInputAction {
    pub id: i64,
    pub step_id: i64,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub is_case_sensitive: bool,
    #[serde(default)]
    pub scoring_mode: ScoringMode,
    #[serde(default)]
    pub max_attempts: u32,
    #[serde(default)]
    pub on_error_action: OnErrorAction,
    #[serde(default)]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_style: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl TextInputAction {
    /// Whether this field is a decoy that can never be answered correctly.
    pub fn is_decoy(&self) -> bool {
        self.correct_answer == DECOY_ANSWER
    }
}

/// Decorative annotation; never evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAction {
    pub id: i64,
    pub step_id: i64,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub comment_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_font_size: Option<String>,
}

/// An element anchored to a step image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum Action {
    Button(ButtonAction),
    TextInput(TextInputAction),
    Comment(CommentAction),
}

impl Action {
    pub fn id(&self) -> i64 {
        match self {
            Self::Button(a) => a.id,
            Self::TextInput(a) => a.id,
            Self::Comment(a) => a.id,
        }
    }

    pub fn step_id(&self) -> i64 {
        match self {
            Self::Button(a) => a.step_id,
            Self::TextInput(a) => a.step_id,
            Self::Comment(a) => a.step_id,
        }
    }

    pub fn key(&self) -> ActionKey {
        ActionKey::new(self.step_id(), self.id())
    }

    pub fn geometry(&self) -> &Geometry {
        match self {
            Self::Button(a) => &a.geometry,
            Self::TextInput(a) => &a.geometry,
            Self::Comment(a) => &a.geometry,
        }
    }

    /// Whether this action counts towards the maximum score.
    pub fn is_scoring(&self) -> bool {
        match self {
            Self::Button(a) => a.is_scoring(),
            Self::TextInput(a) => !a.is_decoy(),
            Self::Comment(_) => false,
        }
    }

    /// Error policy settings, `None` for comments.
    pub fn error_settings(&self) -> Option<ErrorSettings<'_>> {
        match self {
            Self::Button(a) => Some(ErrorSettings {
                on_error: a.on_error_action,
                max_attempts: a.max_attempts,
                message: &a.error_message,
            }),
            Self::TextInput(a) => Some(ErrorSettings {
                on_error: a.on_error_action,
                max_attempts: a.max_attempts,
                message: &a.error_message,
            }),
            Self::Comment(_) => None,
        }
    }
}

/// The error-related configuration shared by buttons and text inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSettings<'a> {
    pub on_error: OnErrorAction,
    /// Attempts allowed beyond the first failure.
    pub max_attempts: u32,
    pub message: &'a str,
}

/// Identifies one action within an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionKey {
    pub step_id: i64,
    pub action_id: i64,
}

impl ActionKey {
    pub fn new(step_id: i64, action_id: i64) -> Self {
        Self { step_id, action_id }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.step_id, self.action_id)
    }
}

/// A learner's recorded answer for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// Button click, `true` when it was the scoring button.
    Clicked { value: bool },
    /// Submitted text answer.
    Text {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        similarity: Option<u8>,
    },
    /// Autosaved similarity-mode text that was never submitted.
    Partial {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        similarity: Option<u8>,
    },
}

impl Response {
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }

    /// Text value, if this is a text response.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { value, .. } | Self::Partial { value, .. } => Some(value),
            Self::Clicked { .. } => None,
        }
    }
}

/// Responses of one session, keyed by action.
pub type ResponseMap = HashMap<ActionKey, Response>;

/// Input coming from the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnerInput {
    Click,
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn button(answer: &str) -> ButtonAction {
        ButtonAction {
            id: 1,
            step_id: 1,
            geometry: Geometry::default(),
            correct_answer: answer.to_string(),
            max_attempts: 0,
            on_error_action: OnErrorAction::default(),
            error_message: String::new(),
            label_style: None,
            placeholder: None,
        }
    }

    #[test]
    fn truthy_button_answers() {
        for answer in ["true", "TRUE", " 1 ", "Correct", "yes", "Si", "SÍ"] {
            assert!(button(answer).is_scoring(), "{answer} should score");
        }
        for answer in ["false", "0", "", "no", "wrong", "truthy"] {
            assert!(!button(answer).is_scoring(), "{answer} should not score");
        }
    }

    #[test]
    fn deserialize_tagged_actions() {
        let json = r#"[
            {"action_type": "button", "id": 1, "step_id": 9, "position_x": 10, "position_y": 20,
             "width": 5, "height": 5, "correct_answer": "true", "on_error_action": "next_exercise"},
            {"action_type": "text_input", "id": 2, "step_id": 9, "position_x": 0, "position_y": 0,
             "width": 50, "height": 10, "correct_answer": "Paris", "scoring_mode": "similarity"},
            {"action_type": "comment", "id": 3, "step_id": 9, "position_x": 0, "position_y": 0,
             "width": 1, "height": 1, "comment_text": "Look here"}
        ]"#;
        let actions: Vec<Action> = serde_json::from_str(json).unwrap();

        match &actions[0] {
            Action::Button(b) => {
                assert_eq!(b.on_error_action, OnErrorAction::EndExercise);
                assert_eq!(b.geometry.position_y, 20.0);
                assert_eq!(b.max_attempts, 0);
            }
            other => panic!("expected button, got {other:?}"),
        }
        match &actions[1] {
            Action::TextInput(t) => {
                assert_eq!(t.scoring_mode, ScoringMode::Similarity);
                assert!(!t.is_case_sensitive);
                assert_eq!(t.on_error_action, OnErrorAction::ShowMessage);
            }
            other => panic!("expected text input, got {other:?}"),
        }
        assert!(matches!(actions[2], Action::Comment(_)));
        assert_eq!(actions[2].key(), ActionKey::new(9, 3));
    }

    #[test]
    fn decoys_and_comments_do_not_score() {
        let json = r#"[
            {"action_type": "text_input", "id": 2, "step_id": 1, "position_x": 0, "position_y": 0,
             "width": 1, "height": 1, "correct_answer": "wrong"},
            {"action_type": "comment", "id": 3, "step_id": 1, "position_x": 0, "position_y": 0,
             "width": 1, "height": 1}
        ]"#;
        let actions: Vec<Action> = serde_json::from_str(json).unwrap();
        assert!(actions.iter().all(|a| !a.is_scoring()));
        assert!(actions[1].error_settings().is_none());
    }

    #[test]
    fn geometry_maps_to_pixels() {
        let geometry = Geometry {
            position_x: 10.0,
            position_y: 50.0,
            width: 25.0,
            height: 10.0,
        };
        let rect = geometry.to_pixels(800.0, 600.0);
        assert_eq!(
            rect,
            PixelRect {
                x: 80.0,
                y: 300.0,
                width: 200.0,
                height: 60.0
            }
        );
    }

    #[test]
    fn response_serializes_with_kind_tag() {
        let response = Response::Partial {
            value: "abc".to_string(),
            similarity: Some(40),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["kind"], "partial");
        assert_eq!(json["similarity"], 40);
        assert!(response.is_partial());
    }
}
