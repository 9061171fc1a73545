//! Error policy for incorrect responses.

use crate::types::{ActionKey, ErrorSettings, OnErrorAction};
use serde::Serialize;
use std::collections::HashMap;

/// What the session should do after an incorrect response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ErrorDecision {
    /// Stay on the step and let the learner try again.
    Retry {
        message: String,
        attempts: u32,
        remaining: u32,
    },
    /// Record the action as wrong and move to the next step (or complete).
    ResolveAndAdvance { message: Option<String> },
    /// Record the action as wrong and complete the exercise now.
    ResolveAndTerminate,
}

/// Decide the outcome of an incorrect response.
///
/// `attempts` is the failure count for the action including this one.
pub fn decide(settings: &ErrorSettings<'_>, attempts: u32) -> ErrorDecision {
    match settings.on_error {
        OnErrorAction::NextStep => ErrorDecision::ResolveAndAdvance { message: None },
        OnErrorAction::EndExercise => ErrorDecision::ResolveAndTerminate,
        OnErrorAction::ShowMessage if attempts > settings.max_attempts => {
            ErrorDecision::ResolveAndAdvance {
                message: Some(settings.message.to_string()),
            }
        }
        OnErrorAction::ShowMessage => ErrorDecision::Retry {
            message: settings.message.to_string(),
            attempts,
            remaining: (settings.max_attempts - attempts).saturating_add(1),
        },
    }
}

/// Failure counters per action. Counters only grow until [`Attempts::clear`].
#[derive(Debug, Clone, Default)]
pub struct Attempts {
    counts: HashMap<ActionKey, u32>,
}

impl Attempts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current failure count for an action.
    pub fn get(&self, key: &ActionKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Record one more failure and return the new count.
    pub fn increment(&mut self, key: ActionKey) -> u32 {
        let count = self.counts.entry(key).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
