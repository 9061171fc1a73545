//! Exercise session state machine.
//!
//! A session walks `NotStarted -> InStep(index) -> Completed`. All calls are
//! synchronous; the only deferred work is the auto-advance after a resolved
//! step, which is handed to the host as a [`ScheduledAdvance`] and applied
//! with [`ExerciseSession::fire`] once its delay has elapsed.

use crate::error::Result;
use crate::evaluator::{evaluate, Evaluation};
use crate::parser::validate;
use crate::policy::{decide, Attempts, ErrorDecision};
use crate::progress::{best_of, ProgressReporter, ProgressUpdate};
use crate::scoring::{aggregate, ScoreSummary};
use crate::types::{
    Action, ActionKey, Exercise, LearnerInput, Response, ResponseMap, ScoringMode, Step,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between resolving a step and moving on, so feedback can be shown.
    pub feedback_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            feedback_delay: Duration::from_millis(1200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InStep { index: usize },
    Completed { summary: ScoreSummary },
}

/// Where a scheduled advance leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "to", content = "index", rename_all = "snake_case")]
pub enum Transition {
    Step(usize),
    Complete,
}

/// A pending transition the host must fire after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledAdvance {
    pub ticket: u64,
    pub target: Transition,
    pub delay: Duration,
}

/// Why a submission had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    NotInStep,
    NotOnCurrentStep,
    UnknownAction,
    StepResolved,
    NotInteractive,
    EmptyInput,
    InputMismatch,
}

/// Result of [`ExerciseSession::submit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Ignored { reason: IgnoreReason },
    /// Correct (or similarity-graded) answer; the step is resolved.
    Accepted {
        evaluation: Evaluation,
        advance: ScheduledAdvance,
    },
    /// Wrong answer, the learner may try again.
    Retry {
        message: String,
        attempts: u32,
        remaining: u32,
    },
    /// Wrong answer recorded as final by the error policy.
    ForcedResolve {
        evaluation: Evaluation,
        message: Option<String>,
        advance: ScheduledAdvance,
    },
}

impl SubmitOutcome {
    /// The advance to schedule, if the step was resolved.
    pub fn advance(&self) -> Option<ScheduledAdvance> {
        match self {
            Self::Accepted { advance, .. } | Self::ForcedResolve { advance, .. } => Some(*advance),
            _ => None,
        }
    }
}

/// Final result of a finished attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub summary: ScoreSummary,
    pub is_completed: bool,
    /// Optimistic local best; the progress store has the final word.
    pub best_score: u8,
    pub completed_at: DateTime<Utc>,
}

/// A learner's run through one exercise.
pub struct ExerciseSession {
    exercise: Exercise,
    config: SessionConfig,
    reporter: Arc<dyn ProgressReporter>,
    state: SessionState,
    responses: ResponseMap,
    attempts: Attempts,
    resolved_steps: HashSet<usize>,
    pending: Option<ScheduledAdvance>,
    next_ticket: u64,
    last_error: Option<String>,
    completion: Option<Completion>,
    best_score: Option<u8>,
}

impl ExerciseSession {
    /// Create a session for a validated exercise.
    pub fn new(exercise: Exercise, reporter: Arc<dyn ProgressReporter>) -> Result<Self> {
        validate(&exercise)?;
        Ok(Self {
            exercise,
            config: SessionConfig::default(),
            reporter,
            state: SessionState::NotStarted,
            responses: ResponseMap::new(),
            attempts: Attempts::new(),
            resolved_steps: HashSet::new(),
            pending: None,
            next_ticket: 0,
            last_error: None,
            completion: None,
            best_score: None,
        })
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the local best score, typically from the progress store.
    pub fn with_best_score(mut self, best_score: Option<u8>) -> Self {
        self.best_score = best_score;
        self
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Index of the step being shown.
    pub fn current_step(&self) -> Option<usize> {
        match self.state {
            SessionState::InStep { index } => Some(index),
            _ => None,
        }
    }

    pub fn step(&self) -> Option<&Step> {
        self.current_step().and_then(|i| self.exercise.steps.get(i))
    }

    pub fn responses(&self) -> &ResponseMap {
        &self.responses
    }

    pub fn response(&self, key: &ActionKey) -> Option<&Response> {
        self.responses.get(key)
    }

    pub fn attempts(&self, key: &ActionKey) -> u32 {
        self.attempts.get(key)
    }

    pub fn is_step_resolved(&self, index: usize) -> bool {
        self.resolved_steps.contains(&index)
    }

    pub fn pending(&self) -> Option<ScheduledAdvance> {
        self.pending
    }

    /// Error message to display for the last wrong answer.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    pub fn best_score(&self) -> Option<u8> {
        self.best_score
    }

    /// Running score over the responses recorded so far.
    pub fn score(&self) -> ScoreSummary {
        aggregate(&self.exercise, &self.responses)
    }

    /// Begin a fresh attempt at the first step.
    pub fn start(&mut self) {
        self.clear();
        if self.exercise.steps.is_empty() {
            self.finish();
        } else {
            self.enter_step(0);
        }
        tracing::debug!(exercise_id = self.exercise.id, "exercise started");
    }

    /// Evaluate learner input for an action on the current step.
    pub fn submit(&mut self, key: ActionKey, input: LearnerInput) -> SubmitOutcome {
        let index = match self.state {
            SessionState::InStep { index } => index,
            _ => return ignored(IgnoreReason::NotInStep),
        };
        let step = &self.exercise.steps[index];
        if step.id != key.step_id {
            return ignored(IgnoreReason::NotOnCurrentStep);
        }
        if self.resolved_steps.contains(&index) {
            return ignored(IgnoreReason::StepResolved);
        }
        let Some(action) = step.actions.iter().find(|a| a.id() == key.action_id).cloned() else {
            return ignored(IgnoreReason::UnknownAction);
        };

        let raw = match (&action, input) {
            (Action::Comment(_), _) => return ignored(IgnoreReason::NotInteractive),
            (Action::Button(_), LearnerInput::Click) => String::new(),
            (Action::TextInput(_), LearnerInput::Text(text)) => {
                if text.trim().is_empty() {
                    return ignored(IgnoreReason::EmptyInput);
                }
                text
            }
            _ => return ignored(IgnoreReason::InputMismatch),
        };

        let (Some(evaluation), Some(settings)) = (evaluate(&action, &raw), action.error_settings())
        else {
            return ignored(IgnoreReason::NotInteractive);
        };

        self.last_error = None;

        if evaluation.is_correct {
            self.resolve(index, &action, raw, &evaluation);
            let advance = self.schedule(self.after(index));
            tracing::debug!(action = %key, contribution = evaluation.contribution, "answer accepted");
            return SubmitOutcome::Accepted {
                evaluation,
                advance,
            };
        }

        let attempts = self.attempts.increment(key);
        match decide(&settings, attempts) {
            ErrorDecision::Retry {
                message,
                attempts,
                remaining,
            } => {
                tracing::debug!(action = %key, attempts, remaining, "wrong answer, retry allowed");
                self.last_error = Some(message.clone());
                SubmitOutcome::Retry {
                    message,
                    attempts,
                    remaining,
                }
            }
            ErrorDecision::ResolveAndAdvance { message } => {
                tracing::debug!(action = %key, attempts, "wrong answer, moving on");
                self.resolve(index, &action, raw, &evaluation);
                self.last_error = message.clone();
                let advance = self.schedule(self.after(index));
                SubmitOutcome::ForcedResolve {
                    evaluation,
                    message,
                    advance,
                }
            }
            ErrorDecision::ResolveAndTerminate => {
                tracing::debug!(action = %key, attempts, "wrong answer, ending exercise");
                self.resolve(index, &action, raw, &evaluation);
                let advance = self.schedule(Transition::Complete);
                SubmitOutcome::ForcedResolve {
                    evaluation,
                    message: None,
                    advance,
                }
            }
        }
    }

    /// Autosave unsubmitted text of a similarity-mode field.
    ///
    /// Returns `false` when nothing was stored: wrong field kind, blank text,
    /// or the field already holds a submitted answer.
    pub fn record_partial(&mut self, key: ActionKey, text: &str) -> bool {
        if !matches!(self.state, SessionState::InStep { .. }) || text.trim().is_empty() {
            return false;
        }
        let Some(action) = self.exercise.action(&key) else {
            return false;
        };
        let Action::TextInput(input) = action else {
            return false;
        };
        if input.scoring_mode != ScoringMode::Similarity || input.is_decoy() {
            return false;
        }
        if matches!(self.responses.get(&key), Some(r) if !r.is_partial()) {
            return false;
        }

        let similarity = evaluate(action, text).and_then(|e| e.similarity);
        self.responses.insert(
            key,
            Response::Partial {
                value: text.to_string(),
                similarity,
            },
        );
        true
    }

    /// Apply a scheduled advance. Stale or cancelled tickets are ignored.
    pub fn fire(&mut self, ticket: u64) -> Option<Transition> {
        let pending = self.pending.filter(|p| p.ticket == ticket)?;
        self.pending = None;
        match pending.target {
            Transition::Step(index) => self.enter_step(index),
            Transition::Complete => {
                self.complete();
            }
        }
        Some(pending.target)
    }

    /// Drop the pending advance, e.g. when the view goes away.
    pub fn cancel_pending(&mut self) -> Option<ScheduledAdvance> {
        self.pending.take()
    }

    /// Jump to any step. Does not evaluate anything or consume attempts.
    pub fn go_to_step(&mut self, index: usize) -> bool {
        if self.current_step().is_none() || index >= self.exercise.steps.len() {
            return false;
        }
        self.pending = None;
        self.enter_step(index);
        true
    }

    pub fn previous_step(&mut self) -> bool {
        match self.current_step() {
            Some(index) if index > 0 => self.go_to_step(index - 1),
            _ => false,
        }
    }

    pub fn next_step(&mut self) -> bool {
        match self.current_step() {
            Some(index) => self.go_to_step(index + 1),
            None => false,
        }
    }

    /// Score the attempt, report it, and finish the session.
    ///
    /// Returns the existing completion when already completed and `None`
    /// before `start`.
    pub fn complete(&mut self) -> Option<Completion> {
        match self.state {
            SessionState::NotStarted => None,
            SessionState::Completed { .. } => self.completion.clone(),
            SessionState::InStep { .. } => Some(self.finish()),
        }
    }

    /// Throw away the attempt and return to `NotStarted`.
    pub fn reset(&mut self) {
        self.clear();
        self.state = SessionState::NotStarted;
        tracing::debug!(exercise_id = self.exercise.id, "exercise reset");
    }

    fn clear(&mut self) {
        self.responses.clear();
        self.attempts.clear();
        self.resolved_steps.clear();
        self.pending = None;
        self.last_error = None;
        self.completion = None;
    }

    fn enter_step(&mut self, index: usize) {
        self.resolved_steps.remove(&index);
        self.last_error = None;
        self.state = SessionState::InStep { index };
    }

    fn after(&self, index: usize) -> Transition {
        if index + 1 < self.exercise.steps.len() {
            Transition::Step(index + 1)
        } else {
            Transition::Complete
        }
    }

    fn schedule(&mut self, target: Transition) -> ScheduledAdvance {
        self.next_ticket += 1;
        let advance = ScheduledAdvance {
            ticket: self.next_ticket,
            target,
            delay: self.config.feedback_delay,
        };
        self.pending = Some(advance);
        advance
    }

    fn resolve(&mut self, index: usize, action: &Action, raw: String, evaluation: &Evaluation) {
        let response = match action {
            Action::TextInput(_) => Response::Text {
                value: raw,
                similarity: evaluation.similarity,
            },
            _ => Response::Clicked {
                value: evaluation.is_correct,
            },
        };
        self.responses.insert(action.key(), response);
        self.resolved_steps.insert(index);
    }

    fn finish(&mut self) -> Completion {
        self.pending = None;
        let summary = aggregate(&self.exercise, &self.responses);
        let is_completed = summary.percentage >= 100;
        let best_score = best_of(self.best_score, summary.percentage);
        self.best_score = Some(best_score);

        self.reporter.report(ProgressUpdate::interactive(
            self.exercise.id,
            is_completed,
            summary.percentage,
        ));
        tracing::info!(
            exercise_id = self.exercise.id,
            score = summary.score,
            max_score = summary.max_score,
            percentage = summary.percentage,
            "exercise completed"
        );

        let completion = Completion {
            summary,
            is_completed,
            best_score,
            completed_at: Utc::now(),
        };
        self.state = SessionState::Completed { summary };
        self.completion = Some(completion.clone());
        completion
    }
}

fn ignored(reason: IgnoreReason) -> SubmitOutcome {
    SubmitOutcome::Ignored { reason }
}
