//! Line-oriented terminal front end.

use std::fmt::Write;

use exercise_core::{
    Action, Completion, ExerciseSession, IgnoreReason, SessionState, SubmitOutcome, Transition,
};

use crate::driver::DriverEvent;

/// Nominal image size used to show pixel placements.
const PREVIEW_WIDTH: f64 = 1280.0;
const PREVIEW_HEIGHT: f64 = 720.0;

pub const HELP: &str = "\
Commands:
  click <action>         click a button on the current step
  type <action> <text>   submit text for an input
  draft <action> <text>  autosave unsent text for a similarity input
  next | prev            move between steps
  goto <step>            jump to a step (1-based)
  show                   print the current step
  finish                 score the attempt now
  reset                  start over
  quit                   leave the player";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Click { action_id: i64 },
    Type { action_id: i64, text: String },
    Draft { action_id: i64, text: String },
    Next,
    Prev,
    Goto { step: usize },
    Show,
    Finish,
    Reset,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match word.to_lowercase().as_str() {
            "click" => Ok(Self::Click {
                action_id: parse_id(rest)?,
            }),
            "type" => {
                let (action_id, text) = id_and_text(rest)?;
                Ok(Self::Type { action_id, text })
            }
            "draft" => {
                let (action_id, text) = id_and_text(rest)?;
                Ok(Self::Draft { action_id, text })
            }
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            "goto" => match rest.parse::<usize>() {
                Ok(step) if step > 0 => Ok(Self::Goto { step }),
                _ => Err(format!("expected a step number, got '{}'", rest)),
            },
            "show" => Ok(Self::Show),
            "finish" => Ok(Self::Finish),
            "reset" => Ok(Self::Reset),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{}', try 'help'", other)),
        }
    }
}

fn parse_id(value: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("expected an action id, got '{}'", value))
}

fn id_and_text(rest: &str) -> Result<(i64, String), String> {
    let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Ok((parse_id(id)?, text.trim().to_string()))
}

/// Current step with its actions, or the final score.
pub fn render(session: &ExerciseSession) -> String {
    let exercise = session.exercise();
    let mut out = String::new();

    match session.state() {
        SessionState::NotStarted => {
            let _ = writeln!(out, "{} (not started)", exercise.title);
        }
        SessionState::Completed { .. } => {
            if let Some(completion) = session.completion() {
                out.push_str(&render_completion(completion));
            }
        }
        SessionState::InStep { index } => {
            let step = &exercise.steps[*index];
            let _ = writeln!(
                out,
                "{} - step {}/{}",
                exercise.title,
                index + 1,
                exercise.steps.len()
            );
            if let Some(image) = &step.background_image_ref {
                let _ = writeln!(out, "  image: {}", image);
            }
            for action in &step.actions {
                let rect = action.geometry().to_pixels(PREVIEW_WIDTH, PREVIEW_HEIGHT);
                let kind = match action {
                    Action::Button(_) => "button".to_string(),
                    Action::TextInput(input) => match &input.placeholder {
                        Some(hint) => format!("text \"{}\"", hint),
                        None => "text".to_string(),
                    },
                    Action::Comment(comment) => format!("note: {}", comment.comment_text),
                };
                let answered = match session.response(&action.key()) {
                    Some(r) if r.is_partial() => " (draft saved)",
                    Some(_) => " (answered)",
                    None => "",
                };
                let _ = writeln!(
                    out,
                    "  [{}] {} at ({:.0}, {:.0}){}",
                    action.id(),
                    kind,
                    rect.x,
                    rect.y,
                    answered
                );
            }
            let score = session.score();
            let _ = writeln!(out, "  score so far: {:.2}/{}", score.score, score.max_score);
        }
    }

    out
}

pub fn render_completion(completion: &Completion) -> String {
    let summary = &completion.summary;
    let status = if completion.is_completed {
        "completed"
    } else {
        "finished"
    };
    format!(
        "Exercise {}: {}% ({:.2}/{}), best {}%\n",
        status, summary.percentage, summary.score, summary.max_score, completion.best_score
    )
}

pub fn describe_outcome(outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::Accepted { evaluation, .. } => match evaluation.similarity {
            Some(similarity) => format!("Saved ({}% match)", similarity),
            None => "Correct!".to_string(),
        },
        SubmitOutcome::Retry {
            message, remaining, ..
        } => {
            let message = if message.is_empty() {
                "Not quite"
            } else {
                message.as_str()
            };
            format!("{} ({} tries left)", message, remaining)
        }
        SubmitOutcome::ForcedResolve { message, .. } => match message {
            Some(message) if !message.is_empty() => format!("{} Moving on.", message),
            _ => "Incorrect. Moving on.".to_string(),
        },
        SubmitOutcome::Ignored { reason } => match reason {
            IgnoreReason::NotInStep => "The exercise is not running".to_string(),
            IgnoreReason::NotOnCurrentStep | IgnoreReason::UnknownAction => {
                "No such action on this step".to_string()
            }
            IgnoreReason::StepResolved => "This step is already answered".to_string(),
            IgnoreReason::NotInteractive => "That is only a note".to_string(),
            IgnoreReason::EmptyInput => "Type something first".to_string(),
            IgnoreReason::InputMismatch => "Use 'click' for buttons and 'type' for text".to_string(),
        },
    }
}

pub fn describe_event(event: &DriverEvent) -> Option<String> {
    match event {
        DriverEvent::Advanced(Transition::Step(index)) => {
            Some(format!("Moving to step {}", index + 1))
        }
        DriverEvent::Advanced(Transition::Complete) => None,
        DriverEvent::Completed(completion) => Some(render_completion(completion)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exercise_core::{parse_exercise, ActionKey, LearnerInput, NoopReporter};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("click 3"), Ok(Command::Click { action_id: 3 }));
        assert_eq!(
            Command::parse("  type 4 New  York "),
            Ok(Command::Type {
                action_id: 4,
                text: "New  York".to_string()
            })
        );
        assert_eq!(
            Command::parse("draft 4"),
            Ok(Command::Draft {
                action_id: 4,
                text: String::new()
            })
        );
        assert_eq!(Command::parse("GOTO 2"), Ok(Command::Goto { step: 2 }));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn reject_bad_commands() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("click x").is_err());
        assert!(Command::parse("goto 0").is_err());
        assert!(Command::parse("jump 1").is_err());
    }

    #[test]
    fn render_step_and_outcome() {
        let exercise = parse_exercise(
            r#"{"id": 1, "title": "Map", "steps": [{"id": 7, "background_image_ref": "map.png",
                "actions": [
                  {"action_type": "button", "id": 1, "step_id": 7, "position_x": 50,
                   "position_y": 50, "width": 5, "height": 5, "correct_answer": "true"},
                  {"action_type": "comment", "id": 2, "step_id": 7, "position_x": 0,
                   "position_y": 0, "width": 5, "height": 5, "comment_text": "Hint"}
                ]}]}"#,
        )
        .unwrap();
        let mut session = ExerciseSession::new(exercise, Arc::new(NoopReporter)).unwrap();
        session.start();

        let view = render(&session);
        assert!(view.contains("Map - step 1/1"));
        assert!(view.contains("image: map.png"));
        assert!(view.contains("[1] button at (640, 360)"));
        assert!(view.contains("[2] note: Hint"));

        let outcome = session.submit(ActionKey::new(7, 1), LearnerInput::Click);
        assert_eq!(describe_outcome(&outcome), "Correct!");

        let outcome = session.submit(ActionKey::new(7, 1), LearnerInput::Click);
        assert_eq!(describe_outcome(&outcome), "This step is already answered");
    }
}
