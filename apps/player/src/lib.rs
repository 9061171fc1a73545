//! Terminal player for interactive exercises.

pub mod client;
pub mod config;
pub mod debounce;
pub mod driver;
pub mod reporter;
pub mod retry;
pub mod source;
pub mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exercise_core::types::CONTENT_TYPE;
use exercise_core::{ActionKey, ExerciseSession, LearnerInput, NoopReporter, ProgressReporter};

use crate::client::{ApiClient, ClientError};
use crate::config::PlayerConfig;
use crate::debounce::Debouncer;
use crate::driver::SessionDriver;
use crate::reporter::HttpProgressReporter;
use crate::source::{ExerciseSource, FileSource};
use crate::terminal::{describe_event, describe_outcome, render, Command, HELP};

#[derive(Parser, Debug)]
#[command(name = "exercise-player")]
#[command(about = "Play an image-anchored interactive exercise in the terminal")]
pub struct Args {
    /// Topic whose exercise is fetched from the backend
    #[arg(required_unless_present = "file")]
    pub topic_id: Option<i64>,

    /// Load the exercise from a JSON file instead
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Do not send progress to the backend
    #[arg(long)]
    pub offline: bool,

    /// Learner name used when registering
    #[arg(long)]
    pub name: Option<String>,
}

pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = PlayerConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = ApiClient::new(&config.api_url, config.api_token.clone());
    let online = !args.offline && connect(&client, &args).await?;

    let exercise = match &args.file {
        Some(path) => FileSource::new(path).fetch(args.topic_id.unwrap_or_default()).await,
        None => {
            let topic_id = args.topic_id.context("a topic id is required")?;
            client.fetch(topic_id).await
        }
    }?;

    let best_score = if online {
        match client.get_progress(CONTENT_TYPE, exercise.id).await {
            Ok(record) => record.map(|r| r.best_score()),
            Err(e) => {
                tracing::warn!("Could not load previous progress: {}", e);
                None
            }
        }
    } else {
        None
    };

    let http_reporter = online
        .then(|| Arc::new(HttpProgressReporter::new(client.clone(), config.retry_config())));
    let reporter: Arc<dyn ProgressReporter> = match &http_reporter {
        Some(reporter) => reporter.clone(),
        None => Arc::new(NoopReporter),
    };

    let session = ExerciseSession::new(exercise, reporter)?
        .with_config(config.session_config())
        .with_best_score(best_score);

    let (driver, mut events) = SessionDriver::new(session);
    let drafts = Debouncer::new(config.draft_debounce);

    driver.start().await;
    println!("{}", driver.with_session(render).await);
    if let Some(best) = best_score {
        println!("Best so far: {}%", best);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let Some(text) = describe_event(&event) {
                    println!("{}", text);
                }
                println!("{}", driver.with_session(render).await);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match Command::parse(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message);
                        continue;
                    }
                };

                match command {
                    Command::Click { action_id } => {
                        let key = current_key(&driver, action_id).await;
                        let outcome = driver.submit(key, LearnerInput::Click).await;
                        println!("{}", describe_outcome(&outcome));
                    }
                    Command::Type { action_id, text } => {
                        drafts.cancel();
                        let key = current_key(&driver, action_id).await;
                        let outcome = driver.submit(key, LearnerInput::Text(text)).await;
                        println!("{}", describe_outcome(&outcome));
                    }
                    Command::Draft { action_id, text } => {
                        let key = current_key(&driver, action_id).await;
                        let session = driver.shared();
                        drafts.trigger(async move {
                            if session.lock().await.record_partial(key, &text) {
                                tracing::debug!(action = %key, "draft saved");
                            }
                        });
                    }
                    Command::Next => show_move(&driver, driver.next_step().await).await,
                    Command::Prev => show_move(&driver, driver.previous_step().await).await,
                    Command::Goto { step } => {
                        show_move(&driver, driver.go_to_step(step - 1).await).await
                    }
                    Command::Show => println!("{}", driver.with_session(render).await),
                    Command::Finish => match driver.complete().await {
                        Some(completion) => print!("{}", terminal::render_completion(&completion)),
                        None => println!("The exercise has not started"),
                    },
                    Command::Reset => {
                        drafts.cancel();
                        driver.reset().await;
                        driver.start().await;
                        println!("{}", driver.with_session(render).await);
                    }
                    Command::Help => println!("{}", HELP),
                    Command::Quit => break,
                }
            }
        }
    }

    drafts.cancel();
    driver.unmount().await;
    if let Some(reporter) = http_reporter {
        reporter.flush().await;
    }

    Ok(())
}

/// Reach the backend and make sure a learner token is available.
///
/// Returns whether progress will be reported. Failures are fatal only when the
/// exercise itself has to come from the backend.
async fn connect(client: &ApiClient, args: &Args) -> Result<bool, ClientError> {
    let result = async {
        if !client.check_connectivity().await? {
            return Err(ClientError::Network(format!(
                "Backend at {} is not healthy",
                client.backend_url()
            )));
        }
        if client.token().await.is_none() {
            let learner_id = client.register_learner(args.name.clone()).await?;
            if let Some(token) = client.token().await {
                println!(
                    "Registered learner {}. Set EXERCISE_API_TOKEN={} to keep progress.",
                    learner_id, token
                );
            }
        }
        Ok::<(), ClientError>(())
    }
    .await;

    fall_back_for_local_file(result, args.file.is_some())
}

fn fall_back_for_local_file(
    result: Result<(), ClientError>,
    local_file: bool,
) -> Result<bool, ClientError> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if local_file => {
            tracing::warn!("Progress will not be saved: {}", e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

async fn show_move(driver: &SessionDriver, moved: bool) {
    if moved {
        println!("{}", driver.with_session(render).await);
    } else {
        println!("Cannot move there");
    }
}

async fn current_key(driver: &SessionDriver, action_id: i64) -> ActionKey {
    let step_id = driver
        .with_session(|s| s.step().map(|step| step.id))
        .await
        .unwrap_or_default();
    ActionKey::new(step_id, action_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_file_plays_without_backend() {
        let down = || Err(ClientError::Network("connection refused".to_string()));

        assert!(!fall_back_for_local_file(down(), true).unwrap());
        assert!(matches!(
            fall_back_for_local_file(down(), false),
            Err(ClientError::Network(_))
        ));
        assert!(fall_back_for_local_file(Ok(()), true).unwrap());
    }

    #[tokio::test]
    async fn unreachable_backend_with_file_goes_offline() {
        let client = ApiClient::new("http://127.0.0.1:9", None);
        let args = Args::parse_from(["exercise-player", "--file", "exercise.json"]);
        assert!(!connect(&client, &args).await.unwrap());

        let args = Args::parse_from(["exercise-player", "7"]);
        assert!(connect(&client, &args).await.is_err());
    }
}
