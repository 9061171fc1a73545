//! Async host for an [`ExerciseSession`].
//!
//! The session itself is synchronous and only hands out [`ScheduledAdvance`]s.
//! The driver turns each one into a tokio timer and keeps at most one alive:
//! any navigation, reset, unmount, or drop aborts it.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use exercise_core::{
    ActionKey, Completion, ExerciseSession, LearnerInput, ScheduledAdvance, SubmitOutcome,
    Transition,
};

/// Changes made by the driver on its own, after a timer fired.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Advanced(Transition),
    Completed(Completion),
}

pub struct SessionDriver {
    session: Arc<Mutex<ExerciseSession>>,
    timer: std::sync::Mutex<Option<JoinHandle<()>>>,
    events: mpsc::UnboundedSender<DriverEvent>,
}

impl SessionDriver {
    pub fn new(session: ExerciseSession) -> (Self, mpsc::UnboundedReceiver<DriverEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let driver = Self {
            session: Arc::new(Mutex::new(session)),
            timer: std::sync::Mutex::new(None),
            events,
        };
        (driver, receiver)
    }

    /// Shared handle to the session, for tasks that outlive a single call.
    pub fn shared(&self) -> Arc<Mutex<ExerciseSession>> {
        self.session.clone()
    }

    /// Read the session under its lock.
    pub async fn with_session<R>(&self, f: impl FnOnce(&ExerciseSession) -> R) -> R {
        let session = self.session.lock().await;
        f(&session)
    }

    pub async fn start(&self) {
        self.abort_timer();
        self.session.lock().await.start();
    }

    pub async fn submit(&self, key: ActionKey, input: LearnerInput) -> SubmitOutcome {
        let outcome = self.session.lock().await.submit(key, input);
        if let Some(advance) = outcome.advance() {
            self.schedule(advance);
        }
        outcome
    }

    pub async fn record_partial(&self, key: ActionKey, text: &str) -> bool {
        self.session.lock().await.record_partial(key, text)
    }

    pub async fn go_to_step(&self, index: usize) -> bool {
        self.abort_timer();
        self.session.lock().await.go_to_step(index)
    }

    pub async fn previous_step(&self) -> bool {
        self.abort_timer();
        self.session.lock().await.previous_step()
    }

    pub async fn next_step(&self) -> bool {
        self.abort_timer();
        self.session.lock().await.next_step()
    }

    pub async fn complete(&self) -> Option<Completion> {
        self.abort_timer();
        self.session.lock().await.complete()
    }

    pub async fn reset(&self) {
        self.abort_timer();
        self.session.lock().await.reset();
    }

    /// The view went away: nothing scheduled may fire afterwards.
    pub async fn unmount(&self) {
        self.abort_timer();
        self.session.lock().await.cancel_pending();
    }

    fn schedule(&self, advance: ScheduledAdvance) {
        let session = self.session.clone();
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(advance.delay).await;

            let mut session = session.lock().await;
            let Some(transition) = session.fire(advance.ticket) else {
                tracing::debug!(ticket = advance.ticket, "stale advance ignored");
                return;
            };

            let _ = events.send(DriverEvent::Advanced(transition));
            if transition == Transition::Complete {
                if let Some(completion) = session.completion().cloned() {
                    let _ = events.send(DriverEvent::Completed(completion));
                }
            }
        });

        if let Some(previous) = self.lock_timer().replace(handle) {
            previous.abort();
        }
    }

    fn abort_timer(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.abort_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exercise_core::{parse_exercise, MemoryReporter, SessionState};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const EXERCISE: &str = r#"{
        "id": 5,
        "title": "Two clicks",
        "steps": [
            {"id": 1, "actions": [
                {"action_type": "button", "id": 1, "step_id": 1, "position_x": 0,
                 "position_y": 0, "width": 10, "height": 10, "correct_answer": "true"}
            ]},
            {"id": 2, "actions": [
                {"action_type": "button", "id": 2, "step_id": 2, "position_x": 0,
                 "position_y": 0, "width": 10, "height": 10, "correct_answer": "yes"}
            ]}
        ]
    }"#;

    const PAST_DELAY: Duration = Duration::from_millis(1300);

    fn driver() -> (
        SessionDriver,
        mpsc::UnboundedReceiver<DriverEvent>,
        Arc<MemoryReporter>,
    ) {
        let reporter = Arc::new(MemoryReporter::new());
        let session =
            ExerciseSession::new(parse_exercise(EXERCISE).unwrap(), reporter.clone()).unwrap();
        let (driver, events) = SessionDriver::new(session);
        (driver, events, reporter)
    }

    async fn state(driver: &SessionDriver) -> SessionState {
        driver.with_session(|s| s.state().clone()).await
    }

    #[tokio::test(start_paused = true)]
    async fn correct_answer_advances_after_delay() {
        let (driver, mut events, _) = driver();
        driver.start().await;

        let outcome = driver.submit(ActionKey::new(1, 1), LearnerInput::Click).await;
        assert!(matches!(outcome, SubmitOutcome::Accepted { .. }));
        assert_eq!(state(&driver).await, SessionState::InStep { index: 0 });

        tokio::time::sleep(PAST_DELAY).await;
        assert_eq!(state(&driver).await, SessionState::InStep { index: 1 });
        assert_eq!(
            events.try_recv().unwrap(),
            DriverEvent::Advanced(Transition::Step(1))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn last_step_completes_and_reports() {
        let (driver, mut events, reporter) = driver();
        driver.start().await;
        driver.go_to_step(1).await;

        driver.submit(ActionKey::new(2, 2), LearnerInput::Click).await;
        tokio::time::sleep(PAST_DELAY).await;

        assert_eq!(
            events.try_recv().unwrap(),
            DriverEvent::Advanced(Transition::Complete)
        );
        let DriverEvent::Completed(completion) = events.try_recv().unwrap() else {
            panic!("expected completion event");
        };
        assert_eq!(completion.summary.percentage, 50);
        assert!(!completion.is_completed);
        assert_eq!(reporter.updates().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_pending_advance() {
        let (driver, mut events, reporter) = driver();
        driver.start().await;
        driver.submit(ActionKey::new(1, 1), LearnerInput::Click).await;

        driver.reset().await;
        tokio::time::sleep(PAST_DELAY).await;

        assert_eq!(state(&driver).await, SessionState::NotStarted);
        assert!(events.try_recv().is_err());
        assert!(reporter.updates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_cancels_pending_advance() {
        let (driver, mut events, _) = driver();
        driver.start().await;
        driver.submit(ActionKey::new(1, 1), LearnerInput::Click).await;

        assert!(driver.go_to_step(0).await);
        tokio::time::sleep(PAST_DELAY).await;

        assert_eq!(state(&driver).await, SessionState::InStep { index: 0 });
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_cancels_pending_advance() {
        let (driver, mut events, _) = driver();
        driver.start().await;
        driver.submit(ActionKey::new(1, 1), LearnerInput::Click).await;

        driver.unmount().await;
        assert!(driver.with_session(|s| s.pending().is_none()).await);

        tokio::time::sleep(PAST_DELAY).await;
        assert_eq!(state(&driver).await, SessionState::InStep { index: 0 });
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_driver_cancels_pending_advance() {
        let (driver, _events, _) = driver();
        driver.start().await;
        driver.submit(ActionKey::new(1, 1), LearnerInput::Click).await;

        let session = driver.shared();
        drop(driver);
        tokio::time::sleep(PAST_DELAY).await;

        assert_eq!(
            *session.lock().await.state(),
            SessionState::InStep { index: 0 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn manual_complete_wins_over_timer() {
        let (driver, mut events, reporter) = driver();
        driver.start().await;
        driver.submit(ActionKey::new(1, 1), LearnerInput::Click).await;

        let completion = driver.complete().await.unwrap();
        assert_eq!(completion.summary.percentage, 50);

        tokio::time::sleep(PAST_DELAY).await;
        assert!(events.try_recv().is_err());
        assert_eq!(reporter.updates().len(), 1);
    }
}
