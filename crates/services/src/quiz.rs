use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use eco_core::model::{
    NotificationKind, Progress, QuestionId, QuizError, QuizPhase, QuizSession, Submission,
    SubmitGate, SubmitTrigger, TickOutcome, TimerUrgency,
};

use crate::notifications::NotificationCenter;
use crate::task::TaskHandle;

pub const TIME_UP_MESSAGE: &str = "Time's up! Quiz submitted automatically.";

/// A countdown label. Every label of a form is driven by the same countdown.
pub trait TimerDisplay: Send + Sync {
    fn show_countdown(&self, remaining_secs: u32, urgency: TimerUrgency);
}

/// Progress bar plus answered/total counter.
pub trait ProgressDisplay: Send + Sync {
    fn show_progress(&self, progress: Progress);
}

/// Asks the student whether to submit with unanswered questions.
pub trait SubmitConfirmation: Send + Sync {
    fn confirm_partial(&self, answered: usize, total: usize) -> bool;
}

/// Sends the frozen answers with the form.
pub trait QuizSubmitter: Send + Sync {
    fn submit(&self, submission: &Submission);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// The student declined the confirmation; nothing changed.
    Declined,
    /// Already submitted, or the timer won the race.
    Ignored,
}

/// Drives one quiz form from first render through countdown to submission.
///
/// Each handler takes the session lock for its whole duration, so a tick never
/// observes a half-applied answer. The confirmation dialog and the submitter run
/// without the lock held.
pub struct QuizController {
    session: Mutex<QuizSession>,
    timers: Vec<Arc<dyn TimerDisplay>>,
    progress: Option<Arc<dyn ProgressDisplay>>,
    confirmation: Arc<dyn SubmitConfirmation>,
    submitter: Arc<dyn QuizSubmitter>,
    notifications: NotificationCenter,
}

impl QuizController {
    #[must_use]
    pub fn new(
        session: QuizSession,
        confirmation: Arc<dyn SubmitConfirmation>,
        submitter: Arc<dyn QuizSubmitter>,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            timers: Vec::new(),
            progress: None,
            confirmation,
            submitter,
            notifications,
        }
    }

    #[must_use]
    pub fn with_timer_display(mut self, display: Arc<dyn TimerDisplay>) -> Self {
        self.timers.push(display);
        self
    }

    #[must_use]
    pub fn with_progress_display(mut self, display: Arc<dyn ProgressDisplay>) -> Self {
        self.progress = Some(display);
        self
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.session().phase()
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> u32 {
        self.session().time_remaining_secs()
    }

    /// # Errors
    ///
    /// Propagates `QuizError` from the session (frozen, unknown question, bad option).
    pub fn select_option(
        &self,
        id: &QuestionId,
        value: impl Into<String>,
    ) -> Result<Progress, QuizError> {
        let progress = self.session().select_option(id, value)?;
        self.show_progress(progress);
        Ok(progress)
    }

    /// # Errors
    ///
    /// Propagates `QuizError` from the session.
    pub fn record_text(&self, id: &QuestionId, text: impl Into<String>) -> Result<Progress, QuizError> {
        let progress = self.session().record_text(id, text)?;
        self.show_progress(progress);
        Ok(progress)
    }

    /// Recompute and display progress. Safe to call at any time.
    pub fn compute_progress(&self) -> Progress {
        let progress = self.session().progress();
        self.show_progress(progress);
        progress
    }

    /// Push the current countdown to every timer display.
    pub fn render_countdown(&self) {
        let session = self.session();
        self.show_countdown(session.time_remaining_secs(), session.urgency());
    }

    /// One second elapsed. On expiry the form is auto-submitted exactly once.
    pub fn tick(&self) -> TickOutcome {
        let mut session = self.session();
        let outcome = session.tick();
        match &outcome {
            TickOutcome::Running {
                remaining_secs,
                urgency,
            } => self.show_countdown(*remaining_secs, *urgency),
            TickOutcome::Expired(submission) => {
                self.show_countdown(0, session.urgency());
                drop(session);
                self.finish_submit(submission);
                tracing::info!("quiz time limit reached; submitted automatically");
                self.notifications
                    .show(NotificationKind::Warning, TIME_UP_MESSAGE);
            }
            TickOutcome::Idle => {}
        }
        outcome
    }

    /// Manual submit. Asks for confirmation when questions are unanswered.
    pub fn on_submit_attempt(&self) -> SubmitOutcome {
        // The dialog runs without the lock so the countdown keeps going.
        let gate = self.session().submit_gate();
        match gate {
            SubmitGate::Closed => return SubmitOutcome::Ignored,
            SubmitGate::NeedsConfirmation { answered, total } => {
                if !self.confirmation.confirm_partial(answered, total) {
                    return SubmitOutcome::Declined;
                }
            }
            SubmitGate::Open => {}
        }

        let Ok(submission) = self.session().begin_submit(SubmitTrigger::Manual) else {
            return SubmitOutcome::Ignored;
        };
        self.finish_submit(&submission);
        tracing::info!(answered = self.session().answered_count(), "quiz submitted");
        SubmitOutcome::Submitted
    }

    // Called with the session latched in `Submitting` and the lock released, so the
    // submitter may read the controller back.
    fn finish_submit(&self, submission: &Submission) {
        self.submitter.submit(submission);
        if let Err(err) = self.session().complete_submit() {
            tracing::warn!(error = %err, trigger = ?submission.trigger, "quiz submit did not complete");
        }
    }

    /// Render the countdown, then tick once per second until the session leaves `Active`.
    #[must_use]
    pub fn start_countdown(self: &Arc<Self>) -> TaskHandle {
        self.render_countdown();
        self.compute_progress();
        let controller = Arc::clone(self);
        TaskHandle::new(
            "quiz-countdown",
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(1));
                // The first tick completes immediately; the countdown is already rendered.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if !matches!(controller.tick(), TickOutcome::Running { .. }) {
                        break;
                    }
                }
            }),
        )
    }

    fn session(&self) -> MutexGuard<'_, QuizSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn show_countdown(&self, remaining_secs: u32, urgency: TimerUrgency) {
        for timer in &self.timers {
            timer.show_countdown(remaining_secs, urgency);
        }
    }

    fn show_progress(&self, progress: Progress) {
        if let Some(display) = &self.progress {
            display.show_progress(progress);
        }
    }
}
