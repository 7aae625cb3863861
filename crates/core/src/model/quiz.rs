use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuestionId;

/// Time limit applied when the page does not carry a usable one.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("time limit must be greater than zero")]
    ZeroTimeLimit,

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    #[error("unknown question: {0}")]
    UnknownQuestion(QuestionId),

    #[error("question {id} does not take {attempted:?} answers")]
    KindMismatch {
        id: QuestionId,
        attempted: QuestionKind,
    },

    #[error("option {value:?} is not offered by question {id}")]
    UnknownOption { id: QuestionId, value: String },

    #[error("quiz no longer accepts changes")]
    Frozen,

    #[error("quiz submission already started")]
    AlreadySubmitting,

    #[error("no submission in progress")]
    NotSubmitting,
}

//
// ─── QUESTIONS & ANSWERS ───────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    FreeText,
}

/// A question as rendered into the quiz form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    #[serde(default)]
    options: Vec<String>,
}

impl Question {
    /// A single-choice question. An empty option list accepts any value.
    #[must_use]
    pub fn single_choice<I, S>(id: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: QuestionId::new(id),
            kind: QuestionKind::SingleChoice,
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn free_text(id: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new(id),
            kind: QuestionKind::FreeText,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    fn offers(&self, value: &str) -> bool {
        self.options.is_empty() || self.options.iter().any(|option| option == value)
    }
}

/// A recorded answer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Choice(String),
    Text(String),
}

impl Answer {
    /// Choices count when non-empty; text counts only when it has non-whitespace content.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        match self {
            Answer::Choice(value) => !value.is_empty(),
            Answer::Text(text) => !text.trim().is_empty(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Answer::Choice(value) | Answer::Text(value) => value,
        }
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Answered/total counts plus the rounded completion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    /// Rounds half-up. 100 is reserved for a fully answered quiz, so a nearly complete
    /// quiz with many questions reports 99.
    #[must_use]
    pub fn new(answered: usize, total: usize) -> Self {
        let answered = answered.min(total);
        let percent = if total == 0 {
            0
        } else {
            let rounded = (answered * 200 + total) / (2 * total);
            let rounded = if answered < total { rounded.min(99) } else { rounded };
            u8::try_from(rounded).unwrap_or(100)
        };
        Self {
            answered,
            total,
            percent,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.answered == self.total
    }
}

//
// ─── TIMER ─────────────────────────────────────────────────────────────────────
//

/// Visual state of the countdown. Ordered so that the latch can use `max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerUrgency {
    #[default]
    Normal,
    Warning,
    Critical,
}

/// Countdown thresholds, in remaining seconds (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizTimings {
    pub warning_secs: u32,
    pub critical_secs: u32,
}

impl Default for QuizTimings {
    fn default() -> Self {
        Self {
            warning_secs: 300,
            critical_secs: 60,
        }
    }
}

impl QuizTimings {
    #[must_use]
    pub fn urgency_for(&self, remaining_secs: u32) -> TimerUrgency {
        if remaining_secs <= self.critical_secs {
            TimerUrgency::Critical
        } else if remaining_secs <= self.warning_secs {
            TimerUrgency::Warning
        } else {
            TimerUrgency::Normal
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Active,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    TimerExpired,
}

/// Whether a manual submit may proceed right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitGate {
    Open,
    NeedsConfirmation { answered: usize, total: usize },
    Closed,
}

/// Frozen answer set handed to the form submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub trigger: SubmitTrigger,
    /// One entry per question, in form order; unanswered questions carry an empty value.
    pub answers: Vec<(QuestionId, String)>,
    pub time_remaining_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Running {
        remaining_secs: u32,
        urgency: TimerUrgency,
    },
    /// The countdown hit zero; the session is now `Submitting`.
    Expired(Submission),
    /// The session is no longer active; ticking must stop.
    Idle,
}

/// Answer state and countdown for a single quiz form.
///
/// Lifecycle is `Active → Submitting → Submitted`. Both the manual path and timer
/// expiry go through [`QuizSession::begin_submit`], which only succeeds once.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    answers: HashMap<QuestionId, Answer>,
    time_limit_secs: u32,
    time_remaining_secs: u32,
    timings: QuizTimings,
    urgency: TimerUrgency,
    phase: QuizPhase,
    trigger: Option<SubmitTrigger>,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `QuizError::ZeroTimeLimit` for a zero limit and
    /// `QuizError::DuplicateQuestion` when two questions share an id.
    pub fn new(questions: Vec<Question>, time_limit_secs: u32) -> Result<Self, QuizError> {
        if time_limit_secs == 0 {
            return Err(QuizError::ZeroTimeLimit);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestion(question.id().clone()));
            }
        }

        let timings = QuizTimings::default();
        Ok(Self {
            questions,
            answers: HashMap::new(),
            time_limit_secs,
            time_remaining_secs: time_limit_secs,
            urgency: timings.urgency_for(time_limit_secs),
            timings,
            phase: QuizPhase::Active,
            trigger: None,
        })
    }

    #[must_use]
    pub fn with_timings(mut self, timings: QuizTimings) -> Self {
        self.timings = timings;
        self.urgency = timings.urgency_for(self.time_remaining_secs);
        self
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answer(&self, id: &QuestionId) -> Option<&Answer> {
        self.answers.get(id)
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_secs
    }

    #[must_use]
    pub fn urgency(&self) -> TimerUrgency {
        self.urgency
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == QuizPhase::Submitted
    }

    /// Which path won the submit latch, if any.
    #[must_use]
    pub fn submit_trigger(&self) -> Option<SubmitTrigger> {
        self.trigger
    }

    /// Select an option, replacing any earlier choice for the same question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Frozen` once submission started, or a lookup/kind error.
    pub fn select_option(
        &mut self,
        id: &QuestionId,
        value: impl Into<String>,
    ) -> Result<Progress, QuizError> {
        let value = value.into();
        let question = self.editable_question(id, QuestionKind::SingleChoice)?;
        if !question.offers(&value) {
            return Err(QuizError::UnknownOption {
                id: id.clone(),
                value,
            });
        }
        self.answers.insert(id.clone(), Answer::Choice(value));
        Ok(self.progress())
    }

    /// Record the current content of a free-text input.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Frozen` once submission started, or a lookup/kind error.
    pub fn record_text(
        &mut self,
        id: &QuestionId,
        text: impl Into<String>,
    ) -> Result<Progress, QuizError> {
        self.editable_question(id, QuestionKind::FreeText)?;
        self.answers.insert(id.clone(), Answer::Text(text.into()));
        Ok(self.progress())
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| {
                self.answers
                    .get(question.id())
                    .is_some_and(Answer::is_answered)
            })
            .count()
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::new(self.answered_count(), self.questions.len())
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != QuizPhase::Active {
            return TickOutcome::Idle;
        }

        self.time_remaining_secs = self.time_remaining_secs.saturating_sub(1);
        self.urgency = self
            .urgency
            .max(self.timings.urgency_for(self.time_remaining_secs));

        if self.time_remaining_secs > 0 {
            return TickOutcome::Running {
                remaining_secs: self.time_remaining_secs,
                urgency: self.urgency,
            };
        }

        match self.begin_submit(SubmitTrigger::TimerExpired) {
            Ok(submission) => TickOutcome::Expired(submission),
            Err(_) => TickOutcome::Idle,
        }
    }

    #[must_use]
    pub fn submit_gate(&self) -> SubmitGate {
        if self.phase != QuizPhase::Active {
            return SubmitGate::Closed;
        }
        let progress = self.progress();
        if progress.answered < progress.total {
            SubmitGate::NeedsConfirmation {
                answered: progress.answered,
                total: progress.total,
            }
        } else {
            SubmitGate::Open
        }
    }

    /// One-shot latch: freezes the answers and moves to `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadySubmitting` if either path already claimed the latch.
    pub fn begin_submit(&mut self, trigger: SubmitTrigger) -> Result<Submission, QuizError> {
        if self.phase != QuizPhase::Active {
            return Err(QuizError::AlreadySubmitting);
        }
        self.phase = QuizPhase::Submitting;
        self.trigger = Some(trigger);

        let answers = self
            .questions
            .iter()
            .map(|question| {
                let value = self
                    .answers
                    .get(question.id())
                    .map(|answer| answer.value().to_owned())
                    .unwrap_or_default();
                (question.id().clone(), value)
            })
            .collect();

        Ok(Submission {
            trigger,
            answers,
            time_remaining_secs: self.time_remaining_secs,
        })
    }

    /// # Errors
    ///
    /// Returns `QuizError::NotSubmitting` unless the latch was claimed first.
    pub fn complete_submit(&mut self) -> Result<(), QuizError> {
        if self.phase != QuizPhase::Submitting {
            return Err(QuizError::NotSubmitting);
        }
        self.phase = QuizPhase::Submitted;
        Ok(())
    }

    fn editable_question(
        &self,
        id: &QuestionId,
        attempted: QuestionKind,
    ) -> Result<&Question, QuizError> {
        if self.phase != QuizPhase::Active {
            return Err(QuizError::Frozen);
        }
        let question = self
            .questions
            .iter()
            .find(|question| question.id() == id)
            .ok_or_else(|| QuizError::UnknownQuestion(id.clone()))?;
        if question.kind() != attempted {
            return Err(QuizError::KindMismatch {
                id: id.clone(),
                attempted,
            });
        }
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_choice_quiz(limit: u32) -> QuizSession {
        let questions = (1..=5)
            .map(|n| Question::single_choice(format!("q{n}"), ["a", "b", "c"]))
            .collect();
        QuizSession::new(questions, limit).unwrap()
    }

    fn qid(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    #[test]
    fn rejects_zero_limit_and_duplicate_ids() {
        assert_eq!(
            QuizSession::new(vec![Question::free_text("q1")], 0).unwrap_err(),
            QuizError::ZeroTimeLimit
        );
        let dup = vec![Question::free_text("q1"), Question::single_choice("q1", ["a"])];
        assert_eq!(
            QuizSession::new(dup, 60).unwrap_err(),
            QuizError::DuplicateQuestion(qid("q1"))
        );
    }

    #[test]
    fn selecting_replaces_previous_choice() {
        let mut quiz = five_choice_quiz(600);
        quiz.select_option(&qid("q1"), "a").unwrap();
        let progress = quiz.select_option(&qid("q1"), "b").unwrap();

        assert_eq!(quiz.answer(&qid("q1")), Some(&Answer::Choice("b".into())));
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.percent, 20);
    }

    #[test]
    fn selection_validates_question_and_option() {
        let mut quiz = QuizSession::new(
            vec![Question::single_choice("q1", ["a"]), Question::free_text("q2")],
            60,
        )
        .unwrap();

        assert!(matches!(
            quiz.select_option(&qid("nope"), "a"),
            Err(QuizError::UnknownQuestion(_))
        ));
        assert!(matches!(
            quiz.select_option(&qid("q1"), "z"),
            Err(QuizError::UnknownOption { .. })
        ));
        assert!(matches!(
            quiz.select_option(&qid("q2"), "a"),
            Err(QuizError::KindMismatch { .. })
        ));
        assert!(matches!(
            quiz.record_text(&qid("q1"), "a"),
            Err(QuizError::KindMismatch { .. })
        ));
    }

    #[test]
    fn whitespace_text_counts_as_unanswered() {
        let mut quiz = QuizSession::new(vec![Question::free_text("q1")], 60).unwrap();

        assert_eq!(quiz.record_text(&qid("q1"), "   ").unwrap().answered, 0);
        assert_eq!(quiz.record_text(&qid("q1"), " photosynthesis ").unwrap().percent, 100);
        assert_eq!(quiz.record_text(&qid("q1"), "").unwrap().percent, 0);
    }

    #[test]
    fn progress_without_questions_is_zero() {
        let quiz = QuizSession::new(Vec::new(), 60).unwrap();
        let progress = quiz.progress();
        assert_eq!(progress.percent, 0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn progress_rounds_half_up_and_reserves_hundred() {
        assert_eq!(Progress::new(1, 3).percent, 33);
        assert_eq!(Progress::new(2, 3).percent, 67);
        assert_eq!(Progress::new(1, 8).percent, 13);
        assert_eq!(Progress::new(199, 200).percent, 99);
        assert_eq!(Progress::new(200, 200).percent, 100);
    }

    #[test]
    fn progress_is_idempotent() {
        let mut quiz = five_choice_quiz(600);
        quiz.select_option(&qid("q2"), "c").unwrap();
        assert_eq!(quiz.progress(), quiz.progress());
    }

    #[test]
    fn urgency_latches_and_never_downgrades() {
        let mut quiz = QuizSession::new(vec![Question::free_text("q1")], 400).unwrap();
        assert_eq!(quiz.urgency(), TimerUrgency::Normal);

        for _ in 0..100 {
            quiz.tick();
        }
        assert_eq!(quiz.time_remaining_secs(), 300);
        assert_eq!(quiz.urgency(), TimerUrgency::Warning);

        for _ in 0..240 {
            quiz.tick();
        }
        assert_eq!(quiz.urgency(), TimerUrgency::Critical);
        quiz.tick();
        assert_eq!(quiz.urgency(), TimerUrgency::Critical);
    }

    #[test]
    fn urgency_starts_from_time_limit() {
        assert_eq!(five_choice_quiz(300).urgency(), TimerUrgency::Warning);
        assert_eq!(five_choice_quiz(45).urgency(), TimerUrgency::Critical);
    }

    #[test]
    fn timer_expiry_submits_exactly_once() {
        let mut quiz = five_choice_quiz(300);
        quiz.select_option(&qid("q1"), "a").unwrap();
        quiz.select_option(&qid("q2"), "b").unwrap();
        quiz.select_option(&qid("q3"), "c").unwrap();

        quiz.tick();
        assert_eq!(quiz.urgency(), TimerUrgency::Warning);

        for _ in 1..299 {
            assert!(matches!(quiz.tick(), TickOutcome::Running { .. }));
        }
        assert_eq!(quiz.progress().percent, 60);
        assert_eq!(quiz.time_remaining_secs(), 1);
        assert_eq!(quiz.phase(), QuizPhase::Active);

        let TickOutcome::Expired(submission) = quiz.tick() else {
            panic!("expected expiry on tick 300");
        };
        assert_eq!(submission.trigger, SubmitTrigger::TimerExpired);
        assert_eq!(submission.answers.len(), 5);
        assert_eq!(submission.answers[3], (qid("q4"), String::new()));
        assert_eq!(quiz.phase(), QuizPhase::Submitting);

        assert_eq!(quiz.tick(), TickOutcome::Idle);
        assert_eq!(
            quiz.begin_submit(SubmitTrigger::Manual).unwrap_err(),
            QuizError::AlreadySubmitting
        );
        quiz.complete_submit().unwrap();
        assert!(quiz.is_submitted());
        assert_eq!(quiz.submit_trigger(), Some(SubmitTrigger::TimerExpired));
    }

    #[test]
    fn submitted_session_is_frozen() {
        let mut quiz = five_choice_quiz(120);
        quiz.select_option(&qid("q1"), "a").unwrap();
        quiz.begin_submit(SubmitTrigger::Manual).unwrap();
        quiz.complete_submit().unwrap();

        assert_eq!(quiz.select_option(&qid("q2"), "a"), Err(QuizError::Frozen));
        assert_eq!(quiz.tick(), TickOutcome::Idle);
        assert_eq!(quiz.time_remaining_secs(), 120);
        assert_eq!(quiz.progress().answered, 1);
        assert_eq!(quiz.submit_gate(), SubmitGate::Closed);
    }

    #[test]
    fn submit_gate_asks_for_confirmation_when_incomplete() {
        let mut quiz = five_choice_quiz(120);
        quiz.select_option(&qid("q1"), "a").unwrap();
        assert_eq!(
            quiz.submit_gate(),
            SubmitGate::NeedsConfirmation {
                answered: 1,
                total: 5
            }
        );

        for n in 2..=5 {
            quiz.select_option(&qid(&format!("q{n}")), "a").unwrap();
        }
        assert_eq!(quiz.submit_gate(), SubmitGate::Open);
    }

    #[test]
    fn complete_requires_latch() {
        let mut quiz = five_choice_quiz(120);
        assert_eq!(quiz.complete_submit(), Err(QuizError::NotSubmitting));
    }
}
