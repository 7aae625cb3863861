use eco_core::model::{Progress, TimerUrgency};

/// `125` → `"2:05"`.
#[must_use]
pub fn format_countdown(remaining_secs: u32) -> String {
    format!("{}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// Text colour class for a timer label; `None` while plenty of time is left.
#[must_use]
pub fn urgency_class(urgency: TimerUrgency) -> Option<&'static str> {
    match urgency {
        TimerUrgency::Normal => None,
        TimerUrgency::Warning => Some("text-warning"),
        TimerUrgency::Critical => Some("text-danger"),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountdownVm {
    pub text: String,
    pub class: String,
}

impl CountdownVm {
    #[must_use]
    pub fn new(remaining_secs: u32, urgency: TimerUrgency) -> Self {
        let class = match urgency_class(urgency) {
            Some(extra) => format!("quiz-timer {extra}"),
            None => "quiz-timer".to_owned(),
        };
        Self {
            text: format_countdown(remaining_secs),
            class,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressVm {
    pub percent: u8,
    pub percent_text: String,
    pub width_style: String,
    pub answered: usize,
    pub total: usize,
}

impl From<Progress> for ProgressVm {
    fn from(progress: Progress) -> Self {
        Self {
            percent: progress.percent,
            percent_text: format!("{}%", progress.percent),
            width_style: format!("width: {}%;", progress.percent),
            answered: progress.answered,
            total: progress.total,
        }
    }
}

/// Prompt shown before submitting a partially answered quiz.
#[must_use]
pub fn partial_submit_prompt(answered: usize, total: usize) -> String {
    format!(
        "You have only answered {answered} out of {total} questions. Are you sure you want to submit?"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_pads_seconds() {
        assert_eq!(format_countdown(300), "5:00");
        assert_eq!(format_countdown(65), "1:05");
        assert_eq!(format_countdown(9), "0:09");
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(3_600), "60:00");
    }

    #[test]
    fn timer_classes_follow_urgency() {
        assert_eq!(CountdownVm::new(400, TimerUrgency::Normal).class, "quiz-timer");
        assert_eq!(
            CountdownVm::new(299, TimerUrgency::Warning).class,
            "quiz-timer text-warning"
        );
        assert_eq!(
            CountdownVm::new(1, TimerUrgency::Critical).class,
            "quiz-timer text-danger"
        );
    }

    #[test]
    fn progress_text() {
        let vm = ProgressVm::from(Progress::new(1, 3));
        assert_eq!(vm.percent_text, "33%");
        assert_eq!(vm.width_style, "width: 33%;");
        assert_eq!(vm.answered, 1);
    }
}
