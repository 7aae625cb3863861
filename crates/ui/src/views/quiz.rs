use dioxus::prelude::*;

use eco_core::model::{Progress, TimerUrgency};

use crate::vm::{CountdownVm, ProgressVm};

#[component]
pub fn QuizTimer(countdown: CountdownVm) -> Element {
    rsx! {
        span { class: "{countdown.class}", "{countdown.text}" }
    }
}

#[component]
pub fn QuizProgress(progress: ProgressVm) -> Element {
    rsx! {
        div { class: "progress",
            div {
                id: "quiz-progress",
                class: "progress-bar bg-success",
                role: "progressbar",
                style: "{progress.width_style}",
                "aria-valuenow": "{progress.percent}",
                "aria-valuemin": "0",
                "aria-valuemax": "100",
            }
        }
        small { class: "text-muted",
            span { id: "answered-count", "{progress.answered}" }
            " / {progress.total} answered ("
            span { id: "progress-text", "{progress.percent_text}" }
            ")"
        }
    }
}

#[must_use]
pub fn render_countdown(remaining_secs: u32, urgency: TimerUrgency) -> String {
    let countdown = CountdownVm::new(remaining_secs, urgency);
    dioxus_ssr::render_element(rsx! { QuizTimer { countdown } })
}

#[must_use]
pub fn render_progress(progress: Progress) -> String {
    let progress = ProgressVm::from(progress);
    dioxus_ssr::render_element(rsx! { QuizProgress { progress } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_label_carries_urgency_class() {
        let html = render_countdown(59, TimerUrgency::Critical);
        assert!(html.contains("0:59"), "{html}");
        assert!(html.contains("text-danger"), "{html}");
    }

    #[test]
    fn progress_bar_width_tracks_percent() {
        let html = render_progress(Progress::new(2, 4));
        assert!(html.contains("width: 50%"), "{html}");
        assert!(html.contains("50%"), "{html}");
        assert!(html.contains(r#"aria-valuenow="50""#), "{html}");
    }
}
