use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eco_core::model::{ChallengeId, NotificationId, NotificationKind, Question, QuizError};
use services::{
    ChallengeJoinFlow, DashboardServices, JoinOutcome, LeaderboardReconciler, LeaderboardSurface,
    NotificationCenter, QuizController, TaskHandle, TimerDisplay,
};

use crate::page::{ChallengeBoard, QuizPage, TimerLabel};
use crate::views::render_notifications;

pub trait UiApp: Send + Sync {
    fn dashboard(&self) -> DashboardServices;
}

#[derive(Default)]
struct Active {
    tasks: Vec<TaskHandle>,
    challenges: Option<Arc<ChallengeJoinFlow>>,
}

/// Page-wide handle on the dashboard services and the recurring tasks they run.
///
/// The `activate_*` methods spawn onto the current Tokio runtime and must be called
/// from within one.
#[derive(Clone)]
pub struct DashboardContext {
    services: DashboardServices,
    active: Arc<Mutex<Active>>,
}

impl DashboardContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            services: app.dashboard(),
            active: Arc::new(Mutex::new(Active::default())),
        }
    }

    #[must_use]
    pub fn services(&self) -> &DashboardServices {
        &self.services
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationCenter {
        self.services.notifications()
    }

    #[must_use]
    pub fn notifications_html(&self) -> String {
        render_notifications(&self.notifications().snapshot())
    }

    /// Start live updates for `surface`. Returns `None` when it has no leaderboard view.
    pub fn activate_leaderboard(
        &self,
        surface: Arc<dyn LeaderboardSurface>,
    ) -> Option<Arc<LeaderboardReconciler>> {
        let reconciler = self.services.leaderboard(surface);
        let handle = reconciler.start()?;
        self.active().tasks.push(handle);
        Some(reconciler)
    }

    /// Wire a quiz form to its timer labels and start the countdown.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` when the questions cannot form a session.
    pub fn activate_quiz(
        &self,
        questions: Vec<Question>,
        raw_time_limit: Option<&str>,
        page: Arc<QuizPage>,
        timers: &[Arc<TimerLabel>],
    ) -> Result<Arc<QuizController>, QuizError> {
        let controller = self
            .services
            .quiz(questions, raw_time_limit, page.clone(), page.clone())?
            .with_progress_display(page);
        let controller = timers.iter().fold(controller, |controller, timer| {
            controller.with_timer_display(Arc::clone(timer) as Arc<dyn TimerDisplay>)
        });
        let controller = Arc::new(controller);
        let handle = controller.start_countdown();
        self.active().tasks.push(handle);
        Ok(controller)
    }

    /// Attach the join flow to the challenge cards of `board`.
    pub fn activate_challenges(&self, board: Arc<ChallengeBoard>) -> Arc<ChallengeJoinFlow> {
        let flow = Arc::new(self.services.challenges(board.clone(), board));
        self.active().challenges = Some(Arc::clone(&flow));
        flow
    }

    /// Join through the active challenge board; `None` if no board is active.
    pub async fn join_challenge(&self, challenge_id: &ChallengeId) -> Option<JoinOutcome> {
        let flow = self.active().challenges.clone()?;
        Some(flow.join(challenge_id).await)
    }

    /// Show the `message`/`type` pair carried by a page query string.
    pub fn notify_from_query(&self, query: &str) -> Option<NotificationId> {
        let mut message = None;
        let mut kind = None;
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "message" => message = Some(value.into_owned()),
                "type" => kind = Some(NotificationKind::from_label(&value)),
                _ => {}
            }
        }
        let message = message.filter(|message| !message.is_empty())?;
        Some(self.notifications().show(kind.unwrap_or_default(), message))
    }

    pub fn announce_level_up(&self, level: &str) -> NotificationId {
        self.notifications().show(
            NotificationKind::Success,
            format!("🎉 Level Up! You're now a {level}!"),
        )
    }

    /// Stop every recurring task and drop all notifications.
    pub fn teardown(&self) {
        let tasks = {
            let mut active = self.active();
            active.challenges = None;
            std::mem::take(&mut active.tasks)
        };
        for mut task in tasks {
            task.stop();
        }
        self.notifications().clear();
    }

    fn active(&self) -> MutexGuard<'_, Active> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build a `DashboardContext` from a UI-facing app implementation.
#[must_use]
pub fn build_dashboard_context(app: &Arc<dyn UiApp>) -> DashboardContext {
    DashboardContext::new(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::page::LeaderboardPage;

    use eco_core::model::{LeaderboardSnapshot, QuestionId, QuizPhase};
    use eco_core::time::fixed_clock;
    use services::{ApiError, DashboardApi, DashboardConfig, JoinReceipt};

    struct QuietApi;

    #[async_trait::async_trait]
    impl DashboardApi for QuietApi {
        async fn fetch_leaderboard(&self) -> Result<LeaderboardSnapshot, ApiError> {
            Ok(LeaderboardSnapshot::default())
        }

        async fn join_challenge(&self, _id: &ChallengeId) -> Result<JoinReceipt, ApiError> {
            Ok(JoinReceipt { message: None })
        }
    }

    struct TestApp;

    impl UiApp for TestApp {
        fn dashboard(&self) -> DashboardServices {
            DashboardServices::with_api(
                DashboardConfig::default(),
                fixed_clock(),
                Arc::new(QuietApi),
            )
        }
    }

    fn context() -> DashboardContext {
        let app: Arc<dyn UiApp> = Arc::new(TestApp);
        build_dashboard_context(&app)
    }

    #[tokio::test(start_paused = true)]
    async fn query_string_notification_uses_category_fallback() {
        let ctx = context();
        assert!(ctx.notify_from_query("?type=success").is_none());
        ctx.notify_from_query("?message=Quiz%20saved%21&type=success");
        ctx.notify_from_query("message=Heads+up&type=bogus");

        let entries = ctx.notifications().snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].notification.message, "Quiz saved!");
        assert_eq!(entries[0].notification.kind, NotificationKind::Success);
        assert_eq!(entries[1].notification.message, "Heads up");
        assert_eq!(entries[1].notification.kind, NotificationKind::Info);
        assert!(ctx.notifications_html().contains("alert-info"));
    }

    #[tokio::test(start_paused = true)]
    async fn level_up_is_a_success_toast() {
        let ctx = context();
        ctx.announce_level_up("Sapling");
        let entries = ctx.notifications().snapshot();
        assert_eq!(entries[0].notification.kind, NotificationKind::Success);
        assert!(entries[0].notification.message.contains("You're now a Sapling!"));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_quiz_and_polling() {
        let ctx = context();
        let page = Arc::new(LeaderboardPage::new(true, true));
        let reconciler =
            ctx.activate_leaderboard(Arc::clone(&page) as Arc<dyn LeaderboardSurface>);
        assert!(reconciler.is_some());
        assert!(ctx.activate_leaderboard(Arc::new(LeaderboardPage::new(false, false))).is_none());

        let quiz_page = Arc::new(QuizPage::new(|_prompt: &str| true));
        let timers = [Arc::new(TimerLabel::default()), Arc::new(TimerLabel::default())];
        let controller = ctx
            .activate_quiz(
                vec![Question::single_choice("1", ["a", "b"])],
                Some("90"),
                Arc::clone(&quiz_page),
                &timers,
            )
            .unwrap();
        assert!(timers[0].html().unwrap().contains("1:30"));
        assert_eq!(quiz_page.progress().map(|p| p.percent), Some(0));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(controller.time_remaining_secs(), 80);
        assert_eq!(timers[0].html(), timers[1].html());

        ctx.announce_level_up("Oak");
        ctx.teardown();
        assert!(ctx.notifications().is_empty());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(controller.time_remaining_secs(), 80);
        assert_eq!(controller.phase(), QuizPhase::Active);
        assert!(quiz_page.submission().is_none());
        controller
            .select_option(&QuestionId::from("1"), "a")
            .unwrap();
    }

    #[tokio::test]
    async fn join_goes_through_the_active_board() {
        let ctx = context();
        let id = ChallengeId::from("9");
        assert_eq!(ctx.join_challenge(&id).await, None);

        let board = Arc::new(ChallengeBoard::new([id.clone()]));
        ctx.activate_challenges(Arc::clone(&board));

        assert_eq!(ctx.join_challenge(&id).await, Some(JoinOutcome::Joined));
        assert_eq!(ctx.join_challenge(&id).await, Some(JoinOutcome::AlreadyJoined));
        assert!(board.is_joined(&id));
        assert!(!board.is_loading());
    }
}
