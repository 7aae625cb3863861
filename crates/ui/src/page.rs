//! In-memory stand-ins for the dashboard page regions.
//!
//! Each surface keeps the last HTML rendered into a region, so a region the services
//! never touch keeps its server-rendered content byte for byte.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use eco_core::model::{
    ChallengeId, ChallengeMembership, PeerStanding, Progress, QuestionId, Submission, TimerUrgency,
    UserStanding,
};
use services::{
    ChallengeControls, LeaderboardSurface, LoadingIndicator, ProgressDisplay, QuizSubmitter,
    SubmitConfirmation, TimerDisplay,
};

use crate::views::{
    render_countdown, render_global_top, render_join_button, render_loading_overlay,
    render_personal_window, render_progress, render_user_stats,
};
use crate::vm::partial_submit_prompt;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// HTML content of the three leaderboard regions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeaderboardRegions {
    pub user_stats: Option<String>,
    pub personal_window: Option<String>,
    pub global_top: Option<String>,
}

/// Leaderboard page with an optional personal tab and an optional global tab.
#[derive(Debug, Default)]
pub struct LeaderboardPage {
    personal: bool,
    global: bool,
    regions: Mutex<LeaderboardRegions>,
    renders: AtomicUsize,
}

impl LeaderboardPage {
    #[must_use]
    pub fn new(personal: bool, global: bool) -> Self {
        Self {
            personal,
            global,
            ..Self::default()
        }
    }

    /// Start from server-rendered content.
    #[must_use]
    pub fn with_initial(mut self, regions: LeaderboardRegions) -> Self {
        self.regions = Mutex::new(regions);
        self
    }

    #[must_use]
    pub fn regions(&self) -> LeaderboardRegions {
        lock(&self.regions).clone()
    }

    /// Number of region writes so far.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    fn write(&self, update: impl FnOnce(&mut LeaderboardRegions)) {
        update(&mut lock(&self.regions));
        self.renders.fetch_add(1, Ordering::SeqCst);
    }
}

impl LeaderboardSurface for LeaderboardPage {
    fn has_personal_view(&self) -> bool {
        self.personal
    }

    fn has_global_view(&self) -> bool {
        self.global
    }

    fn render_user_stats(&self, user: &UserStanding) {
        let html = render_user_stats(user);
        self.write(|regions| regions.user_stats = Some(html));
    }

    fn render_personal_window(&self, user: &UserStanding, rows: &[PeerStanding]) {
        let html = render_personal_window(user, rows);
        self.write(|regions| regions.personal_window = Some(html));
    }

    fn render_global_top(&self, rows: &[PeerStanding]) {
        let html = render_global_top(rows);
        self.write(|regions| regions.global_top = Some(html));
    }
}

/// A single countdown label (form timer or header timer).
#[derive(Debug, Default)]
pub struct TimerLabel {
    html: Mutex<Option<String>>,
}

impl TimerLabel {
    #[must_use]
    pub fn html(&self) -> Option<String> {
        lock(&self.html).clone()
    }
}

impl TimerDisplay for TimerLabel {
    fn show_countdown(&self, remaining_secs: u32, urgency: TimerUrgency) {
        *lock(&self.html) = Some(render_countdown(remaining_secs, urgency));
    }
}

type PromptFn = dyn Fn(&str) -> bool + Send + Sync;

/// Quiz form: progress bar, partial-submit prompt and form submission.
pub struct QuizPage {
    progress: Mutex<Option<(Progress, String)>>,
    prompt: Box<PromptFn>,
    submitted: Mutex<Option<Submission>>,
}

impl QuizPage {
    /// `prompt` answers the partial-submit question; it receives the prompt text.
    #[must_use]
    pub fn new(prompt: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            progress: Mutex::new(None),
            prompt: Box::new(prompt),
            submitted: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        lock(&self.progress).as_ref().map(|(progress, _)| *progress)
    }

    #[must_use]
    pub fn progress_html(&self) -> Option<String> {
        lock(&self.progress).as_ref().map(|(_, html)| html.clone())
    }

    #[must_use]
    pub fn submission(&self) -> Option<Submission> {
        lock(&self.submitted).clone()
    }

    /// Form fields as posted, one `question_<id>` field per question.
    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.submission()
            .map(|submission| {
                submission
                    .answers
                    .into_iter()
                    .map(|(id, value)| (field_name(&id), value))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn field_name(id: &QuestionId) -> String {
    format!("question_{id}")
}

impl ProgressDisplay for QuizPage {
    fn show_progress(&self, progress: Progress) {
        *lock(&self.progress) = Some((progress, render_progress(progress)));
    }
}

impl SubmitConfirmation for QuizPage {
    fn confirm_partial(&self, answered: usize, total: usize) -> bool {
        (self.prompt)(&partial_submit_prompt(answered, total))
    }
}

impl QuizSubmitter for QuizPage {
    fn submit(&self, submission: &Submission) {
        let mut submitted = lock(&self.submitted);
        if submitted.is_some() {
            tracing::warn!("quiz form already submitted; ignoring second submission");
            return;
        }
        *submitted = Some(submission.clone());
    }
}

/// Challenge cards with join buttons and the page-wide loading overlay.
#[derive(Debug, Default)]
pub struct ChallengeBoard {
    buttons: Mutex<BTreeMap<ChallengeId, (ChallengeMembership, String)>>,
    loading_depth: AtomicUsize,
    loading_shown: AtomicUsize,
}

impl ChallengeBoard {
    #[must_use]
    pub fn new<I>(challenges: I) -> Self
    where
        I: IntoIterator<Item = ChallengeId>,
    {
        let buttons = challenges
            .into_iter()
            .map(|id| {
                let membership = ChallengeMembership::new(id.clone());
                let html = render_join_button(&membership);
                (id, (membership, html))
            })
            .collect();
        Self {
            buttons: Mutex::new(buttons),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn button_html(&self, challenge_id: &ChallengeId) -> Option<String> {
        lock(&self.buttons)
            .get(challenge_id)
            .map(|(_, html)| html.clone())
    }

    #[must_use]
    pub fn is_joined(&self, challenge_id: &ChallengeId) -> bool {
        lock(&self.buttons)
            .get(challenge_id)
            .is_some_and(|(membership, _)| membership.joined())
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading_depth.load(Ordering::SeqCst) > 0
    }

    /// Overlay markup while a request is pending.
    #[must_use]
    pub fn overlay_html(&self) -> Option<String> {
        self.is_loading().then(render_loading_overlay)
    }

    /// How many times the overlay was raised.
    #[must_use]
    pub fn loading_shown(&self) -> usize {
        self.loading_shown.load(Ordering::SeqCst)
    }
}

impl ChallengeControls for ChallengeBoard {
    fn mark_joined(&self, challenge_id: &ChallengeId) {
        let mut buttons = lock(&self.buttons);
        let Some((membership, html)) = buttons.get_mut(challenge_id) else {
            tracing::debug!(challenge = %challenge_id, "no join button on page");
            return;
        };
        if membership.mark_joined() {
            *html = render_join_button(membership);
        }
    }
}

impl LoadingIndicator for ChallengeBoard {
    fn show(&self) {
        self.loading_depth.fetch_add(1, Ordering::SeqCst);
        self.loading_shown.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        let _ = self
            .loading_depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| {
                depth.checked_sub(1)
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use eco_core::model::{LeaderboardSnapshot, SubmitTrigger, Tier, UserId};
    use eco_core::time::fixed_clock;
    use services::{ApiError, DashboardApi, JoinReceipt, LeaderboardReconciler, PollOutcome};

    struct OneShotApi(Mutex<Option<Result<LeaderboardSnapshot, ApiError>>>);

    #[async_trait::async_trait]
    impl DashboardApi for OneShotApi {
        async fn fetch_leaderboard(&self) -> Result<LeaderboardSnapshot, ApiError> {
            let next = lock(&self.0).take();
            next.unwrap_or_else(|| Err(ApiError::Malformed("drained".into())))
        }

        async fn join_challenge(&self, _id: &ChallengeId) -> Result<JoinReceipt, ApiError> {
            Ok(JoinReceipt { message: None })
        }
    }

    fn row(id: u64, rank: u32) -> PeerStanding {
        PeerStanding {
            id: UserId::new(id),
            name: format!("Student {id}"),
            school_name: None,
            eco_points: 1_000 - u64::from(rank),
            tier: Tier::new("Leaf", "leaf"),
            rank,
            total_badges: 0,
        }
    }

    fn reconciler(
        page: &Arc<LeaderboardPage>,
        reply: Result<LeaderboardSnapshot, ApiError>,
    ) -> LeaderboardReconciler {
        LeaderboardReconciler::new(
            Arc::new(OneShotApi(Mutex::new(Some(reply)))),
            Arc::clone(page) as Arc<dyn LeaderboardSurface>,
            fixed_clock(),
            std::time::Duration::from_secs(30),
        )
    }

    fn initial() -> LeaderboardRegions {
        LeaderboardRegions {
            user_stats: Some("<div>server stats</div>".into()),
            personal_window: Some("<div>server window</div>".into()),
            global_top: Some("<div>server top</div>".into()),
        }
    }

    #[tokio::test]
    async fn failed_poll_leaves_page_byte_for_byte() {
        let page = Arc::new(LeaderboardPage::new(true, true).with_initial(initial()));

        let outcome = reconciler(&page, Err(ApiError::Application { message: None }))
            .poll_once()
            .await;

        assert!(matches!(outcome, PollOutcome::Failed { .. }));
        assert_eq!(page.regions(), initial());
        assert_eq!(page.render_count(), 0);
    }

    #[tokio::test]
    async fn global_only_page_renders_top_list() {
        let page = Arc::new(LeaderboardPage::new(false, true).with_initial(initial()));
        let snapshot = LeaderboardSnapshot {
            user: None,
            personal_window: None,
            global_top: Some((1..=5).map(|rank| row(u64::from(rank), rank)).collect()),
        };

        reconciler(&page, Ok(snapshot)).poll_once().await;

        let regions = page.regions();
        assert_eq!(regions.user_stats, initial().user_stats);
        let top = regions.global_top.unwrap();
        assert_eq!(top.matches("leaderboard-item").count(), 5);
        assert!(top.contains("leaderboard-rank gold"));
    }

    #[test]
    fn quiz_page_prompts_with_counts_and_submits_once() {
        let asked = Arc::new(Mutex::new(Vec::new()));
        let page = QuizPage::new({
            let asked = Arc::clone(&asked);
            move |prompt: &str| {
                lock(&asked).push(prompt.to_owned());
                false
            }
        });

        assert!(!page.confirm_partial(1, 4));
        assert_eq!(
            lock(&asked).as_slice(),
            ["You have only answered 1 out of 4 questions. Are you sure you want to submit?"]
        );

        let submission = Submission {
            trigger: SubmitTrigger::Manual,
            answers: vec![(QuestionId::from("12"), "b".into())],
            time_remaining_secs: 40,
        };
        page.submit(&submission);
        page.submit(&Submission {
            time_remaining_secs: 0,
            ..submission.clone()
        });
        assert_eq!(page.submission(), Some(submission));
        assert_eq!(page.form_fields(), [("question_12".to_owned(), "b".to_owned())]);
    }

    #[test]
    fn challenge_board_tracks_buttons_and_overlay() {
        let id = ChallengeId::from("3");
        let board = ChallengeBoard::new([id.clone()]);
        assert!(board.button_html(&id).unwrap().contains("Join Challenge"));

        assert_eq!(board.overlay_html(), None);
        board.show();
        assert!(board.is_loading());
        assert!(board.overlay_html().unwrap().contains("global-loading"));
        board.hide();
        board.hide();
        assert!(!board.is_loading());

        board.mark_joined(&id);
        board.mark_joined(&ChallengeId::from("missing"));
        assert!(board.is_joined(&id));
        assert!(board.button_html(&id).unwrap().contains("Joined"));
        assert_eq!(board.loading_shown(), 1);
    }
}
