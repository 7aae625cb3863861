use std::sync::Arc;

use eco_core::Clock;
use eco_core::model::{Question, QuizError, QuizSession};

use crate::api::{DashboardApi, HttpDashboardApi};
use crate::challenges::{ChallengeControls, ChallengeJoinFlow, LoadingIndicator};
use crate::config::DashboardConfig;
use crate::error::ApiError;
use crate::leaderboard::{LeaderboardReconciler, LeaderboardSurface};
use crate::notifications::NotificationCenter;
use crate::quiz::{QuizController, QuizSubmitter, SubmitConfirmation};

/// Assembles the dashboard services around one API client and one notification stack.
#[derive(Clone)]
pub struct DashboardServices {
    config: DashboardConfig,
    clock: Clock,
    api: Arc<dyn DashboardApi>,
    notifications: NotificationCenter,
}

impl DashboardServices {
    /// Build services talking HTTP to `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be created.
    pub fn from_config(config: DashboardConfig, clock: Clock) -> Result<Self, ApiError> {
        let api = Arc::new(HttpDashboardApi::new(&config)?);
        Ok(Self::with_api(config, clock, api))
    }

    #[must_use]
    pub fn with_api(config: DashboardConfig, clock: Clock, api: Arc<dyn DashboardApi>) -> Self {
        let notifications = NotificationCenter::new(clock, config.notifications);
        Self {
            config,
            clock,
            api,
            notifications,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn DashboardApi> {
        Arc::clone(&self.api)
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationCenter {
        self.notifications.clone()
    }

    #[must_use]
    pub fn leaderboard(&self, surface: Arc<dyn LeaderboardSurface>) -> Arc<LeaderboardReconciler> {
        Arc::new(LeaderboardReconciler::new(
            self.api(),
            surface,
            self.clock,
            self.config.poll_interval,
        ))
    }

    /// Build a controller for one quiz form. `raw_time_limit` is the page's
    /// `data-time-limit` attribute; missing or unparsable values use the default.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for duplicate question ids.
    pub fn quiz(
        &self,
        questions: Vec<Question>,
        raw_time_limit: Option<&str>,
        confirmation: Arc<dyn SubmitConfirmation>,
        submitter: Arc<dyn QuizSubmitter>,
    ) -> Result<QuizController, QuizError> {
        let limit = self.config.time_limit_or_default(raw_time_limit);
        let session = QuizSession::new(questions, limit)?.with_timings(self.config.quiz);
        Ok(QuizController::new(
            session,
            confirmation,
            submitter,
            self.notifications(),
        ))
    }

    #[must_use]
    pub fn challenges(
        &self,
        loading: Arc<dyn LoadingIndicator>,
        controls: Arc<dyn ChallengeControls>,
    ) -> ChallengeJoinFlow {
        ChallengeJoinFlow::new(self.api(), self.notifications(), loading, controls)
    }
}
