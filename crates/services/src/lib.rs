#![forbid(unsafe_code)]

pub mod api;
pub mod challenges;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod leaderboard;
pub mod notifications;
pub mod quiz;
pub mod task;
mod wire;

pub use eco_core::Clock;

pub use api::{DashboardApi, HttpDashboardApi};
pub use challenges::{ChallengeControls, ChallengeJoinFlow, JoinOutcome, LoadingIndicator};
pub use config::{DashboardConfig, NotificationTimings};
pub use dashboard::DashboardServices;
pub use error::{ApiError, ConfigError, FailureKind};
pub use leaderboard::{LeaderboardReconciler, LeaderboardSurface, PollOutcome, RenderedRegions};
pub use notifications::{NotificationCenter, NotificationEntry, ToastPhase};
pub use quiz::{
    ProgressDisplay, QuizController, QuizSubmitter, SubmitConfirmation, SubmitOutcome,
    TimerDisplay,
};
pub use task::TaskHandle;
pub use wire::JoinReceipt;
