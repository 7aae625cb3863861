pub mod context;
pub mod page;
pub mod views;
pub mod vm;

pub use context::{DashboardContext, UiApp, build_dashboard_context};
pub use page::{ChallengeBoard, LeaderboardPage, LeaderboardRegions, QuizPage, TimerLabel};
