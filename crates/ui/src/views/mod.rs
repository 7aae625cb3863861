mod challenges;
mod leaderboard;
mod notifications;
mod quiz;

pub use challenges::{JoinButton, LoadingOverlay, render_join_button, render_loading_overlay};
pub use leaderboard::{
    GlobalTopList, PersonalWindowList, UserStatsBlock, render_global_top, render_personal_window,
    render_user_stats,
};
pub use notifications::{NotificationStack, render_notifications};
pub use quiz::{QuizProgress, QuizTimer, render_countdown, render_progress};
