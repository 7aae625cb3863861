mod leaderboard_vm;
mod notification_vm;
mod quiz_vm;
mod time_fmt;

pub use leaderboard_vm::{
    LeaderRowVm, Medal, PeerRowVm, UserStatsVm, format_compact, format_delta, format_points,
    map_global_top, map_personal_window,
};
pub use notification_vm::{ToastVm, map_toasts};
pub use quiz_vm::{
    CountdownVm, ProgressVm, format_countdown, partial_submit_prompt, urgency_class,
};
pub use time_fmt::format_refreshed_at;
