mod challenge;
mod ids;
mod leaderboard;
mod notification;
mod quiz;

pub use ids::{ChallengeId, NotificationId, QuestionId, UserId};

pub use challenge::ChallengeMembership;
pub use leaderboard::{INDEPENDENT_SCHOOL, LeaderboardSnapshot, PeerStanding, Tier, UserStanding};
pub use notification::{Notification, NotificationKind};
pub use quiz::{
    Answer, DEFAULT_TIME_LIMIT_SECS, Progress, Question, QuestionKind, QuizError, QuizPhase,
    QuizSession, QuizTimings, Submission, SubmitGate, SubmitTrigger, TickOutcome, TimerUrgency,
};
