use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use eco_core::Clock;
use eco_core::model::{LeaderboardSnapshot, PeerStanding, UserStanding};

use crate::api::DashboardApi;
use crate::error::FailureKind;
use crate::task::TaskHandle;

/// Rendered leaderboard regions of a page.
///
/// Implementations replace a region's content wholesale; the reconciler only calls
/// a render method when it has valid data for that region.
pub trait LeaderboardSurface: Send + Sync {
    /// Personal tab present (own stats block plus the rank window).
    fn has_personal_view(&self) -> bool;

    fn has_global_view(&self) -> bool;

    fn render_user_stats(&self, user: &UserStanding);

    fn render_personal_window(&self, user: &UserStanding, rows: &[PeerStanding]);

    fn render_global_top(&self, rows: &[PeerStanding]);
}

/// Which regions a poll re-rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderedRegions {
    pub user_stats: bool,
    pub personal_window: bool,
    pub global_top: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied {
        sequence: u64,
        regions: RenderedRegions,
    },
    /// A newer poll already rendered; this response was discarded.
    Stale { sequence: u64 },
    Failed { sequence: u64, kind: FailureKind },
}

#[derive(Debug, Default)]
struct Applied {
    sequence: u64,
    at: Option<DateTime<Utc>>,
}

/// Keeps a page's leaderboard regions eventually consistent with the server.
pub struct LeaderboardReconciler {
    api: Arc<dyn DashboardApi>,
    surface: Arc<dyn LeaderboardSurface>,
    clock: Clock,
    interval: Duration,
    issued: AtomicU64,
    applied: Mutex<Applied>,
}

impl LeaderboardReconciler {
    #[must_use]
    pub fn new(
        api: Arc<dyn DashboardApi>,
        surface: Arc<dyn LeaderboardSurface>,
        clock: Clock,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            surface,
            clock,
            // tokio intervals reject a zero period.
            interval: interval.max(Duration::from_millis(1)),
            issued: AtomicU64::new(0),
            applied: Mutex::new(Applied::default()),
        }
    }

    /// False when the page has nothing to render into.
    #[must_use]
    pub fn is_relevant(&self) -> bool {
        self.surface.has_personal_view() || self.surface.has_global_view()
    }

    /// Time of the last applied refresh.
    #[must_use]
    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.applied().at
    }

    /// Fetch once and patch the regions the response carries.
    ///
    /// Failures leave every region untouched. Responses that arrive after a newer poll
    /// was applied are dropped.
    pub async fn poll_once(&self) -> PollOutcome {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        match self.api.fetch_leaderboard().await {
            Ok(snapshot) => self.apply(sequence, &snapshot),
            Err(err) => {
                tracing::debug!(sequence, error = %err, "leaderboard refresh failed; keeping last view");
                PollOutcome::Failed {
                    sequence,
                    kind: err.kind(),
                }
            }
        }
    }

    /// Poll now and then every interval until the handle is stopped.
    ///
    /// Returns `None` without fetching when neither leaderboard view is on the page.
    #[must_use]
    pub fn start(self: &Arc<Self>) -> Option<TaskHandle> {
        if !self.is_relevant() {
            tracing::debug!("no leaderboard view on page; polling stays off");
            return None;
        }
        tracing::info!(interval_secs = self.interval.as_secs(), "starting leaderboard polling");
        let reconciler = Arc::clone(self);
        Some(TaskHandle::new(
            "leaderboard-poll",
            tokio::spawn(reconciler.run()),
        ))
    }

    async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Owned here so aborting the loop also aborts every in-flight poll.
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let reconciler = Arc::clone(&self);
                    in_flight.spawn(async move { reconciler.poll_once().await });
                }
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }
    }

    fn applied(&self) -> MutexGuard<'_, Applied> {
        self.applied.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, sequence: u64, snapshot: &LeaderboardSnapshot) -> PollOutcome {
        // Held across rendering so two responses never interleave their patches.
        let mut applied = self.applied();
        if sequence <= applied.sequence {
            tracing::debug!(sequence, newest = applied.sequence, "dropping stale leaderboard response");
            return PollOutcome::Stale { sequence };
        }
        applied.sequence = sequence;
        applied.at = Some(self.clock.now());

        let mut regions = RenderedRegions::default();
        if self.surface.has_personal_view() {
            if let Some(user) = &snapshot.user {
                self.surface.render_user_stats(user);
                regions.user_stats = true;
                if let Some(rows) = &snapshot.personal_window {
                    self.surface.render_personal_window(user, rows);
                    regions.personal_window = true;
                }
            }
        }
        if self.surface.has_global_view() {
            if let Some(rows) = &snapshot.global_top {
                self.surface.render_global_top(rows);
                regions.global_top = true;
            }
        }

        PollOutcome::Applied { sequence, regions }
    }
}
