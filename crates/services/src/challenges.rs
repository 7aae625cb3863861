use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eco_core::model::{ChallengeId, ChallengeMembership, NotificationKind};

use crate::api::DashboardApi;
use crate::error::FailureKind;
use crate::notifications::NotificationCenter;

pub const JOIN_SUCCESS_MESSAGE: &str = "Successfully joined challenge!";
pub const JOIN_FAILED_MESSAGE: &str = "Failed to join challenge";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Page-wide busy overlay.
pub trait LoadingIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Join buttons on the challenge cards.
pub trait ChallengeControls: Send + Sync {
    /// Switch the control to its disabled "Joined" state.
    fn mark_joined(&self, challenge_id: &ChallengeId);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    /// The control stays interactive so the student can retry.
    Failed { message: String },
    AlreadyJoined,
    /// A request for this challenge is still pending.
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinState {
    Pending,
    Joined,
}

/// Hides the overlay on every exit path, including cancellation.
struct LoadingGuard<'a>(&'a dyn LoadingIndicator);

impl<'a> LoadingGuard<'a> {
    fn show(indicator: &'a dyn LoadingIndicator) -> Self {
        indicator.show();
        Self(indicator)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.hide();
    }
}

/// Clears a pending marker unless the join settled as joined.
struct PendingJoin<'a> {
    states: &'a Mutex<HashMap<ChallengeId, JoinState>>,
    challenge_id: &'a ChallengeId,
    joined: bool,
}

impl Drop for PendingJoin<'_> {
    fn drop(&mut self) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        if self.joined {
            states.insert(self.challenge_id.clone(), JoinState::Joined);
        } else {
            states.remove(self.challenge_id);
        }
    }
}

/// One-shot join requests with an optimistic lock per challenge.
pub struct ChallengeJoinFlow {
    api: Arc<dyn DashboardApi>,
    notifications: NotificationCenter,
    loading: Arc<dyn LoadingIndicator>,
    controls: Arc<dyn ChallengeControls>,
    states: Mutex<HashMap<ChallengeId, JoinState>>,
}

impl ChallengeJoinFlow {
    #[must_use]
    pub fn new(
        api: Arc<dyn DashboardApi>,
        notifications: NotificationCenter,
        loading: Arc<dyn LoadingIndicator>,
        controls: Arc<dyn ChallengeControls>,
    ) -> Self {
        Self {
            api,
            notifications,
            loading,
            controls,
            states: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn membership(&self, challenge_id: &ChallengeId) -> ChallengeMembership {
        let mut membership = ChallengeMembership::new(challenge_id.clone());
        if self.states().get(challenge_id) == Some(&JoinState::Joined) {
            membership.mark_joined();
        }
        membership
    }

    /// Join `challenge_id`. Joined or pending challenges never issue a second request.
    pub async fn join(&self, challenge_id: &ChallengeId) -> JoinOutcome {
        {
            let mut states = self.states();
            match states.get(challenge_id) {
                Some(JoinState::Joined) => return JoinOutcome::AlreadyJoined,
                Some(JoinState::Pending) => return JoinOutcome::InFlight,
                None => {
                    states.insert(challenge_id.clone(), JoinState::Pending);
                }
            }
        }
        let mut pending = PendingJoin {
            states: &self.states,
            challenge_id,
            joined: false,
        };

        let result = {
            let _loading = LoadingGuard::show(self.loading.as_ref());
            self.api.join_challenge(challenge_id).await
        };

        match result {
            Ok(_) => {
                pending.joined = true;
                drop(pending);
                tracing::info!(challenge = %challenge_id, "joined challenge");
                self.notifications
                    .show(NotificationKind::Success, JOIN_SUCCESS_MESSAGE);
                self.controls.mark_joined(challenge_id);
                JoinOutcome::Joined
            }
            Err(err) => {
                drop(pending);
                let message = match err.kind() {
                    FailureKind::Application => err
                        .server_message()
                        .unwrap_or(JOIN_FAILED_MESSAGE)
                        .to_owned(),
                    FailureKind::Transport | FailureKind::Malformed => {
                        NETWORK_ERROR_MESSAGE.to_owned()
                    }
                };
                tracing::warn!(challenge = %challenge_id, error = %err, "joining challenge failed");
                self.notifications
                    .show(NotificationKind::Error, message.clone());
                JoinOutcome::Failed { message }
            }
        }
    }

    fn states(&self) -> MutexGuard<'_, HashMap<ChallengeId, JoinState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
