use crate::model::ChallengeId;

/// Client-side membership of the current student in a challenge.
///
/// Joining is one-way: nothing on the client ever flips `joined` back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeMembership {
    challenge_id: ChallengeId,
    joined: bool,
}

impl ChallengeMembership {
    #[must_use]
    pub fn new(challenge_id: ChallengeId) -> Self {
        Self {
            challenge_id,
            joined: false,
        }
    }

    #[must_use]
    pub fn challenge_id(&self) -> &ChallengeId {
        &self.challenge_id
    }

    #[must_use]
    pub fn joined(&self) -> bool {
        self.joined
    }

    /// Returns true if this call performed the transition.
    pub fn mark_joined(&mut self) -> bool {
        let changed = !self.joined;
        self.joined = true;
        changed
    }
}
