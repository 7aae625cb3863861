use serde::{Deserialize, Serialize};

use crate::model::UserId;

/// Label shown when a student has no school on record.
pub const INDEPENDENT_SCHOOL: &str = "Independent";

/// Points tier, e.g. bronze/silver/gold, with its style slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub slug: String,
}

impl Tier {
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
        }
    }
}

/// The requesting student's own standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStanding {
    pub id: UserId,
    pub name: String,
    pub school_name: Option<String>,
    pub eco_points: u64,
    pub tier: Tier,
    /// `None` while the student is not ranked yet.
    pub rank: Option<u32>,
    pub total_participants: Option<u32>,
    pub total_badges: u32,
}

/// Another student's row in a ranking list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStanding {
    pub id: UserId,
    pub name: String,
    pub school_name: Option<String>,
    pub eco_points: u64,
    pub tier: Tier,
    pub rank: u32,
    pub total_badges: u32,
}

impl PeerStanding {
    /// Signed point difference of this peer relative to `points`.
    #[must_use]
    pub fn delta_from(&self, points: u64) -> i64 {
        let mine = i128::from(self.eco_points);
        let theirs = i128::from(points);
        i64::try_from(mine - theirs).unwrap_or(if mine > theirs { i64::MAX } else { i64::MIN })
    }

    #[must_use]
    pub fn school_label(&self) -> &str {
        school_label(self.school_name.as_deref())
    }
}

impl UserStanding {
    #[must_use]
    pub fn school_label(&self) -> &str {
        school_label(self.school_name.as_deref())
    }

    /// True if `peer` is this student's own leaderboard row.
    #[must_use]
    pub fn owns_row(&self, peer: &PeerStanding) -> bool {
        self.id == peer.id
    }
}

fn school_label(school: Option<&str>) -> &str {
    match school {
        Some(name) if !name.trim().is_empty() => name,
        _ => INDEPENDENT_SCHOOL,
    }
}

/// One poll's worth of leaderboard data.
///
/// Each region is independent: `None` means the response did not carry a usable
/// value for it and the matching rendered region must be left as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardSnapshot {
    pub user: Option<UserStanding>,
    pub personal_window: Option<Vec<PeerStanding>>,
    pub global_top: Option<Vec<PeerStanding>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: u64, points: u64) -> PeerStanding {
        PeerStanding {
            id: UserId::new(id),
            name: format!("Student {id}"),
            school_name: None,
            eco_points: points,
            tier: Tier::new("Sprout", "sprout"),
            rank: 1,
            total_badges: 0,
        }
    }

    #[test]
    fn delta_is_signed() {
        assert_eq!(peer(1, 1500).delta_from(1200), 300);
        assert_eq!(peer(1, 900).delta_from(1200), -300);
        assert_eq!(peer(1, 0).delta_from(u64::MAX), i64::MIN);
    }

    #[test]
    fn own_row_matches_by_id() {
        let user = UserStanding {
            id: UserId::new(7),
            name: "Student 7".into(),
            school_name: None,
            eco_points: 40,
            tier: Tier::new("Sprout", "sprout"),
            rank: Some(3),
            total_participants: Some(9),
            total_badges: 1,
        };
        assert!(user.owns_row(&peer(7, 999)));
        assert!(!user.owns_row(&peer(8, 40)));
    }

    #[test]
    fn blank_school_falls_back_to_independent() {
        let mut row = peer(1, 0);
        assert_eq!(row.school_label(), INDEPENDENT_SCHOOL);
        row.school_name = Some("  ".into());
        assert_eq!(row.school_label(), INDEPENDENT_SCHOOL);
        row.school_name = Some("Green Valley High".into());
        assert_eq!(row.school_label(), "Green Valley High");
    }
}
