use eco_core::model::{PeerStanding, UserStanding};

/// Top-three highlight of a leaderboard position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    #[must_use]
    pub fn for_rank(rank: u32) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }

    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Bronze => "bronze",
        }
    }
}

/// `1234567` → `"1,234,567"`.
#[must_use]
pub fn format_points(points: u64) -> String {
    let digits = points.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Signed points difference: `"+1,200"`, `"-50"`, `"0"`.
#[must_use]
pub fn format_delta(delta: i64) -> String {
    let magnitude = format_points(delta.unsigned_abs());
    match delta.signum() {
        1 => format!("+{magnitude}"),
        -1 => format!("-{magnitude}"),
        _ => magnitude,
    }
}

/// Short form for large counts: `999`, `1.2K`, `3.4M`.
#[must_use]
pub fn format_compact(value: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let scaled = |divisor: u64| value as f64 / divisor as f64;
    if value >= 1_000_000 {
        format!("{:.1}M", scaled(1_000_000))
    } else if value >= 1_000 {
        format!("{:.1}K", scaled(1_000))
    } else {
        value.to_string()
    }
}

fn or_na(value: Option<u32>) -> String {
    value.map_or_else(|| "N/A".to_owned(), |value| value.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserStatsVm {
    pub rank_label: String,
    pub total_label: String,
    pub points_str: String,
    pub tier_name: String,
    pub tier_class: String,
}

impl From<&UserStanding> for UserStatsVm {
    fn from(user: &UserStanding) -> Self {
        Self {
            rank_label: format!("Rank #{}", or_na(user.rank)),
            total_label: format!("Total {}", or_na(user.total_participants)),
            points_str: format_points(user.eco_points),
            tier_name: user.tier.name.clone(),
            tier_class: format!("badge bg-{} text-uppercase", user.tier.slug),
        }
    }
}

/// One row of the personal rank window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRowVm {
    pub rank: u32,
    pub item_class: &'static str,
    pub rank_class: &'static str,
    pub name: String,
    pub school: String,
    pub tier_name: String,
    pub tier_class: String,
    pub points_str: String,
    pub badges_label: String,
    pub is_user: bool,
    /// `None` on the student's own row.
    pub delta_label: Option<String>,
}

#[must_use]
pub fn map_personal_window(user: &UserStanding, rows: &[PeerStanding]) -> Vec<PeerRowVm> {
    rows.iter()
        .map(|peer| {
            let is_user = user.owns_row(peer);
            PeerRowVm {
                rank: peer.rank,
                item_class: if is_user {
                    "leaderboard-item border border-success"
                } else {
                    "leaderboard-item"
                },
                rank_class: if is_user {
                    "leaderboard-rank gold"
                } else {
                    "leaderboard-rank"
                },
                name: peer.name.clone(),
                school: peer.school_label().to_owned(),
                tier_name: peer.tier.name.clone(),
                tier_class: format!("badge bg-{} text-uppercase", peer.tier.slug),
                points_str: format_points(peer.eco_points),
                badges_label: format!("{} badges", peer.total_badges),
                is_user,
                delta_label: (!is_user)
                    .then(|| format!("Δ {} pts", format_delta(peer.delta_from(user.eco_points)))),
            }
        })
        .collect()
}

/// One row of the global top list; rank is the 1-based position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderRowVm {
    pub rank: u32,
    pub medal: Option<Medal>,
    pub rank_class: String,
    pub name: String,
    pub school: String,
    pub points_str: String,
}

#[must_use]
pub fn map_global_top(rows: &[PeerStanding]) -> Vec<LeaderRowVm> {
    rows.iter()
        .map(|leader| {
            let medal = Medal::for_rank(leader.rank);
            LeaderRowVm {
                rank: leader.rank,
                medal,
                rank_class: match medal {
                    Some(medal) => format!("leaderboard-rank {}", medal.class()),
                    None => "leaderboard-rank".to_owned(),
                },
                name: leader.name.clone(),
                school: leader.school_label().to_owned(),
                points_str: format_points(leader.eco_points),
            }
        })
        .collect()
}
