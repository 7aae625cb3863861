use dioxus::prelude::*;

use eco_core::model::{PeerStanding, UserStanding};

use crate::vm::{LeaderRowVm, PeerRowVm, UserStatsVm, map_global_top, map_personal_window};

#[component]
pub fn UserStatsBlock(stats: UserStatsVm) -> Element {
    rsx! {
        div { class: "card-body",
            div { class: "d-flex gap-2 mb-2",
                span { class: "badge bg-success", "{stats.rank_label}" }
                span { class: "badge bg-secondary", "{stats.total_label}" }
            }
            p {
                strong { "Eco Points:" }
                " {stats.points_str}"
            }
            span { class: "{stats.tier_class}", "{stats.tier_name}" }
        }
    }
}

#[component]
pub fn PersonalWindowList(rows: Vec<PeerRowVm>) -> Element {
    rsx! {
        for row in rows {
            div { key: "{row.rank}-{row.name}", class: "{row.item_class}",
                div { class: "{row.rank_class}", "{row.rank}" }
                div { class: "flex-grow-1",
                    h6 { class: "mb-1",
                        "{row.name}"
                        if row.is_user {
                            span { class: "badge bg-success ms-2", "You" }
                        }
                    }
                    small { class: "text-muted",
                        i { class: "fas fa-school me-1" }
                        "{row.school}"
                    }
                    div { class: "mt-1",
                        span { class: "{row.tier_class}", "Tier: {row.tier_name}" }
                    }
                }
                div { class: "text-end",
                    div { class: "eco-points",
                        i { class: "fas fa-coins me-1" }
                        "{row.points_str}"
                    }
                    small { class: "text-muted d-block",
                        i { class: "fas fa-medal me-1" }
                        "{row.badges_label}"
                    }
                    if let Some(delta) = &row.delta_label {
                        small { class: "text-muted", "{delta}" }
                    }
                }
            }
        }
    }
}

#[component]
pub fn GlobalTopList(rows: Vec<LeaderRowVm>) -> Element {
    rsx! {
        for row in rows {
            div { key: "{row.rank}", class: "leaderboard-item",
                div { class: "{row.rank_class}", "{row.rank}" }
                div { class: "flex-grow-1",
                    h6 { class: "mb-1", "{row.name}" }
                    small { class: "text-muted",
                        i { class: "fas fa-school me-1" }
                        "{row.school}"
                    }
                }
                div { class: "text-end",
                    div { class: "eco-points",
                        i { class: "fas fa-coins me-1" }
                        "{row.points_str}"
                    }
                }
            }
        }
    }
}

#[must_use]
pub fn render_user_stats(user: &UserStanding) -> String {
    let stats = UserStatsVm::from(user);
    dioxus_ssr::render_element(rsx! { UserStatsBlock { stats } })
}

#[must_use]
pub fn render_personal_window(user: &UserStanding, rows: &[PeerStanding]) -> String {
    let rows = map_personal_window(user, rows);
    dioxus_ssr::render_element(rsx! { PersonalWindowList { rows } })
}

#[must_use]
pub fn render_global_top(rows: &[PeerStanding]) -> String {
    let rows = map_global_top(rows);
    dioxus_ssr::render_element(rsx! { GlobalTopList { rows } })
}
