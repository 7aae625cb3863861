use dioxus::prelude::*;

use eco_core::model::ChallengeMembership;

#[component]
pub fn JoinButton(challenge_id: String, joined: bool) -> Element {
    rsx! {
        if joined {
            button {
                r#type: "button",
                class: "btn btn-success join-challenge-btn",
                "data-challenge-id": "{challenge_id}",
                disabled: true,
                "Joined"
            }
        } else {
            button {
                r#type: "button",
                class: "btn btn-primary join-challenge-btn",
                "data-challenge-id": "{challenge_id}",
                "Join Challenge"
            }
        }
    }
}

#[component]
pub fn LoadingOverlay() -> Element {
    rsx! {
        div {
            id: "global-loading",
            class: "position-fixed top-0 start-0 w-100 h-100 d-flex align-items-center justify-content-center",
            div { class: "spinner" }
        }
    }
}

#[must_use]
pub fn render_join_button(membership: &ChallengeMembership) -> String {
    let challenge_id = membership.challenge_id().to_string();
    let joined = membership.joined();
    dioxus_ssr::render_element(rsx! { JoinButton { challenge_id, joined } })
}

#[must_use]
pub fn render_loading_overlay() -> String {
    dioxus_ssr::render_element(rsx! { LoadingOverlay {} })
}
