use dioxus::prelude::*;

use services::NotificationEntry;

use crate::vm::{ToastVm, map_toasts};

#[component]
pub fn NotificationStack(toasts: Vec<ToastVm>) -> Element {
    rsx! {
        div { class: "notification-stack",
            for toast in toasts {
                div { key: "{toast.id}", class: "{toast.class}", role: "alert",
                    i { class: "{toast.icon_class}" }
                    span { dangerous_inner_html: "{toast.message_html}" }
                    button { r#type: "button", class: "btn-close", "data-mdb-dismiss": "alert" }
                }
            }
        }
    }
}

/// Oldest toast first, matching insertion order.
#[must_use]
pub fn render_notifications(entries: &[NotificationEntry]) -> String {
    let toasts = map_toasts(entries);
    dioxus_ssr::render_element(rsx! { NotificationStack { toasts } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::model::NotificationKind;
    use eco_core::time::fixed_clock;
    use services::{NotificationCenter, NotificationTimings};

    #[test]
    fn stack_keeps_insertion_order() {
        let center = NotificationCenter::new(fixed_clock(), NotificationTimings::default());
        center.show(NotificationKind::Info, "first");
        center.show(NotificationKind::Success, "second <em>now</em>");

        let html = render_notifications(&center.snapshot());

        let first = html.find("first").unwrap();
        let second = html.find("second").unwrap();
        assert!(first < second);
        assert!(html.contains("alert-info"));
        assert!(html.contains("alert-success"));
        assert!(html.contains("<em>now</em>"));
        assert!(html.contains("fa-check-circle"));
    }
}
