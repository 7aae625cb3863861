use std::collections::HashSet;

use services::{NotificationEntry, ToastPhase};

/// Markup a toast message may keep; everything else is stripped.
fn sanitize_message(message: &str) -> String {
    let tags: HashSet<&str> = ["strong", "em", "b", "i", "br", "span", "code"]
        .into_iter()
        .collect();

    ammonia::Builder::new()
        .tags(tags)
        .clean(message)
        .to_string()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToastVm {
    pub id: String,
    pub class: String,
    pub icon_class: String,
    pub message_html: String,
}

impl From<&NotificationEntry> for ToastVm {
    fn from(entry: &NotificationEntry) -> Self {
        let kind = entry.notification.kind;
        let mut class = format!(
            "alert alert-{} alert-dismissible fade notification-toast",
            kind.alert_class()
        );
        if entry.phase == ToastPhase::Visible {
            class.push_str(" show");
        }
        Self {
            id: entry.notification.id.to_string(),
            class,
            icon_class: format!("fas {} me-2", kind.icon()),
            message_html: sanitize_message(&entry.notification.message),
        }
    }
}

#[must_use]
pub fn map_toasts(entries: &[NotificationEntry]) -> Vec<ToastVm> {
    entries.iter().map(ToastVm::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::model::{Notification, NotificationKind};
    use eco_core::time::fixed_now;

    fn entry(kind: NotificationKind, message: &str, phase: ToastPhase) -> NotificationEntry {
        NotificationEntry {
            notification: Notification::new(kind, message, fixed_now()),
            phase,
        }
    }

    #[test]
    fn leaving_toasts_drop_the_show_class() {
        let visible = ToastVm::from(&entry(NotificationKind::Error, "x", ToastPhase::Visible));
        let leaving = ToastVm::from(&entry(NotificationKind::Error, "x", ToastPhase::Leaving));

        assert!(visible.class.starts_with("alert alert-danger"));
        assert!(visible.class.ends_with(" show"));
        assert!(!leaving.class.contains("show"));
        assert_eq!(visible.icon_class, "fas fa-exclamation-circle me-2");
    }

    #[test]
    fn message_markup_is_sanitized() {
        let vm = ToastVm::from(&entry(
            NotificationKind::Success,
            "<strong>Joined!</strong><script>alert(1)</script><img src=x onerror=alert(1)>",
            ToastPhase::Visible,
        ));

        assert_eq!(vm.message_html, "<strong>Joined!</strong>");
    }
}
