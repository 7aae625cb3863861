use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::NotificationId;

/// Category of a toast. Unknown labels collapse into `Info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl NotificationKind {
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "error" => Self::Error,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }

    /// Alert style suffix (`alert-<class>`).
    #[must_use]
    pub fn alert_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "danger",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "fa-check-circle",
            Self::Error => "fa-exclamation-circle",
            Self::Warning => "fa-exclamation-triangle",
            Self::Info => "fa-info-circle",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(kind: NotificationKind, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new_v4(),
            kind,
            message: message.into(),
            created_at,
        }
    }
}
