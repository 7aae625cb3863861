use std::env;
use std::time::Duration;

use url::Url;

use eco_core::model::{DEFAULT_TIME_LIMIT_SECS, QuizTimings};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
pub const LEADERBOARD_PATH: &str = "api/leaderboard_live.php";
pub const JOIN_PATH: &str = "api/join_challenge.php";

/// Notification lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTimings {
    /// How long a toast stays fully visible.
    pub visible_for: Duration,
    /// Length of the exit transition before removal.
    pub exit_for: Duration,
}

impl Default for NotificationTimings {
    fn default() -> Self {
        Self {
            visible_for: Duration::from_secs(5),
            exit_for: Duration::from_millis(300),
        }
    }
}

/// Everything the dashboard needs to talk to the site and drive its timers.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Site root; endpoint paths are resolved against it.
    pub base_url: Url,
    /// Anti-forgery token from the page's `csrf-token` meta tag (empty when absent).
    pub csrf_token: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub notifications: NotificationTimings,
    pub quiz: QuizTimings,
    pub default_time_limit_secs: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!()),
            csrf_token: String::new(),
            poll_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            notifications: NotificationTimings::default(),
            quiz: QuizTimings::default(),
            default_time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
        }
    }
}

impl DashboardConfig {
    /// Read `ECO_BASE_URL`, `ECO_CSRF_TOKEN` and `ECO_POLL_INTERVAL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("ECO_BASE_URL") {
            config = config.with_base_url(&raw)?;
        }
        if let Ok(token) = env::var("ECO_CSRF_TOKEN") {
            config.csrf_token = token;
        }
        if let Ok(raw) = env::var("ECO_POLL_INTERVAL_SECS") {
            config.poll_interval = parse_seconds("ECO_POLL_INTERVAL_SECS", &raw)?;
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if `raw` is not an absolute URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        // Without a trailing slash `join` would replace the last path segment.
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_owned()
        } else {
            format!("{trimmed}/")
        };
        self.base_url = Url::parse(&normalized).map_err(|source| ConfigError::InvalidBaseUrl {
            raw: raw.to_owned(),
            source,
        })?;
        Ok(self)
    }

    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = token.into();
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn leaderboard_url(&self) -> Url {
        self.endpoint(LEADERBOARD_PATH)
    }

    #[must_use]
    pub fn join_url(&self) -> Url {
        self.endpoint(JOIN_PATH)
    }

    /// Parse a page-supplied time limit, falling back to the configured default.
    #[must_use]
    pub fn time_limit_or_default(&self, raw: Option<&str>) -> u32 {
        raw.and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(self.default_time_limit_secs)
    }

    fn endpoint(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

/// # Errors
///
/// Returns `ConfigError::InvalidSeconds` for anything but a positive integer.
pub fn parse_seconds(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidSeconds {
            name,
            raw: raw.to_owned(),
        }),
    }
}
