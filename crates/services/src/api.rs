use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use url::Url;

use eco_core::model::{ChallengeId, LeaderboardSnapshot};

use crate::config::DashboardConfig;
use crate::error::ApiError;
use crate::wire::{self, JoinReceipt, JoinRequest};

const REQUESTED_WITH: &str = "x-requested-with";
const CSRF_HEADER: &str = "x-csrf-token";

/// The two outbound calls of the dashboard.
///
/// Implementations never panic on bad input: every transport, status, or shape problem
/// comes back as an `ApiError` and callers handle both branches.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn fetch_leaderboard(&self) -> Result<LeaderboardSnapshot, ApiError>;

    async fn join_challenge(&self, challenge_id: &ChallengeId) -> Result<JoinReceipt, ApiError>;
}

/// `reqwest`-backed client for the live leaderboard and join endpoints.
#[derive(Clone)]
pub struct HttpDashboardApi {
    client: Client,
    leaderboard_url: Url,
    join_url: Url,
    csrf_token: String,
}

impl HttpDashboardApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder().timeout(config.request_timeout).build()?,
            leaderboard_url: config.leaderboard_url(),
            join_url: config.join_url(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // A token with bytes that cannot go into a header is sent in the body only.
        if let Ok(token) = HeaderValue::from_str(&self.csrf_token) {
            headers.insert(CSRF_HEADER, token);
        }
        headers
    }

    async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn fetch_leaderboard(&self) -> Result<LeaderboardSnapshot, ApiError> {
        let response = self
            .client
            .get(self.leaderboard_url.clone())
            .headers(self.headers())
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        wire::decode_leaderboard(&body)
    }

    async fn join_challenge(&self, challenge_id: &ChallengeId) -> Result<JoinReceipt, ApiError> {
        let payload = JoinRequest {
            challenge_id: challenge_id.as_str(),
            csrf_token: &self.csrf_token,
        };
        let response = self
            .client
            .post(self.join_url.clone())
            .headers(self.headers())
            .json(&payload)
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        wire::decode_join(&body)
    }
}
