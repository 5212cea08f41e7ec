use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use st_core::config::ApiConfig;
use st_core::types::{Category, EntityType, Settings};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Failures talking to the heartbeat endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: DNS, refused connection, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }

    /// Whether the request never got an answer from the server.
    pub fn is_network(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ApiError::Status { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Test payload
// ---------------------------------------------------------------------------

pub const TEST_ENTITY: &str = "shadertime/test";
pub const TEST_PROJECT: &str = "shadertime-test";

/// Minimal synthetic heartbeat used to validate credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestHeartbeat {
    pub entity: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub category: Category,
    pub time: i64,
    pub project: String,
    pub language: String,
}

impl TestHeartbeat {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            entity: TEST_ENTITY.to_string(),
            entity_type: EntityType::App,
            category: Category::Coding,
            time: at.timestamp(),
            project: TEST_PROJECT.to_string(),
            language: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// The remote heartbeat endpoint.
#[async_trait]
pub trait HeartbeatApi: Send + Sync {
    /// POST `body` to the heartbeats endpoint described by `settings`.
    /// Returns the success status code.
    async fn post_heartbeat(&self, settings: &Settings, body: &serde_json::Value) -> Result<u16>;
}

#[derive(Debug, Clone)]
pub struct WakaTimeClient {
    client: reqwest::Client,
}

impl WakaTimeClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HeartbeatApi for WakaTimeClient {
    async fn post_heartbeat(&self, settings: &Settings, body: &serde_json::Value) -> Result<u16> {
        let url = settings.heartbeats_url();
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&settings.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(status.as_u16())
    }
}
