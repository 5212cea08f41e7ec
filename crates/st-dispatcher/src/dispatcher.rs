use std::fmt;

use chrono::Utc;
use st_core::settings::SettingsStore;
use st_core::types::{HeartbeatData, Settings};
use st_protocol::{Envelope, ExtensionMessage, TestApiResponse};
use tokio::task::JoinHandle;

use crate::client::{ApiError, HeartbeatApi, TestHeartbeat};
use crate::notifications::{NotificationCenter, NotificationLevel};

/// What happened to one heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Tracking disabled or no API key; nothing was sent.
    Skipped,
    Sent { status: u16 },
    Rejected { status: u16 },
    Failed,
}

/// Result of a credential check, one variant per user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    MissingKey,
    Connected,
    InvalidKey,
    PlanLimit,
    ApiError { status: u16 },
    Network(String),
}

impl TestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TestOutcome::Connected)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::MissingKey => write!(f, "API key is required"),
            TestOutcome::Connected => write!(f, "Connected successfully! API key is valid."),
            TestOutcome::InvalidKey => {
                write!(f, "Invalid API key. Please check your WakaTime API key.")
            }
            TestOutcome::PlanLimit => {
                write!(f, "WakaTime plan limit reached. Please upgrade your plan.")
            }
            TestOutcome::ApiError { status } => write!(
                f,
                "API Error {status}. Check if your API server URL is correct."
            ),
            TestOutcome::Network(reason) => write!(f, "Connection failed: {reason}"),
        }
    }
}

impl From<TestOutcome> for TestApiResponse {
    fn from(outcome: TestOutcome) -> Self {
        if outcome.is_success() {
            TestApiResponse::ok(outcome.to_string())
        } else {
            TestApiResponse::failed(outcome.to_string())
        }
    }
}

/// Sends heartbeats on behalf of the activity monitor.
///
/// Settings are read fresh from the store for every request, so edits made
/// while running apply to the next heartbeat. Nothing is retried.
pub struct HeartbeatDispatcher<A> {
    api: A,
    store: SettingsStore,
    notifications: NotificationCenter,
}

impl<A: HeartbeatApi> HeartbeatDispatcher<A> {
    pub fn new(api: A, store: SettingsStore, notifications: NotificationCenter) -> Self {
        Self {
            api,
            store,
            notifications,
        }
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Write default settings when the store has none yet.
    pub fn initialize(&self) {
        if let Err(e) = self.store.initialize_defaults() {
            tracing::error!(error = %e, "failed to initialise settings");
        }
    }

    fn current_settings(&self) -> Settings {
        self.store.settings_or_default()
    }

    pub async fn dispatch(&self, heartbeat: &HeartbeatData) -> DispatchOutcome {
        let settings = self.current_settings();
        if !settings.is_active() {
            tracing::debug!(status = %settings.status(), "heartbeat dropped");
            return DispatchOutcome::Skipped;
        }

        let body = match serde_json::to_value(heartbeat) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode heartbeat");
                return DispatchOutcome::Failed;
            }
        };

        tracing::debug!(
            url = %settings.heartbeats_url(),
            entity = %heartbeat.entity,
            project = heartbeat.project.as_deref().unwrap_or("-"),
            line = heartbeat.lineno,
            "posting heartbeat"
        );

        match self.api.post_heartbeat(&settings, &body).await {
            Ok(status) => {
                tracing::info!(status, entity = %heartbeat.entity, "heartbeat accepted");
                DispatchOutcome::Sent { status }
            }
            Err(ApiError::Status { status, body }) => {
                tracing::warn!(status, %body, "heartbeat rejected");
                if status == 401 {
                    self.notifications.notify(
                        NotificationLevel::Error,
                        "WakaTime API key is invalid",
                        "Please check your API key with `shadertime config --api-key`.",
                    );
                } else if status >= 500 {
                    self.notifications.notify(
                        NotificationLevel::Warning,
                        "WakaTime API error",
                        "Server error occurred. Please try again later.",
                    );
                }
                DispatchOutcome::Rejected { status }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to send heartbeat");
                if e.is_network() {
                    self.notifications.notify(
                        NotificationLevel::Warning,
                        "Network error",
                        "Failed to connect to WakaTime API. Please check your internet connection.",
                    );
                }
                DispatchOutcome::Failed
            }
        }
    }

    /// Validate the configured key with a synthetic heartbeat.
    pub async fn test_connection(&self) -> TestOutcome {
        let settings = self.current_settings();
        if settings.api_key.is_empty() {
            return TestOutcome::MissingKey;
        }

        let url = settings.heartbeats_url();
        tracing::info!(%url, "testing API connection");

        let body = match serde_json::to_value(TestHeartbeat::new(Utc::now())) {
            Ok(v) => v,
            Err(e) => return TestOutcome::Network(e.to_string()),
        };

        match self.api.post_heartbeat(&settings, &body).await {
            Ok(_) => TestOutcome::Connected,
            Err(ApiError::Status { status: 401, .. }) => TestOutcome::InvalidKey,
            Err(ApiError::Status { status: 402, .. }) => TestOutcome::PlanLimit,
            Err(ApiError::Status { status, body }) => {
                tracing::info!(status, %body, "test API response");
                TestOutcome::ApiError { status }
            }
            Err(ApiError::Http(e)) => {
                tracing::error!(error = %e, "test API error");
                TestOutcome::Network(e.to_string())
            }
        }
    }

    pub async fn handle(&self, envelope: Envelope) {
        match envelope.message {
            ExtensionMessage::SendHeartbeat { data } => {
                self.dispatch(&data).await;
            }
            ExtensionMessage::TestApi => {
                let response = TestApiResponse::from(self.test_connection().await);
                match envelope.reply {
                    Some(reply) => {
                        if reply.send(response).is_err() {
                            tracing::debug!("test caller went away before the reply");
                        }
                    }
                    None => tracing::debug!(success = response.success, "{}", response.message),
                }
            }
        }
    }

    /// Serve envelopes in arrival order until every sender is gone.
    pub async fn run(self, inbox: flume::Receiver<Envelope>) {
        self.initialize();
        while let Ok(envelope) = inbox.recv_async().await {
            self.handle(envelope).await;
        }
        tracing::debug!("dispatcher inbox closed");
    }
}

/// Handle to a spawned dispatcher task.
pub struct DispatcherHandle {
    sender: flume::Sender<Envelope>,
    task: JoinHandle<()>,
}

pub fn spawn_dispatcher<A>(dispatcher: HeartbeatDispatcher<A>) -> DispatcherHandle
where
    A: HeartbeatApi + 'static,
{
    let (sender, inbox) = flume::unbounded();
    let task = tokio::spawn(dispatcher.run(inbox));
    DispatcherHandle { sender, task }
}

impl DispatcherHandle {
    pub fn sender(&self) -> flume::Sender<Envelope> {
        self.sender.clone()
    }

    /// TEST_API round trip.
    pub async fn test_connection(&self) -> TestApiResponse {
        let (envelope, reply) = Envelope::test_api();
        if self.sender.send(envelope).is_err() {
            return TestApiResponse::failed("Dispatcher is not running");
        }
        reply
            .await
            .unwrap_or_else(|_| TestApiResponse::failed("Dispatcher is not running"))
    }

    /// Close this handle's sender and wait for queued envelopes to drain.
    /// Other senders (e.g. a monitor) must be dropped first.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "dispatcher task failed");
        }
    }
}
