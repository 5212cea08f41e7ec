//! Message contracts between the three shadertime execution contexts.
//!
//! - [`ExtensionMessage`]: monitor (or CLI) -> dispatcher.
//! - [`PageMessage`]: the page bridge and the monitor, keyed by event name.
//!
//! Both are plain serde enums so they can cross a process boundary as JSON
//! just as well as an in-process channel.

use serde::{Deserialize, Serialize};
use st_core::types::HeartbeatData;

// ── Monitor -> Dispatcher ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionMessage {
    /// Fire-and-forget: no reply is produced.
    SendHeartbeat { data: HeartbeatData },
    /// Answered with a [`TestApiResponse`].
    TestApi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestApiResponse {
    pub success: bool,
    pub message: String,
}

impl TestApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// An [`ExtensionMessage`] in flight, with a reply slot for the messages that
/// expect one.
#[derive(Debug)]
pub struct Envelope {
    pub message: ExtensionMessage,
    pub reply: Option<tokio::sync::oneshot::Sender<TestApiResponse>>,
}

impl Envelope {
    /// Wrap a message whose sender does not wait for an answer.
    pub fn fire_and_forget(message: ExtensionMessage) -> Self {
        Self {
            message,
            reply: None,
        }
    }

    /// Build a `TEST_API` request and the receiver its answer arrives on.
    pub fn test_api() -> (Self, tokio::sync::oneshot::Receiver<TestApiResponse>) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        (
            Self {
                message: ExtensionMessage::TestApi,
                reply: Some(tx),
            },
            rx,
        )
    }
}

// ── Page bridge <-> Monitor ──

/// Cursor and size of the host editor as seen from the page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorData {
    /// One-based line of the cursor.
    pub line: u32,
    pub cursor_pos: u32,
    pub total_lines: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PageMessage {
    /// The host editor was discovered and hooked.
    EditorReady,
    EditorChange,
    CursorActivity,
    /// Monitor -> page: ask for a fresh [`EditorData`].
    RequestEditorData,
    /// Page -> monitor: `None` when the editor is no longer reachable.
    EditorDataResponse { detail: Option<EditorData> },
}

impl PageMessage {
    /// The DOM-style event name this message travels under.
    pub fn event_name(&self) -> &'static str {
        match self {
            PageMessage::EditorReady => "shadertime-editor-ready",
            PageMessage::EditorChange => "shadertime-editor-change",
            PageMessage::CursorActivity => "shadertime-cursor-activity",
            PageMessage::RequestEditorData => "shadertime-request-editor-data",
            PageMessage::EditorDataResponse { .. } => "shadertime-editor-data-response",
        }
    }
}
