use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// API endpoint used whenever the stored URL is blank.
pub const DEFAULT_API_URL: &str = "https://api.wakatime.com/api/v1";

/// Entity reported for documents that have no public URL yet.
pub const UNTITLED_ENTITY: &str = "untitled";

/// Language reported for every editor heartbeat.
pub const SHADER_LANGUAGE: &str = "glsl";

/// Default project name offered for per-project tracking.
pub const DEFAULT_PROJECT_NAME: &str = "ShaderToy";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Credentials and the global on/off switch, stored under `wakatimeSettings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_key: String,
    pub api_url: String,
    pub enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            enabled: true,
        }
    }
}

impl Settings {
    /// Returns `true` when an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Returns `true` when heartbeats should actually be sent.
    pub fn is_active(&self) -> bool {
        self.enabled && self.is_configured()
    }

    /// Trim user input and restore the default URL when it was cleared.
    pub fn normalized(mut self) -> Self {
        self.api_key = self.api_key.trim().to_string();
        let url = self.api_url.trim();
        self.api_url = if url.is_empty() {
            DEFAULT_API_URL.to_string()
        } else {
            url.to_string()
        };
        self
    }

    /// Full URL of the heartbeat collection endpoint.
    pub fn heartbeats_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        let base = if base.is_empty() { DEFAULT_API_URL } else { base };
        format!("{base}/users/current/heartbeats")
    }

    pub fn status(&self) -> TrackingStatus {
        match (self.is_configured(), self.enabled) {
            (true, true) => TrackingStatus::Enabled,
            (true, false) => TrackingStatus::Disabled,
            (false, _) => TrackingStatus::NotConfigured,
        }
    }
}

/// User-facing summary of [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Enabled,
    Disabled,
    NotConfigured,
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingStatus::Enabled => write!(f, "Configured and enabled"),
            TrackingStatus::Disabled => write!(f, "Configured but disabled"),
            TrackingStatus::NotConfigured => write!(f, "Not configured"),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectSettings
// ---------------------------------------------------------------------------

/// Per-site project attribution, stored under `projectSettings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub enabled: bool,
    pub name: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            name: DEFAULT_PROJECT_NAME.to_string(),
        }
    }
}

impl ProjectSettings {
    /// The project name to attach to heartbeats, if any.
    pub fn project(&self) -> Option<&str> {
        if self.enabled && !self.name.is_empty() {
            Some(self.name.as_str())
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    File,
    Url,
    App,
    Domain,
}

/// What is being worked on, resolved from the page location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub kind: EntityType,
}

impl Entity {
    /// Published shaders (`/view/...`) are reported by URL; anything else is
    /// an unsaved local document.
    pub fn from_location(location: &str) -> Self {
        if location.contains("/view") {
            Self {
                id: location.to_string(),
                kind: EntityType::Url,
            }
        } else {
            Self {
                id: UNTITLED_ENTITY.to_string(),
                kind: EntityType::File,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// HeartbeatData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Coding,
}

/// One activity report, built fresh for each emission and sent once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatData {
    pub time: i64,
    pub entity: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub language: String,
    pub lines: u32,
    pub lineno: u32,
    pub cursorpos: u32,
    pub is_write: bool,
}

impl HeartbeatData {
    /// Build an editor heartbeat. `line` is zero-based as reported by the
    /// editor; the payload carries it one-based.
    pub fn new(
        at: DateTime<Utc>,
        entity: &Entity,
        line: u32,
        column: u32,
        total_lines: u32,
        project: Option<&str>,
    ) -> Self {
        Self {
            time: at.timestamp(),
            entity: entity.id.clone(),
            entity_type: entity.kind,
            category: Category::Coding,
            project: project.map(str::to_string),
            language: SHADER_LANGUAGE.to_string(),
            lines: total_lines,
            lineno: line.saturating_add(1),
            cursorpos: column,
            is_write: false,
        }
    }
}
