use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Daemon configuration loaded from `~/.shadertime/config.toml`.
///
/// Credentials are not part of this file; they live in the settings store
/// (see [`crate::settings::SettingsStore`]) so that every context sees the
/// same values and is notified when they change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.validate()?;
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Semantic validation for settings that are not fully expressible via type checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.general.validate()?;
        self.monitor.validate()?;
        if self.notifications.max_history == 0 {
            return Err(ConfigError::Validation(
                "notifications.max_history must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Where the settings store lives, honouring `storage.path` when set.
    pub fn storage_path(&self) -> PathBuf {
        match &self.storage.path {
            Some(p) => expand_home(p),
            None => data_dir().join("storage.json"),
        }
    }

    pub fn default_path() -> PathBuf {
        data_dir().join("config.toml")
    }
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shadertime")
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => Path::new(path).to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `"pretty"` or `"json"`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl GeneralConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.log_format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::Validation(format!(
                "general.log_format must be \"pretty\" or \"json\", got {other:?}"
            ))),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Override for the settings store file. `~/` is expanded.
    #[serde(default)]
    pub path: Option<String>,
}

/// Timing knobs of the activity monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Minimum spacing between heartbeats for the same entity.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Gap after which the next editor event starts a fresh session.
    #[serde(default = "default_max_inactivity_secs")]
    pub max_inactivity_secs: u64,
    /// Focus regained within this window keeps the session going.
    #[serde(default = "default_focus_resume_secs")]
    pub focus_resume_secs: u64,
    #[serde(default = "default_discovery_initial_delay_ms")]
    pub discovery_initial_delay_ms: u64,
    #[serde(default = "default_discovery_interval_ms")]
    pub discovery_interval_ms: u64,
    #[serde(default = "default_discovery_max_attempts")]
    pub discovery_max_attempts: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            max_inactivity_secs: default_max_inactivity_secs(),
            focus_resume_secs: default_focus_resume_secs(),
            discovery_initial_delay_ms: default_discovery_initial_delay_ms(),
            discovery_interval_ms: default_discovery_interval_ms(),
            discovery_max_attempts: default_discovery_max_attempts(),
        }
    }
}

impl MonitorConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn max_inactivity(&self) -> Duration {
        Duration::from_secs(self.max_inactivity_secs)
    }

    pub fn focus_resume(&self) -> Duration {
        Duration::from_secs(self.focus_resume_secs)
    }

    pub fn discovery_initial_delay(&self) -> Duration {
        Duration::from_millis(self.discovery_initial_delay_ms)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "monitor.heartbeat_interval_secs must be positive".into(),
            ));
        }
        if self.max_inactivity_secs < self.heartbeat_interval_secs {
            return Err(ConfigError::Validation(
                "monitor.max_inactivity_secs must not be shorter than the heartbeat interval"
                    .into(),
            ));
        }
        if self.discovery_max_attempts == 0 {
            return Err(ConfigError::Validation(
                "monitor.discovery_max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_heartbeat_interval_secs() -> u64 {
    120
}
fn default_max_inactivity_secs() -> u64 {
    900
}
fn default_focus_resume_secs() -> u64 {
    300
}
fn default_discovery_initial_delay_ms() -> u64 {
    1000
}
fn default_discovery_interval_ms() -> u64 {
    100
}
fn default_discovery_max_attempts() -> u32 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("shadertime/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

fn default_max_history() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tracking_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.monitor.heartbeat_interval(), Duration::from_secs(120));
        assert_eq!(cfg.monitor.max_inactivity(), Duration::from_secs(900));
        assert_eq!(cfg.monitor.focus_resume(), Duration::from_secs(300));
        assert_eq!(cfg.monitor.discovery_interval(), Duration::from_millis(100));
        assert_eq!(cfg.monitor.discovery_max_attempts, 300);
        assert!(cfg.api.user_agent.starts_with("shadertime/"));
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[monitor]
heartbeat_interval_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(cfg.monitor.heartbeat_interval_secs, 60);
        assert_eq!(cfg.monitor.max_inactivity_secs, 900);
        assert_eq!(cfg.general.log_level, "info");
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut cfg = Config::default();
        cfg.general.log_format = "xml".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_inactivity_shorter_than_interval() {
        let mut cfg = Config::default();
        cfg.monitor.max_inactivity_secs = 30;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = Config::default();
        cfg.storage.path = Some("/tmp/st.json".into());
        let text = cfg.to_toml().unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.storage_path(), PathBuf::from("/tmp/st.json"));
    }
}
