use std::time::Duration;

use st_core::config::MonitorConfig;

/// Cursor position as the host editor reports it (zero-based line).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: u32,
    pub ch: u32,
}

/// Notifications the host editor pushes to its subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorSignal {
    Change,
    CursorActivity,
}

/// The editor object living in the host page.
pub trait HostEditor: Send {
    fn cursor(&self) -> Cursor;

    /// Zero-based index of the last line.
    fn last_line(&self) -> u32;

    /// Route change and cursor notifications to `sink`.
    fn subscribe(&mut self, sink: flume::Sender<EditorSignal>);

    /// `false` once the page tore the editor down.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Where the page bridge looks for the editor while the page initialises.
pub trait EditorHost: Send {
    fn find_editor(&mut self) -> Option<Box<dyn HostEditor>>;
}

/// Fixed-interval, bounded polling schedule for [`discover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for DiscoveryConfig {
    fn from(cfg: &MonitorConfig) -> Self {
        Self {
            initial_delay: cfg.discovery_initial_delay(),
            interval: cfg.discovery_interval(),
            max_attempts: cfg.discovery_max_attempts,
        }
    }
}

/// Poll `host` until it exposes an editor or the attempts run out.
pub async fn discover<H: EditorHost + ?Sized>(
    host: &mut H,
    config: DiscoveryConfig,
) -> Option<Box<dyn HostEditor>> {
    tokio::time::sleep(config.initial_delay).await;

    for attempt in 1..=config.max_attempts {
        if let Some(editor) = host.find_editor() {
            tracing::info!(attempt, "host editor found");
            return Some(editor);
        }
        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    tracing::warn!(
        attempts = config.max_attempts,
        "host editor not found, tracking stays inactive for this page"
    );
    None
}
