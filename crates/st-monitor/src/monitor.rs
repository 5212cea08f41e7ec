use std::sync::Arc;

use st_core::config::MonitorConfig;
use st_core::settings::{SettingsStore, StorageChange};
use st_core::types::{Entity, HeartbeatData, ProjectSettings, Settings, TrackingStatus};
use st_protocol::{EditorData, Envelope, ExtensionMessage, PageMessage};

use crate::clock::Clock;
use crate::tracker::{ActivityTracker, Decision, TrackerConfig};

/// Plain user input that only counts as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    PointerDown,
    KeyDown,
    Scroll,
}

/// Everything the monitor reacts to, processed strictly in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Page(PageMessage),
    Input(InputKind),
    FocusGained,
    /// The URL changed in place (e.g. a new shader was saved); same session.
    LocationChanged { location: String },
    /// The page was reloaded or left; the session starts over.
    Navigated { location: String },
    Storage(StorageChange),
}

impl From<PageMessage> for MonitorEvent {
    fn from(msg: PageMessage) -> Self {
        MonitorEvent::Page(msg)
    }
}

impl From<StorageChange> for MonitorEvent {
    fn from(change: StorageChange) -> Self {
        MonitorEvent::Storage(change)
    }
}

/// Turns page and input events into throttled heartbeats.
///
/// One instance owns the whole session state; it never performs I/O itself.
/// Heartbeats are handed to the dispatcher as fire-and-forget envelopes and
/// editor data is requested from the page bridge before every decision.
pub struct ActivityMonitor {
    tracker: ActivityTracker,
    clock: Arc<dyn Clock>,
    location: String,
    settings: Option<Settings>,
    project: ProjectSettings,
    editor_ready: bool,
    editor_data: Option<EditorData>,
    /// Editor events waiting for their data response.
    pending_decisions: usize,
    to_page: flume::Sender<PageMessage>,
    to_dispatcher: flume::Sender<Envelope>,
}

impl ActivityMonitor {
    pub fn new(
        config: &MonitorConfig,
        location: impl Into<String>,
        store: &SettingsStore,
        to_page: flume::Sender<PageMessage>,
        to_dispatcher: flume::Sender<Envelope>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tracker: ActivityTracker::new(TrackerConfig::from(config)),
            clock,
            location: location.into(),
            settings: store.settings(),
            project: store.project_settings(),
            editor_ready: false,
            editor_data: None,
            pending_decisions: 0,
            to_page,
            to_dispatcher,
        }
    }

    pub fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status(&self) -> TrackingStatus {
        self.settings.clone().unwrap_or_default().status()
    }

    /// Consume events until every sender is gone.
    pub async fn run(mut self, inbox: flume::Receiver<MonitorEvent>) {
        while let Ok(event) = inbox.recv_async().await {
            self.handle(event);
        }
        tracing::debug!("activity monitor inbox closed");
    }

    /// Apply one event. Returns the heartbeat it produced, if any.
    pub fn handle(&mut self, event: MonitorEvent) -> Option<HeartbeatData> {
        match event {
            MonitorEvent::Page(PageMessage::EditorReady) => {
                tracing::info!(location = %self.location, "editor ready, tracking page");
                self.editor_ready = true;
                self.request_editor_data();
                None
            }
            MonitorEvent::Page(PageMessage::EditorChange)
            | MonitorEvent::Page(PageMessage::CursorActivity) => {
                if self.editor_ready && self.request_editor_data() {
                    self.pending_decisions += 1;
                }
                None
            }
            MonitorEvent::Page(PageMessage::EditorDataResponse { detail }) => {
                self.editor_data = detail;
                if self.pending_decisions > 0 {
                    self.pending_decisions -= 1;
                    self.maybe_send_heartbeat()
                } else {
                    None
                }
            }
            MonitorEvent::Page(PageMessage::RequestEditorData) => None,
            MonitorEvent::Input(_) => {
                self.tracker.record_input(self.clock.now());
                None
            }
            MonitorEvent::FocusGained => {
                if self.tracker.should_resume_on_focus(self.clock.now()) {
                    self.maybe_send_heartbeat()
                } else {
                    None
                }
            }
            MonitorEvent::LocationChanged { location } => {
                self.location = location;
                None
            }
            MonitorEvent::Navigated { location } => {
                tracing::debug!(%location, "navigation, resetting activity state");
                self.location = location;
                self.tracker.reset();
                // The old page's cursor says nothing about the new one.
                self.editor_data = None;
                self.pending_decisions = 0;
                None
            }
            MonitorEvent::Storage(StorageChange::Settings(settings)) => {
                tracing::debug!(status = %settings.status(), "settings changed");
                self.settings = Some(settings);
                None
            }
            MonitorEvent::Storage(StorageChange::Project(project)) => {
                self.project = project;
                None
            }
        }
    }

    fn request_editor_data(&self) -> bool {
        self.to_page.send(PageMessage::RequestEditorData).is_ok()
    }

    fn maybe_send_heartbeat(&mut self) -> Option<HeartbeatData> {
        let data = self.editor_data?;
        if !self.editor_ready {
            return None;
        }
        match &self.settings {
            Some(s) if s.is_active() => {}
            _ => return None,
        }

        let now = self.clock.now();
        let entity = Entity::from_location(&self.location);

        match self.tracker.evaluate(now, &entity.id) {
            Decision::Emit {
                entity_changed,
                since_heartbeat,
            } => {
                let heartbeat = HeartbeatData::new(
                    now,
                    &entity,
                    data.line.saturating_sub(1),
                    data.cursor_pos,
                    data.total_lines,
                    self.project.project(),
                );
                tracing::info!(
                    entity = %heartbeat.entity,
                    line = heartbeat.lineno,
                    cursor_pos = heartbeat.cursorpos,
                    total_lines = heartbeat.lines,
                    project = heartbeat.project.as_deref().unwrap_or("-"),
                    entity_changed,
                    since_heartbeat_secs = since_heartbeat.map(|d| d.as_secs()),
                    "sending heartbeat"
                );

                let envelope = Envelope::fire_and_forget(ExtensionMessage::SendHeartbeat {
                    data: heartbeat.clone(),
                });
                if self.to_dispatcher.send(envelope).is_err() {
                    tracing::warn!("dispatcher unavailable, heartbeat dropped");
                }
                self.tracker.record_heartbeat(now, &entity.id);
                Some(heartbeat)
            }
            Decision::Throttled { since_heartbeat } => {
                tracing::trace!(since_secs = since_heartbeat.as_secs(), "heartbeat throttled");
                None
            }
            Decision::ResumedAfterIdle { idle_for } => {
                tracing::debug!(idle_secs = idle_for.as_secs(), "resuming after inactivity");
                None
            }
        }
    }
}
