use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use st_core::config::MonitorConfig;
use st_core::settings::{SettingsStore, StorageChange};
use st_core::types::{EntityType, ProjectSettings, Settings, TrackingStatus, UNTITLED_ENTITY};
use st_monitor::clock::ManualClock;
use st_monitor::{ActivityMonitor, InputKind, MonitorEvent};
use st_protocol::{EditorData, Envelope, ExtensionMessage, PageMessage};

const VIEW_A: &str = "https://www.shadertoy.com/view/AAAAAA";
const VIEW_B: &str = "https://www.shadertoy.com/view/BBBBBB";

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

struct Harness {
    monitor: ActivityMonitor,
    clock: Arc<ManualClock>,
    page_rx: flume::Receiver<PageMessage>,
    dispatch_rx: flume::Receiver<Envelope>,
}

impl Harness {
    fn new(settings: Option<Settings>) -> Self {
        let store = SettingsStore::in_memory();
        if let Some(s) = settings {
            store.set_settings(s).unwrap();
        }
        let clock = Arc::new(ManualClock::new(epoch()));
        let (page_tx, page_rx) = flume::unbounded();
        let (dispatch_tx, dispatch_rx) = flume::unbounded();
        let monitor = ActivityMonitor::new(
            &MonitorConfig::default(),
            VIEW_A,
            &store,
            page_tx,
            dispatch_tx,
            clock.clone(),
        );
        Self {
            monitor,
            clock,
            page_rx,
            dispatch_rx,
        }
    }

    fn configured() -> Self {
        Self::new(Some(active_settings()))
    }

    fn ready(mut self) -> Self {
        self.monitor.handle(PageMessage::EditorReady.into());
        self.monitor.handle(
            PageMessage::EditorDataResponse {
                detail: Some(data(1, 0, 10)),
            }
            .into(),
        );
        self.page_rx.drain().for_each(drop);
        self
    }

    fn at(&self, secs: u64) {
        self.clock.set(epoch() + chrono::Duration::seconds(secs as i64));
    }

    /// A change event followed by the page's answer to the data request.
    fn edit(&mut self, secs: u64) -> Option<st_core::types::HeartbeatData> {
        self.at(secs);
        self.monitor.handle(PageMessage::EditorChange.into());
        assert_eq!(
            self.page_rx.try_recv().ok(),
            Some(PageMessage::RequestEditorData),
            "each editor event asks the page for fresh data"
        );
        self.monitor.handle(
            PageMessage::EditorDataResponse {
                detail: Some(data(5, 3, 42)),
            }
            .into(),
        )
    }

    fn sent(&self) -> Vec<ExtensionMessage> {
        self.dispatch_rx.drain().map(|e| e.message).collect()
    }
}

fn active_settings() -> Settings {
    Settings {
        api_key: "waka_test".into(),
        ..Settings::default()
    }
}

fn data(line: u32, cursor_pos: u32, total_lines: u32) -> EditorData {
    EditorData {
        line,
        cursor_pos,
        total_lines,
    }
}

// ===========================================================================
// Throttling
// ===========================================================================

#[test]
fn reference_scenario_with_entity_switch() {
    let mut h = Harness::configured().ready();

    assert!(h.edit(0).is_some(), "first event emits");
    assert!(h.edit(60).is_none(), "inside throttle interval");
    assert!(h.edit(125).is_some(), "interval elapsed");

    h.monitor.handle(MonitorEvent::LocationChanged {
        location: VIEW_B.into(),
    });
    let hb = h.edit(126).expect("entity switch overrides throttle");
    assert_eq!(hb.entity, VIEW_B);

    assert_eq!(h.sent().len(), 3);
}

#[test]
fn heartbeat_payload_reflects_editor_and_location() {
    let mut h = Harness::configured().ready();
    let hb = h.edit(0).unwrap();

    assert_eq!(hb.entity, VIEW_A);
    assert_eq!(hb.entity_type, EntityType::Url);
    assert_eq!(hb.lineno, 5);
    assert_eq!(hb.cursorpos, 3);
    assert_eq!(hb.lines, 42);
    assert_eq!(hb.language, "glsl");
    assert!(!hb.is_write);
    assert_eq!(hb.time, epoch().timestamp());
    assert!(hb.project.is_none());

    match h.sent().as_slice() {
        [ExtensionMessage::SendHeartbeat { data }] => assert_eq!(data, &hb),
        other => panic!("expected one SEND_HEARTBEAT, got {other:?}"),
    }
}

#[test]
fn unsaved_shader_reports_untitled_file() {
    let mut h = Harness::configured().ready();
    h.monitor.handle(MonitorEvent::LocationChanged {
        location: "https://www.shadertoy.com/new".into(),
    });
    let hb = h.edit(0).unwrap();
    assert_eq!(hb.entity, UNTITLED_ENTITY);
    assert_eq!(hb.entity_type, EntityType::File);
}

#[test]
fn constant_entity_emits_at_most_once_per_window() {
    let mut h = Harness::configured().ready();
    let mut emitted = Vec::new();
    for secs in (0..1200).step_by(7) {
        if h.edit(secs).is_some() {
            emitted.push(secs);
        }
    }
    for pair in emitted.windows(2) {
        assert!(pair[1] - pair[0] >= 120, "heartbeats too close: {pair:?}");
    }
    assert!(emitted.len() >= 9);
}

// ===========================================================================
// Inactivity and input
// ===========================================================================

#[test]
fn long_inactivity_suppresses_next_event_but_records_it() {
    let mut h = Harness::configured().ready();
    h.edit(0).unwrap();

    assert!(h.edit(16 * 60).is_none());
    assert_eq!(
        h.monitor.tracker().state().last_activity_at,
        Some(epoch() + chrono::Duration::seconds(16 * 60))
    );
    assert!(h.edit(16 * 60 + 1).is_some(), "follow-up event is a fresh start");
}

#[test]
fn input_events_never_emit() {
    let mut h = Harness::configured().ready();
    for (secs, kind) in [
        (0, InputKind::PointerDown),
        (300, InputKind::KeyDown),
        (600, InputKind::Scroll),
    ] {
        h.at(secs);
        assert!(h.monitor.handle(MonitorEvent::Input(kind)).is_none());
    }
    assert!(h.sent().is_empty());
    assert_eq!(
        h.monitor.tracker().state().last_activity_at,
        Some(epoch() + chrono::Duration::seconds(600))
    );
}

// ===========================================================================
// Focus
// ===========================================================================

#[test]
fn quick_focus_return_keeps_session_going() {
    let mut h = Harness::configured().ready();
    h.edit(0).unwrap();

    h.at(200);
    assert!(
        h.monitor.handle(MonitorEvent::FocusGained).is_some(),
        "under 5 minutes since activity and throttle elapsed"
    );
}

#[test]
fn late_focus_return_does_not_emit() {
    let mut h = Harness::configured().ready();
    h.edit(0).unwrap();

    h.at(6 * 60);
    assert!(h.monitor.handle(MonitorEvent::FocusGained).is_none());
    assert_eq!(
        h.monitor.tracker().state().last_activity_at,
        Some(epoch()),
        "a skipped focus check leaves state untouched"
    );
}

#[test]
fn focus_before_any_activity_runs_the_check() {
    let mut h = Harness::configured().ready();
    h.at(0);
    assert!(h.monitor.handle(MonitorEvent::FocusGained).is_some());
}

// ===========================================================================
// Configuration gating
// ===========================================================================

#[test]
fn disabled_tracking_never_dispatches() {
    let mut h = Harness::new(Some(Settings {
        enabled: false,
        ..active_settings()
    }))
    .ready();

    for secs in (0..3600).step_by(30) {
        assert!(h.edit(secs).is_none());
    }
    assert!(h.sent().is_empty());
    assert_eq!(h.monitor.tracker().state().last_activity_at, None);
    assert_eq!(h.monitor.status(), TrackingStatus::Disabled);
}

#[test]
fn missing_key_never_dispatches() {
    let mut h = Harness::new(Some(Settings::default())).ready();
    assert!(h.edit(0).is_none());
    assert!(h.sent().is_empty());
    assert_eq!(h.monitor.status(), TrackingStatus::NotConfigured);
}

#[test]
fn settings_change_enables_tracking() {
    let mut h = Harness::new(None).ready();
    assert!(h.edit(0).is_none());

    h.monitor
        .handle(MonitorEvent::Storage(StorageChange::Settings(active_settings())));
    assert!(h.edit(1).is_some());
}

#[test]
fn project_name_attached_only_when_enabled() {
    let mut h = Harness::configured().ready();
    h.monitor.handle(MonitorEvent::Storage(StorageChange::Project(ProjectSettings {
        enabled: true,
        name: "fractals".into(),
    })));
    assert_eq!(h.edit(0).unwrap().project.as_deref(), Some("fractals"));

    h.monitor.handle(MonitorEvent::Storage(StorageChange::Project(ProjectSettings {
        enabled: false,
        name: "fractals".into(),
    })));
    assert!(h.edit(500).unwrap().project.is_none());
}

// ===========================================================================
// Editor availability
// ===========================================================================

#[test]
fn editor_events_before_ready_are_ignored() {
    let mut h = Harness::configured();
    h.at(0);
    assert!(h.monitor.handle(PageMessage::EditorChange.into()).is_none());
    assert!(h.page_rx.try_recv().is_err(), "no editor, no data request");
    assert_eq!(h.monitor.tracker().state().last_activity_at, None);
}

#[test]
fn vanished_editor_makes_decisions_no_ops() {
    let mut h = Harness::configured().ready();
    h.monitor.handle(PageMessage::CursorActivity.into());
    let hb = h
        .monitor
        .handle(PageMessage::EditorDataResponse { detail: None }.into());
    assert!(hb.is_none());
    assert!(h.sent().is_empty());
    assert_eq!(h.monitor.tracker().state().last_activity_at, None);
}

#[test]
fn navigation_resets_the_session() {
    let mut h = Harness::configured().ready();
    h.edit(0).unwrap();
    h.monitor.handle(MonitorEvent::Navigated {
        location: VIEW_A.into(),
    });
    assert_eq!(h.monitor.tracker().state().last_heartbeat_at, None);
    assert!(h.edit(10).is_some(), "same entity, but a new session");
}

#[test]
fn focus_right_after_navigation_waits_for_fresh_editor_data() {
    let mut h = Harness::configured().ready();
    h.edit(0).unwrap();
    h.sent();

    h.monitor.handle(MonitorEvent::Navigated {
        location: VIEW_B.into(),
    });
    h.at(5);
    assert!(h.monitor.handle(MonitorEvent::FocusGained).is_none());
    assert!(h.sent().is_empty());
    assert_eq!(h.monitor.tracker().state().last_activity_at, None);

    let hb = h.edit(6).expect("fresh data from the new page");
    assert_eq!(hb.entity, VIEW_B);
}

#[test]
fn stale_response_after_navigation_is_not_a_decision() {
    let mut h = Harness::configured().ready();
    h.at(0);
    h.monitor.handle(PageMessage::EditorChange.into());
    h.monitor.handle(MonitorEvent::Navigated {
        location: VIEW_B.into(),
    });

    // Answer to the request made on the old page.
    let hb = h.monitor.handle(
        PageMessage::EditorDataResponse {
            detail: Some(data(9, 9, 9)),
        }
        .into(),
    );
    assert!(hb.is_none());
    assert!(h.sent().is_empty());
}

#[test]
fn closed_dispatcher_still_advances_state() {
    let mut h = Harness::configured().ready();
    drop(std::mem::replace(&mut h.dispatch_rx, flume::unbounded().1));
    assert!(h.edit(0).is_some());
    assert!(h.edit(30).is_none());
}
