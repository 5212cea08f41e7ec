//! A page session driven from stdin.
//!
//! Each line is one JSON object describing something the page did, e.g.
//!
//! ```text
//! {"kind":"ready","line":0,"ch":0,"last_line":41}
//! {"kind":"change","line":3,"ch":12,"last_line":42}
//! {"kind":"input","input":"key"}
//! {"kind":"location","url":"https://www.shadertoy.com/view/XsXXDn"}
//! ```
//!
//! Cursor lines are zero-based, the way the host editor reports them.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use st_monitor::editor::{Cursor, EditorHost, EditorSignal, HostEditor};
use st_monitor::{InputKind, MonitorEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedInput {
    Pointer,
    Key,
    Scroll,
}

impl From<FeedInput> for InputKind {
    fn from(input: FeedInput) -> Self {
        match input {
            FeedInput::Pointer => InputKind::PointerDown,
            FeedInput::Key => InputKind::KeyDown,
            FeedInput::Scroll => InputKind::Scroll,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedLine {
    /// The editor object appeared on the page.
    Ready { line: u32, ch: u32, last_line: u32 },
    Change { line: u32, ch: u32, last_line: u32 },
    Cursor { line: u32, ch: u32, last_line: u32 },
    /// The editor was torn down.
    Detach,
    Input { input: FeedInput },
    Focus,
    Location { url: String },
    Navigate { url: String },
}

#[derive(Debug, Default)]
struct PageState {
    present: bool,
    attached: bool,
    cursor: Cursor,
    last_line: u32,
    sink: Option<flume::Sender<EditorSignal>>,
}

/// Shared view of the fed page; the editor side is handed to the monitor's
/// page bridge, the feeding side stays with the stdin loop.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    state: Arc<Mutex<PageState>>,
}

impl FeedPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_cursor(&self, line: u32, ch: u32, last_line: u32) {
        let mut s = self.lock();
        s.cursor = Cursor { line, ch };
        s.last_line = last_line;
    }

    fn signal(&self, signal: EditorSignal) {
        let sink = self.lock().sink.clone();
        match sink {
            Some(tx) => {
                if tx.send(signal).is_err() {
                    tracing::debug!("page bridge gone, editor signal dropped");
                }
            }
            None => tracing::debug!(?signal, "editor not hooked yet, signal dropped"),
        }
    }

    /// Apply one line. Returns `false` once the monitor stopped listening.
    pub fn apply(&self, line: FeedLine, events: &flume::Sender<MonitorEvent>) -> bool {
        let event = match line {
            FeedLine::Ready { line, ch, last_line } => {
                self.set_cursor(line, ch, last_line);
                let mut s = self.lock();
                s.present = true;
                s.attached = true;
                return true;
            }
            FeedLine::Change { line, ch, last_line } => {
                self.set_cursor(line, ch, last_line);
                self.signal(EditorSignal::Change);
                return true;
            }
            FeedLine::Cursor { line, ch, last_line } => {
                self.set_cursor(line, ch, last_line);
                self.signal(EditorSignal::CursorActivity);
                return true;
            }
            FeedLine::Detach => {
                self.lock().attached = false;
                return true;
            }
            FeedLine::Input { input } => MonitorEvent::Input(input.into()),
            FeedLine::Focus => MonitorEvent::FocusGained,
            FeedLine::Location { url } => MonitorEvent::LocationChanged { location: url },
            FeedLine::Navigate { url } => MonitorEvent::Navigated { location: url },
        };
        events.send(event).is_ok()
    }

    /// Parse and apply a raw stdin line. Blank lines are ignored.
    pub fn apply_str(&self, raw: &str, events: &flume::Sender<MonitorEvent>) -> bool {
        let raw = raw.trim();
        if raw.is_empty() {
            return true;
        }
        match serde_json::from_str::<FeedLine>(raw) {
            Ok(line) => self.apply(line, events),
            Err(e) => {
                tracing::warn!(error = %e, line = raw, "ignoring malformed feed line");
                true
            }
        }
    }
}

struct FeedEditor {
    page: FeedPage,
}

impl HostEditor for FeedEditor {
    fn cursor(&self) -> Cursor {
        self.page.lock().cursor
    }

    fn last_line(&self) -> u32 {
        self.page.lock().last_line
    }

    fn subscribe(&mut self, sink: flume::Sender<EditorSignal>) {
        self.page.lock().sink = Some(sink);
    }

    fn is_attached(&self) -> bool {
        self.page.lock().attached
    }
}

impl EditorHost for FeedPage {
    fn find_editor(&mut self) -> Option<Box<dyn HostEditor>> {
        if self.lock().present {
            Some(Box::new(FeedEditor { page: self.clone() }))
        } else {
            None
        }
    }
}
