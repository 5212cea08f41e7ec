//! The page-context half of the monitor.
//!
//! Only this side can reach the host editor. It hooks the editor once it
//! shows up, relays change/cursor notifications as [`PageMessage`]s and answers
//! `RequestEditorData` with a fresh [`EditorData`]. Nothing else crosses over.

use st_protocol::{EditorData, PageMessage};

use crate::editor::{discover, DiscoveryConfig, EditorHost, EditorSignal, HostEditor};

/// How a page bridge run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// Discovery exhausted its attempts; the page stays untracked.
    EditorNotFound,
    /// The monitor side hung up.
    Closed,
}

pub struct PageBridge<H> {
    host: H,
    discovery: DiscoveryConfig,
}

impl<H: EditorHost> PageBridge<H> {
    pub fn new(host: H, discovery: DiscoveryConfig) -> Self {
        Self { host, discovery }
    }

    /// Discover the editor, then serve until the monitor goes away.
    pub async fn run<E>(
        mut self,
        outbox: flume::Sender<E>,
        inbox: flume::Receiver<PageMessage>,
    ) -> BridgeOutcome
    where
        E: From<PageMessage> + Send + 'static,
    {
        let Some(mut editor) = discover(&mut self.host, self.discovery).await else {
            return BridgeOutcome::EditorNotFound;
        };

        let (signal_tx, signal_rx) = flume::unbounded();
        editor.subscribe(signal_tx);

        let emit = |msg: PageMessage| outbox.send(E::from(msg)).is_ok();

        // Readiness is followed by one cursor event so the monitor gets a
        // chance to report right away.
        if !emit(PageMessage::EditorReady) || !emit(PageMessage::CursorActivity) {
            return BridgeOutcome::Closed;
        }

        let mut signals = Some(signal_rx);
        loop {
            let next_signal = async {
                match &signals {
                    Some(rx) => rx.recv_async().await.ok(),
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                signal = next_signal => {
                    let forwarded = match signal {
                        Some(EditorSignal::Change) => emit(PageMessage::EditorChange),
                        Some(EditorSignal::CursorActivity) => emit(PageMessage::CursorActivity),
                        None => {
                            tracing::debug!("host editor dropped its subscription");
                            signals = None;
                            true
                        }
                    };
                    if !forwarded {
                        return BridgeOutcome::Closed;
                    }
                }
                request = inbox.recv_async() => match request {
                    Ok(PageMessage::RequestEditorData) => {
                        let detail = editor_data(editor.as_ref());
                        if !emit(PageMessage::EditorDataResponse { detail }) {
                            return BridgeOutcome::Closed;
                        }
                    }
                    Ok(other) => {
                        tracing::debug!(event = other.event_name(), "page bridge ignoring message");
                    }
                    Err(_) => return BridgeOutcome::Closed,
                },
            }
        }
    }
}

fn editor_data(editor: &dyn HostEditor) -> Option<EditorData> {
    if !editor.is_attached() {
        return None;
    }
    let cursor = editor.cursor();
    Some(EditorData {
        line: cursor.line.saturating_add(1),
        cursor_pos: cursor.ch,
        total_lines: editor.last_line().saturating_add(1),
    })
}
