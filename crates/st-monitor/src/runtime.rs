use std::sync::Arc;

use st_core::config::MonitorConfig;
use st_core::settings::SettingsStore;
use st_protocol::Envelope;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::editor::{DiscoveryConfig, EditorHost};
use crate::monitor::{ActivityMonitor, MonitorEvent};
use crate::page::{BridgeOutcome, PageBridge};

/// Handle to a running page bridge + activity monitor pair.
pub struct MonitorHandle {
    events: flume::Sender<MonitorEvent>,
    monitor_task: JoinHandle<()>,
    bridge_task: JoinHandle<BridgeOutcome>,
    storage_task: JoinHandle<()>,
}

/// Spawn the page bridge, the monitor and a forwarder that feeds settings
/// changes from `store` into the monitor's queue.
pub fn spawn_monitor<H>(
    config: &MonitorConfig,
    location: impl Into<String>,
    store: &SettingsStore,
    host: H,
    to_dispatcher: flume::Sender<Envelope>,
    clock: Arc<dyn Clock>,
) -> MonitorHandle
where
    H: EditorHost + 'static,
{
    let (events_tx, events_rx) = flume::unbounded::<MonitorEvent>();
    let (page_tx, page_rx) = flume::unbounded();

    let monitor = ActivityMonitor::new(config, location, store, page_tx, to_dispatcher, clock);
    let monitor_task = tokio::spawn(monitor.run(events_rx));

    let bridge = PageBridge::new(host, DiscoveryConfig::from(config));
    let bridge_task = tokio::spawn(bridge.run(events_tx.clone(), page_rx));

    let changes = store.subscribe();
    let storage_events = events_tx.clone();
    let storage_task = tokio::spawn(async move {
        while let Ok(change) = changes.recv_async().await {
            if storage_events.send(MonitorEvent::from(change)).is_err() {
                break;
            }
        }
    });

    MonitorHandle {
        events: events_tx,
        monitor_task,
        bridge_task,
        storage_task,
    }
}

impl MonitorHandle {
    /// A sender for feeding events from elsewhere (e.g. an input source).
    pub fn sender(&self) -> flume::Sender<MonitorEvent> {
        self.events.clone()
    }

    /// Stop the bridge and the forwarder, then let the monitor drain what is
    /// already queued.
    pub async fn shutdown(self) {
        self.bridge_task.abort();
        self.storage_task.abort();
        let _ = self.bridge_task.await;
        let _ = self.storage_task.await;
        drop(self.events);
        if let Err(e) = self.monitor_task.await {
            tracing::warn!(error = %e, "activity monitor task failed");
        }
    }
}
