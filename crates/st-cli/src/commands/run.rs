use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use st_dispatcher::{
    spawn_dispatcher, HeartbeatDispatcher, Notification, NotificationCenter, NotificationLevel,
    WakaTimeClient,
};
use st_monitor::clock::SystemClock;
use st_monitor::spawn_monitor;
use tokio::io::AsyncBufReadExt;

use super::Context;
use crate::feed::FeedPage;

/// How often the settings file is re-read for edits made by other processes.
const RELOAD_INTERVAL: Duration = Duration::from_secs(2);

fn format_notification(n: &Notification) -> String {
    format!("[{:?}] {}: {}", n.level, n.title, n.message)
}

/// Run the `run` subcommand: page bridge, monitor and dispatcher wired
/// together, fed from stdin until EOF or Ctrl-C.
pub async fn run(ctx: &Context, location: String) -> anyhow::Result<()> {
    let client = WakaTimeClient::new(&ctx.config.api).context("failed to build HTTP client")?;
    let notifications = NotificationCenter::new(ctx.config.notifications.max_history);
    let notes = notifications.subscribe();
    let history = notifications.clone();

    let dispatcher = spawn_dispatcher(HeartbeatDispatcher::new(
        client,
        ctx.store.clone(),
        notifications,
    ));

    let page = FeedPage::new();
    let monitor = spawn_monitor(
        &ctx.config.monitor,
        location.as_str(),
        &ctx.store,
        page.clone(),
        dispatcher.sender(),
        Arc::new(SystemClock),
    );
    let events = monitor.sender();

    tracing::info!(%location, status = %ctx.store.settings_or_default().status(), "tracking started");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut reload = tokio::time::interval(RELOAD_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(raw) => {
                    if !page.apply_str(&raw, &events) {
                        tracing::warn!("activity monitor stopped");
                        break;
                    }
                }
                None => {
                    tracing::debug!("stdin closed");
                    break;
                }
            },
            _ = reload.tick() => {
                if let Err(e) = ctx.store.reload() {
                    tracing::warn!(error = %e, "failed to reload settings");
                }
            }
            Ok(n) = notes.recv_async() => eprintln!("{}", format_notification(&n)),
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    drop(events);
    monitor.shutdown().await;
    dispatcher.shutdown().await;

    for n in notes.drain() {
        eprintln!("{}", format_notification(&n));
    }
    let raised = history.list_all();
    let errors = raised
        .iter()
        .filter(|n| n.level == NotificationLevel::Error)
        .count();
    tracing::info!(notifications = raised.len(), errors, "tracking stopped");
    Ok(())
}
