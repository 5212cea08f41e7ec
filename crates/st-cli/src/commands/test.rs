use anyhow::Context as _;
use st_dispatcher::{spawn_dispatcher, HeartbeatDispatcher, NotificationCenter, WakaTimeClient};

use super::Context;

/// Run the `test` subcommand: a TEST_API round trip through the dispatcher.
pub async fn run(ctx: &Context) -> anyhow::Result<()> {
    let client = WakaTimeClient::new(&ctx.config.api).context("failed to build HTTP client")?;
    let notifications = NotificationCenter::new(ctx.config.notifications.max_history);
    let handle = spawn_dispatcher(HeartbeatDispatcher::new(
        client,
        ctx.store.clone(),
        notifications,
    ));

    let response = handle.test_connection().await;
    handle.shutdown().await;

    if response.success {
        println!("{}", response.message);
        Ok(())
    } else {
        anyhow::bail!(response.message)
    }
}
