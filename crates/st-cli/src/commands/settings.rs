use anyhow::Context as _;

use super::Context;

pub fn update_credentials(
    ctx: &Context,
    api_key: Option<String>,
    api_url: Option<String>,
    enabled: Option<bool>,
) -> anyhow::Result<()> {
    let mut settings = ctx.store.settings_or_default();
    if let Some(key) = api_key {
        settings.api_key = key;
    }
    if let Some(url) = api_url {
        settings.api_url = url;
    }
    if let Some(on) = enabled {
        settings.enabled = on;
    }
    ctx.store
        .set_settings(settings)
        .context("failed to save settings")?;

    let saved = ctx.store.settings_or_default();
    println!("Settings saved: {}", saved.status());
    Ok(())
}

pub fn update_project(ctx: &Context, name: Option<String>, enabled: Option<bool>) -> anyhow::Result<()> {
    let mut project = ctx.store.project_settings();
    if let Some(name) = name {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("project name must not be empty");
        }
        project.name = name.to_string();
    }
    if let Some(on) = enabled {
        project.enabled = on;
    }
    ctx.store
        .set_project_settings(project.clone())
        .context("failed to save project settings")?;

    match project.project() {
        Some(name) => println!("Heartbeats will carry project {name:?}"),
        None => println!("Heartbeats will be sent without a project"),
    }
    Ok(())
}
