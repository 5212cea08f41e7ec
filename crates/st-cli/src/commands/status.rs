use super::Context;

pub fn render(ctx: &Context) -> String {
    let settings = ctx.store.settings_or_default();
    let project = ctx.store.project_settings();
    let storage = ctx
        .store
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(in memory)".to_string());

    let mut out = String::new();
    out.push_str(&format!("shadertime  (v{})\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!("{}\n", "-".repeat(40)));
    out.push_str(&format!("Status:    {}\n", settings.status()));
    out.push_str(&format!("API URL:   {}\n", settings.api_url));
    out.push_str(&format!(
        "Project:   {}\n",
        project.project().unwrap_or("(not sent)")
    ));
    out.push_str(&format!("Storage:   {storage}\n"));
    out
}

/// Run the `status` subcommand.
pub fn run(ctx: &Context) -> anyhow::Result<()> {
    print!("{}", render(ctx));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use st_core::types::{ProjectSettings, Settings};

    #[test]
    fn fresh_store_is_not_configured() {
        let out = render(&Context::in_memory());
        assert!(out.contains("Status:    Not configured"));
        assert!(out.contains("API URL:   https://api.wakatime.com/api/v1"));
        assert!(out.contains("Project:   (not sent)"));
        assert!(out.contains("(in memory)"));
    }

    #[test]
    fn shows_enabled_project() {
        let ctx = Context::in_memory();
        ctx.store
            .set_settings(Settings {
                api_key: "k".into(),
                ..Settings::default()
            })
            .unwrap();
        ctx.store
            .set_project_settings(ProjectSettings {
                enabled: true,
                name: "raymarching".into(),
            })
            .unwrap();
        let out = render(&ctx);
        assert!(out.contains("Status:    Configured and enabled"));
        assert!(out.contains("Project:   raymarching"));
    }
}
