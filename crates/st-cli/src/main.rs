//! shadertime -- WakaTime heartbeats for a browser shader editor.

mod commands;
mod feed;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "shadertime", version, about)]
struct Cli {
    /// Config file (defaults to ~/.shadertime/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Settings store file, overriding `storage.path`.
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tracking status (default when no subcommand is given).
    Status,

    /// Track a page session fed as JSON lines on stdin.
    Run {
        /// Page URL at startup.
        #[arg(long, default_value = "https://www.shadertoy.com/new")]
        location: String,
    },

    /// Check the configured API key against the server.
    Test,

    /// Update API credentials.
    Config {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },

    /// Update the project name attached to heartbeats.
    Project {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
}

/// `--enable` / `--disable` pair to an optional switch.
fn toggle(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.config.as_deref(), cli.storage.as_deref())?;
    st_telemetry::logging::init_from_config("shadertime", &ctx.config.general, cli.verbose);

    match cli.command {
        None | Some(Commands::Status) => commands::status::run(&ctx)?,
        Some(Commands::Run { location }) => commands::run::run(&ctx, location).await?,
        Some(Commands::Test) => commands::test::run(&ctx).await?,
        Some(Commands::Config {
            api_key,
            api_url,
            enable,
            disable,
        }) => commands::settings::update_credentials(&ctx, api_key, api_url, toggle(enable, disable))?,
        Some(Commands::Project {
            name,
            enable,
            disable,
        }) => commands::settings::update_project(&ctx, name, toggle(enable, disable))?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn toggles() {
        assert_eq!(toggle(true, false), Some(true));
        assert_eq!(toggle(false, true), Some(false));
        assert_eq!(toggle(false, false), None);
    }

    #[test]
    fn parses_config_subcommand() {
        let cli = Cli::try_parse_from(["shadertime", "config", "--api-key", "waka_x", "--disable"])
            .unwrap();
        match cli.command {
            Some(Commands::Config {
                api_key, disable, ..
            }) => {
                assert_eq!(api_key.as_deref(), Some("waka_x"));
                assert!(disable);
            }
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn enable_and_disable_conflict() {
        assert!(Cli::try_parse_from(["shadertime", "project", "--enable", "--disable"]).is_err());
    }
}
