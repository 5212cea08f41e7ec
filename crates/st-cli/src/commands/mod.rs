pub mod run;
pub mod settings;
pub mod status;
pub mod test;

use std::path::Path;

use anyhow::Context as _;
use st_core::config::Config;
use st_core::settings::SettingsStore;

/// Loaded config plus the settings store it points at.
pub struct Context {
    pub config: Config,
    pub store: SettingsStore,
}

impl Context {
    pub fn load(config_path: Option<&Path>, storage_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(p) => Config::load_from(p)
                .with_context(|| format!("failed to load config from {}", p.display()))?,
            None => Config::load().context("failed to load config")?,
        };
        let storage = storage_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.storage_path());
        let store = SettingsStore::open(storage.clone())
            .with_context(|| format!("failed to open settings store {}", storage.display()))?;
        Ok(Self { config, store })
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            config: Config::default(),
            store: SettingsStore::in_memory(),
        }
    }
}
