use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::types::{ProjectSettings, Settings};

/// Storage key of the credential settings.
pub const SETTINGS_KEY: &str = "wakatimeSettings";
/// Storage key of the per-project settings.
pub const PROJECT_SETTINGS_KEY: &str = "projectSettings";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage parse: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A change broadcast to every subscriber after a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageChange {
    Settings(Settings),
    Project(ProjectSettings),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Entries {
    #[serde(rename = "wakatimeSettings", default, skip_serializing_if = "Option::is_none")]
    settings: Option<Settings>,
    #[serde(rename = "projectSettings", default, skip_serializing_if = "Option::is_none")]
    project: Option<ProjectSettings>,
}

struct Inner {
    path: Option<PathBuf>,
    entries: Entries,
    subscribers: Vec<flume::Sender<StorageChange>>,
}

impl Inner {
    /// Write `entries` to disk, then make them current. On failure the
    /// in-memory state is left as it was.
    fn commit(&mut self, entries: Entries) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let text = serde_json::to_string_pretty(&entries)?;
            std::fs::write(path, text)?;
        }
        self.entries = entries;
        Ok(())
    }

    fn broadcast(&mut self, change: StorageChange) {
        self.subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }
}

/// Synchronized key-value storage shared by the monitor and the dispatcher.
///
/// The handle is cheap to clone. Reads are snapshots; every write is persisted
/// (when file-backed) and then broadcast to all subscribers.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<Mutex<Inner>>,
}

impl SettingsStore {
    /// Open a file-backed store. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;
        tracing::debug!(path = %path.display(), "settings store opened");
        Ok(Self::with_inner(Some(path), entries))
    }

    /// A store that lives only as long as its handles.
    pub fn in_memory() -> Self {
        Self::with_inner(None, Entries::default())
    }

    fn with_inner(path: Option<PathBuf>, entries: Entries) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                path,
                entries,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    /// The stored credential settings, if any were ever written.
    pub fn settings(&self) -> Option<Settings> {
        self.lock().entries.settings.clone()
    }

    pub fn settings_or_default(&self) -> Settings {
        self.settings().unwrap_or_default()
    }

    pub fn project_settings(&self) -> ProjectSettings {
        self.lock().entries.project.clone().unwrap_or_default()
    }

    /// Normalise and store `settings`, then notify subscribers.
    pub fn set_settings(&self, settings: Settings) -> Result<()> {
        let settings = settings.normalized();
        let mut inner = self.lock();
        let mut entries = inner.entries.clone();
        entries.settings = Some(settings.clone());
        inner.commit(entries)?;
        inner.broadcast(StorageChange::Settings(settings));
        Ok(())
    }

    pub fn set_project_settings(&self, project: ProjectSettings) -> Result<()> {
        let mut inner = self.lock();
        let mut entries = inner.entries.clone();
        entries.project = Some(project.clone());
        inner.commit(entries)?;
        inner.broadcast(StorageChange::Project(project));
        Ok(())
    }

    /// Write default [`Settings`] when none exist yet. Returns `true` when the
    /// defaults were written.
    pub fn initialize_defaults(&self) -> Result<bool> {
        if self.settings().is_some() {
            return Ok(false);
        }
        self.set_settings(Settings::default())?;
        tracing::info!(key = SETTINGS_KEY, "initialised default settings");
        Ok(true)
    }

    /// Register for change notifications from this point forward.
    pub fn subscribe(&self) -> flume::Receiver<StorageChange> {
        let (tx, rx) = flume::unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Re-read the backing file and broadcast whatever another process changed.
    pub fn reload(&self) -> Result<Vec<StorageChange>> {
        let mut inner = self.lock();
        let Some(path) = inner.path.clone() else {
            return Ok(Vec::new());
        };
        let fresh = read_entries(&path)?;

        let mut changes = Vec::new();
        if fresh.settings != inner.entries.settings {
            if let Some(s) = &fresh.settings {
                changes.push(StorageChange::Settings(s.clone()));
            }
        }
        if fresh.project != inner.entries.project {
            if let Some(p) = &fresh.project {
                changes.push(StorageChange::Project(p.clone()));
            }
        }
        inner.entries = fresh;
        for change in &changes {
            inner.broadcast(change.clone());
        }
        if !changes.is_empty() {
            tracing::debug!(count = changes.len(), "settings store reloaded with changes");
        }
        Ok(changes)
    }
}

fn read_entries(path: &Path) -> Result<Entries> {
    match std::fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(Entries::default()),
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::default()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_API_URL;

    #[test]
    fn empty_store_has_no_settings() {
        let store = SettingsStore::in_memory();
        assert!(store.settings().is_none());
        assert_eq!(store.settings_or_default(), Settings::default());
        assert_eq!(store.project_settings(), ProjectSettings::default());
    }

    #[test]
    fn initialize_defaults_only_once() {
        let store = SettingsStore::in_memory();
        assert!(store.initialize_defaults().unwrap());
        store
            .set_settings(Settings {
                api_key: "k".into(),
                ..Settings::default()
            })
            .unwrap();
        assert!(!store.initialize_defaults().unwrap());
        assert_eq!(store.settings().unwrap().api_key, "k");
    }

    #[test]
    fn writes_are_broadcast_to_subscribers() {
        let store = SettingsStore::in_memory();
        let rx1 = store.subscribe();
        let rx2 = store.subscribe();

        let project = ProjectSettings {
            enabled: true,
            name: "clouds".into(),
        };
        store.set_project_settings(project.clone()).unwrap();

        assert_eq!(rx1.try_recv().unwrap(), StorageChange::Project(project.clone()));
        assert_eq!(rx2.try_recv().unwrap(), StorageChange::Project(project));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let store = SettingsStore::in_memory();
        let rx = store.subscribe();
        drop(rx);
        store.set_settings(Settings::default()).unwrap();
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn set_settings_normalises_input() {
        let store = SettingsStore::in_memory();
        store
            .set_settings(Settings {
                api_key: " key ".into(),
                api_url: "".into(),
                enabled: true,
            })
            .unwrap();
        let s = store.settings().unwrap();
        assert_eq!(s.api_key, "key");
        assert_eq!(s.api_url, DEFAULT_API_URL);
    }
}
