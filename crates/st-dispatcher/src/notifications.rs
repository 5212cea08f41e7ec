use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Transient trouble; the next heartbeat may well succeed.
    Warning,
    /// Needs the user to act, e.g. fix the API key.
    Error,
}

/// A user-visible message raised by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner {
    history: VecDeque<Notification>,
    max_history: usize,
    subscribers: Vec<flume::Sender<Notification>>,
}

/// Bounded notification history with live fan-out to subscribers.
///
/// Every notification is also echoed to the log at a matching level, so a
/// headless run still leaves a trace.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    inner: Arc<Mutex<Inner>>,
}

impl NotificationCenter {
    pub fn new(max_history: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                history: VecDeque::new(),
                max_history: max_history.max(1),
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn notify(
        &self,
        level: NotificationLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Notification {
        let n = Notification {
            id: Uuid::new_v4(),
            level,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
        };

        match level {
            NotificationLevel::Warning => tracing::warn!(title = %n.title, "{}", n.message),
            NotificationLevel::Error => tracing::error!(title = %n.title, "{}", n.message),
        }

        let mut inner = self.lock();
        inner.history.push_back(n.clone());
        while inner.history.len() > inner.max_history {
            inner.history.pop_front();
        }
        inner.subscribers.retain(|tx| tx.send(n.clone()).is_ok());
        n
    }

    /// Live feed of notifications raised from now on.
    pub fn subscribe(&self) -> flume::Receiver<Notification> {
        let (tx, rx) = flume::unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    pub fn list_all(&self) -> Vec<Notification> {
        self.lock().history.iter().cloned().collect()
    }
}
