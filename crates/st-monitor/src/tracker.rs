use std::time::Duration;

use chrono::{DateTime, Utc};
use st_core::config::MonitorConfig;

/// Timing thresholds of the heartbeat decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Minimum spacing between heartbeats for the same entity.
    pub heartbeat_interval: Duration,
    /// Gap since the last activity after which an event starts a new session.
    pub max_inactivity: Duration,
    /// Focus regained within this window re-runs the decision.
    pub focus_resume: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for TrackerConfig {
    fn from(cfg: &MonitorConfig) -> Self {
        Self {
            heartbeat_interval: cfg.heartbeat_interval(),
            max_inactivity: cfg.max_inactivity(),
            focus_resume: cfg.focus_resume(),
        }
    }
}

/// Per-page-session timing state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityState {
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub last_entity: Option<String>,
}

/// Outcome of one editor-originated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A heartbeat should go out now.
    Emit {
        entity_changed: bool,
        /// `None` when no heartbeat was ever sent this session.
        since_heartbeat: Option<Duration>,
    },
    /// Same entity, inside the throttle interval.
    Throttled { since_heartbeat: Duration },
    /// The user was away longer than the inactivity ceiling; this event only
    /// marks the restart.
    ResumedAfterIdle { idle_for: Duration },
}

impl Decision {
    pub fn should_emit(&self) -> bool {
        matches!(self, Decision::Emit { .. })
    }
}

/// The throttling core: decides from timing state alone whether an editor
/// event turns into a heartbeat.
///
/// Callers are expected to have already checked that editor state is readable
/// and that tracking is configured; those checks must not touch this state.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    config: TrackerConfig,
    state: ActivityState,
}

impl ActivityTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: ActivityState::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> &ActivityState {
        &self.state
    }

    /// Forget everything; a navigation starts a new page session.
    pub fn reset(&mut self) {
        self.state = ActivityState::default();
    }

    /// Pointer, key and scroll input: activity without a heartbeat.
    pub fn record_input(&mut self, now: DateTime<Utc>) {
        self.state.last_activity_at = Some(now);
    }

    /// Run the decision for an editor event on `entity` at `now`.
    ///
    /// The activity timestamp is updated whatever the outcome.
    pub fn evaluate(&mut self, now: DateTime<Utc>, entity: &str) -> Decision {
        let since_heartbeat = self.state.last_heartbeat_at.map(|t| elapsed(t, now));
        let since_activity = self.state.last_activity_at.map(|t| elapsed(t, now));

        self.state.last_activity_at = Some(now);

        if let Some(idle_for) = since_activity {
            if idle_for > self.config.max_inactivity {
                return Decision::ResumedAfterIdle { idle_for };
            }
        }

        let entity_changed = self.state.last_entity.as_deref() != Some(entity);
        let interval_elapsed = since_heartbeat.map_or(true, |d| d >= self.config.heartbeat_interval);

        if interval_elapsed || entity_changed {
            Decision::Emit {
                entity_changed,
                since_heartbeat,
            }
        } else {
            // interval not elapsed implies a previous heartbeat exists
            Decision::Throttled {
                since_heartbeat: since_heartbeat.unwrap_or_default(),
            }
        }
    }

    /// Commit an emitted heartbeat.
    pub fn record_heartbeat(&mut self, now: DateTime<Utc>, entity: &str) {
        self.state.last_heartbeat_at = Some(now);
        self.state.last_entity = Some(entity.to_string());
    }

    /// Whether regaining window focus should re-run the decision.
    pub fn should_resume_on_focus(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_activity_at {
            None => true,
            Some(t) => elapsed(t, now) < self.config.focus_resume,
        }
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
