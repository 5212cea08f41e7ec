//! Heartbeat dispatcher: the only component that talks to the remote API.
//!
//! It receives [`st_protocol::Envelope`]s from the activity monitor, attaches
//! credentials from the settings store, posts heartbeats and turns failures
//! into user-visible notifications.

pub mod client;
pub mod dispatcher;
pub mod notifications;

pub use client::{ApiError, HeartbeatApi, TestHeartbeat, WakaTimeClient};
pub use dispatcher::{
    spawn_dispatcher, DispatchOutcome, DispatcherHandle, HeartbeatDispatcher, TestOutcome,
};
pub use notifications::{Notification, NotificationCenter, NotificationLevel};
