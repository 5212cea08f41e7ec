//! Activity monitor: turns a noisy stream of editor, input and focus events
//! into throttled heartbeat requests.
//!
//! Key components:
//! - **tracker**: the timing decision (throttle interval, inactivity ceiling,
//!   entity switches), free of I/O
//! - **editor** / **page**: bounded discovery of the host editor and the
//!   page-context bridge that is the only code touching it
//! - **monitor**: the single-owner actor applying events in arrival order
//! - **runtime**: spawns and wires the above

pub mod clock;
pub mod editor;
pub mod monitor;
pub mod page;
pub mod runtime;
pub mod tracker;

pub use monitor::{ActivityMonitor, InputKind, MonitorEvent};
pub use runtime::{spawn_monitor, MonitorHandle};
pub use tracker::{ActivityTracker, Decision, TrackerConfig};
