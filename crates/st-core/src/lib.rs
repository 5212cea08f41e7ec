//! Core types for shadertime: the heartbeat data model, the synchronized
//! settings store shared by the monitor and the dispatcher, and the daemon
//! configuration file.

pub mod config;
pub mod settings;
pub mod types;
