//! Logging setup shared by every shadertime binary.
//!
//! Output goes to stderr so that command output on stdout stays clean.

pub mod logging;
