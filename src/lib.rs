//! Lifeline runs a periodic workload as a long-lived background service. It
//! registers with the operating system's service manager, moves through the
//! start/run/stop lifecycle in response to manager controls, and shuts down
//! cleanly on a stop or pre-shutdown notification.

/// CLI interface.
pub mod cli;

/// Configuration management.
pub mod config;

/// Error handling.
pub mod error;

/// Service manager collaborator.
pub mod manager;

/// Platform bindings.
pub mod platform;

/// Service lifecycle state machine.
pub mod service;

/// Stop signal primitive.
pub mod signal;

/// Lifecycle states and control events.
pub mod state;

#[doc(hidden)]
pub mod test_utils;
