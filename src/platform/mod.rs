//! Bindings that host a [`ServiceHandlers`](crate::service::ServiceHandlers) implementation.
use crate::{config::Config, error::ServiceError};

/// Foreground hosting driven by process signals.
pub mod console;

/// Windows Service Control Manager hosting.
#[cfg(windows)]
pub mod windows;

/// Runs the configured service under the platform's service manager.
///
/// Windows registers with the SCM dispatcher. Other platforms have no
/// callback-based manager, so the service runs in the foreground and
/// treats SIGINT/SIGTERM as a stop request.
pub fn run_under_manager(config: Config) -> Result<(), ServiceError> {
    #[cfg(windows)]
    {
        windows::run(config)
    }

    #[cfg(not(windows))]
    {
        console::run_config(&config)
    }
}
