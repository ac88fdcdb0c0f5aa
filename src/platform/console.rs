use std::sync::Arc;

use tracing::info;

use crate::{
    config::Config,
    error::ServiceError,
    manager::ConsoleManager,
    service::{LifecycleService, ServiceHandlers},
    state::ControlEvent,
};

/// Installs a Ctrl-C/SIGTERM handler that requests a stop, then runs the
/// service on the calling thread until it stops.
///
/// The handler can only be installed once per process.
pub fn run<S>(service: Arc<S>) -> Result<(), ServiceError>
where
    S: ServiceHandlers + 'static,
{
    let handler = Arc::clone(&service);
    ctrlc::set_handler(move || {
        info!("Termination signal received; requesting stop");
        handler.handle_control(ControlEvent::Stop);
    })?;

    service.run()
}

/// Builds the heartbeat service described by `config` and runs it in the foreground.
pub fn run_config(config: &Config) -> Result<(), ServiceError> {
    let manager = ConsoleManager::new(config.identity.clone());
    let service = Arc::new(LifecycleService::from_config(config, manager));
    run(service)
}
