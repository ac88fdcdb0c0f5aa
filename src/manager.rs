//! Service manager collaborator: receives status reports and log messages.
use std::sync::Mutex;

use tracing::{debug, info};

use crate::{config::ServiceIdentity, state::ServiceState};

/// Callbacks the lifecycle core makes into whatever hosts the service.
pub trait ServiceManager: Send + Sync {
    /// Relays a lifecycle status to the host.
    fn report_status(&self, state: ServiceState);

    /// Records an informational lifecycle message. `fragment` completes the
    /// sentence "The <service> service ...".
    fn log_info(&self, fragment: &str);
}

/// Formats a lifecycle message the way every bundled manager presents it.
pub fn format_message(identity: &ServiceIdentity, fragment: &str) -> String {
    format!("The {} service {}.", identity.name, fragment)
}

/// Manager used when no platform service manager is present. Lifecycle
/// messages go to `tracing` and the last reported state is kept for queries.
#[derive(Debug)]
pub struct ConsoleManager {
    identity: ServiceIdentity,
    current: Mutex<ServiceState>,
}

impl ConsoleManager {
    pub fn new(identity: ServiceIdentity) -> Self {
        Self {
            identity,
            current: Mutex::new(ServiceState::Stopped),
        }
    }

    /// Last state reported by the service.
    pub fn current_state(&self) -> ServiceState {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ServiceManager for ConsoleManager {
    fn report_status(&self, state: ServiceState) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = *current;
        debug!(service = %self.identity.name, from = %previous, to = %state, "status report");
        *current = state;
    }

    fn log_info(&self, fragment: &str) {
        info!("{}", format_message(&self.identity, fragment));
    }
}
