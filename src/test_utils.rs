use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::{manager::ServiceManager, state::ServiceState};

/// Global lock for environment variable modifications in tests.
pub static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Entry captured by [`RecordingManager`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Status(ServiceState),
    Log(String),
}

/// Manager that records every report so tests can assert on ordering.
#[derive(Debug, Default)]
pub struct RecordingManager {
    entries: Mutex<Vec<Recorded>>,
}

impl RecordingManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Recorded>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn entries(&self) -> Vec<Recorded> {
        self.lock().clone()
    }

    pub fn statuses(&self) -> Vec<ServiceState> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                Recorded::Status(state) => Some(*state),
                Recorded::Log(_) => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                Recorded::Log(fragment) => Some(fragment.clone()),
                Recorded::Status(_) => None,
            })
            .collect()
    }

    pub fn count_logs(&self, fragment: &str) -> usize {
        self.lock()
            .iter()
            .filter(|entry| matches!(entry, Recorded::Log(f) if f == fragment))
            .count()
    }
}

impl ServiceManager for RecordingManager {
    fn report_status(&self, state: ServiceState) {
        self.lock().push(Recorded::Status(state));
    }

    fn log_info(&self, fragment: &str) {
        self.lock().push(Recorded::Log(fragment.to_string()));
    }
}
