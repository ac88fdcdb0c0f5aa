//! Service lifecycle state machine.
//!
//! [`LifecycleService`] implements the callback set a service manager drives:
//! `run` owns the work loop on one thread while the stop, pre-shutdown and
//! generic control callbacks arrive on others. The only shared state between
//! them is the [`StopSignal`]; every transition reports its status to the
//! [`ServiceManager`] before touching the signal.
use std::{
    error::Error,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use tracing::{debug, warn};

use crate::{
    config::{Config, FailurePolicy, ServiceIdentity},
    error::ServiceError,
    manager::ServiceManager,
    signal::{StopSignal, WaitOutcome},
    state::{AcceptedControls, ControlEvent, ServiceState},
};

/// Error returned by a failed work unit.
pub type WorkError = Box<dyn Error + Send + Sync>;

/// One unit of periodic work, performed each time the stop wait times out.
pub trait Workload: Send {
    fn perform(&mut self) -> Result<(), WorkError>;
}

impl<F> Workload for F
where
    F: FnMut() -> Result<(), WorkError> + Send,
{
    fn perform(&mut self) -> Result<(), WorkError> {
        (self)()
    }
}

/// Placeholder workload: optionally pauses after each tick and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heartbeat {
    pause: Duration,
}

impl Heartbeat {
    pub fn new(pause: Duration) -> Self {
        Self { pause }
    }
}

impl Workload for Heartbeat {
    fn perform(&mut self) -> Result<(), WorkError> {
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
        }
        Ok(())
    }
}

/// Entry points a platform binding calls into.
pub trait ServiceHandlers: Send + Sync {
    /// Runs the work loop until a stop is requested.
    fn run(&self) -> Result<(), ServiceError>;

    /// Reports `StopPending` and sets the stop signal.
    fn request_stop(&self);

    /// Same as [`request_stop`](Self::request_stop), logged as a pre-shutdown notification.
    fn handle_pre_shutdown(&self);

    /// Logs a control event that has no lifecycle meaning.
    fn handle_other_control(&self, code: u32, event_type: u32, data: Option<&str>);

    /// Control codes this service wants to receive.
    fn accepted_controls(&self) -> AcceptedControls;

    /// Dispatches a classified control event to the matching callback.
    fn handle_control(&self, event: ControlEvent) {
        match event {
            ControlEvent::Stop => self.request_stop(),
            ControlEvent::PreShutdown => self.handle_pre_shutdown(),
            ControlEvent::Other {
                code,
                event_type,
                data,
            } => self.handle_other_control(code, event_type, data.as_deref()),
        }
    }
}

/// The concrete lifecycle: a stop signal, a tick interval and a workload.
pub struct LifecycleService<M, W = Heartbeat> {
    identity: ServiceIdentity,
    tick_interval: Duration,
    on_work_failure: FailurePolicy,
    manager: M,
    stop: StopSignal,
    started: AtomicBool,
    /// Set under its lock right before `Stopped` is reported; stop
    /// requests holding the lock never report after it.
    stopped: Mutex<bool>,
    workload: Mutex<W>,
}

impl<M: ServiceManager> LifecycleService<M, Heartbeat> {
    /// Builds a heartbeat service from loaded configuration.
    pub fn from_config(config: &Config, manager: M) -> Self {
        Self::new(
            config.identity.clone(),
            config.tick_interval,
            manager,
            Heartbeat::new(config.work_pause),
        )
        .with_failure_policy(config.on_work_failure)
    }
}

impl<M: ServiceManager, W: Workload> LifecycleService<M, W> {
    pub fn new(
        identity: ServiceIdentity,
        tick_interval: Duration,
        manager: M,
        workload: W,
    ) -> Self {
        debug!(service = %identity.name, ?tick_interval, "initializing service");
        Self {
            identity,
            tick_interval,
            on_work_failure: FailurePolicy::default(),
            manager,
            stop: StopSignal::new(),
            started: AtomicBool::new(false),
            stopped: Mutex::new(false),
            workload: Mutex::new(workload),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_work_failure = policy;
        self
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Whether a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        self.stop.is_set()
    }

    fn lock_stopped(&self) -> MutexGuard<'_, bool> {
        self.stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Logs `notice`, reports `StopPending`, then sets the signal. Returns whether
    /// this call set it. Once the loop has reported `Stopped` this is a no-op.
    fn begin_stop(&self, notice: Option<&str>) -> bool {
        let stopped = self.lock_stopped();
        if *stopped {
            debug!(service = %self.identity.name, "stop request after stop ignored");
            return false;
        }

        if let Some(notice) = notice {
            self.manager.log_info(notice);
        }

        self.manager.report_status(ServiceState::StopPending);
        let first = self.stop.set();
        if !first {
            debug!(service = %self.identity.name, "duplicate stop request ignored");
        }
        first
    }

    fn perform_work(&self) {
        let result = self
            .workload
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .perform();

        let Err(err) = result else {
            return;
        };

        match self.on_work_failure {
            FailurePolicy::Continue => {
                warn!(service = %self.identity.name, "work unit failed: {err}");
            }
            FailurePolicy::Stop => {
                self.begin_stop(Some(&format!("failed: {err}")));
            }
        }
    }
}

impl<M: ServiceManager, W: Workload> ServiceHandlers for LifecycleService<M, W> {
    fn run(&self) -> Result<(), ServiceError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyStarted {
                service: self.identity.name.clone(),
            });
        }

        self.manager.report_status(ServiceState::StartPending);
        self.manager.report_status(ServiceState::Running);
        self.manager.log_info("has started");

        loop {
            match self.stop.wait(self.tick_interval) {
                WaitOutcome::Signaled => {
                    self.manager.log_info("is stopping");
                    break;
                }
                WaitOutcome::TimedOut => {
                    self.manager.log_info("is running");
                    self.perform_work();
                }
            }
        }

        self.manager.log_info("has stopped");
        let mut stopped = self.lock_stopped();
        *stopped = true;
        self.manager.report_status(ServiceState::Stopped);
        Ok(())
    }

    fn request_stop(&self) {
        self.begin_stop(None);
    }

    fn handle_pre_shutdown(&self) {
        self.begin_stop(Some("received a pre-shutdown notification"));
    }

    fn handle_other_control(&self, code: u32, event_type: u32, data: Option<&str>) {
        self.manager.log_info(&format!(
            "received an event: code={code}, type={event_type}, data={}",
            data.unwrap_or("None")
        ));
    }

    fn accepted_controls(&self) -> AcceptedControls {
        AcceptedControls::BASELINE | AcceptedControls::PRESHUTDOWN
    }
}
