use std::{
    ffi::OsString,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use tracing::{debug, error, info, warn};
use windows_service::{
    define_windows_service,
    service::{
        ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceStatus, ServiceType,
    },
    service_control_handler::{self, ServiceControlHandlerResult, ServiceStatusHandle},
    service_dispatcher,
};

use crate::{
    config::{Config, ServiceIdentity},
    error::ServiceError,
    manager::{ServiceManager, format_message},
    service::{LifecycleService, ServiceHandlers},
    state::{AcceptedControls, ControlEvent, ServiceState},
};

/// Configuration handed from `run` to the dispatcher's service entry point.
static CONFIG: OnceLock<Config> = OnceLock::new();

define_windows_service!(ffi_service_main, service_main);

fn platform_error(err: windows_service::Error) -> ServiceError {
    ServiceError::Platform(err.to_string())
}

/// Connects to the SCM dispatcher. Blocks until the service has stopped.
pub fn run(config: Config) -> Result<(), ServiceError> {
    let name = config.identity.name.clone();
    CONFIG
        .set(config)
        .map_err(|_| ServiceError::Platform("service dispatcher already started".into()))?;

    info!("Connecting '{name}' to the service control dispatcher");
    service_dispatcher::start(&name, ffi_service_main).map_err(platform_error)
}

fn service_main(_arguments: Vec<OsString>) {
    let Some(config) = CONFIG.get() else {
        error!("Service entry point invoked without configuration");
        return;
    };

    if let Err(err) = run_service(config) {
        error!("Service '{}' exited with error: {err}", config.identity.name);
    }
}

fn run_service(config: &Config) -> Result<(), ServiceError> {
    let manager = ScmManager::new(config.identity.clone(), wait_hint(config.tick_interval));
    let service = Arc::new(LifecycleService::from_config(config, manager));

    let handler = Arc::clone(&service);
    let status_handle =
        service_control_handler::register(&config.identity.name, move |control| {
            if let ServiceControl::Interrogate = control {
                return ServiceControlHandlerResult::NoError;
            }
            handler.handle_control(classify(control));
            ServiceControlHandlerResult::NoError
        })
        .map_err(platform_error)?;

    service
        .manager()
        .attach(status_handle, service.accepted_controls());
    service.run()
}

/// Time the SCM should allow between pending-state checkpoints: two ticks,
/// saturating instead of overflowing.
fn wait_hint(tick_interval: Duration) -> Duration {
    tick_interval.checked_mul(2).unwrap_or(Duration::MAX)
}

/// `dwEventType` values the SCM passes to `HandlerEx` alongside a control.
mod event_types {
    pub const DBT_QUERYCHANGECONFIG: u32 = 0x0017;
    pub const DBT_CONFIGCHANGED: u32 = 0x0018;
    pub const DBT_CONFIGCHANGECANCELED: u32 = 0x0019;

    pub const PBT_APMQUERYSUSPEND: u32 = 0x0000;
    pub const PBT_APMQUERYSUSPENDFAILED: u32 = 0x0002;
    pub const PBT_APMSUSPEND: u32 = 0x0004;
    pub const PBT_APMRESUMECRITICAL: u32 = 0x0006;
    pub const PBT_APMRESUMESUSPEND: u32 = 0x0007;
    pub const PBT_APMBATTERYLOW: u32 = 0x0009;
    pub const PBT_APMPOWERSTATUSCHANGE: u32 = 0x000A;
    pub const PBT_APMOEMEVENT: u32 = 0x000B;
    pub const PBT_APMRESUMEAUTOMATIC: u32 = 0x0012;
    pub const PBT_POWERSETTINGCHANGE: u32 = 0x8013;

    pub const WTS_CONSOLE_CONNECT: u32 = 0x1;
    pub const WTS_CONSOLE_DISCONNECT: u32 = 0x2;
    pub const WTS_REMOTE_CONNECT: u32 = 0x3;
    pub const WTS_REMOTE_DISCONNECT: u32 = 0x4;
    pub const WTS_SESSION_LOGON: u32 = 0x5;
    pub const WTS_SESSION_LOGOFF: u32 = 0x6;
    pub const WTS_SESSION_LOCK: u32 = 0x7;
    pub const WTS_SESSION_UNLOCK: u32 = 0x8;
    pub const WTS_SESSION_REMOTE_CONTROL: u32 = 0x9;
    pub const WTS_SESSION_CREATE: u32 = 0xA;
    pub const WTS_SESSION_TERMINATE: u32 = 0xB;
}

/// Recovers the `dwEventType` the SCM delivered with `control`; zero for
/// controls that carry none.
#[allow(unreachable_patterns)]
fn event_type(control: &ServiceControl) -> u32 {
    use event_types::*;
    use windows_service::service::{
        HardwareProfileChangeParam, PowerEventParam, SessionChangeReason,
    };

    match control {
        ServiceControl::HardwareProfileChange(param) => match param {
            HardwareProfileChangeParam::QueryChangeConfig => DBT_QUERYCHANGECONFIG,
            HardwareProfileChangeParam::ConfigChanged => DBT_CONFIGCHANGED,
            HardwareProfileChangeParam::ConfigChangeCanceled => DBT_CONFIGCHANGECANCELED,
            _ => 0,
        },
        ServiceControl::PowerEvent(param) => match param {
            PowerEventParam::QuerySuspend => PBT_APMQUERYSUSPEND,
            PowerEventParam::QuerySuspendFailed => PBT_APMQUERYSUSPENDFAILED,
            PowerEventParam::Suspend => PBT_APMSUSPEND,
            PowerEventParam::ResumeCritical => PBT_APMRESUMECRITICAL,
            PowerEventParam::ResumeSuspend => PBT_APMRESUMESUSPEND,
            PowerEventParam::BatteryLow => PBT_APMBATTERYLOW,
            PowerEventParam::PowerStatusChange => PBT_APMPOWERSTATUSCHANGE,
            PowerEventParam::OemEvent => PBT_APMOEMEVENT,
            PowerEventParam::ResumeAutomatic => PBT_APMRESUMEAUTOMATIC,
            PowerEventParam::PowerSettingChange(_) => PBT_POWERSETTINGCHANGE,
            _ => 0,
        },
        ServiceControl::SessionChange(param) => match param.reason {
            SessionChangeReason::ConsoleConnect => WTS_CONSOLE_CONNECT,
            SessionChangeReason::ConsoleDisconnect => WTS_CONSOLE_DISCONNECT,
            SessionChangeReason::RemoteConnect => WTS_REMOTE_CONNECT,
            SessionChangeReason::RemoteDisconnect => WTS_REMOTE_DISCONNECT,
            SessionChangeReason::SessionLogon => WTS_SESSION_LOGON,
            SessionChangeReason::SessionLogoff => WTS_SESSION_LOGOFF,
            SessionChangeReason::SessionLock => WTS_SESSION_LOCK,
            SessionChangeReason::SessionUnlock => WTS_SESSION_UNLOCK,
            SessionChangeReason::SessionRemoteControl => WTS_SESSION_REMOTE_CONTROL,
            SessionChangeReason::SessionCreate => WTS_SESSION_CREATE,
            SessionChangeReason::SessionTerminate => WTS_SESSION_TERMINATE,
            _ => 0,
        },
        _ => 0,
    }
}

/// Converts an SCM control into the core's event type.
fn classify(control: ServiceControl) -> ControlEvent {
    let code = control.raw_service_control_type();
    let event_type = event_type(&control);
    let data = match control {
        ServiceControl::Stop
        | ServiceControl::Preshutdown
        | ServiceControl::Shutdown
        | ServiceControl::Pause
        | ServiceControl::Continue
        | ServiceControl::Interrogate
        | ServiceControl::ParamChange => None,
        other => Some(format!("{other:?}")),
    };
    ControlEvent::from_raw(code, event_type, data)
}

/// Forwards status reports to the SCM through a registered status handle.
struct ScmManager {
    identity: ServiceIdentity,
    wait_hint: Duration,
    registration: OnceLock<(ServiceStatusHandle, ServiceControlAccept)>,
    checkpoint: AtomicU32,
}

impl ScmManager {
    fn new(identity: ServiceIdentity, wait_hint: Duration) -> Self {
        Self {
            identity,
            wait_hint,
            registration: OnceLock::new(),
            checkpoint: AtomicU32::new(0),
        }
    }

    fn attach(&self, handle: ServiceStatusHandle, accepted: AcceptedControls) {
        let accepted = ServiceControlAccept::from_bits_truncate(accepted.bits());
        if self.registration.set((handle, accepted)).is_err() {
            warn!("Status handle for '{}' already attached", self.identity.name);
        }
    }
}

impl ServiceManager for ScmManager {
    fn report_status(&self, state: ServiceState) {
        let Some((handle, accepted)) = self.registration.get() else {
            warn!(
                "Dropping '{state}' report for '{}': no status handle",
                self.identity.name
            );
            return;
        };

        let current_state = match state {
            ServiceState::Stopped => windows_service::service::ServiceState::Stopped,
            ServiceState::StartPending => windows_service::service::ServiceState::StartPending,
            ServiceState::Running => windows_service::service::ServiceState::Running,
            ServiceState::StopPending => windows_service::service::ServiceState::StopPending,
        };
        let (checkpoint, wait_hint) = if state.is_pending() {
            (self.checkpoint.fetch_add(1, Ordering::SeqCst) + 1, self.wait_hint)
        } else {
            (0, Duration::default())
        };
        let controls_accepted = match state {
            ServiceState::Running => *accepted,
            _ => ServiceControlAccept::empty(),
        };

        let status = ServiceStatus {
            service_type: ServiceType::OWN_PROCESS,
            current_state,
            controls_accepted,
            exit_code: ServiceExitCode::Win32(0),
            checkpoint,
            wait_hint,
            process_id: None,
        };

        match handle.set_service_status(status) {
            Ok(()) => debug!(service = %self.identity.name, %state, "status reported"),
            Err(err) => error!(
                "Failed to report '{state}' for '{}': {err}",
                self.identity.name
            ),
        }
    }

    fn log_info(&self, fragment: &str) {
        info!("{}", format_message(&self.identity, fragment));
    }
}
