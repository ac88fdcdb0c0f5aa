//! Lifecycle states, control events and the accepted-controls contract.
use std::{fmt, ops::BitOr};

use strum_macros::{AsRefStr, Display};

/// Raw control codes delivered by the service manager.
pub mod codes {
    pub const STOP: u32 = 0x01;
    pub const PAUSE: u32 = 0x02;
    pub const CONTINUE: u32 = 0x03;
    pub const INTERROGATE: u32 = 0x04;
    pub const SHUTDOWN: u32 = 0x05;
    pub const PARAM_CHANGE: u32 = 0x06;
    pub const NET_BIND_ADD: u32 = 0x07;
    pub const NET_BIND_REMOVE: u32 = 0x08;
    pub const NET_BIND_ENABLE: u32 = 0x09;
    pub const NET_BIND_DISABLE: u32 = 0x0A;
    pub const DEVICE_EVENT: u32 = 0x0B;
    pub const HARDWARE_PROFILE_CHANGE: u32 = 0x0C;
    pub const POWER_EVENT: u32 = 0x0D;
    pub const SESSION_CHANGE: u32 = 0x0E;
    pub const PRESHUTDOWN: u32 = 0x0F;
    pub const TIME_CHANGE: u32 = 0x10;
    pub const TRIGGER_EVENT: u32 = 0x20;
}

/// Status reported to the service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ServiceState {
    Stopped,
    StartPending,
    Running,
    StopPending,
}

impl ServiceState {
    /// Whether the state is a transitional one the manager should wait on.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::StartPending | Self::StopPending)
    }
}

/// What the service manager asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    Stop,
    PreShutdown,
    /// Any other control code, passed through for logging.
    Other {
        code: u32,
        event_type: u32,
        data: Option<String>,
    },
}

impl ControlEvent {
    /// Classifies a raw control code.
    pub fn from_raw(code: u32, event_type: u32, data: Option<String>) -> Self {
        match code {
            codes::STOP => Self::Stop,
            codes::PRESHUTDOWN => Self::PreShutdown,
            _ => Self::Other {
                code,
                event_type,
                data,
            },
        }
    }
}

/// Bitset of control codes a service is willing to receive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AcceptedControls(u32);

impl AcceptedControls {
    pub const STOP: Self = Self(0x0000_0001);
    pub const PAUSE_CONTINUE: Self = Self(0x0000_0002);
    pub const SHUTDOWN: Self = Self(0x0000_0004);
    pub const PARAM_CHANGE: Self = Self(0x0000_0008);
    pub const NET_BIND_CHANGE: Self = Self(0x0000_0010);
    pub const HARDWARE_PROFILE_CHANGE: Self = Self(0x0000_0020);
    pub const POWER_EVENT: Self = Self(0x0000_0040);
    pub const SESSION_CHANGE: Self = Self(0x0000_0080);
    pub const PRESHUTDOWN: Self = Self(0x0000_0100);
    pub const TIME_CHANGE: Self = Self(0x0000_0200);
    pub const TRIGGER_EVENT: Self = Self(0x0000_0400);

    /// Controls the service manager grants every service by default.
    pub const BASELINE: Self = Self::STOP;

    const NAMED: [(Self, &'static str); 11] = [
        (Self::STOP, "STOP"),
        (Self::PAUSE_CONTINUE, "PAUSE_CONTINUE"),
        (Self::SHUTDOWN, "SHUTDOWN"),
        (Self::PARAM_CHANGE, "PARAM_CHANGE"),
        (Self::NET_BIND_CHANGE, "NET_BIND_CHANGE"),
        (Self::HARDWARE_PROFILE_CHANGE, "HARDWARE_PROFILE_CHANGE"),
        (Self::POWER_EVENT, "POWER_EVENT"),
        (Self::SESSION_CHANGE, "SESSION_CHANGE"),
        (Self::PRESHUTDOWN, "PRESHUTDOWN"),
        (Self::TIME_CHANGE, "TIME_CHANGE"),
        (Self::TRIGGER_EVENT, "TRIGGER_EVENT"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Names of the known flags that are set, lowest bit first.
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for AcceptedControls {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for AcceptedControls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)?;
        let names = self.names();
        if !names.is_empty() {
            write!(f, " ({})", names.join(" | "))?;
        }
        Ok(())
    }
}
