//! Configuration management for lifeline.
use regex::Regex;
use serde::Deserialize;
use std::{env, fs, path::Path, time::Duration};
use strum_macros::{AsRefStr, EnumString};

use crate::error::ConfigError;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lifeline.yaml";

/// Default period between work units.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(3);

/// Longest accepted period between work units.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// How a service is registered with the manager and named in log messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceIdentity {
    /// Internal name used for registration.
    pub name: String,
    /// Human-readable name shown by the manager.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self {
            name: "Lifeline".into(),
            display_name: "Lifeline Example".into(),
            description: "Example of a long-running service built on lifeline.".into(),
        }
    }
}

/// What the run loop does when a work unit fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and wait for the next tick.
    #[default]
    Continue,
    /// Log the failure and stop the service.
    Stop,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub identity: ServiceIdentity,
    /// Timeout of each wait on the stop signal.
    pub tick_interval: Duration,
    /// Pause taken by the heartbeat workload after each tick.
    pub work_pause: Duration,
    pub on_work_failure: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity: ServiceIdentity::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            work_pause: Duration::ZERO,
            on_work_failure: FailurePolicy::default(),
        }
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    service: Option<ServiceIdentity>,
    tick_interval: Option<String>,
    work_pause: Option<String>,
    on_work_failure: Option<FailurePolicy>,
}

impl TryFrom<ConfigFile> for Config {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let identity = file.service.unwrap_or_default();
        if identity.name.trim().is_empty() {
            return Err(ConfigError::Invalid("service name cannot be empty".into()));
        }

        let tick_interval = match file.tick_interval.as_deref() {
            Some(raw) => parse_duration(raw)?,
            None => DEFAULT_TICK_INTERVAL,
        };
        if tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tick_interval must be greater than zero".into(),
            ));
        }
        if tick_interval > MAX_TICK_INTERVAL {
            return Err(ConfigError::Invalid(format!(
                "tick_interval must not exceed {}s",
                MAX_TICK_INTERVAL.as_secs()
            )));
        }

        let work_pause = match file.work_pause.as_deref() {
            Some(raw) => parse_duration(raw)?,
            None => Duration::ZERO,
        };

        Ok(Self {
            identity,
            tick_interval,
            work_pause,
            on_work_failure: file.on_work_failure.unwrap_or_default(),
        })
    }
}

/// Parses a user-facing duration string in the format `<number>[ms|s|m|h]`.
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ConfigError::Invalid("Duration value cannot be empty".into()));
    }

    let invalid = || ConfigError::Invalid(format!("Invalid duration value: '{raw}'"));

    if let Some(stripped) = value.strip_suffix("ms") {
        let amount: u64 = stripped.trim().parse().map_err(|_| invalid())?;
        return Ok(Duration::from_millis(amount));
    }

    let (amount_str, multiplier) = if let Some(stripped) = value.strip_suffix('s') {
        (stripped.trim(), 1)
    } else if let Some(stripped) = value.strip_suffix('m') {
        (stripped.trim(), 60)
    } else if let Some(stripped) = value.strip_suffix('h') {
        (stripped.trim(), 3600)
    } else {
        (value, 1)
    };

    let amount: u64 = amount_str.parse().map_err(|_| invalid())?;
    Ok(Duration::from_secs(amount.saturating_mul(multiplier)))
}

/// Expands `$VAR` and `${VAR}` references from the environment.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?")
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

    let mut missing = None;
    let result = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env::var(var_name).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| var_name.to_string());
            String::new()
        })
    });

    match missing {
        Some(name) => Err(ConfigError::MissingEnvVar(name)),
        None => Ok(result.into_owned()),
    }
}

/// Parses configuration text after environment expansion.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let expanded = expand_env_vars(content)?;
    let file: ConfigFile = if expanded.trim().is_empty() {
        ConfigFile::default()
    } else {
        serde_yaml::from_str(&expanded)?
    };
    Config::try_from(file)
}

/// Loads the configuration file, falling back to defaults when none is present.
pub fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
    let config_path = match config_path {
        Some(path) => Path::new(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
        None => return Ok(Config::default()),
    };

    let content = fs::read_to_string(config_path).map_err(|e| {
        ConfigError::Read(std::io::Error::new(
            e.kind(),
            format!("{} ({})", e, config_path.display()),
        ))
    })?;

    parse_config(&content)
}
