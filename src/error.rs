//! Error handling for lifeline.
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading the configuration file.
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A `${VAR}` reference names a variable that is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A value parsed but is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Defines the errors that can stop a service before or while it runs.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `run` was entered a second time on the same instance.
    #[error("Service '{service}' has already been started")]
    AlreadyStarted {
        /// The internal service name.
        service: String,
    },

    /// Installing the console stop handler failed.
    #[error("Failed to install stop handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),

    /// The platform service manager rejected registration or a status report.
    #[error("Service manager error: {0}")]
    Platform(String),
}
