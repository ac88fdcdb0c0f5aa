//! Command-line interface for lifeline.
use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

/// Log level accepted either by name ("info", "debug", ...) or as a 0-5 shorthand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevelArg(LevelFilter);

impl LogLevelArg {
    /// String representation suitable for `RUST_LOG`.
    pub fn as_str(&self) -> &'static str {
        match self.0 {
            LevelFilter::OFF => "off",
            LevelFilter::ERROR => "error",
            LevelFilter::WARN => "warn",
            LevelFilter::INFO => "info",
            LevelFilter::DEBUG => "debug",
            LevelFilter::TRACE => "trace",
        }
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("log level cannot be empty".into());
        }

        let levels = [
            LevelFilter::OFF,
            LevelFilter::ERROR,
            LevelFilter::WARN,
            LevelFilter::INFO,
            LevelFilter::DEBUG,
            LevelFilter::TRACE,
        ];

        if let Ok(number) = trimmed.parse::<usize>() {
            return levels
                .get(number)
                .copied()
                .map(LogLevelArg)
                .ok_or_else(|| {
                    format!("unsupported log level number '{number}' (expected 0-5)")
                });
        }

        let level = match trimmed.to_ascii_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "error" | "err" => LevelFilter::ERROR,
            "warn" | "warning" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => return Err(format!("invalid log level '{trimmed}'")),
        };

        Ok(LogLevelArg(level))
    }
}

/// Command-line interface for lifeline.
#[derive(Parser, Debug)]
#[command(name = "lifeline", version, author)]
#[command(about = "Runs a periodic workload under an OS service manager", long_about = None)]
pub struct Cli {
    /// Override the logging verbosity for this invocation only.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Path to the configuration file (defaults to `lifeline.yaml` when present).
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for lifeline.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run under the platform service manager (foreground with signal handling off Windows).
    Run,

    /// Run in the foreground until Ctrl-C or SIGTERM.
    Console,

    /// Print the control codes the service accepts.
    Controls,
}

/// Parses command-line arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
