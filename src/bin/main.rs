use std::error::Error;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lifeline::{
    cli::{Cli, Commands, parse_args},
    config::load_config,
    manager::ConsoleManager,
    platform,
    service::{LifecycleService, ServiceHandlers},
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args();
    init_logging(&args);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Run => {
            info!("Starting service '{}'", config.identity.name);
            if let Err(err) = platform::run_under_manager(config) {
                error!("Service exited with error: {err}");
                return Err(err.into());
            }
        }
        Commands::Console => {
            info!(
                "Running service '{}' in the foreground; press Ctrl-C to stop",
                config.identity.name
            );
            platform::console::run_config(&config)?;
        }
        Commands::Controls => {
            let manager = ConsoleManager::new(config.identity.clone());
            let service = LifecycleService::from_config(&config, manager);
            println!("{}", service.accepted_controls());
        }
    }

    Ok(())
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
