use std::env;
use std::process::ExitCode;

use clap::Parser;

use sensorcast_client::cli::{exit_with_usage, normalize_args, Cli};
use sensorcast_client::configs::Settings;
use sensorcast_client::{logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(env::args_os()));
    let config = cli.into_config().unwrap_or_else(|e| exit_with_usage(e));

    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let log_file = match logging::init(&settings.logger) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to initialise logging: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!("start sensorcast, logging to {}", log_file.display());

    match run(config, &settings).await {
        Ok(()) => {
            tracing::info!("Shut down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
