use dotenv::dotenv;
use host_reservations_export::config::{self, Startup, DEFAULT_LOG_FILE, DEFAULT_LOG_LEVEL};
use host_reservations_export::logging::init_logging;
use host_reservations_export::run;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let config = match config::load(std::env::args_os()) {
        Ok(Startup::Run(config)) => config,
        Ok(Startup::Exit(text)) => {
            print!("{}", text);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            // The log file setting was not read, so fall back to the default location.
            // Errors also reach stderr through the console layer.
            match init_logging(Path::new(DEFAULT_LOG_FILE), DEFAULT_LOG_LEVEL) {
                Ok(()) => error!("configuration error: {}", e),
                Err(log_error) => eprintln!("Error: {}\nError: {:#}", e, log_error),
            }
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.log_file, &config.log_level) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!("export started");
    match run(&config).await {
        Ok(outcome) => {
            info!(
                reservations = outcome.reservation_count,
                json = %outcome.json_output.display(),
                calendar = %outcome.calendar_output.display(),
                "export complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("export failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
