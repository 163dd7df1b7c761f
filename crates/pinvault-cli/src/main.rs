use pinvault_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // File logging first; stderr if the state dir is unusable.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable ({:#}), logging to stderr", e);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("pinvault error: {:#}", err);
        std::process::exit(1);
    }
}
