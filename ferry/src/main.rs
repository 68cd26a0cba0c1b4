use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferry::cli::Cli;
use ferry::output;

fn main() {
    // Parse CLI arguments early so we can configure logging.
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cli.verbose {
                EnvFilter::new("info")
            } else {
                EnvFilter::new("warn")
            }
        }))
        .with_target(false)
        .init();

    // Run the command
    if let Err(e) = cli.run() {
        output::error_stderr(&e.to_string());
        std::process::exit(1);
    }
}
