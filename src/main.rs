use std::path::Path;

use clap::Parser;
use taskboard::cli::commands::Cli;
use taskboard::cli::handlers;
use taskboard::io::config_io;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter
const LOG_ENV: &str = "TB_LOG";

fn main() {
    let cli = Cli::parse();
    let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref().map(Path::new));

    let config = match config_io::read_config(&data_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // Logs go to stderr so stdout stays clean for --json
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = handlers::dispatch(cli, &data_dir, config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
