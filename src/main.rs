use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use newsdigest::cli::{Cli, Commands};
use newsdigest::config::{DEFAULT_CONFIG_PATH, environment, get_config, init_config_from};
use newsdigest::runtime::modes::{run_cli, run_server};
use newsdigest::system::logging::init_logging;

#[actix_web::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    init_config_from(&config_path);

    let config = get_config();
    let env = environment();
    let _guard = match init_logging(&config.logging, env) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            return ExitCode::FAILURE;
        }
    };

    match cli.command_or_default() {
        Commands::Serve { host, port } => {
            info!(
                "newsdigest {} starting ({} profile)",
                env!("CARGO_PKG_VERSION"),
                env
            );
            if let Err(e) = run_server(host, port).await {
                error!("Server error: {:#}", e);
                return ExitCode::FAILURE;
            }
        }
        command => {
            if let Err(e) = run_cli(command).await {
                eprintln!("{}", e.format_colored());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
