//! CLI mode
//!
//! Delegates to the command implementations.

use crate::cli::Commands;
use crate::interfaces::cli::{CliError, run_cli_command};

pub async fn run_cli(cmd: Commands) -> Result<(), CliError> {
    crate::runtime::lifetime::startup::install_crypto_provider();
    run_cli_command(cmd).await
}
