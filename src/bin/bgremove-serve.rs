//! Background Removal Service binary
//!
//! Starts the HTTP server with configuration from the environment and
//! command-line flags.

use bgremove_service::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
