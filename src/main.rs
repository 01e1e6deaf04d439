//! Bluestack: local Azure-style storage emulator.

use clap::Parser;
use tracing::info;

use bluestack::{logging, Cli, Command, Config, EdgeServer, ServerError};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let cli = Cli::parse();

    let args = match cli.command {
        Command::Version => {
            println!("bluestack version {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Start(args) => args,
    };

    let config = Config::from(args);
    config
        .validate()
        .map_err(|e| format!("invalid configuration: {}", e))?;

    logging::init(&config.log_level)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        edge_port = config.port,
        data_dir = %config.data_dir.display(),
        log_level = %config.log_level,
        services = %config.enabled_services.join(","),
        "starting bluestack"
    );

    let server = EdgeServer::from_config(config)
        .map_err(|e| format!("failed to initialize blob store: {}", e))?;

    println!(
        r#"
Bluestack is listening at {}

Blob endpoint: {}/blob/<account>/<container>[/<blob>]
Health check:  {}/health

Press Ctrl+C to stop the server.
"#,
        server.bind_address(),
        server.base_url(),
        server.base_url()
    );

    server.run().await
}
