//! Edge gateway entry point.
//!
//! Settings come from defaults, an optional config file (`--config` or
//! `EDGE_GATEWAY_CONFIG`), `EDGE_GATEWAY_*` environment variables, and
//! finally command-line flags. `RUST_LOG` overrides the configured log
//! filter.

use clap::Parser;
use edge_gateway::cli::Cli;
use edge_gateway::config::{GatewaySettings, LoggingSettings};
use edge_gateway::server::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut settings = match GatewaySettings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Gateway configuration error: {e}");
            std::process::exit(1);
        }
    };
    cli.apply(&mut settings);
    init_tracing(&settings.logging);

    info!(
        addr = %settings.socket_addr(),
        functions = %settings.functions.root.display(),
        discover = settings.functions.discover,
        watch = settings.functions.watch,
        "Edge gateway configuration loaded"
    );

    if let Err(e) = GatewayServer::new(settings).start().await {
        eprintln!("Gateway error: {e}");
        std::process::exit(1);
    }
}
