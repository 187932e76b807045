//! Command-line interface for the `edge-gateway` binary.

use crate::config::GatewaySettings;
use clap::Parser;
use std::path::PathBuf;

/// Local edge-function gateway: serves hot-reloaded handler modules over HTTP.
#[derive(Debug, Parser)]
#[command(name = "edge-gateway", version, about)]
pub struct Cli {
    /// Configuration file (toml, yaml, json, ini, ron, json5)
    #[arg(short, long, env = "EDGE_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding handler modules
    #[arg(short, long)]
    pub functions: Option<PathBuf>,

    /// Do not watch the functions directory for changes
    #[arg(long)]
    pub no_watch: bool,

    /// Only serve routes listed in the configuration file
    #[arg(long)]
    pub no_discover: bool,
}

impl Cli {
    /// Apply flags on top of loaded settings.
    pub fn apply(&self, settings: &mut GatewaySettings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(root) = &self.functions {
            settings.functions.root = root.clone();
        }
        if self.no_watch {
            settings.functions.watch = false;
        }
        if self.no_discover {
            settings.functions.discover = false;
        }
    }
}
