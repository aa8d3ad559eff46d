//! Data API server.
//!
//! Serves the per-province JSON files and the views derived from them:
//!   nuoc-server --data-dir ./data --port 8080

use clap::Parser;
use nuoc_dashboard::{server, DashboardConfig, DEFAULT_CONFIG_FILE};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nuoc-server", about = "Water-quality data API")]
struct Args {
    /// Config file; defaults apply when it does not exist
    #[arg(long, env = "NUOC_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address to listen on
    #[arg(long, env = "NUOC_BIND")]
    bind: Option<SocketAddr>,

    /// Port to listen on, keeping the configured host
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Directory holding the province JSON files
    #[arg(long, env = "NUOC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Disable cross-origin headers
    #[arg(long)]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nuoc=info".parse()?))
        .init();

    let args = Args::parse();
    let mut config = DashboardConfig::load(&args.config)?.server;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(port) = args.port {
        config.bind.set_port(port);
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if args.no_cors {
        config.cors = false;
    }

    server::run(config).await
}
