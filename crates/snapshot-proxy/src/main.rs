use clap::Parser;
use snapshot_proxy::{Config, ProxyServer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "snapshot-proxy", version, about)]
struct Args {
    /// Listener port (overrides the config file)
    #[arg(short, long, env = "SNAPSHOT_PROXY_PORT")]
    port: Option<u16>,
    /// YAML configuration file
    #[arg(short, long, env = "SNAPSHOT_PROXY_CONFIG")]
    config: Option<PathBuf>,
    /// Directory for cached snapshots (overrides the config file)
    #[arg(long, env = "SNAPSHOT_PROXY_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if let Some(dir) = args.cache_dir {
        config.cache.dir = dir;
    }
    config.validate()?;

    info!("Caching snapshots in {}", config.cache.dir.display());
    if config.upstream.allowed_hosts.is_empty() {
        info!("Any upstream host may be targeted (upstream.allowed_hosts is empty)");
    }

    let server = ProxyServer::new(&config)?;
    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
