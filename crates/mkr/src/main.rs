//! MKR gateway daemon.
//!
//! Starts the REST gateway over a configured MKR timetable deployment.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mkr_api::MkrApi;
use mkr_server::{Server, ServerConfig};

/// MKR gateway - REST API over the MKR timetable service
#[derive(Parser)]
#[command(name = "mkr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root URL of the MKR deployment to scrape
    #[arg(long, env = "SERVICE_URL")]
    service_url: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "mkr=debug,mkr_api=debug,mkr_server=debug,tower_http=debug,info"
    } else {
        "mkr=info,mkr_api=info,mkr_server=info,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let api = MkrApi::builder()
        .base_url(&cli.service_url)
        .build()
        .with_context(|| format!("invalid SERVICE_URL '{}'", cli.service_url))?;

    info!(base_url = %api.base_url(), "Gateway configured");

    let addr = SocketAddr::new(cli.bind, cli.port);
    let server = Server::new(api, ServerConfig::default().with_bind_address(addr));

    server.run().await.context("server exited with error")?;

    Ok(())
}
