use clap::Parser;
use cinder_dns_domain::CliOverrides;
use cinder_dns_jobs::{CacheMaintenanceJob, HealthProbeJob, JobRunner, StatsJob};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "cinder-dns")]
#[command(version)]
#[command(about = "Cinder DNS - caching DNS resolver forwarding over DNS-over-HTTPS")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS listen port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream DoH endpoint URL (repeatable, replaces configured list)
    #[arg(short = 'u', long = "upstream", value_name = "URL")]
    upstreams: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        upstream_urls: if cli.upstreams.is_empty() {
            None
        } else {
            Some(cli.upstreams.clone())
        },
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting Cinder DNS v{}", env!("CARGO_PKG_VERSION"));

    let services = di::DnsServices::new(&config)?;

    let shutdown = CancellationToken::new();

    let mut runner = JobRunner::new()
        .with_health_probe(HealthProbeJob::new(services.prober.clone()))
        .with_stats(StatsJob::new(services.stats.clone()))
        .with_shutdown_token(shutdown.clone());
    if let Some(maintenance) = services.maintenance.clone() {
        runner = runner.with_cache_maintenance(CacheMaintenanceJob::new(maintenance));
    }
    runner.start().await;

    let listen_addr = format!("{}:{}", config.server.bind_address, config.server.dns_port);
    let handler = Arc::new(services.handler);

    let udp_handler = handler.clone();
    let udp_addr = listen_addr.clone();
    let udp_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = server::run_udp_server(udp_addr, udp_handler, udp_shutdown).await {
            error!(error = %e, "UDP DNS server error");
        }
    });

    let tcp_handler = handler.clone();
    let tcp_addr = listen_addr.clone();
    let tcp_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = server::run_tcp_server(tcp_addr, tcp_handler, tcp_shutdown).await {
            error!(error = %e, "TCP DNS server error");
        }
    });

    info!(listen_address = %listen_addr, "Cinder DNS ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    shutdown.cancel();

    // Give listeners and jobs a moment to observe cancellation.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    info!("Server shutdown complete");
    Ok(())
}
