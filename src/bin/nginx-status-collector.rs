use clap::Parser;
use nginx_status_rs::HttpStatusSource;
use nginx_status_rs::collector::{
    AppState, MetricsServer, PrometheusMetrics, RollingWindow, Sampler,
};
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nginx-status-collector")]
#[command(about = "Sample NGINX stub_status and serve the last 15 minutes as JSON")]
struct Args {
    /// NGINX stub_status URL
    #[arg(long, default_value = "http://nginx:80/nginx_status")]
    status_url: String,

    /// Address for the dashboard and /metrics
    #[arg(long, default_value = "0.0.0.0:5000")]
    listen: SocketAddr,

    /// Per-request timeout for status fetches in seconds (minimum 1)
    #[arg(long, default_value_t = 2)]
    request_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let request_timeout = Duration::from_secs(args.request_timeout.max(1));

    let cancel = CancellationToken::new();

    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal");
        cancel_signal.cancel();
    });

    let metrics = Arc::new(PrometheusMetrics::default());
    let mut registry = Registry::default();
    metrics.register(&mut registry);

    let window = RollingWindow::default();
    let state = AppState {
        window: window.clone(),
        registry: Arc::new(registry),
    };

    let source = HttpStatusSource::new(&args.status_url, request_timeout)?;
    tracing::info!(
        "Sampling {} (window: {} samples)",
        source.url(),
        window.capacity()
    );
    let sampler = Sampler::new(source, window, metrics);
    let sampler_handle = tokio::spawn(sampler.run(cancel.clone()));

    let server = MetricsServer::new(state, args.listen, cancel.clone());
    if let Err(e) = server.run().await {
        tracing::error!("Dashboard server error: {}", e);
        cancel.cancel();
        sampler_handle.await.ok();
        return Err(e.into());
    }

    sampler_handle.await.ok();
    tracing::info!("Shutdown complete");
    Ok(())
}
