use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use profile_gateway::{
    config::{Args, LookupConfig, load_env_file},
    janitor::janitor,
    lookup::LookupService,
    router,
    state::AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "gateway stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional, real environment variables win
    match load_env_file(Path::new(".env")) {
        Ok(true) => tracing::info!("loaded settings from .env"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env file"),
    }
    let args = Args::parse();

    // a missing API key makes every lookup fail, refuse to start instead
    let config = LookupConfig::from_args(&args)?;
    let lookup = Arc::new(LookupService::with_directory(config.clone(), reqwest::Client::new())?);

    if let Some(sweep_interval) = config.sweep_interval {
        tokio::spawn(janitor(lookup.clone(), sweep_interval));
    }

    if args.trust_proxy_headers {
        tracing::info!("rate limiting by x-real-ip / x-forwarded-for");
    }
    let app = router::app(AppState {
        lookup,
        trust_proxy_headers: args.trust_proxy_headers,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Gateway running on http://localhost:{}", args.port);
    tracing::info!("Forwarding lookups to {}", config.upstream_url);
    tracing::info!("Cache TTL: {} seconds", config.cache_ttl.as_secs());
    tracing::info!(
        "Rate limit: {} requests per {} seconds",
        config.rate_limit,
        config.rate_window.as_secs()
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
