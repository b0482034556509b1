//! Traced Cache gateway
//!
//! Serves the cache facade over HTTP in front of a Redis server, or an
//! in-process store when `CACHE_ADDRESS` starts with `memory://`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use traced_cache::api::{create_router, AppState};
use traced_cache::{
    Cache, Client, Config, Context, MemoryTransport, Tracer, TracingTracer, Transport,
};

/// Time allowed for the startup ping and for closing the transport.
const LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Main entry point for the cache gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the tracer and the cache facade
/// 4. Probe the store
/// 5. Serve the HTTP API until SIGINT/SIGTERM, then close the transport
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "traced_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Traced Cache gateway");

    let config = Config::from_env();
    info!(
        "Configuration loaded: address={}, db={}, port={}, request_timeout={:?}",
        config.transport.address, config.transport.db, config.server_port, config.request_timeout
    );

    // One tracer for the whole process
    let tracer: Arc<dyn Tracer> = Arc::new(TracingTracer::new());

    if config.transport.is_memory() {
        let transport = MemoryTransport::with_address(config.transport.address.clone());
        let cache = Cache::from_client(Client::new(transport, tracer));
        serve(cache, &config).await
    } else {
        let cache = Cache::new(&config.transport, tracer).context("invalid cache configuration")?;
        serve(cache, &config).await
    }
}

async fn serve<T: Transport>(cache: Cache<T>, config: &Config) -> anyhow::Result<()> {
    let ctx = Context::background().with_timeout(LIFECYCLE_TIMEOUT);
    match cache.ping(&ctx).await {
        Ok(()) => info!("Store at {} is reachable", cache.client().address()),
        Err(e) => warn!(
            "Store at {} is not reachable yet: {}",
            cache.client().address(),
            e
        ),
    }

    let app = create_router(AppState::new(cache.clone(), config.request_timeout));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let ctx = Context::background().with_timeout(LIFECYCLE_TIMEOUT);
    if let Err(e) = cache.close(&ctx).await {
        warn!("Failed to close store transport: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
