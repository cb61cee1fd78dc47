//! Harbor Gateway - internal replication data plane
//!
//! This binary serves the internal protocol the asynchronous replication
//! worker uses to move object metadata and bytes between backends, plus
//! the bucket "set replication configuration" endpoint.

use anyhow::{Context, Result, bail};
use clap::Parser;
use harbor_auth::SharedSecretAuthenticator;
use harbor_gateway::app::AppState;
use harbor_gateway::{GatewayConfig, router};
use harbor_store::{DataStoreRegistry, MemMetadataStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "harbor-gateway")]
#[command(about = "Harbor internal replication gateway")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address override
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Harbor Gateway");

    let mut config = GatewayConfig::load(args.config.as_deref())
        .context("failed to load gateway configuration")?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    config
        .backend
        .validate()
        .context("invalid backend configuration")?;
    if config.auth.secret.is_empty() {
        bail!("auth.secret must be set; the internal data plane is never unauthenticated");
    }

    info!("Backend mode: {}", config.backend.mode);
    info!(
        "Configured locations: {}",
        config
            .backend
            .locations
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Build the data stores declared by the location table
    let data = Arc::new(
        DataStoreRegistry::from_backend_config(&config.backend)
            .context("failed to initialize data stores")?,
    );

    // The metadata key-value engine is an external collaborator; the
    // built-in store covers single-node deployments.
    let metadata = Arc::new(MemMetadataStore::new());
    info!("Using built-in in-memory metadata store");

    let authenticator = Arc::new(SharedSecretAuthenticator::new(config.auth.secret.clone()));

    let state = Arc::new(AppState {
        backend: config.backend.clone(),
        metadata,
        data,
        authenticator,
    });
    let app = router(state);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen))?;

    info!("Starting internal replication gateway on {addr}");

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
        })
        .await?;

    info!("Gateway shut down gracefully");

    Ok(())
}
