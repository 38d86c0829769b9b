//! Asset Depot - an authenticated upload gateway for asset repositories.
//!
//! This binary starts the HTTP server and wires up all components.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_depot::{
    create_router, AppState, Config, HostAllowlist, MemoryAssetStore, ReplayWindow,
    RepositoryStack, RouterConfig, UploadAuth,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    // Build the repository stack
    let stack = match RepositoryStack::from_yaml_file(Path::new(&config.repository_config)) {
        Ok(stack) => stack,
        Err(e) => {
            error!("Repository configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Repository config: {}", config.repository_config);
    info!("  Staging directory: {}", stack.workdir().display());
    for repository in stack.repositories() {
        let restriction = if repository.media_types().is_empty() {
            "any media type".to_string()
        } else {
            repository.media_types().join(", ")
        };
        info!("  Repository {}: {}", repository.name(), restriction);
    }
    info!("  Replay window: {}s", config.replay_window_secs());
    info!("  Hash function: {}", config.parsed_hash_function());
    match &config.allowed_hosts {
        Some(hosts) => info!("  Upload hosts: {:?}", hosts),
        None => info!("  Upload hosts: any"),
    }

    // Wire up application state
    let state = AppState::new(
        Arc::new(stack),
        Arc::new(MemoryAssetStore::new()),
        UploadAuth::from_config(&config),
        ReplayWindow::new(config.replay_window_secs()),
    );

    let allowed_hosts = match &config.allowed_hosts {
        Some(hosts) => HostAllowlist::only(hosts.clone()),
        None => HostAllowlist::any(),
    };
    let router_config = RouterConfig::new()
        .with_allowed_hosts(allowed_hosts)
        .with_tracing(!config.no_tracing);

    let router = create_router(state, router_config);

    // Bind and serve
    let addr = config.bind_address();
    info!("Server listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    // ConnectInfo feeds the upload host allowlist.
    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing subscriber.
///
/// Respects `RUST_LOG` when set; otherwise defaults to `info` (or `debug`
/// with `--verbose`).
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
