//! Tab Reloader - a state-managed daemon for automatic browser tab reloading
//!
//! This is the main entry point: it wires the stdio browser bridge, the
//! durable store and the orchestrator together and serves the status
//! surface.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use tab_reloader::{
    api::{create_router, ApiState},
    config::Config,
    host::stdio::BridgeHost,
    orchestrator::Orchestrator,
    storage::{file::JsonFileStore, PersistenceBridge},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level; stdout belongs to the
    // browser bridge, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(format!("tab_reloader={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting tab-reloader v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, storage={}",
        config.host,
        config.port,
        config.storage_path().display()
    );

    let store = JsonFileStore::open(config.storage_path()).await?;

    // All browser and UI events funnel into one channel; the orchestrator
    // drains it one event at a time
    let (events_tx, events_rx) = mpsc::channel(256);
    let host = BridgeHost::spawn(events_tx.clone(), config.collaborator_timeout());

    let mut orchestrator = Orchestrator::new(
        host.clone(),
        host,
        PersistenceBridge::new(store),
        config.restore_delay(),
    );
    orchestrator.init(&events_tx).await;
    tokio::spawn(orchestrator.run(events_rx));

    // Create HTTP router for the status surface
    let app = create_router(ApiState::new(events_tx));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Status surface on http://{}", addr);
    info!("  GET /status - active timers and configuration");
    info!("  GET /health - health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("tab-reloader shutdown complete");
    Ok(())
}
