use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pathway_api::config::ServerConfig;
use pathway_api::db::{normalize_sqlite_url, prepare_sqlite_file};
use pathway_api::router::build_app_router;
use pathway_api::state::AppState;
use services::{AppServices, ChatRelay, Clock, load_catalog};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pathway_api=debug,services=info,storage=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServerConfig::from_env()?;
    config.database_url = normalize_sqlite_url(&config.database_url);
    tracing::info!(host = %config.host, port = config.port, "loaded server configuration");

    prepare_sqlite_file(&config.database_url)?;
    let catalog = load_catalog(config.catalog_path.as_deref())?;
    let relay = ChatRelay::from_env();
    tracing::info!(live = relay.live(), mode = ?relay.mode(), "chat relay configured");

    let services =
        AppServices::new_sqlite(&config.database_url, Clock::system(), catalog, relay).await?;
    tracing::info!("database ready");

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let state = AppState {
        services: services.clone(),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    tracing::info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped accepting connections, closing database");
    services.shutdown().await;
    tracing::info!("graceful shutdown complete");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, starting graceful shutdown"),
        () = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
