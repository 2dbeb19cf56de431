use relay::config::RelayConfig;
use relay::error::RelayError;
use relay::state::AppState;
use relay::{routes, services};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    tracing_subscriber::fmt::init();

    let config = RelayConfig::load()?;
    let addr = config.listen_addr()?;
    let state = AppState::new(&config);

    let liveness = services::liveness::spawn_liveness_task(state.registry.clone(), config.ping_interval());

    let app = routes::app(state);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { addr, source })?;

    info!(%addr, path = routes::WS_PATH, "relay listening");
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(RelayError::Serve);

    liveness.abort();
    info!("relay stopped");
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
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
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
