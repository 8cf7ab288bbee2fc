//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_lobby, get_adventure, get_adventures, get_lobbies, get_lobby, health_check,
        join_lobby_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/lobby/join/{lobby_id}", get(join_lobby_handler))
        // HTTP エンドポイント
        .route("/lobby/create", post(create_lobby))
        .route("/lobby", get(get_lobbies))
        .route("/lobby/{lobby_id}", get(get_lobby))
        .route("/adventure", get(get_adventures))
        .route("/adventure/{adventure_id}", get(get_adventure))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Lobby server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(AppState::new(repository, pusher, catalog, generator, clock));
/// server.run("127.0.0.1".to_string(), 8000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Run the lobby server until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(self.state);

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Lobby server listening on {}", listener.local_addr()?);
        tracing::info!("Join a lobby at: ws://{}/lobby/join/{{lobby_id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
