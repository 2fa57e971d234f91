//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use huddle_shared::time::Clock;
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::trace::TraceLayer;

use crate::{
    auth::TokenTable,
    domain::{MessagePusher, MessageRepository, RoomRegistry},
    error::RelayError,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryMessageRepository,
    },
    usecase::{GetHistoryUseCase, MembershipUseCase, RelayTypingUseCase, SendMessageUseCase},
};

use super::{
    handler::{get_workspace_messages, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Workspace relay server
///
/// # Example
///
/// ```ignore
/// let tokens: TokenTable = "alice-token=alice:Alice".parse()?;
/// let server = Server::in_memory(tokens, 500, Arc::new(SystemClock));
/// server.run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a server over the given stores
    ///
    /// # Arguments
    ///
    /// * `tokens` - Bearer tokens accepted by the relay
    /// * `repository` - Message history storage
    /// * `message_pusher` - Delivery to the connected WebSockets
    /// * `clock` - Source of message timestamps
    pub fn new(
        tokens: TokenTable,
        repository: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rooms = Arc::new(Mutex::new(RoomRegistry::new()));

        let membership_usecase = Arc::new(MembershipUseCase::new(
            rooms.clone(),
            message_pusher.clone(),
        ));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            rooms.clone(),
            clock,
        ));
        let typing_usecase = Arc::new(RelayTypingUseCase::new(rooms, message_pusher.clone()));
        let get_history_usecase = Arc::new(GetHistoryUseCase::new(repository));

        Self {
            state: Arc::new(AppState {
                tokens,
                message_pusher,
                membership_usecase,
                send_message_usecase,
                typing_usecase,
                get_history_usecase,
            }),
        }
    }

    /// Server keeping the latest `history_capacity` messages per workspace in memory
    pub fn in_memory(tokens: TokenTable, history_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            tokens,
            Arc::new(InMemoryMessageRepository::new(history_capacity)),
            Arc::new(WebSocketMessagePusher::new()),
            clock,
        )
    }

    /// Routes of the relay
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route(
                "/workspaces/{workspace_id}/messages",
                get(get_workspace_messages),
            )
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind to `host:port` and serve until Ctrl+C
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self, host: &str, port: u16) -> Result<(), RelayError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Relay shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
