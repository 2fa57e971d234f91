//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use huddle_shared::protocol::ClientEvent;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{domain::Member, ui::state::AppState, usecase::TypingAction};

/// Upgrade an authenticated request to a relay connection
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let user = match state.tokens.authenticate(&headers) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Rejecting WebSocket upgrade: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let member = Member::new(user);
    tracing::info!(
        "'{}' connected as {}",
        member.user_id,
        member.connection_id
    );
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, member)))
}

/// Drain the connection's outbound queue into its WebSocket
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, member: Member) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_client(member.connection_id, tx)
        .await;

    let recv_state = state.clone();
    let recv_member = member.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    match serde_json::from_str::<ClientEvent>(text.as_str()) {
                        Ok(event) => dispatch(&recv_state, &recv_member, event).await,
                        Err(e) => tracing::warn!(
                            "Ignoring malformed frame from {}: {}",
                            recv_member.connection_id,
                            e
                        ),
                    }
                }
                Message::Close(_) => {
                    tracing::info!("{} requested close", recv_member.connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.membership_usecase.disconnect(&member).await;
    state
        .message_pusher
        .unregister_client(&member.connection_id)
        .await;
    tracing::info!(
        "'{}' disconnected ({})",
        member.user_id,
        member.connection_id
    );
}

async fn dispatch(state: &AppState, member: &Member, event: ClientEvent) {
    let name = event.name();
    let result = match event {
        ClientEvent::JoinWorkspace(room) => state
            .membership_usecase
            .join(member, &room.workspace_id)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        ClientEvent::LeaveWorkspace(room) => {
            state
                .membership_usecase
                .leave(member, &room.workspace_id)
                .await;
            Ok(())
        }
        ClientEvent::SendMessage(payload) => state
            .send_message_usecase
            .execute(member, payload)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        ClientEvent::TypingStart(room) => state
            .typing_usecase
            .execute(member, &room.workspace_id, TypingAction::Start)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        ClientEvent::TypingStop(room) => state
            .typing_usecase
            .execute(member, &room.workspace_id, TypingAction::Stop)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
    };

    if let Err(e) = result {
        tracing::warn!(
            "{} from {} was not applied: {}",
            name,
            member.connection_id,
            e
        );
    }
}
