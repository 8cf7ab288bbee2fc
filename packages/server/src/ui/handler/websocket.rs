//! WebSocket connection handlers.

use std::{panic::AssertUnwindSafe, sync::Arc};

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{FutureExt, sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, ConnectionId, LobbyError, LobbyId},
    infrastructure::dto::websocket::{ClientMessage, ErrorMessage, encode},
    ui::state::AppState,
};

/// Outbound messages buffered per client before sends start timing out.
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

pub async fn join_lobby_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(lobby_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, lobby_id))
}

/// Close code for a rejected join: expected refusals are policy violations,
/// anything else is an internal error.
fn close_code_for(error: &LobbyError) -> u16 {
    match error {
        LobbyError::LobbyNotFound(_) | LobbyError::LobbyFull(_) | LobbyError::AlreadyStarted => {
            close_code::POLICY
        }
        _ => close_code::ERROR,
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This is the only writer to the socket; everything addressed to this client
/// goes through the `MessagePusher` into `rx`.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn join(
    state: &AppState,
    raw_lobby_id: String,
    sender: mpsc::Sender<String>,
) -> Result<(LobbyId, Connection), LobbyError> {
    let lobby_id = LobbyId::new(raw_lobby_id)?;
    let connection = state.join_lobby_usecase.execute(&lobby_id, sender).await?;
    Ok((lobby_id, connection))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, raw_lobby_id: String) {
    let (tx, rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);

    let (lobby_id, connection) = match join(&state, raw_lobby_id, tx).await {
        Ok(joined) => joined,
        Err(e) => {
            let frame = CloseFrame {
                code: close_code_for(&e),
                reason: e.to_string().into(),
            };
            if let Err(send_error) = socket.send(Message::Close(Some(frame))).await {
                tracing::debug!("Failed to send close frame: {}", send_error);
            }
            return;
        }
    };
    let connection_id = connection.id;
    tracing::info!(
        "WebSocket for {} ('{}') attached to lobby '{}'",
        connection.name,
        connection_id,
        lobby_id
    );

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let recv_state = state.clone();
    let recv_lobby_id = lobby_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", connection_id, text);
                    handle_text(&recv_state, &recv_lobby_id, connection_id, text.as_str()).await;
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .leave_lobby_usecase
        .execute(&lobby_id, connection_id)
        .await;
}

/// Handle one inbound text message. A panic is contained here so the
/// connection and the lobby keep working.
async fn handle_text(state: &AppState, lobby_id: &LobbyId, connection_id: ConnectionId, text: &str) {
    let handled =
        FutureExt::catch_unwind(AssertUnwindSafe(dispatch(state, lobby_id, connection_id, text)))
            .await;

    if handled.is_err() {
        tracing::error!(
            "Panic while handling message from '{}' in lobby '{}'",
            connection_id,
            lobby_id
        );
        let message = encode(&ErrorMessage::new("Internal server error"));
        state
            .broadcast
            .send_to(lobby_id, connection_id, message)
            .await;
    }
}

async fn dispatch(state: &AppState, lobby_id: &LobbyId, connection_id: ConnectionId, text: &str) {
    let Ok(message) = serde_json::from_str::<ClientMessage>(text) else {
        // Anything that is not a known message is echoed back verbatim.
        state
            .broadcast
            .send_to(lobby_id, connection_id, text.to_string())
            .await;
        return;
    };

    let result = match message {
        ClientMessage::ToggleReady => state
            .toggle_ready_usecase
            .execute(lobby_id, connection_id)
            .await
            .map(|_| ()),
        ClientMessage::StartAdventure => state
            .start_adventure_usecase
            .execute(lobby_id, connection_id)
            .await
            .map(|_| ()),
        ClientMessage::SubmitChoice { choice_index } => {
            state
                .submit_choice_usecase
                .execute(lobby_id, connection_id, choice_index)
                .await;
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::warn!("Request from '{}' failed: {}", connection_id, e);
        state
            .broadcast
            .send_to(lobby_id, connection_id, encode(&ErrorMessage::new(e.to_string())))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_codes() {
        assert_eq!(
            close_code_for(&LobbyError::LobbyNotFound("x".to_string())),
            close_code::POLICY
        );
        assert_eq!(
            close_code_for(&LobbyError::LobbyFull("x".to_string())),
            close_code::POLICY
        );
        assert_eq!(close_code_for(&LobbyError::AlreadyStarted), close_code::POLICY);
        assert_eq!(close_code_for(&LobbyError::NotAllReady), close_code::ERROR);
    }
}
