//! MessagePusher backed by WebSocket outbound channels.
//!
//! ## Responsibilities
//!
//! - Keep the bounded `mpsc::Sender` of every connected client
//! - Deliver a message to one client within a bounded time
//!
//! ## Design note
//!
//! The socket itself is accepted and split in the UI layer
//! (`ui/handler/websocket.rs`), which spawns a task draining the receiving end
//! into the socket. This type only holds the sending end, so a slow or dead
//! socket shows up here as a full or closed channel.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::SendTimeoutError};

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// Default bound on a single outbound send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// MessagePusher keeping one outbound channel per connection.
pub struct WebSocketMessagePusher {
    /// Key: connection id, Value: channel into that client's socket task
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
    send_timeout: Duration,
}

impl WebSocketMessagePusher {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            send_timeout,
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_TIMEOUT)
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(client_id, sender);
        tracing::debug!("Client '{}' registered to MessagePusher", client_id);
    }

    async fn unregister_client(&self, client_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(client_id).is_some() {
            tracing::debug!("Client '{}' unregistered from MessagePusher", client_id);
        }
    }

    async fn push_to(
        &self,
        client_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        // Clone the sender so the map lock is not held while waiting on a slow client.
        let sender = {
            let clients = self.clients.lock().await;
            clients
                .get(client_id)
                .cloned()
                .ok_or(MessagePushError::ClientNotFound(*client_id))?
        };

        match sender
            .send_timeout(content.to_string(), self.send_timeout)
            .await
        {
            Ok(()) => {
                tracing::debug!("Pushed message to client '{}'", client_id);
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_)) => Err(MessagePushError::Timeout(*client_id)),
            Err(SendTimeoutError::Closed(_)) => Err(MessagePushError::PushFailed(format!(
                "channel of client '{}' is closed",
                client_id
            ))),
        }
    }
}
