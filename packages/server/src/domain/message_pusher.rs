//! MessagePusher trait definition.
//!
//! Abstracts delivering outbound messages to connected clients. The sending
//! side of each client's socket is owned by the UI layer; implementations only
//! hold the channel that feeds it.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError};

/// Channel feeding one client's outbound socket task.
pub type PusherChannel = mpsc::Sender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a client's outbound channel.
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel);

    /// Forget a client. No-op if it was never registered.
    async fn unregister_client(&self, client_id: &ConnectionId);

    /// Deliver one message to one client.
    ///
    /// A failure concerns this recipient only; callers fanning out to many
    /// clients inspect it per recipient and carry on.
    async fn push_to(&self, client_id: &ConnectionId, content: &str)
    -> Result<(), MessagePushError>;
}
