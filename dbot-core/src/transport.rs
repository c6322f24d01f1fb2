//! Transport boundary to the messaging provider: long-poll receive and synchronous send.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{OutboundMessage, Update};

/// Request/response boundary to the messaging provider.
///
/// Implementations apply their own bounded retry before returning
/// [`DbotError::Transport`](crate::DbotError::Transport).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-polls for updates. `offset` is the first update id wanted (last seen + 1).
    async fn poll(&self, offset: Option<i64>) -> Result<Vec<Update>>;

    /// Delivers one message; returns the provider's acknowledgement body.
    async fn deliver(&self, message: &OutboundMessage) -> Result<serde_json::Value>;

    /// Releases the connection. Later calls fail with a transport error.
    fn close(&self);
}
