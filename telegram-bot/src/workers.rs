//! The three pipeline loops. Each runs as its own tokio task and exits on the shutdown sentinel
//! (processor, sender) or the shutdown flag (receiver).

use std::sync::Arc;
use std::time::Duration;

use dbot_core::{OutboundMessage, Transport, Update};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::processor::Processor;
use crate::queue::{Envelope, WorkQueue};

/// Telegram rejects longer message texts.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Long-polls and enqueues updates in arrival order until shutdown.
///
/// The offset sent is the highest update id seen plus one. A failed poll is logged and retried
/// after `backoff`; the wait ends early on shutdown. An in-flight poll is never cancelled.
#[instrument(skip_all)]
pub async fn run_receiver(
    transport: Arc<dyn Transport>,
    inbound: Arc<WorkQueue<Update>>,
    backoff: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("step: receiver started");
    let mut last_update_id: Option<i64> = None;
    loop {
        if *shutdown.borrow() {
            break;
        }
        let offset = last_update_id.map(|id| id + 1);
        match transport.poll(offset).await {
            Ok(updates) => {
                for update in updates {
                    last_update_id = Some(match last_update_id {
                        Some(last) => last.max(update.update_id),
                        None => update.update_id,
                    });
                    debug!(update_id = update.update_id, "update received");
                    inbound.push(update);
                }
            }
            Err(e) => {
                if *shutdown.borrow() {
                    break;
                }
                error!(error = %e, backoff_secs = backoff.as_secs_f64(), "poll failed, backing off");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
    info!("step: receiver stopped");
}

/// Dequeues updates, runs them through `processor`, and enqueues responses.
#[instrument(skip_all)]
pub async fn run_processor(
    mut processor: Processor,
    inbound: Arc<WorkQueue<Update>>,
    outbound: Arc<WorkQueue<OutboundMessage>>,
) {
    info!("step: processor started");
    loop {
        match inbound.pop().await {
            Envelope::Shutdown => break,
            Envelope::Item(update) => {
                if let Some(response) = processor.handle(&update) {
                    outbound.push(response);
                }
            }
        }
    }
    info!("step: processor stopped");
}

/// Delivers outbound messages one at a time. A failed delivery is logged and dropped.
///
/// On the shutdown sentinel, everything queued before it has been delivered; the transport is
/// closed then.
#[instrument(skip_all)]
pub async fn run_sender(transport: Arc<dyn Transport>, outbound: Arc<WorkQueue<OutboundMessage>>) {
    info!("step: sender started");
    loop {
        let message = match outbound.pop().await {
            Envelope::Shutdown => break,
            Envelope::Item(message) => truncate_text(message),
        };
        match transport.deliver(&message).await {
            Ok(ack) => debug!(chat_id = ?message.chat_id, ack = %ack, "message delivered"),
            Err(e) => error!(chat_id = ?message.chat_id, error = %e, "message delivery failed"),
        }
    }
    transport.close();
    info!("step: sender stopped");
}

/// Cuts `text` to [`MAX_MESSAGE_LENGTH`] characters.
pub fn truncate_text(mut message: OutboundMessage) -> OutboundMessage {
    if let Some(text) = message.text.as_mut() {
        let len = text.chars().count();
        if len > MAX_MESSAGE_LENGTH {
            warn!(len, max = MAX_MESSAGE_LENGTH, "message text truncated");
            *text = text.chars().take(MAX_MESSAGE_LENGTH).collect();
        }
    }
    message
}
