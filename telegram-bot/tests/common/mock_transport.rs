//! In-memory [`Transport`] for pipeline tests.
//!
//! Scripted poll results are served in order; once exhausted, `poll` waits briefly and returns an
//! empty batch like an idle long-poll. Every delivered message is sent to the test's receiver.

#![allow(dead_code)] // not every test binary uses every helper

use async_trait::async_trait;
use dbot_core::{DbotError, OutboundMessage, Result, Transport, Update};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One scripted `poll` outcome.
pub enum PollScript {
    Updates(Vec<Update>),
    Fail(&'static str),
}

pub struct MockTransport {
    script: Mutex<VecDeque<PollScript>>,
    offsets: Mutex<Vec<Option<i64>>>,
    delivered_tx: mpsc::UnboundedSender<OutboundMessage>,
    /// Number of upcoming deliveries to fail.
    fail_deliveries: AtomicUsize,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl MockTransport {
    pub fn with_receiver(
        script: Vec<PollScript>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (delivered_tx, delivered_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            script: Mutex::new(script.into()),
            offsets: Mutex::new(Vec::new()),
            delivered_tx,
            fail_deliveries: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
        });
        (transport, delivered_rx)
    }

    pub fn fail_next_deliveries(&self, count: usize) {
        self.fail_deliveries.store(count, Ordering::SeqCst);
    }

    /// Offsets passed to `poll`, in call order.
    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn poll(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DbotError::Transport("mock transport closed".to_string()));
        }
        self.offsets.lock().unwrap().push(offset);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(PollScript::Updates(updates)) => Ok(updates),
            Some(PollScript::Fail(reason)) => Err(DbotError::Transport(reason.to_string())),
            None => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<serde_json::Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DbotError::Transport("mock transport closed".to_string()));
        }
        let failing = self
            .fail_deliveries
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DbotError::Transport("mock delivery failure".to_string()));
        }
        let _ = self.delivered_tx.send(message.clone());
        Ok(json!({"message_id": 1}))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Text message update from `chat_id`.
pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {"message_id": update_id, "chat": {"id": chat_id}, "text": text}
    }))
    .unwrap()
}

/// Inline button press carrying `data`.
pub fn callback_update(update_id: i64, chat_id: i64, data: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "callback_query": {"id": "cb", "data": data, "message": {"chat": {"id": chat_id}}}
    }))
    .unwrap()
}
