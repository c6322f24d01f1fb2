//! Bot lifecycle: construction, worker start, outbound `send`, and cooperative stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use command_registry::CommandRegistry;
use dbot_core::{ChatId, CommandHandler, OutboundMessage, Transport, Update};
use dbot_telegram::TelegramTransport;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::config::BotConfig;
use crate::processor::{Processor, DEFAULT_MENU_COMMAND};
use crate::queue::WorkQueue;
use crate::workers::{run_processor, run_receiver, run_sender};

pub const DEFAULT_RECEIVER_BACKOFF: Duration = Duration::from_secs(3);

/// Outcome of [`TelegramBot::send`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    pub enqueued: usize,
    pub discarded: usize,
}

/// Command bot: a transport, a command registry, handlers, and the three pipeline workers.
pub struct TelegramBot {
    transport: Arc<dyn Transport>,
    registry: Arc<CommandRegistry>,
    handlers: Arc<[Arc<dyn CommandHandler>]>,
    default_chat: ChatId,
    menu_command: String,
    receiver_backoff: Duration,
    inbound: Arc<WorkQueue<Update>>,
    outbound: Arc<WorkQueue<OutboundMessage>>,
    shutdown: watch::Sender<bool>,
    stopped: AtomicBool,
    started: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TelegramBot {
    /// Builds the bot on a Telegram HTTP transport from `config`.
    pub fn new(
        config: &BotConfig,
        registry: Arc<CommandRegistry>,
        handlers: impl IntoIterator<Item = Arc<dyn CommandHandler>>,
    ) -> dbot_core::Result<Self> {
        let transport = TelegramTransport::new(config.telegram.clone())?;
        Ok(Self::with_transport(
            Arc::new(transport),
            config.chat_id.clone(),
            registry,
            handlers,
        )
        .with_menu_command(config.menu_command.clone())
        .with_receiver_backoff(config.receiver_backoff()))
    }

    /// Builds the bot on any transport (tests use an in-memory one).
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        default_chat: impl Into<ChatId>,
        registry: Arc<CommandRegistry>,
        handlers: impl IntoIterator<Item = Arc<dyn CommandHandler>>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            transport,
            registry,
            handlers: handlers.into_iter().collect(),
            default_chat: default_chat.into(),
            menu_command: DEFAULT_MENU_COMMAND.to_string(),
            receiver_backoff: DEFAULT_RECEIVER_BACKOFF,
            inbound: Arc::new(WorkQueue::new("inbound")),
            outbound: Arc::new(WorkQueue::new("outbound")),
            shutdown,
            stopped: AtomicBool::new(false),
            started: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_menu_command(mut self, menu_command: impl Into<String>) -> Self {
        self.menu_command = menu_command.into();
        self
    }

    /// Wait between failed polls.
    pub fn with_receiver_backoff(mut self, backoff: Duration) -> Self {
        self.receiver_backoff = backoff;
        self
    }

    /// Spawns the receiver, processor and sender. Must run inside a tokio runtime; a second call
    /// (or a call after [`stop`](Self::stop)) does nothing.
    #[instrument(skip(self), fields(default_chat = %self.default_chat))]
    pub fn start(&self) {
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        if self.is_stopped() {
            warn!("start called on a stopped bot");
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("bot already started");
            return;
        }

        let processor = Processor::new(
            self.registry.clone(),
            self.handlers.clone(),
            self.default_chat.clone(),
        )
        .with_menu_command(self.menu_command.clone());

        workers.push(tokio::spawn(run_receiver(
            self.transport.clone(),
            self.inbound.clone(),
            self.receiver_backoff,
            self.shutdown.subscribe(),
        )));
        workers.push(tokio::spawn(run_processor(
            processor,
            self.inbound.clone(),
            self.outbound.clone(),
        )));
        workers.push(tokio::spawn(run_sender(
            self.transport.clone(),
            self.outbound.clone(),
        )));
        info!(
            commands = self.registry.len(),
            handlers = self.handlers.len(),
            "Bot started"
        );
    }

    /// Enqueues a message object, or each object of an array, for delivery as-is.
    ///
    /// Anything else (and any array item that is not a valid message object) is discarded with a
    /// warning and counted in the report.
    pub fn send(&self, payload: Value) -> SendReport {
        let mut report = SendReport::default();
        match payload {
            Value::Array(items) => {
                for item in items {
                    self.enqueue_value(item, &mut report);
                }
            }
            other => self.enqueue_value(other, &mut report),
        }
        report
    }

    fn enqueue_value(&self, value: Value, report: &mut SendReport) {
        if !value.is_object() {
            warn!(payload = %value, "send payload is not a message object, discarded");
            report.discarded += 1;
            return;
        }
        match serde_json::from_value::<OutboundMessage>(value) {
            Ok(message) => {
                if self.send_message(message) {
                    report.enqueued += 1;
                } else {
                    report.discarded += 1;
                }
            }
            Err(e) => {
                warn!(error = %e, "send payload is not a valid message, discarded");
                report.discarded += 1;
            }
        }
    }

    /// Enqueues one message. `false` (with a warning) once the bot is stopped.
    pub fn send_message(&self, message: OutboundMessage) -> bool {
        if self.is_stopped() {
            warn!(chat_id = ?message.chat_id, "bot is stopped, message discarded");
            return false;
        }
        self.outbound.push(message);
        true
    }

    /// Enqueues the shutdown sentinel on both queues and stops the receiver. Only the first call
    /// has an effect.
    ///
    /// Messages queued ahead of the sentinel are still delivered: a running sender closes the
    /// transport when it exits. A bot that was never started closes it here.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inbound.shutdown();
        self.outbound.shutdown();
        self.shutdown.send_replace(true);
        // Taking the lock orders this check after any `start` already in progress.
        let started = {
            let _workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            self.started.load(Ordering::SeqCst)
        };
        if !started {
            self.transport.close();
        }
        info!(started, "Bot stopping");
    }

    /// Waits for the spawned workers to exit.
    pub async fn join(&self) {
        let workers: Vec<JoinHandle<()>> = {
            let mut guard = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "worker ended abnormally");
            }
        }
        info!("Bot stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn default_chat(&self) -> &ChatId {
        &self.default_chat
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn inbound_queue(&self) -> &Arc<WorkQueue<Update>> {
        &self.inbound
    }

    pub fn outbound_queue(&self) -> &Arc<WorkQueue<OutboundMessage>> {
        &self.outbound
    }
}
