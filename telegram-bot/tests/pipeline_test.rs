//! End-to-end tests for [`telegram_bot::TelegramBot`] over an in-memory transport:
//! receiver offsets and backoff, FIFO delivery, `send` payload handling, and `stop`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use command_registry::{CommandRegistry, HelpHandler};
use common::mock_transport::{callback_update, text_update, MockTransport, PollScript};
use dbot_core::{ChatId, CommandHandler, OutboundMessage, Transport};
use serde_json::json;
use telegram_bot::{
    declare_greetings, ByeHandler, Envelope, HelloHandler, SendReport, TelegramBot,
    MAX_MESSAGE_LENGTH,
};
use tokio::sync::mpsc;

const CHAT: i64 = 42;
const DEFAULT_CHAT: i64 = 999;

fn build_bot(transport: Arc<MockTransport>) -> TelegramBot {
    let registry = Arc::new(CommandRegistry::new());
    declare_greetings(&registry, "/menu").unwrap();
    HelpHandler::declare(&registry, Some("/menu")).unwrap();
    let handlers: Vec<Arc<dyn CommandHandler>> = vec![
        Arc::new(HelloHandler),
        Arc::new(ByeHandler),
        Arc::new(HelpHandler::new(registry.clone())),
    ];
    TelegramBot::with_transport(transport, DEFAULT_CHAT, registry, handlers)
        .with_receiver_backoff(Duration::from_millis(20))
}

async fn next_delivery(rx: &mut mpsc::UnboundedReceiver<OutboundMessage>) -> OutboundMessage {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a delivery")
        .expect("transport dropped")
}

async fn stop_and_join(bot: &TelegramBot) {
    bot.stop();
    tokio::time::timeout(Duration::from_secs(2), bot.join())
        .await
        .expect("workers did not stop");
}

/// **Test: a full prompted conversation flows receiver → processor → sender in order.**
///
/// **Setup:** one poll batch with `/hello`, `/bonjour`, `Alice`, `30` from the same chat.
///
/// **Expected:** four deliveries to that chat, in input order.
#[tokio::test]
async fn test_conversation_end_to_end() {
    let (transport, mut delivered) = MockTransport::with_receiver(vec![PollScript::Updates(vec![
        text_update(1, CHAT, "/hello"),
        text_update(2, CHAT, "/bonjour"),
        text_update(3, CHAT, "Alice"),
        text_update(4, CHAT, "30"),
    ])]);
    let bot = build_bot(transport.clone());
    bot.start();

    let expected = [
        "Hello!!!!!",
        "What is your name?",
        "How old are you?",
        "Hello, Alice! At 30, you are an adult.",
    ];
    for text in expected {
        let message = next_delivery(&mut delivered).await;
        assert_eq!(message.text_str(), text);
        assert_eq!(message.chat_id, Some(ChatId::Id(CHAT)));
    }

    stop_and_join(&bot).await;
}

/// **Test: the receiver asks for updates after the highest id seen.**
///
/// **Setup:** batches [5, 7] then [8].
///
/// **Expected:** offsets None, 8, 9, ...
#[tokio::test]
async fn test_receiver_advances_offset() {
    let (transport, mut delivered) = MockTransport::with_receiver(vec![
        PollScript::Updates(vec![
            text_update(5, CHAT, "/hello"),
            text_update(7, CHAT, "/bye"),
        ]),
        PollScript::Updates(vec![callback_update(8, CHAT, "/hello")]),
    ]);
    let bot = build_bot(transport.clone());
    bot.start();

    for _ in 0..3 {
        next_delivery(&mut delivered).await;
    }
    // One more poll after the second batch proves the new offset was used.
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_and_join(&bot).await;

    let offsets = transport.offsets();
    assert_eq!(offsets[0], None);
    assert_eq!(offsets[1], Some(8));
    assert_eq!(offsets[2], Some(9));
}

/// **Test: a failed poll is retried after the backoff; later updates still arrive.**
#[tokio::test]
async fn test_receiver_backs_off_and_recovers() {
    let (transport, mut delivered) = MockTransport::with_receiver(vec![
        PollScript::Fail("network down"),
        PollScript::Fail("network down"),
        PollScript::Updates(vec![text_update(1, CHAT, "/bye")]),
    ]);
    let bot = build_bot(transport.clone());
    bot.start();

    let message = next_delivery(&mut delivered).await;
    assert_eq!(message.text_str(), "Bye!!!!!");
    assert!(transport.offsets().len() >= 3);

    stop_and_join(&bot).await;
}

/// **Test: a failed delivery is dropped and the sender moves on to the next message.**
#[tokio::test]
async fn test_sender_continues_after_failure() {
    let (transport, mut delivered) = MockTransport::with_receiver(Vec::new());
    transport.fail_next_deliveries(1);
    let bot = build_bot(transport.clone());
    bot.start();

    bot.send(json!([
        {"chat_id": CHAT, "text": "lost"},
        {"chat_id": CHAT, "text": "kept"}
    ]));
    let message = next_delivery(&mut delivered).await;
    assert_eq!(message.text_str(), "kept");

    stop_and_join(&bot).await;
}

#[tokio::test]
async fn test_sender_truncates_long_text() {
    let (transport, mut delivered) = MockTransport::with_receiver(Vec::new());
    let bot = build_bot(transport.clone());
    bot.start();

    bot.send(json!({"chat_id": CHAT, "text": "x".repeat(MAX_MESSAGE_LENGTH + 100)}));
    let message = next_delivery(&mut delivered).await;
    assert_eq!(message.text_str().chars().count(), MAX_MESSAGE_LENGTH);

    stop_and_join(&bot).await;
}

/// **Test: send of one object enqueues exactly that message.**
#[tokio::test]
async fn test_send_single_message() {
    let (transport, _delivered) = MockTransport::with_receiver(Vec::new());
    let bot = build_bot(transport);
    let payload = json!({
        "chat_id": CHAT,
        "text": "hi",
        "parse_mode": "HTML",
        "disable_notification": true
    });

    let report = bot.send(payload.clone());
    assert_eq!(
        report,
        SendReport {
            enqueued: 1,
            discarded: 0
        }
    );
    match bot.outbound_queue().try_pop() {
        Some(Envelope::Item(message)) => {
            assert_eq!(serde_json::to_value(&message).unwrap(), payload)
        }
        other => panic!("expected one message, got {:?}", other),
    }
    assert!(bot.outbound_queue().is_empty());
}

/// **Test: send of a list enqueues every object in order; non-objects are discarded.**
#[tokio::test]
async fn test_send_list_and_invalid_payloads() {
    let (transport, _delivered) = MockTransport::with_receiver(Vec::new());
    let bot = build_bot(transport);

    let report = bot.send(json!([
        {"chat_id": 1, "text": "first"},
        "not a message",
        {"chat_id": 2, "text": "second"},
        {"chat_id": 3, "text": "third"}
    ]));
    assert_eq!(report.enqueued, 3);
    assert_eq!(report.discarded, 1);

    let texts: Vec<String> = std::iter::from_fn(|| match bot.outbound_queue().try_pop() {
        Some(Envelope::Item(message)) => Some(message.text_str().to_string()),
        _ => None,
    })
    .collect();
    assert_eq!(texts, vec!["first", "second", "third"]);

    for invalid in [json!("text"), json!(12), json!(null), json!(true)] {
        let report = bot.send(invalid);
        assert_eq!(report.enqueued, 0);
        assert_eq!(report.discarded, 1);
    }
    assert!(bot.outbound_queue().is_empty());
}

/// **Test: stop puts a sentinel at the head of both (empty) queues and closes the transport once.**
#[tokio::test]
async fn test_stop_enqueues_sentinels_and_closes_once() {
    let (transport, _delivered) = MockTransport::with_receiver(Vec::new());
    let bot = build_bot(transport.clone());

    bot.stop();
    bot.stop();

    assert_eq!(bot.inbound_queue().try_pop(), Some(Envelope::Shutdown));
    assert_eq!(bot.outbound_queue().try_pop(), Some(Envelope::Shutdown));
    assert!(bot.inbound_queue().is_empty());
    assert!(bot.outbound_queue().is_empty());
    assert_eq!(transport.close_calls(), 1);
    assert!(bot.is_stopped());

    let report = bot.send(json!({"chat_id": CHAT, "text": "late"}));
    assert_eq!(report.discarded, 1);
    assert!(bot.outbound_queue().is_empty());
}

/// **Test: all three workers exit after stop on a running bot.**
#[tokio::test]
async fn test_running_bot_stops() {
    let (transport, _delivered) = MockTransport::with_receiver(Vec::new());
    let bot = build_bot(transport.clone());
    bot.start();
    tokio::time::sleep(Duration::from_millis(30)).await;

    stop_and_join(&bot).await;
    assert_eq!(transport.close_calls(), 1);
    assert!(transport.poll(None).await.is_err());
}

/// **Test: messages queued before stop are still delivered; the transport closes once after.**
#[tokio::test]
async fn test_stop_drains_queued_messages_before_close() {
    let (transport, mut delivered) = MockTransport::with_receiver(Vec::new());
    let bot = build_bot(transport.clone());
    for text in ["one", "two", "three"] {
        assert!(bot.send_message(OutboundMessage::text(text).with_chat_id(CHAT)));
    }

    bot.start();
    bot.stop();
    assert_eq!(transport.close_calls(), 0);
    tokio::time::timeout(Duration::from_secs(2), bot.join())
        .await
        .expect("workers did not stop");

    let mut texts = Vec::new();
    while let Ok(message) = delivered.try_recv() {
        texts.push(message.text_str().to_string());
    }
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(transport.close_calls(), 1);
}
