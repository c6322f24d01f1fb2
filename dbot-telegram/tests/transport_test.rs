//! TelegramTransport against a mockito server: getUpdates parsing and query, retry policy,
//! sendMessage body, and close semantics.

use dbot_core::{ChatId, InboundEvent, OutboundMessage, Transport};
use dbot_telegram::{TelegramConfig, TelegramTransport};
use mockito::Matcher;
use serde_json::json;

const TOKEN: &str = "test_token";

fn transport_for(server: &mockito::Server) -> TelegramTransport {
    let mut config = TelegramConfig::with_token(TOKEN.to_string());
    config.telegram_api_url = Some(server.url());
    config.backoff_factor = 0.0;
    TelegramTransport::new(config).unwrap()
}

/// **Test: poll sends timeout and offset, and parses text and callback updates.**
#[tokio::test]
async fn test_poll_parses_updates() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/bottest_token/getUpdates")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("timeout".into(), "30".into()),
            Matcher::UrlEncoded("offset".into(), "5".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "ok": true,
                "result": [
                    {"update_id": 5, "message": {"chat": {"id": 42}, "text": "/hello"}},
                    {"update_id": 6, "callback_query": {"message": {"chat": {"id": 42}}, "data": "/bye"}}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let transport = transport_for(&server);
    let updates = transport.poll(Some(5)).await.unwrap();

    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].update_id, 5);
    assert_eq!(
        updates[0].classify(),
        InboundEvent::Text {
            chat_id: ChatId::Id(42),
            text: "/hello".to_string()
        }
    );
    assert_eq!(
        updates[1].classify(),
        InboundEvent::Callback {
            chat_id: ChatId::Id(42),
            data: "/bye".to_string()
        }
    );
    mock.assert_async().await;
}

/// **Test: an entry whose body does not parse is kept as a bare update; one without an id is
/// dropped; the rest of the batch survives.**
#[tokio::test]
async fn test_poll_keeps_id_of_malformed_update() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/bottest_token/getUpdates")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "ok": true,
                "result": [
                    {"no_update_id": true},
                    {"update_id": 9, "message": {"chat": {"id": 1}, "text": "hi"}},
                    {"update_id": 10, "message": {"chat": {"id": "oops"}, "text": "hi"}}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let transport = transport_for(&server);
    let updates = transport.poll(None).await.unwrap();
    let ids: Vec<i64> = updates.iter().map(|u| u.update_id).collect();
    assert_eq!(ids, vec![9, 10]);
    assert_eq!(
        updates[1].classify(),
        InboundEvent::Unsupported { chat_id: None }
    );
}

/// **Test: poll retries 502 up to max_retries, then fails.**
///
/// **Expected:** 1 + 3 requests reach the server; the error is a transport error.
#[tokio::test]
async fn test_poll_retries_transient_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/bottest_token/getUpdates")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body(json!({"ok": false, "description": "Bad Gateway"}).to_string())
        .expect(4)
        .create_async()
        .await;

    let transport = transport_for(&server);
    let err = transport.poll(None).await.unwrap_err();
    assert!(err.to_string().contains("Bad Gateway"), "{}", err);
    mock.assert_async().await;
}

/// **Test: a non-transient status (409) is not retried.**
#[tokio::test]
async fn test_poll_does_not_retry_conflict() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/bottest_token/getUpdates")
        .match_query(Matcher::Any)
        .with_status(409)
        .with_body(json!({"ok": false, "description": "Conflict"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let transport = transport_for(&server);
    assert!(transport.poll(None).await.is_err());
    mock.assert_async().await;
}

/// **Test: deliver posts the message as JSON and returns the result object.**
#[tokio::test]
async fn test_deliver_posts_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/bottest_token/sendMessage")
        .match_body(Matcher::PartialJson(json!({
            "chat_id": 42,
            "text": "Hello!",
            "parse_mode": "Markdown"
        })))
        .with_status(200)
        .with_body(json!({"ok": true, "result": {"message_id": 7}}).to_string())
        .expect(1)
        .create_async()
        .await;

    let transport = transport_for(&server);
    let message = OutboundMessage::text("Hello!")
        .with_chat_id(ChatId::Id(42))
        .with_parse_mode("Markdown");
    let ack = transport.deliver(&message).await.unwrap();
    assert_eq!(ack["message_id"], 7);
    mock.assert_async().await;
}

/// **Test: sendMessage is not re-posted on a 500 (the server may have accepted it).**
#[tokio::test]
async fn test_deliver_does_not_retry_server_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/bottest_token/sendMessage")
        .with_status(500)
        .with_body(json!({"ok": false, "description": "Internal Server Error"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let transport = transport_for(&server);
    let message = OutboundMessage::text("x").with_chat_id(ChatId::Id(1));
    assert!(transport.deliver(&message).await.is_err());
    mock.assert_async().await;
}

/// **Test: after close, poll and deliver fail without reaching the server; close is idempotent.**
#[tokio::test]
async fn test_closed_transport_rejects_calls() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/bottest_token/getUpdates")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let transport = transport_for(&server);
    transport.close();
    transport.close();
    assert!(transport.is_closed());

    let err = transport.poll(None).await.unwrap_err();
    assert!(err.to_string().contains("closed"));
    let message = OutboundMessage::text("x").with_chat_id(ChatId::Id(1));
    assert!(transport.deliver(&message).await.is_err());
    mock.assert_async().await;
}
