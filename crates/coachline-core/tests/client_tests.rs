//! HTTP-level tests for the chat client against a mock backend.

use coachline_core::classify::{QUOTA_MESSAGE, RATE_LIMIT_MESSAGE};
use coachline_core::client::INVALID_REQUEST_MESSAGE;
use coachline_core::{
    BaseUrl, ChatApi, ChatClient, ClientError, Conversation, ErrorKind, Phase, Role,
    CONNECTIVITY_MESSAGE,
};
use mockito::{Matcher, Server};
use serde_json::json;

fn client_for(server: &Server) -> ChatClient {
    ChatClient::new(BaseUrl::Explicit(server.url()))
}

/// A local address nothing is listening on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn posts_message_as_json_and_returns_reply() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "message": "hi there" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"reply": "Hello!"}"#)
        .create_async()
        .await;

    let response = client_for(&server).send("hi there").await.unwrap();
    assert_eq!(response.reply, "Hello!");
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_reply_is_valid() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(r#"{"reply": ""}"#)
        .create_async()
        .await;

    let response = client_for(&server).send("anything").await.unwrap();
    assert_eq!(response.reply, "");
}

#[tokio::test]
async fn error_detail_is_classified() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Error code: 429 - insufficient_quota"}"#)
        .create_async()
        .await;

    let err = client_for(&server).send("hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuotaExceeded);
    assert_eq!(err.message(), QUOTA_MESSAGE);
}

#[tokio::test]
async fn unparsable_error_body_synthesizes_status_detail() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body("<html>Internal Server Error</html>")
        .create_async()
        .await;

    let err = client_for(&server).send("hi").await.unwrap_err();
    assert_eq!(err, ClientError::Backend("HTTP error! status: 500".into()));
}

#[tokio::test]
async fn unclassified_detail_passes_through() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body(r#"{"detail": "random backend failure xyz"}"#)
        .create_async()
        .await;

    let err = client_for(&server).send("hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(err.message(), "random backend failure xyz");
}

#[tokio::test]
async fn malformed_success_body_is_a_backend_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(r#"{"answer": "wrong field"}"#)
        .create_async()
        .await;

    let err = client_for(&server).send("hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(err.message().starts_with("Invalid response from backend"));
}

#[tokio::test]
async fn unreachable_backend_is_a_connectivity_error() {
    let client = ChatClient::new(BaseUrl::Explicit(closed_port_url()));

    let err = client.send("hi").await.unwrap_err();
    assert!(err.is_connectivity());
    assert_eq!(err.message(), CONNECTIVITY_MESSAGE);
    assert_ne!(err.message(), "HTTP error! status: 500");
}

#[tokio::test]
async fn dropped_connection_is_a_connectivity_error() {
    // Accepts every connection and closes it without answering.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let client = ChatClient::new(BaseUrl::Explicit(format!("http://127.0.0.1:{}", port)));
    let err = client.send("hi").await.unwrap_err();
    assert!(err.is_connectivity(), "got {:?}", err);
    assert_eq!(err.message(), CONNECTIVITY_MESSAGE);
}

#[tokio::test]
async fn malformed_base_url_never_leaks_transport_text() {
    let client = ChatClient::new(BaseUrl::Explicit("not a url".into()));
    let err = client.send("hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(err.message(), INVALID_REQUEST_MESSAGE);
}

#[tokio::test]
async fn health_probe() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(200)
        .with_body(r#"{"status": "ok"}"#)
        .create_async()
        .await;

    assert!(client_for(&server).health().await.is_ok());

    let offline = ChatClient::new(BaseUrl::Explicit(closed_port_url()));
    assert!(offline.health().await.unwrap_err().is_connectivity());
}

#[tokio::test]
async fn health_probe_rejects_bad_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(503)
        .create_async()
        .await;

    let err = client_for(&server).health().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
}

#[tokio::test]
async fn conversation_end_to_end_success() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .match_body(Matcher::Json(json!({ "message": "I'm stressed about exams" })))
        .with_status(200)
        .with_body(r#"{"reply": "Let's break that down together."}"#)
        .create_async()
        .await;
    let client = client_for(&server);

    let mut convo = Conversation::new();
    assert_eq!(convo.messages().len(), 1);
    assert_eq!(convo.phase(), Phase::Idle);

    convo.set_input("I'm stressed about exams");
    let text = convo.begin_turn().unwrap();
    assert_eq!(convo.messages().len(), 2);
    assert_eq!(convo.phase(), Phase::Sending);

    convo.complete_turn(client.send(&text).await);
    assert_eq!(convo.messages().len(), 3);
    let last = convo.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, "Let's break that down together.");
    assert_eq!(convo.phase(), Phase::Idle);
}

#[tokio::test]
async fn conversation_end_to_end_rate_limited() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/chat")
        .with_status(429)
        .with_body(r#"{"detail": "rate limit exceeded"}"#)
        .create_async()
        .await;
    let client = client_for(&server);

    let mut convo = Conversation::new();
    convo.set_input("hello");
    assert!(convo.submit(&client).await);

    assert_eq!(convo.messages().len(), 3);
    assert_eq!(convo.phase(), Phase::Failed);
    assert_eq!(convo.last_error(), Some(RATE_LIMIT_MESSAGE));
    let last = convo.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert!(last.content.contains(RATE_LIMIT_MESSAGE));
}

#[tokio::test]
async fn conversation_survives_unreachable_backend() {
    let client = ChatClient::new(BaseUrl::Explicit(closed_port_url()));
    let mut convo = Conversation::new();

    convo.set_input("anyone there?");
    convo.submit(&client).await;
    assert_eq!(convo.messages().len(), 3);
    assert_eq!(convo.last_error(), Some(CONNECTIVITY_MESSAGE));

    // Still interactive afterwards.
    convo.set_input("retrying by hand");
    assert!(convo.begin_turn().is_some());
    assert!(convo.last_error().is_none());
}
