//! The client against a one-shot local HTTP responder.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vibecheck_core::{GenerationError, Generator, Message};
use vibecheck_provider::{OpenAiChatClient, ProviderConfig};

struct Captured {
    head: String,
    body: serde_json::Value,
}

/// Serve exactly one request with `status` and `reply`, returning what was received.
async fn serve_once(status: &'static str, reply: String) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let head_end = loop {
            let n = socket.read(&mut chunk).await.expect("read");
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length: usize = head
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.expect("read body");
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = serde_json::from_slice(&buf[head_end..head_end + content_length])
            .unwrap_or(serde_json::Value::Null);

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply}",
            reply.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();

        Captured { head, body }
    });

    (format!("http://{addr}/v1"), handle)
}

fn client(base_url: &str) -> OpenAiChatClient {
    OpenAiChatClient::new(
        ProviderConfig::default()
            .with_base_url(base_url)
            .with_api_key("sk-test")
            .with_timeout_secs(5),
    )
    .expect("client")
}

#[tokio::test]
async fn returns_first_choice_and_sends_expected_request() {
    let reply = serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": "<tool_call>\n{}\n</tool_call>"}}]
    })
    .to_string();
    let (base_url, server) = serve_once("200 OK", reply).await;

    let prompt = vec![Message::system("tools"), Message::user("weather?")];
    let text = client(&base_url)
        .generate(&prompt, "gpt-4o-mini")
        .await
        .expect("completion");
    assert_eq!(text, "<tool_call>\n{}\n</tool_call>");

    let captured = server.await.expect("server task");
    assert!(captured.head.starts_with("POST /v1/chat/completions "));
    assert!(captured
        .head
        .to_ascii_lowercase()
        .contains("authorization: bearer sk-test"));
    assert_eq!(captured.body["model"], "gpt-4o-mini");
    assert_eq!(captured.body["temperature"], 0.0);
    assert_eq!(captured.body["messages"][0]["role"], "system");
    assert_eq!(captured.body["messages"][1]["content"], "weather?");
}

#[tokio::test]
async fn error_status_is_a_generation_failure() {
    let (base_url, server) =
        serve_once("429 Too Many Requests", r#"{"error":"slow down"}"#.to_string()).await;

    let err = client(&base_url)
        .generate(&[Message::user("hi")], "gpt-4o")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::Status {
            status: 429,
            body: r#"{"error":"slow down"}"#.to_string(),
        }
    );
    server.await.expect("server task");
}

#[tokio::test]
async fn malformed_and_empty_bodies_are_failures() {
    let (base_url, server) = serve_once("200 OK", "not json".to_string()).await;
    let err = client(&base_url)
        .generate(&[Message::user("hi")], "gpt-4o")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Decode(_)));
    server.await.expect("server task");

    let (base_url, server) = serve_once("200 OK", r#"{"choices":[]}"#.to_string()).await;
    let err = client(&base_url)
        .generate(&[Message::user("hi")], "gpt-4o")
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::EmptyResponse);
    server.await.expect("server task");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client(&format!("http://{addr}/v1"))
        .generate(&[Message::user("hi")], "gpt-4o")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Transport(_)));
}
