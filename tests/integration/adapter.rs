//! Two-phase adapter integration tests
//!
//! Drives `TwoPhaseAdapter` against a mock upstream:
//! - Message selection and protocol errors
//! - Phase ordering and failure propagation
//! - Streaming behavior and headers
//! - Concurrent independence

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use zbridge::adapter::{
    AdapterConfig, AdapterError, ChatAdapter, Phase, TwoPhaseAdapter, UnifiedMessage,
};
use zbridge::streaming::collect_answer;

use crate::common::{constants, test_adapter};
use crate::mocks::{MessageBodyMock, MockZreadServer, ZreadTestData};

fn conversation() -> Vec<UnifiedMessage> {
    vec![
        UnifiedMessage::user("A"),
        UnifiedMessage::assistant("B"),
        UnifiedMessage::user("C"),
    ]
}

#[tokio::test]
async fn test_latest_user_message_is_sent() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_success("talk-1", "glm-4.5").await;
    upstream
        .mock_message_sse("talk-1", &ZreadTestData::answer_stream(&["ok"]))
        .await;
    let adapter = test_adapter(&upstream, None);

    let response = adapter
        .chat_completion("glm-4.5", &conversation(), false)
        .await
        .expect("chat completion should succeed");

    assert_eq!(response.session_id(), "talk-1");
    assert_eq!(response.status(), 200);

    let sent = upstream.message_requests().await;
    assert_eq!(sent.len(), 1);
    let body: MessageBodyMock = sent[0].body_json().unwrap();
    assert_eq!(body.content, "C");
    assert_eq!(body.model, "glm-4.5");
    assert!(!body.stream);
}

#[tokio::test]
async fn test_no_user_message_is_protocol_error() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_success("talk-1", "glm-4.5").await;
    upstream.mock_message_echo().await;
    let adapter = test_adapter(&upstream, None);

    let messages = vec![
        UnifiedMessage::system("be brief"),
        UnifiedMessage::assistant("hello"),
    ];
    let err = adapter
        .chat_completion("glm-4.5", &messages, false)
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Protocol(_)));
    assert!(upstream.message_requests().await.is_empty());
    assert!(upstream.create_talk_requests().await.is_empty());
}

#[tokio::test]
async fn test_create_talk_failure_skips_message() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_error(500, "upstream exploded").await;
    upstream.mock_message_echo().await;
    let adapter = test_adapter(&upstream, None);

    let err = adapter
        .chat_completion("glm-4.5", &conversation(), false)
        .await
        .unwrap_err();

    match err {
        AdapterError::UpstreamStatus {
            phase,
            status,
            body,
        } => {
            assert_eq!(phase, Phase::CreateTalk);
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(upstream.create_talk_requests().await.len(), 1);
    assert!(upstream.message_requests().await.is_empty());
}

#[tokio::test]
async fn test_send_message_failure_surfaces_status() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_success("talk-orphan", "glm-4.5").await;
    upstream.mock_message_error(401, "token expired").await;
    let adapter = test_adapter(&upstream, None);

    let err = adapter
        .chat_completion("glm-4.5", &conversation(), true)
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::SendMessage));
    assert_eq!(err.upstream_status(), Some(401));
    assert!(matches!(
        err,
        AdapterError::UpstreamStatus { ref body, .. } if body == "token expired"
    ));

    // The session was opened and is not torn down
    assert_eq!(upstream.create_talk_requests().await.len(), 1);
    let sent = upstream.message_requests().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].url.path(),
        "/api/chat/completions/talk-orphan/message"
    );
}

#[tokio::test]
async fn test_malformed_session_is_parse_error() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_malformed().await;
    let adapter = test_adapter(&upstream, None);

    let err = adapter
        .chat_completion("glm-4.5", &conversation(), false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AdapterError::ResponseParse {
            phase: Phase::CreateTalk,
            ..
        }
    ));
    assert!(upstream.message_requests().await.is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    let config = AdapterConfig::new("http://127.0.0.1:1/api/chat/completions", "tok");
    let adapter = TwoPhaseAdapter::new(reqwest::Client::new(), &config).unwrap();

    let err = adapter
        .chat_completion("glm-4.5", &conversation(), false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AdapterError::Transport {
            phase: Phase::CreateTalk,
            ..
        }
    ));
}

#[tokio::test]
async fn test_session_model_defaults_to_caller_model() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_success("talk-1", "glm-4.5").await;
    upstream.mock_message_echo().await;
    let adapter = test_adapter(&upstream, None);

    adapter
        .chat_completion("glm-4.5-air", &conversation(), false)
        .await
        .unwrap();

    let created = upstream.create_talk_requests().await;
    let body: Value = created[0].body_json().unwrap();
    assert_eq!(body, json!({"model": "glm-4.5-air"}));
}

#[tokio::test]
async fn test_session_model_override() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_success("talk-1", "glm-4.5").await;
    upstream.mock_message_echo().await;
    let adapter = test_adapter(&upstream, Some("glm-4.5".to_string()));

    adapter
        .chat_completion("glm-4.5-air", &conversation(), false)
        .await
        .unwrap();

    let created: Value = upstream.create_talk_requests().await[0].body_json().unwrap();
    assert_eq!(created["model"], "glm-4.5");

    // The message send still carries the caller's model
    let sent: MessageBodyMock = upstream.message_requests().await[0].body_json().unwrap();
    assert_eq!(sent.model, "glm-4.5-air");
}

#[tokio::test]
async fn test_browser_headers_sent_on_both_phases() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_success("talk-1", "glm-4.5").await;
    upstream.mock_message_echo().await;
    let adapter = test_adapter(&upstream, None);

    adapter
        .chat_completion("glm-4.5", &conversation(), false)
        .await
        .unwrap();

    let requests = upstream.received_requests().await;
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let header = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        assert_eq!(
            header("authorization"),
            Some(format!("Bearer {}", constants::TEST_UPSTREAM_TOKEN))
        );
        assert_eq!(header("content-type").as_deref(), Some("application/json"));
        assert!(header("user-agent").is_some_and(|ua| ua.contains("Mozilla")));
        assert!(header("origin").is_some());
        assert!(header("referer").is_some_and(|r| r.ends_with('/')));
        assert_eq!(header("x-fe-version").as_deref(), Some("prod-fe-1.0.94"));
    }
}

#[tokio::test]
async fn test_accept_header_follows_stream_flag() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_sequential().await;
    upstream.mock_message_echo().await;
    let adapter = test_adapter(&upstream, None);

    adapter
        .chat_completion("glm-4.5", &conversation(), true)
        .await
        .unwrap();
    adapter
        .chat_completion("glm-4.5", &conversation(), false)
        .await
        .unwrap();

    let sent = upstream.message_requests().await;
    assert_eq!(sent.len(), 2);

    let streaming = sent
        .iter()
        .find(|r| r.body_json::<MessageBodyMock>().unwrap().stream)
        .expect("streaming send");
    let buffered = sent
        .iter()
        .find(|r| !r.body_json::<MessageBodyMock>().unwrap().stream)
        .expect("non-streaming send");

    assert_eq!(
        streaming.headers.get("accept").and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );
    assert_ne!(
        buffered.headers.get("accept").and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );

    // Session creation never asks for a stream
    for created in upstream.create_talk_requests().await {
        assert_ne!(
            created.headers.get("accept").and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );
    }
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let upstream = MockZreadServer::start().await;
    upstream.mock_create_talk_sequential().await;
    upstream.mock_message_echo().await;
    let adapter: Arc<dyn ChatAdapter> = Arc::new(test_adapter(&upstream, None));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let adapter = adapter.clone();
            tokio::spawn(async move {
                let question = format!("question-{}", i);
                let messages = vec![
                    UnifiedMessage::user("shared opener"),
                    UnifiedMessage::assistant("sure"),
                    UnifiedMessage::user(question.clone()),
                ];
                let response = adapter
                    .chat_completion("glm-4.5", &messages, false)
                    .await
                    .unwrap();
                let session = response.session_id().to_string();
                let answer = collect_answer(&response.text().await.unwrap());
                (question, session, answer)
            })
        })
        .collect();

    let mut sessions = Vec::new();
    for task in tasks {
        let (question, session, answer) = task.await.unwrap();
        assert_eq!(answer, format!("echo:{}:{}", session, question));
        sessions.push(session);
    }

    sessions.sort();
    sessions.dedup();
    assert_eq!(sessions.len(), 8);
    assert_eq!(upstream.create_talk_requests().await.len(), 8);
    assert_eq!(upstream.message_requests().await.len(), 8);
}

/// Read one HTTP/1.1 request (headers plus `content-length` body)
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

fn http_chunk(data: &str) -> String {
    format!("{:x}\r\n{}\r\n", data.len(), data)
}

#[tokio::test]
async fn test_streaming_response_is_incremental() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    // Upstream that holds the second frame until the client saw the first
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket
            .write_all(http_chunk("event:answer\ndata:{\"text\":\"first\"}\n\n").as_bytes())
            .await
            .unwrap();
        socket.flush().await.unwrap();

        release_rx.await.unwrap();

        socket
            .write_all(http_chunk("event:answer\ndata:{\"text\":\"second\"}\n\nevent:finish\ndata:{}\n\n").as_bytes())
            .await
            .unwrap();
        socket.write_all(b"0\r\n\r\n").await.unwrap();
        socket.flush().await.unwrap();

        request
    });

    let config = AdapterConfig::new(format!("http://{}/api/chat/completions", addr), "tok");
    let adapter = TwoPhaseAdapter::new(reqwest::Client::new(), &config).unwrap();

    let response = adapter
        .send_message("talk-live", "hello", "glm-4.5", true)
        .await
        .unwrap();
    assert!(response.is_event_stream());

    let mut stream = response.into_byte_stream();
    let first = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("first frame should arrive before the upstream finishes")
        .unwrap()
        .unwrap();
    assert!(String::from_utf8_lossy(&first).contains("first"));

    release_tx.send(()).unwrap();

    let mut rest = Vec::new();
    while let Some(chunk) = stream.next().await {
        rest.extend_from_slice(&chunk.unwrap());
    }
    assert!(String::from_utf8_lossy(&rest).contains("second"));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/chat/completions/talk-live/message"));
    assert!(request
        .lines()
        .any(|line| line.eq_ignore_ascii_case("accept: text/event-stream")));
}
