//! Integration tests for HttpApiClient against a canned HTTP server.
//!
//! These tests verify that the client:
//! - Treats 404 on the status endpoint as "no pipeline"
//! - Surfaces other non-success statuses with the server's message
//! - Accepts bare and `data`-wrapped bodies
//! - Sends the expected method, path, query and bearer token

use od_core::api::{ApiError, HttpApiClient, PipelineApi, TaskMessageApi};
use od_protocol::config_models::ApiSettings;
use od_protocol::message_models::SendMessageRequest;
use od_protocol::pipeline_models::{PipelineRunStatus, SyncType};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const STATUS_BODY: &str = r#"{"pipelineId":"pl-7","status":"IN_PROGRESS","currentStep":2,"totalSteps":5,"progress":40,"steps":[]}"#;
const WRAPPED_STATUS_BODY: &str = r#"{"data":{"pipelineId":"pl-7","status":"IN_PROGRESS","currentStep":2,"totalSteps":5,"progress":40,"steps":[]}}"#;

/// Answers each connection with the next queued `(status line, body)` and
/// records the raw request head.
struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    async fn start(responses: Vec<(&'static str, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let mut queue: VecDeque<_> = responses.into();

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Some((status, body)) = queue.pop_front() {
                let Ok((mut stream, _)) = listener.accept().await else { break };
                let head = read_request(&mut stream).await;
                recorded.lock().unwrap().push(head);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{addr}/api"),
            requests,
        }
    }

    fn client(&self) -> HttpApiClient {
        HttpApiClient::new(&ApiSettings {
            base_url: self.base_url.clone(),
            auth_token: Some("secret-token".to_string()),
            request_timeout_ms: 5_000,
        })
        .unwrap()
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read the request head and any body announced by Content-Length.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let body_len = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if !name.eq_ignore_ascii_case("content-length") {
                        return None;
                    }
                    value.trim().parse::<usize>().ok()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

#[tokio::test]
async fn test_status_not_found_is_no_pipeline() {
    let server = CannedServer::start(vec![("404 Not Found", r#"{"message":"no pipeline"}"#)]).await;

    let status = server
        .client()
        .get_pipeline_status("ch-1", SyncType::Full)
        .await;

    assert_eq!(status, Ok(None));
    let request = server.requests()[0].to_lowercase();
    assert!(request.starts_with("get /api/channels/ch-1/sync-pipeline?synctype=full "));
    assert!(request.contains("authorization: bearer secret-token"));
}

#[tokio::test]
async fn test_status_server_error_propagates() {
    let server =
        CannedServer::start(vec![("500 Internal Server Error", r#"{"message":"database down"}"#)])
            .await;

    let status = server
        .client()
        .get_pipeline_status("ch-1", SyncType::Initial)
        .await;

    assert_eq!(
        status,
        Err(ApiError::Http {
            status: 500,
            message: "database down".to_string(),
        })
    );
}

#[tokio::test]
async fn test_status_wrapped_body_decodes() {
    let server =
        CannedServer::start(vec![("200 OK", WRAPPED_STATUS_BODY), ("200 OK", STATUS_BODY)]).await;
    let api = server.client();

    let first = api.get_pipeline_status("ch-1", SyncType::Initial).await.unwrap().unwrap();
    let second = api.get_pipeline_status("ch-1", SyncType::Initial).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.pipeline_id, "pl-7");
    assert_eq!(first.status, PipelineRunStatus::InProgress);
    assert!(first.steps.is_empty());
}

#[tokio::test]
async fn test_action_not_found_is_an_error() {
    let server = CannedServer::start(vec![("200 OK", ""), ("404 Not Found", "")]).await;
    let api = server.client();

    assert_eq!(api.pause_pipeline("pl-7").await, Ok(()));
    assert_eq!(api.resume_pipeline("pl-gone").await, Err(ApiError::NotFound));

    let requests = server.requests();
    assert!(requests[0].starts_with("POST /api/sync-pipelines/pl-7/pause "));
    assert!(requests[1].starts_with("POST /api/sync-pipelines/pl-gone/resume "));
}

#[tokio::test]
async fn test_send_message_posts_client_key() {
    let server = CannedServer::start(vec![(
        "201 Created",
        r#"{"id":"m-1","senderId":"u-1","senderName":"Ana","content":"hello","timestamp":"2026-04-02T08:00:00Z","isFromCurrentUser":true}"#,
    )])
    .await;
    let request = SendMessageRequest::new("hello");

    let message = server.client().send_message("T-3", &request).await.unwrap();

    assert_eq!(message.id, "m-1");
    assert!(message.is_from_current_user);
    let raw = &server.requests()[0];
    assert!(raw.starts_with("POST /api/tasks/T-3/messages "));
    assert!(raw.contains(&request.client_message_id.to_string()));
}
