//! StudioClient against a canned local HTTP responder.

use cukemirror_protocol::StudioCredentials;
use cukemirror_upstream::{StudioClient, StudioSource, UpstreamError};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A request as seen by the responder: request line plus lowercased headers.
#[derive(Debug)]
struct SeenRequest {
    line: String,
    headers: Vec<(String, String)>,
}

impl SeenRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Serve one canned response per entry, then stop.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<SeenRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let base_url = format!("http://127.0.0.1:{}/api", listener.local_addr().unwrap().port());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let mut headers = Vec::new();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
                if let Some((k, v)) = header.trim_end().split_once(':') {
                    headers.push((k.trim().to_lowercase(), v.trim().to_string()));
                }
            }
            seen.push(SeenRequest {
                line: line.trim_end().to_string(),
                headers,
            });

            let response = format!(
                "HTTP/1.1 {status} Canned\r\nContent-Type: application/vnd.api+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        seen
    });

    (base_url, handle)
}

fn credentials() -> StudioCredentials {
    StudioCredentials {
        email: "qa@example.com".to_string(),
        client_id: "client-1".to_string(),
        access_token: "token-1".to_string(),
    }
}

fn client(base_url: &str) -> StudioClient {
    StudioClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_projects_request_shape() {
    let (base_url, server) = serve(vec![(
        200,
        r#"{"data":[{"type":"projects","id":"42","attributes":{"name":"Checkout"}}]}"#,
    )]);

    let projects = client(&base_url).fetch_projects(&credentials()).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Checkout");

    let seen = server.join().unwrap();
    assert_eq!(seen[0].line, "GET /api/projects HTTP/1.1");
    assert_eq!(seen[0].header("accept"), Some("application/vnd.api+json; version=1"));
    assert_eq!(seen[0].header("access-token"), Some("token-1"));
    assert_eq!(seen[0].header("client"), Some("client-1"));
    assert_eq!(seen[0].header("uid"), Some("qa@example.com"));
}

#[tokio::test]
async fn test_folders_and_scenarios_paths() {
    let (base_url, server) = serve(vec![
        (
            200,
            r#"{"data":[{"type":"folders","id":"2","attributes":{"name":"Child","parent-id":1}}]}"#,
        ),
        (
            200,
            r#"{"data":[{"type":"scenarios","id":"s1","attributes":{"name":"Login","folder-id":2},
                "relationships":{"tags":{"data":[{"type":"tags","id":"t1"}]}}}],
                "included":[{"type":"tags","id":"t1","attributes":{"key":"type","value":"smoke"}}]}"#,
        ),
    ]);
    let client = client(&base_url);

    let folders = client.fetch_folders(&credentials(), 7).await.unwrap();
    assert_eq!(folders[0].parent_id.as_deref(), Some("1"));

    let scenarios = client.fetch_scenarios(&credentials(), 7).await.unwrap();
    assert_eq!(scenarios[0].project_id, 7);
    assert_eq!(scenarios[0].tags[0].value, "smoke");

    let seen = server.join().unwrap();
    assert_eq!(seen[0].line, "GET /api/projects/7/folders HTTP/1.1");
    assert_eq!(seen[1].line, "GET /api/projects/7/scenarios?include=tags HTTP/1.1");
}

#[tokio::test]
async fn test_non_success_status_carries_body() {
    let (base_url, server) = serve(vec![(401, r#"{"errors":["bad token"]}"#)]);

    let err = client(&base_url)
        .fetch_folders(&credentials(), 1)
        .await
        .unwrap_err();

    match err {
        UpstreamError::Status { status, ref body } => {
            assert_eq!(status, 401);
            assert!(body.contains("bad token"));
        }
        other => panic!("expected status error, got {other}"),
    }
    server.join().unwrap();
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (base_url, server) = serve(vec![(200, "<html>maintenance</html>")]);

    let err = client(&base_url)
        .fetch_scenarios(&credentials(), 1)
        .await
        .unwrap_err();

    assert!(err.is_decode(), "unexpected error: {err}");
    assert_eq!(err.status(), None);
    server.join().unwrap();
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Bind then drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = client(&format!("http://127.0.0.1:{port}/api"))
        .fetch_projects(&credentials())
        .await
        .unwrap_err();

    assert!(matches!(err, UpstreamError::Unavailable(_)));
}
