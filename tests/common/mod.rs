//! Common test utilities for integration tests.
//!
//! Builds SSE bodies, wiremock responses and clients pointed at a
//! `MockServer`. Set `RUST_LOG=provider_stream=debug` to see the client's
//! logs.

#![allow(dead_code)]

use provider_stream::commands::ProviderClient;
use provider_stream::config::StreamConfig;
use tracing_subscriber::EnvFilter;
use wiremock::{MockServer, ResponseTemplate};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Encode `(event_type, data)` pairs as an SSE body. An empty event type
/// omits the `event:` line.
pub fn sse_body(frames: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (event, data) in frames {
        if !event.is_empty() {
            body.push_str(&format!("event: {}\n", event));
        }
        for line in data.split('\n') {
            body.push_str(&format!("data: {}\n", line));
        }
        body.push('\n');
    }
    body
}

/// `200 OK` with an event-stream body.
pub fn sse_response(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body.into())
}

/// `200 OK` with a JSON body.
pub fn json_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn client(server: &MockServer, config: StreamConfig) -> ProviderClient {
    init_tracing();
    ProviderClient::new(server.uri()).with_config(config)
}

/// Requests the server has seen so far.
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
