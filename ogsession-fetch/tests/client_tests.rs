//! Integration tests for the rate-limited client against a mock server.

use flate2::Compression;
use flate2::write::GzEncoder;
use ogsession_fetch::{ClientSettings, HttpError, Method, RateLimitedClient};
use std::io::Write;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn test_get_buffers_body_and_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(2)
        .mount(&server)
        .await;

    let client = RateLimitedClient::new().unwrap();
    let cancel = CancellationToken::new();
    let url = format!("{}/api/servers", server.uri());

    let first = client.get(&url, &cancel).await.unwrap();
    assert_eq!(first.status, 200);
    assert_eq!(first.text(), "[]");
    // Buffered bodies can be read again.
    assert_eq!(first.bytes(), b"[]");

    client.get(&url, &cancel).await.unwrap();

    let stats = client.stats_snapshot();
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.bytes_downloaded, 4);
}

#[tokio::test]
async fn test_gzip_body_is_decoded() {
    let server = MockServer::start().await;
    let payload = b"<html><meta name=\"ogame-version\" content=\"12.0.0\"></html>";
    Mock::given(method("GET"))
        .and(path("/game/index.php"))
        .and(header("accept-encoding", "gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(gzip(payload)),
        )
        .mount(&server)
        .await;

    let client = RateLimitedClient::new().unwrap();
    let response = client
        .get(&format!("{}/game/index.php", server.uri()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.bytes(), payload);
}

#[tokio::test]
async fn test_post_json_counts_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/challenge"))
        .and(body_json(serde_json::json!({"answer": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"solved\"}"))
        .mount(&server)
        .await;

    let client = RateLimitedClient::new().unwrap();
    let builder = client
        .request(Method::POST, &format!("{}/challenge", server.uri()))
        .json(&serde_json::json!({"answer": 2}));
    let response = client.execute(builder, &CancellationToken::new()).await.unwrap();

    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["status"], "solved");
    assert_eq!(client.stats_snapshot().bytes_uploaded, 12);
}

#[tokio::test]
async fn test_rate_limit_spaces_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client =
        RateLimitedClient::with_settings(ClientSettings::default().with_rate(10).with_burst(1))
            .unwrap();
    let cancel = CancellationToken::new();
    let start = Instant::now();
    for _ in 0..4 {
        client.get(&server.uri(), &cancel).await.unwrap();
    }

    // One burst token, then three more at 10/s.
    assert!(start.elapsed() >= Duration::from_millis(250));
}

#[tokio::test]
async fn test_cancel_interrupts_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let client = RateLimitedClient::new().unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client.get(&server.uri(), &cancel).await.unwrap_err();
    assert!(matches!(err, HttpError::Cancelled));
}

#[tokio::test]
async fn test_already_cancelled_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = RateLimitedClient::with_settings(ClientSettings::default().with_rate(1)).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.get(&server.uri(), &cancel).await.unwrap_err();
    assert!(matches!(err, HttpError::Cancelled));
    assert_eq!(client.stats_snapshot().requests, 0);
}
