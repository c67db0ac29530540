//! Command-line client and poller against a fake proxy, and end to end
//! through the real proxy router.

mod helpers;

use helpers::*;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use video_gen_proxy::models::generation::GenerationRequest;
use video_gen_proxy::models::prediction::PredictionStatus;
use video_gen_proxy::services::poller::{run_generation, PollConfig, PollError};
use video_gen_proxy::services::proxy_client::{ClientError, ProxyClient};

fn request() -> GenerationRequest {
    GenerationRequest {
        width: 1024,
        height: 576,
        duration: 30,
        description: "Team lifting the trophy in the rain".to_string(),
    }
}

fn fast_polling() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(10),
        max_polls: Some(50),
    }
}

#[tokio::test]
async fn test_generate_video_posts_form() {
    let proxy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-video"))
        .and(body_json(generation_form()))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_json("p-1", "starting", None)))
        .expect(1)
        .mount(&proxy)
        .await;

    let client = ProxyClient::new(&format!("{}/api", proxy.uri()));
    let prediction = client.generate_video(&request()).await.unwrap();

    assert_eq!(prediction.id, "p-1");
    assert_eq!(prediction.status, PredictionStatus::Starting);
    assert!(prediction.output.is_none());
}

#[tokio::test]
async fn test_proxy_error_message_is_surfaced() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/check-status/p-1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "API key is missing"})))
        .mount(&proxy)
        .await;

    let client = ProxyClient::new(&format!("{}/api/", proxy.uri()));
    let err = client.check_status("p-1").await.unwrap_err();

    assert!(matches!(err, ClientError::Api { status, .. } if status.as_u16() == 500));
    assert_eq!(err.to_string(), "API error: API key is missing");
}

#[tokio::test]
async fn test_unreachable_proxy() {
    let client = ProxyClient::new(&format!("{UNREACHABLE}/api"));
    let err = client.generate_video(&request()).await.unwrap_err();

    assert!(matches!(err, ClientError::NoResponse(_)));
    assert_eq!(
        err.to_string(),
        "Network error: No response from server. Please check your internet connection."
    );
}

#[tokio::test]
async fn test_run_generation_against_fake_proxy() {
    let proxy = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_json("p-7", "starting", None)))
        .mount(&proxy)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/check-status/p-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_json("p-7", "processing", None)))
        .up_to_n_times(3)
        .mount(&proxy)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/check-status/p-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prediction_json(
            "p-7",
            "succeeded",
            Some("https://replicate.delivery/p-7.mp4"),
        )))
        .mount(&proxy)
        .await;

    let client = ProxyClient::new(&format!("{}/api", proxy.uri()));
    let mut updates = Vec::new();
    let video = run_generation(&client, &request(), &fast_polling(), |p| updates.push(p.clone()))
        .await
        .unwrap();

    assert_eq!(video.id, "p-7");
    assert_eq!(video.url, "https://replicate.delivery/p-7.mp4");

    let percents: Vec<u8> = updates.iter().map(|p| p.percent).collect();
    assert_eq!(percents, vec![5, 10, 20, 21, 22, 23, 100]);
    assert_eq!(updates.last().unwrap().message, "Video generated successfully!");
}

#[tokio::test]
async fn test_end_to_end_through_proxy() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(prediction_json("e2e", "starting", None)))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/predictions/e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "e2e",
            "status": "failed",
            "output": null,
            "error": "NSFW content detected"
        })))
        .mount(&upstream)
        .await;

    let app = test_router(&upstream.uri(), Some(TEST_TOKEN), true);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = ProxyClient::new(&format!("http://{addr}/api"));
    let err = run_generation(&client, &request(), &fast_polling(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, PollError::Failed(ref m) if m == "NSFW content detected"));
}
