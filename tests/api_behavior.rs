use std::sync::Arc;
use std::time::Duration;

use audiograb_core::{FallbackChain, FetchConfig, MediaSource, ProviderId};
use audiograb_tests::{StubOutcome, StubSource};
use audiograb_web::{router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

fn app_with(sources: Vec<Arc<dyn MediaSource>>) -> (AppState, axum::Router) {
    let config = FetchConfig::default();
    let chain = FallbackChain::new(sources, Duration::from_secs(5));
    let state = AppState::with_chain(config, chain);
    (state.clone(), router(state))
}

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("infallible service")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    serde_json::from_slice(&bytes).expect("body is json")
}

#[tokio::test]
async fn missing_video_id_is_a_400_with_the_contract_message() {
    let (_, app) = app_with(vec![]);

    for uri in ["/api/transcode", "/api/transcode?videoId="] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Missing 'videoId' parameter");
    }
}

#[tokio::test]
async fn malformed_video_id_is_a_400() {
    let (state, app) = app_with(vec![]);

    let response = get(&app, "/api/transcode?videoId=abc%22def").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.gate.in_flight(), 0);
}

#[tokio::test]
async fn full_gate_is_a_503_with_retry_after() {
    let (state, app) = app_with(vec![StubSource::new(
        ProviderId::Innertube,
        StubOutcome::Failure("should not run"),
    )]);

    let held: Vec<_> = (0..state.gate.max_concurrent())
        .map(|_| state.gate.try_admit().expect("filling the gate"))
        .collect();

    let response = get(&app, "/api/transcode?videoId=dQw4w9WgXcQ").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok()),
        Some("10")
    );

    let body = json_body(response).await;
    assert_eq!(body["success"], false);

    drop(held);
    assert_eq!(state.gate.in_flight(), 0);
}

#[tokio::test]
async fn third_source_success_streams_bytes_with_exact_headers() {
    let payload = vec![0xAB_u8; 1024];
    let first = StubSource::new(ProviderId::Innertube, StubOutcome::Failure("one down"));
    let second = StubSource::new(ProviderId::Direct, StubOutcome::Failure("two down"));
    let third = StubSource::new(
        ProviderId::Converter,
        StubOutcome::Success {
            bytes: payload.clone(),
            media_type: "audio/mpeg",
        },
    );
    let (state, app) = app_with(vec![first, second, third.clone()]);

    let response = get(&app, "/api/transcode?videoId=dQw4w9WgXcQ").await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers["content-type"], "audio/mpeg");
    assert_eq!(headers["content-length"], "1024");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"dQw4w9WgXcQ.mp3\""
    );
    assert_eq!(headers["cache-control"], "public, max-age=86400");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    assert_eq!(bytes.as_ref(), payload.as_slice());

    assert_eq!(third.calls(), 1);
    assert_eq!(state.gate.in_flight(), 0);
}

#[tokio::test]
async fn exhausted_chain_is_a_500_listing_every_failure_in_order() {
    let (state, app) = app_with(vec![
        StubSource::new(ProviderId::Innertube, StubOutcome::Failure("primary broke")),
        StubSource::new(ProviderId::Direct, StubOutcome::Failure("direct broke")),
        StubSource::new(ProviderId::Ytdlp, StubOutcome::Failure("cli broke")),
    ]);

    let response = get(&app, "/api/transcode?videoId=dQw4w9WgXcQ").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["errorType"], "AllSourcesFailed");
    assert!(body["timestamp"].is_string());

    let message = body["message"].as_str().expect("message is a string");
    let first = message.find("primary broke").expect("first present");
    let second = message.find("direct broke").expect("second present");
    let third = message.find("cli broke").expect("third present");
    assert!(first < second && second < third);

    assert_eq!(state.gate.in_flight(), 0);
}

#[tokio::test]
async fn filename_extension_follows_the_declared_media_type() {
    let (_, app) = app_with(vec![StubSource::new(
        ProviderId::Innertube,
        StubOutcome::Success {
            bytes: vec![1, 2, 3],
            media_type: "audio/webm",
        },
    )]);

    let response = get(&app, "/api/transcode?videoId=abc123").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"abc123.webm\""
    );
}

#[tokio::test]
async fn status_endpoint_reports_the_gate() {
    let (state, app) = app_with(vec![]);
    let _permit = state.gate.try_admit().expect("gate is empty");

    let response = get(&app, "/api/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["in_flight"], 1);
    assert_eq!(body["max_concurrent"], 5);
}
