use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use edge_analytics_proxy::{
    api::{router, run_query, ProxyState},
    client::HttpVendorClient,
    credentials::Credentials,
    models::TrafficQuery,
    request::ResolutionMode,
    ProxyError,
};
use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

fn state_for(server: &MockServer) -> ProxyState {
    let client = HttpVendorClient::new(server.base_url()).unwrap();
    ProxyState::new(
        Some(Credentials::new("LTAIexample", "secret-example")),
        Arc::new(client),
        "1036556791122480",
    )
}

#[tokio::test]
async fn signed_time_series_query_reaches_vendor_and_is_normalized() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/")
                .header("content-type", "application/json")
                .query_param("Action", "DescribeSiteTimeSeriesData")
                .query_param("Fields", r#"[{"FieldName":"Requests","Dimension":["ALL"]}]"#)
                .query_param("Metric", "ALL")
                .query_param("SignatureMethod", "HMAC-SHA1")
                .query_param("SignatureVersion", "1.0")
                .query_param("Version", "2024-09-10")
                .query_param("SiteId", "1036556791122480")
                .query_param("StartTime", "2025-01-01T00:00:00Z")
                .query_param_exists("SignatureNonce")
                .query_param_exists("Timestamp")
                .query_param_exists("Signature");
            then.status(200).json_body(json!({
                "RequestId": "req-1",
                "SummarizedData": [{ "Value": 42 }],
                "Data": [{
                    "DetailData": [
                        { "Value": 40, "TimeStamp": "2025-01-01T00:00:00Z" },
                        { "Value": 2, "TimeStamp": "2025-01-01T01:00:00Z" }
                    ]
                }]
            }));
        })
        .await;

    let query = TrafficQuery {
        metric: Some("l7Flow_request".to_string()),
        start_time: Some("2025-01-01T00:00:00Z".to_string()),
        ..Default::default()
    };
    let mode = ResolutionMode::Mapped {
        default_site_id: "1036556791122480".to_string(),
    };
    let body = assert_ok!(run_query(&state_for(&server), &query, &mode).await);

    mock.assert_async().await;
    assert_eq!(
        body,
        json!({
            "RequestId": "req-1",
            "Data": [{
                "TypeValue": [{
                    "MetricName": "l7Flow_request",
                    "Sum": 42,
                    "Detail": [
                        { "Value": 40, "Timestamp": 1_735_689_600 },
                        { "Value": 2, "Timestamp": 1_735_693_200 }
                    ]
                }]
            }]
        })
    );
}

#[tokio::test]
async fn vendor_rejection_is_surfaced_with_raw_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(400)
                .body(r#"{"Code":"IncompleteSignature","Message":"The request signature does not conform"}"#);
        })
        .await;

    let query = TrafficQuery {
        metric: Some("l7Flow_flux".to_string()),
        ..Default::default()
    };
    let mode = ResolutionMode::Passthrough;
    let err = assert_err!(run_query(&state_for(&server), &query, &mode).await);

    mock.assert_async().await;
    match err {
        ProxyError::Upstream { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("IncompleteSignature"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn router_serves_top_n_query_end_to_end() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/")
                .query_param("Action", "DescribeSiteTopData")
                .query_param("Metric", "ClientRequestHost")
                .query_param("Limit", "3")
                .query_param("SiteId", "site-7");
            then.status(200).json_body(json!({
                "Data": [{
                    "DetailData": [
                        { "DimensionValue": "a.example.com", "Value": 30 },
                        { "DimensionValue": "b.example.com", "Value": 12 }
                    ]
                }]
            }));
        })
        .await;

    let app = router(state_for(&server));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/traffic?metric=l7Flow_outFlux_domain&Limit=3&siteId=site-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    mock.assert_async().await;
    assert_eq!(
        body,
        json!({
            "Data": [{
                "DetailData": [
                    { "Key": "a.example.com", "Value": 30 },
                    { "Key": "b.example.com", "Value": 12 }
                ]
            }]
        })
    );
}

#[tokio::test]
async fn router_mirrors_vendor_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(403).body("Forbidden.AccessKeyDisabled");
        })
        .await;

    let app = router(state_for(&server));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/traffic?metric=l7Flow_flux")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["aliyunError"], "Forbidden.AccessKeyDisabled");
    assert_eq!(
        body["error"],
        "Failed to fetch data from vendor API: 403 Forbidden"
    );
}
