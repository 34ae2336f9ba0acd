//! HTTP routes served over scripted mailboxes.

mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use otp_inbox::http::{build_router, CODE_PLACEHOLDER, NO_CODE_MESSAGE};
use otp_inbox::Aggregator;
use std::sync::Arc;
use support::{ago, config_for, Behavior, Scripted, ScriptedConnector};
use tower::ServiceExt;

const A: &str = "a@example.com";
const B: &str = "b@example.com";

fn router(connector: ScriptedConnector, addresses: &[&str]) -> axum::Router {
    build_router(Arc::new(Aggregator::new(config_for(addresses), connector)))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_latest_code_returns_fresh_code() {
    let connector = ScriptedConnector::new([
        (A, Behavior::Unreachable),
        (B, Behavior::Serve(vec![Scripted::from_sender(ago(5), "code 482913")])),
    ]);

    let (status, body) = get(router(connector, &[A, B]), "/latest-code").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["email"], B);
    assert_eq!(json["code"], "482913");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_latest_code_without_fresh_code() {
    let connector = ScriptedConnector::new([(
        A,
        Behavior::Serve(vec![Scripted::from_sender(ago(900), "code 482913")]),
    )]);

    let (status, body) = get(router(connector, &[A]), "/latest-code").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "message": NO_CODE_MESSAGE }));
}

#[tokio::test]
async fn test_dashboard_lists_every_account() {
    let connector = ScriptedConnector::new([
        (A, Behavior::RejectLogin),
        (B, Behavior::Serve(vec![Scripted::from_sender(ago(5), "code 482913")])),
    ]);

    let (status, html) = get(router(connector, &[A, B]), "/").await;

    assert_eq!(status, StatusCode::OK);
    let b_row = html.find(B).expect("row for b");
    let a_row = html.find(A).expect("row for a");
    assert!(b_row < a_row, "account with a code is listed first");
    assert!(html.contains("482913"));
    assert!(html.contains(CODE_PLACEHOLDER));
}

#[tokio::test]
async fn test_health() {
    let connector = ScriptedConnector::new([(A, Behavior::Unreachable)]);

    let (status, body) = get(router(connector, &[A, B]), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["accounts"], 2);
}
