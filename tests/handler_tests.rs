//! Route-level tests driving the axum routers directly, without a socket.

mod common;

use alloy::primitives::{Address, U256};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use common::{AccountFixture, MockChainReader, MockDelegationStore, MockIndexer};
use smartguard::config::Settings;
use smartguard::handlers::{create_delegation_routes, create_risk_routes, health_check};
use smartguard::services::{DelegationManager, RiskEngine};
use smartguard::AppState;

const USER: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
const GRANTEE: &str = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

fn test_app(chain: MockChainReader, store: MockDelegationStore) -> Router {
    let settings = Settings::default();
    let risk_engine = Arc::new(RiskEngine::new(
        Arc::new(chain),
        Arc::new(MockIndexer::new()),
    ));
    let delegation_manager = Arc::new(DelegationManager::new(
        Arc::new(store),
        settings.delegation.clone(),
    ));
    let state = AppState {
        settings,
        risk_engine,
        delegation_manager,
    };

    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            create_risk_routes().merge(create_delegation_routes()),
        )
        .with_state(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = test_app(MockChainReader::new(), MockDelegationStore::new());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "smartguard");
}

#[tokio::test]
async fn wallet_risk_route_returns_the_assessment() {
    let wallet = Address::with_last_byte(1);
    let chain = MockChainReader::new().with_account(wallet, AccountFixture::default());
    let app = test_app(chain, MockDelegationStore::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/risk/wallet/{wallet}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // Fresh empty wallet: base 50 + zero balance + no history.
    assert_eq!(body["score"], 80);
    assert_eq!(body["level"], "High");
}

#[tokio::test]
async fn malformed_address_in_the_path_is_a_400() {
    let app = test_app(MockChainReader::new(), MockDelegationStore::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/risk/wallet/not-an-address")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid input"));
}

#[tokio::test]
async fn transaction_route_analyzes_the_request_body() {
    let app = test_app(MockChainReader::new(), MockDelegationStore::new());

    let payload = serde_json::json!({
        "from": USER,
        "to": GRANTEE,
        "value": U256::from(2_000_000_000_000_000_000u64).to_string(),
        "data": "0x",
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/risk/transaction")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["score"], 20);
    assert_eq!(body["should_proceed"], true);
}

#[tokio::test]
async fn rejected_delegation_lists_every_violation_in_the_error() {
    let app = test_app(MockChainReader::new(), MockDelegationStore::new());

    let payload = serde_json::json!({
        "user": USER,
        "contract_addr": GRANTEE,
        "duration_seconds": 0,
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/delegations")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    // Zero duration breaks both the non-zero rule and the minimum window.
    assert!(message.contains("Validation error"));
    assert!(message.contains("; "));
}

#[tokio::test]
async fn delegation_lifecycle_over_http() {
    let app = test_app(MockChainReader::new(), MockDelegationStore::new());

    let payload = serde_json::json!({
        "user": USER,
        "contract_addr": GRANTEE,
        "duration_seconds": 3_600,
        "description": "swap session",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/delegations")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["remote_write_ok"], true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/delegations/{USER}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["description"], "swap session");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/delegations/{USER}/{GRANTEE}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["contract_revoke_success"], true);
}

#[tokio::test]
async fn threat_lookup_route_round_trips() {
    let flagged = Address::with_last_byte(7);
    let store = MockDelegationStore::new().with_threat(flagged, "drains approvals");
    let app = test_app(MockChainReader::new(), store);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/threats/{flagged}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_threat"], true);
    assert_eq!(body["reason"], "drains approvals");
}
