use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{
    AddDelegationOutcome, CleanupOutcome, DelegationView, ReportThreatOutcome, RevokeOutcome,
    ThreatCheck,
};
use crate::utils::address::parse_address;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddDelegationRequest {
    pub user: String,
    pub contract_addr: String,
    pub duration_seconds: u64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportThreatRequest {
    pub contract_address: String,
    pub reason: String,
    #[serde(default = "default_severity")]
    pub severity: String,
}

fn default_severity() -> String {
    "medium".to_string()
}

pub async fn add_delegation(
    State(state): State<AppState>,
    Json(request): Json<AddDelegationRequest>,
) -> Result<Json<AddDelegationOutcome>, AppError> {
    let user = parse_address(&request.user)?;
    let contract_addr = parse_address(&request.contract_addr)?;

    let outcome = state
        .delegation_manager
        .add_delegation(user, contract_addr, request.duration_seconds, request.description)
        .await?;
    Ok(Json(outcome))
}

pub async fn list_delegations(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Vec<DelegationView>>, AppError> {
    let user = parse_address(&user)?;
    let views = state.delegation_manager.list_delegations(user).await?;
    Ok(Json(views))
}

pub async fn revoke_delegation(
    State(state): State<AppState>,
    Path((user, contract_addr)): Path<(String, String)>,
) -> Result<Json<RevokeOutcome>, AppError> {
    let user = parse_address(&user)?;
    let contract_addr = parse_address(&contract_addr)?;

    let outcome = state
        .delegation_manager
        .revoke_delegation(user, contract_addr)
        .await?;
    Ok(Json(outcome))
}

pub async fn cleanup_expired(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<CleanupOutcome>, AppError> {
    let user = parse_address(&user)?;
    Ok(Json(state.delegation_manager.cleanup_expired(user).await))
}

pub async fn check_threat(
    State(state): State<AppState>,
    Path(contract): Path<String>,
) -> Result<Json<ThreatCheck>, AppError> {
    let contract = parse_address(&contract)?;
    Ok(Json(state.delegation_manager.check_threat(contract).await))
}

pub async fn report_threat(
    State(state): State<AppState>,
    Json(request): Json<ReportThreatRequest>,
) -> Result<Json<ReportThreatOutcome>, AppError> {
    let contract = parse_address(&request.contract_address)?;
    Ok(Json(
        state
            .delegation_manager
            .report_threat(contract, request.reason, request.severity)
            .await,
    ))
}

pub fn create_delegation_routes() -> Router<AppState> {
    Router::new()
        .route("/delegations", post(add_delegation))
        .route("/delegations/:user", get(list_delegations))
        .route("/delegations/:user/:contract", delete(revoke_delegation))
        .route("/delegations/:user/cleanup", post(cleanup_expired))
        .route("/threats/:contract", get(check_threat))
        .route("/threats", post(report_threat))
}
