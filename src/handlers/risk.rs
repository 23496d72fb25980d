use alloy::primitives::U256;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::{RiskAssessment, TransactionCheck, TxRequest};
use crate::utils::address::parse_address;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeTransactionRequest {
    pub from: String,
    pub to: String,
    /// Transfer value in wei, as a decimal string.
    pub value: String,
    pub data: Option<String>,
}

pub async fn score_wallet(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<RiskAssessment>, AppError> {
    let address = parse_address(&address)?;
    let assessment = state.risk_engine.score_wallet(address).await?;
    Ok(Json(assessment))
}

pub async fn score_contract(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<RiskAssessment>, AppError> {
    let address = parse_address(&address)?;
    let assessment = state.risk_engine.score_contract(address).await?;
    Ok(Json(assessment))
}

pub async fn analyze_transaction(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTransactionRequest>,
) -> Result<Json<TransactionCheck>, AppError> {
    let tx = TxRequest {
        from: parse_address(&request.from)?,
        to: parse_address(&request.to)?,
        value: U256::from_str(&request.value)
            .map_err(|e| AppError::InvalidInput(format!("invalid value '{}': {}", request.value, e)))?,
        data: request.data,
    };
    let check = state.risk_engine.analyze_transaction(tx).await?;
    Ok(Json(check))
}

pub fn create_risk_routes() -> Router<AppState> {
    Router::new()
        .route("/risk/wallet/:address", get(score_wallet))
        .route("/risk/contract/:address", get(score_contract))
        .route("/risk/transaction", post(analyze_transaction))
}
