use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;

use crate::chain::traits::IndexerReader;
use crate::error::AppError;
use crate::models::TransferRecord;

/// JSON-RPC client for an Alchemy-style transfer index
/// (`alchemy_getAssetTransfers`). Strictly best-effort: scoring continues
/// without history when this endpoint is down.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TransfersEnvelope {
    result: Option<TransfersResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TransfersResult {
    transfers: Vec<RawTransfer>,
}

#[derive(Debug, Deserialize)]
struct RawTransfer {
    from: String,
    to: Option<String>,
    value: Option<f64>,
    category: Option<String>,
    metadata: Option<TransferMetadata>,
}

#[derive(Debug, Deserialize)]
struct TransferMetadata {
    #[serde(rename = "blockTimestamp")]
    block_timestamp: Option<String>,
}

impl IndexerClient {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AppError::ConfigError(format!("indexer HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    fn convert(raw: RawTransfer) -> Option<TransferRecord> {
        // Entries with an unparseable counterparty are dropped, not fatal.
        let from = Address::from_str(&raw.from).ok()?;
        let to = raw.to.as_deref().and_then(|t| Address::from_str(t).ok());
        let timestamp = raw
            .metadata
            .and_then(|m| m.block_timestamp)
            .and_then(|ts| chrono::DateTime::parse_from_rfc3339(&ts).ok())
            .map(|dt| dt.timestamp());

        Some(TransferRecord {
            from,
            to,
            value: raw.value.unwrap_or(0.0),
            timestamp,
            category: raw.category.unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

#[async_trait]
impl IndexerReader for IndexerClient {
    async fn get_transfer_history(
        &self,
        address: Address,
        categories: &[&str],
        max_count: usize,
    ) -> Result<Vec<TransferRecord>, AppError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "alchemy_getAssetTransfers",
            "params": [{
                "fromAddress": format!("{:#x}", address),
                "category": categories,
                "maxCount": format!("{:#x}", max_count),
            }],
        });

        let envelope: TransfersEnvelope = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = envelope.error {
            return Err(AppError::NetworkError(format!(
                "indexer returned error: {}",
                err.message
            )));
        }

        let transfers = envelope
            .result
            .map(|r| r.transfers)
            .unwrap_or_default()
            .into_iter()
            .filter_map(Self::convert)
            .collect();

        Ok(transfers)
    }
}
