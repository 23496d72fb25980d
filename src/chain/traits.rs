use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{RemoteDelegationRecord, TransferRecord};

/// Read-only access to chain state. Every method may fail with
/// `NetworkError`/`Timeout`.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256, AppError>;
    async fn get_transaction_count(&self, address: Address) -> Result<u64, AppError>;
    async fn get_code(&self, address: Address) -> Result<Bytes, AppError>;
    async fn get_block_number(&self) -> Result<u64, AppError>;
    async fn get_gas_price(&self) -> Result<u128, AppError>;
}

/// Transfer-history lookups against the indexing API. Best-effort: callers
/// must tolerate failure and treat missing history as "no data".
#[async_trait]
pub trait IndexerReader: Send + Sync {
    async fn get_transfer_history(
        &self,
        address: Address,
        categories: &[&str],
        max_count: usize,
    ) -> Result<Vec<TransferRecord>, AppError>;
}

/// The on-chain SmartGuard contract: authoritative delegation records plus
/// the threat registry. Writes return a transaction hash once confirmed.
#[async_trait]
pub trait DelegationStore: Send + Sync {
    async fn get_active_delegations(
        &self,
        user: Address,
    ) -> Result<Vec<RemoteDelegationRecord>, AppError>;

    async fn add_delegation(
        &self,
        user: Address,
        contract_addr: Address,
        duration_seconds: u64,
        description: &str,
    ) -> Result<String, AppError>;

    async fn remove_delegation(
        &self,
        user: Address,
        contract_addr: Address,
    ) -> Result<String, AppError>;

    async fn cleanup_expired(&self, user: Address) -> Result<String, AppError>;

    async fn known_threat(&self, target: Address) -> Result<bool, AppError>;

    async fn threat_reason(&self, target: Address) -> Result<String, AppError>;

    async fn report_threat(&self, target: Address, reason: &str) -> Result<String, AppError>;
}
