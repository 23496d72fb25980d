use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Read-only chain facts for a single address, fetched per scoring call.
/// Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletFacts {
    pub address: Address,
    /// Native balance in the smallest denomination (wei).
    pub native_balance: U256,
    pub transaction_count: u64,
    pub is_contract: bool,
    /// Deployed bytecode; empty for externally owned accounts.
    pub bytecode: Bytes,
}

impl WalletFacts {
    /// `is_contract` is derived from the bytecode, never set independently.
    pub fn new(
        address: Address,
        native_balance: U256,
        transaction_count: u64,
        bytecode: Bytes,
    ) -> Self {
        let is_contract = !bytecode.is_empty();
        Self {
            address,
            native_balance,
            transaction_count,
            is_contract,
            bytecode,
        }
    }
}

/// One entry of an address's transfer history, as reported by the indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: Address,
    pub to: Option<Address>,
    pub value: f64,
    pub timestamp: Option<i64>,
    pub category: String,
}
