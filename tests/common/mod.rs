//! Mock collaborators shared by the integration tests.

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use smartguard::chain::{ChainReader, DelegationStore, IndexerReader};
use smartguard::models::{RemoteDelegationRecord, TransferRecord};
use smartguard::AppError;

#[derive(Debug, Clone, Default)]
pub struct AccountFixture {
    pub balance: U256,
    pub tx_count: u64,
    pub code: Bytes,
}

/// Canned chain facts keyed by address. Unknown addresses read as empty EOAs.
#[derive(Default)]
pub struct MockChainReader {
    accounts: Mutex<HashMap<Address, AccountFixture>>,
    fail_all: AtomicBool,
    code_fetches: AtomicUsize,
}

impl MockChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, address: Address, fixture: AccountFixture) -> Self {
        self.accounts.lock().unwrap().insert(address, fixture);
        self
    }

    pub fn failing() -> Self {
        let reader = Self::default();
        reader.fail_all.store(true, Ordering::SeqCst);
        reader
    }

    /// Number of get_code calls served so far.
    pub fn code_fetches(&self) -> usize {
        self.code_fetches.load(Ordering::SeqCst)
    }

    fn fetch(&self, address: Address) -> Result<AccountFixture, AppError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::NetworkError("mock RPC down".to_string()));
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&address)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn get_balance(&self, address: Address) -> Result<U256, AppError> {
        Ok(self.fetch(address)?.balance)
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64, AppError> {
        Ok(self.fetch(address)?.tx_count)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, AppError> {
        self.code_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.fetch(address)?.code)
    }

    async fn get_block_number(&self) -> Result<u64, AppError> {
        Ok(1)
    }

    async fn get_gas_price(&self) -> Result<u128, AppError> {
        Ok(1_000_000_000)
    }
}

/// Canned transfer history, or a hard failure when `failing` is set.
#[derive(Default)]
pub struct MockIndexer {
    transfers: Mutex<Vec<TransferRecord>>,
    fail_all: AtomicBool,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transfers(self, transfers: Vec<TransferRecord>) -> Self {
        *self.transfers.lock().unwrap() = transfers;
        self
    }

    pub fn failing() -> Self {
        let indexer = Self::default();
        indexer.fail_all.store(true, Ordering::SeqCst);
        indexer
    }
}

#[async_trait]
impl IndexerReader for MockIndexer {
    async fn get_transfer_history(
        &self,
        _address: Address,
        _categories: &[&str],
        _max_count: usize,
    ) -> Result<Vec<TransferRecord>, AppError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::NetworkError("mock indexer down".to_string()));
        }
        Ok(self.transfers.lock().unwrap().clone())
    }
}

/// Scriptable stand-in for the on-chain SmartGuard contract.
#[derive(Default)]
pub struct MockDelegationStore {
    pub records: Mutex<HashMap<Address, Vec<RemoteDelegationRecord>>>,
    pub threats: Mutex<HashMap<Address, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Simulated latency for writes, to exercise the timeout path.
    write_delay: Mutex<Option<Duration>>,
}

impl MockDelegationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        let store = Self::default();
        store.fail_reads.store(true, Ordering::SeqCst);
        store.fail_writes.store(true, Ordering::SeqCst);
        store
    }

    pub fn with_records(self, user: Address, records: Vec<RemoteDelegationRecord>) -> Self {
        self.records.lock().unwrap().insert(user, records);
        self
    }

    pub fn with_threat(self, target: Address, reason: &str) -> Self {
        self.threats.lock().unwrap().insert(target, reason.to_string());
        self
    }

    pub fn with_failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_write_delay(self, delay: Duration) -> Self {
        *self.write_delay.lock().unwrap() = Some(delay);
        self
    }

    async fn gate_write(&self, op: &str) -> Result<(), AppError> {
        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::NetworkError(format!("mock {} write rejected", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl DelegationStore for MockDelegationStore {
    async fn get_active_delegations(
        &self,
        user: Address,
    ) -> Result<Vec<RemoteDelegationRecord>, AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::NetworkError("mock contract read failed".to_string()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_delegation(
        &self,
        user: Address,
        contract_addr: Address,
        duration_seconds: u64,
        description: &str,
    ) -> Result<String, AppError> {
        self.gate_write("addDelegation").await?;
        let now = chrono::Utc::now().timestamp();
        self.records
            .lock()
            .unwrap()
            .entry(user)
            .or_default()
            .push(RemoteDelegationRecord {
                contract_addr,
                expires_at: now + duration_seconds as i64,
                added_at: now,
                description: description.to_string(),
                is_active: true,
            });
        Ok("0xmockaddtx".to_string())
    }

    async fn remove_delegation(
        &self,
        user: Address,
        contract_addr: Address,
    ) -> Result<String, AppError> {
        self.gate_write("removeDelegation").await?;
        if let Some(records) = self.records.lock().unwrap().get_mut(&user) {
            records.retain(|r| r.contract_addr != contract_addr);
        }
        Ok("0xmockremovetx".to_string())
    }

    async fn cleanup_expired(&self, user: Address) -> Result<String, AppError> {
        self.gate_write("cleanupExpired").await?;
        let now = chrono::Utc::now().timestamp();
        if let Some(records) = self.records.lock().unwrap().get_mut(&user) {
            records.retain(|r| r.is_active && now < r.expires_at);
        }
        Ok("0xmockcleanuptx".to_string())
    }

    async fn known_threat(&self, target: Address) -> Result<bool, AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::NetworkError("mock registry read failed".to_string()));
        }
        Ok(self.threats.lock().unwrap().contains_key(&target))
    }

    async fn threat_reason(&self, target: Address) -> Result<String, AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::NetworkError("mock registry read failed".to_string()));
        }
        Ok(self
            .threats
            .lock()
            .unwrap()
            .get(&target)
            .cloned()
            .unwrap_or_default())
    }

    async fn report_threat(&self, target: Address, reason: &str) -> Result<String, AppError> {
        self.gate_write("reportThreat").await?;
        self.threats
            .lock()
            .unwrap()
            .insert(target, reason.to_string());
        Ok("0xmockreporttx".to_string())
    }
}
