use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    sol,
    transports::http::{Client, Http},
};
use async_trait::async_trait;

use crate::chain::traits::DelegationStore;
use crate::error::AppError;
use crate::models::RemoteDelegationRecord;

// SmartGuard delegation contract ABI using alloy sol! macro
sol! {
    #[sol(rpc)]
    interface ISmartGuard {
        struct DelegationRecord {
            address contractAddr;
            uint256 expiresAt;
            uint256 addedAt;
            string description;
            bool isActive;
        }

        function getActiveDelegations(address user) external view returns (DelegationRecord[] memory);
        function addDelegation(address user, address contractAddr, uint256 durationSeconds, string calldata description) external;
        function removeDelegation(address user, address contractAddr) external;
        function cleanupExpired(address user) external;

        function knownThreats(address target) external view returns (bool);
        function threatReasons(address target) external view returns (string memory);
        function reportThreat(address target, string calldata reason) external;
    }
}

/// Handle to the on-chain SmartGuard contract. Reads work against any
/// provider; writes require a provider constructed with the operator signer.
pub struct GuardContract<P> {
    contract: ISmartGuard::ISmartGuardInstance<Http<Client>, P>,
    can_write: bool,
}

impl<P: Provider<Http<Client>>> GuardContract<P> {
    pub fn new(address: Address, provider: P, can_write: bool) -> Self {
        Self {
            contract: ISmartGuard::new(address, provider),
            can_write,
        }
    }

    fn require_signer(&self, op: &str) -> Result<(), AppError> {
        if self.can_write {
            Ok(())
        } else {
            Err(AppError::NetworkError(format!(
                "{}: no operator key configured, on-chain write skipped",
                op
            )))
        }
    }
}

fn to_unix(value: U256) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn contract_err(op: &str, e: alloy::contract::Error) -> AppError {
    AppError::NetworkError(format!("{} failed: {}", op, e))
}

#[async_trait]
impl<P> DelegationStore for GuardContract<P>
where
    P: Provider<Http<Client>> + Send + Sync + 'static,
{
    async fn get_active_delegations(
        &self,
        user: Address,
    ) -> Result<Vec<RemoteDelegationRecord>, AppError> {
        let records = self
            .contract
            .getActiveDelegations(user)
            .call()
            .await
            .map_err(|e| contract_err("getActiveDelegations", e))?
            ._0;

        Ok(records
            .into_iter()
            .map(|rec| RemoteDelegationRecord {
                contract_addr: rec.contractAddr,
                expires_at: to_unix(rec.expiresAt),
                added_at: to_unix(rec.addedAt),
                description: rec.description,
                is_active: rec.isActive,
            })
            .collect())
    }

    async fn add_delegation(
        &self,
        user: Address,
        contract_addr: Address,
        duration_seconds: u64,
        description: &str,
    ) -> Result<String, AppError> {
        self.require_signer("addDelegation")?;

        let call = self.contract.addDelegation(
            user,
            contract_addr,
            U256::from(duration_seconds),
            description.to_string(),
        );
        let pending = call
            .send()
            .await
            .map_err(|e| contract_err("addDelegation", e))?;

        let tx_hash = pending
            .watch()
            .await
            .map_err(|e| AppError::NetworkError(format!("addDelegation confirmation: {}", e)))?;

        tracing::info!(%user, %contract_addr, %tx_hash, "Delegation recorded on-chain");
        Ok(format!("{tx_hash}"))
    }

    async fn remove_delegation(
        &self,
        user: Address,
        contract_addr: Address,
    ) -> Result<String, AppError> {
        self.require_signer("removeDelegation")?;

        let call = self.contract.removeDelegation(user, contract_addr);
        let pending = call
            .send()
            .await
            .map_err(|e| contract_err("removeDelegation", e))?;

        let tx_hash = pending
            .watch()
            .await
            .map_err(|e| AppError::NetworkError(format!("removeDelegation confirmation: {}", e)))?;

        Ok(format!("{tx_hash}"))
    }

    async fn cleanup_expired(&self, user: Address) -> Result<String, AppError> {
        self.require_signer("cleanupExpired")?;

        let call = self.contract.cleanupExpired(user);
        let pending = call
            .send()
            .await
            .map_err(|e| contract_err("cleanupExpired", e))?;

        let tx_hash = pending
            .watch()
            .await
            .map_err(|e| AppError::NetworkError(format!("cleanupExpired confirmation: {}", e)))?;

        Ok(format!("{tx_hash}"))
    }

    async fn known_threat(&self, target: Address) -> Result<bool, AppError> {
        Ok(self
            .contract
            .knownThreats(target)
            .call()
            .await
            .map_err(|e| contract_err("knownThreats", e))?
            ._0)
    }

    async fn threat_reason(&self, target: Address) -> Result<String, AppError> {
        Ok(self
            .contract
            .threatReasons(target)
            .call()
            .await
            .map_err(|e| contract_err("threatReasons", e))?
            ._0)
    }

    async fn report_threat(&self, target: Address, reason: &str) -> Result<String, AppError> {
        self.require_signer("reportThreat")?;

        let call = self.contract.reportThreat(target, reason.to_string());
        let pending = call
            .send()
            .await
            .map_err(|e| contract_err("reportThreat", e))?;

        let tx_hash = pending
            .watch()
            .await
            .map_err(|e| AppError::NetworkError(format!("reportThreat confirmation: {}", e)))?;

        Ok(format!("{tx_hash}"))
    }
}
