use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Delegation, DelegationKey};

/// In-process fallback for the on-chain delegation store. Best-effort only:
/// nothing here survives a restart, and it is never merged with a successful
/// remote read.
///
/// Every mutation takes the write lock for its whole duration, so map updates
/// are atomic and a revoke racing an add can never leave a ghost record.
#[derive(Debug, Clone, Default)]
pub struct LocalDelegationStore {
    inner: Arc<RwLock<HashMap<DelegationKey, Delegation>>>,
}

impl LocalDelegationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &DelegationKey) -> Option<Delegation> {
        self.inner.read().await.get(key).cloned()
    }

    /// Insert or overwrite. Re-adding an existing key is last-write-wins.
    pub async fn set(&self, delegation: Delegation) {
        self.inner.write().await.insert(delegation.key(), delegation);
    }

    /// Remove the entry if present. Returns whether anything was removed, so
    /// revoke can stay idempotent.
    pub async fn remove(&self, key: &DelegationKey) -> bool {
        self.inner.write().await.remove(key).is_some()
    }

    /// All delegations for one user, in map iteration order.
    pub async fn scan_user(&self, user: alloy::primitives::Address) -> Vec<Delegation> {
        self.inner
            .read()
            .await
            .values()
            .filter(|d| d.user == user)
            .cloned()
            .collect()
    }

    /// Drop every entry for `user` whose derived status at `now` is Expired.
    /// Returns how many were removed.
    pub async fn purge_expired(&self, user: alloy::primitives::Address, now: i64) -> usize {
        use crate::models::DelegationStatus;

        let mut map = self.inner.write().await;
        let expired: Vec<DelegationKey> = map
            .values()
            .filter(|d| d.user == user && d.status_at(now) == DelegationStatus::Expired)
            .map(|d| d.key())
            .collect();
        for key in &expired {
            map.remove(key);
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    fn delegation(user: u8, contract: u8, now: i64, duration: u64) -> Delegation {
        Delegation::new(
            Address::with_last_byte(user),
            Address::with_last_byte(contract),
            duration,
            None,
            now,
        )
    }

    #[tokio::test]
    async fn test_set_overwrites_same_key() {
        let store = LocalDelegationStore::new();
        store.set(delegation(1, 2, 100, 3_600)).await;
        store.set(delegation(1, 2, 200, 7_200)).await;

        assert_eq!(store.len().await, 1);
        let key = DelegationKey {
            user: Address::with_last_byte(1),
            contract_addr: Address::with_last_byte(2),
        };
        let current = store.get(&key).await.unwrap();
        assert_eq!(current.added_at, 200);
        assert_eq!(current.expires_at, 200 + 7_200);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = LocalDelegationStore::new();
        store.set(delegation(1, 2, 100, 3_600)).await;

        let key = DelegationKey {
            user: Address::with_last_byte(1),
            contract_addr: Address::with_last_byte(2),
        };
        assert!(store.remove(&key).await);
        assert!(!store.remove(&key).await);
    }

    #[tokio::test]
    async fn test_scan_user_only_returns_that_users_entries() {
        let store = LocalDelegationStore::new();
        store.set(delegation(1, 2, 100, 3_600)).await;
        store.set(delegation(1, 3, 100, 3_600)).await;
        store.set(delegation(9, 2, 100, 3_600)).await;

        assert_eq!(store.scan_user(Address::with_last_byte(1)).await.len(), 2);
        assert_eq!(store.scan_user(Address::with_last_byte(9)).await.len(), 1);
        assert!(store.scan_user(Address::with_last_byte(7)).await.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_leaves_active_entries() {
        let store = LocalDelegationStore::new();
        store.set(delegation(1, 2, 0, 100)).await; // expires at 100
        store.set(delegation(1, 3, 0, 10_000)).await; // expires at 10_000

        let removed = store.purge_expired(Address::with_last_byte(1), 5_000).await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }
}
