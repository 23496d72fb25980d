use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::utils::time::humanize_expiry;

pub const DEFAULT_DESCRIPTION: &str = "No description";

/// Composite key for the delegation stores. Both addresses are canonical
/// `Address` values, so checksummed and lowercased inputs collapse to the
/// same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationKey {
    pub user: Address,
    pub contract_addr: Address,
}

/// A time-bounded grant letting `contract_addr` act on behalf of `user`.
///
/// `is_active` is only flipped by an explicit revoke. Mere passage of time
/// never mutates the record; expiry is derived at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    pub user: Address,
    pub contract_addr: Address,
    pub description: String,
    /// Unix seconds, set at creation, immutable.
    pub added_at: i64,
    /// Unix seconds, `added_at + duration`, immutable.
    pub expires_at: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegationStatus {
    Active,
    Expired,
}

impl Delegation {
    pub fn new(
        user: Address,
        contract_addr: Address,
        duration_seconds: u64,
        description: Option<String>,
        now: i64,
    ) -> Self {
        Self {
            user,
            contract_addr,
            description: description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            added_at: now,
            expires_at: now + duration_seconds as i64,
            is_active: true,
        }
    }

    pub fn key(&self) -> DelegationKey {
        DelegationKey {
            user: self.user,
            contract_addr: self.contract_addr,
        }
    }

    /// Derived status: Active iff still flagged active and `now < expires_at`.
    /// `now >= expires_at` counts as expired.
    pub fn status_at(&self, now: i64) -> DelegationStatus {
        if self.is_active && now < self.expires_at {
            DelegationStatus::Active
        } else {
            DelegationStatus::Expired
        }
    }

    pub fn view_at(&self, now: i64) -> DelegationView {
        DelegationView {
            contract_addr: self.contract_addr,
            expires_at: self.expires_at,
            expires_in: humanize_expiry(self.expires_at, now),
            status: self.status_at(now),
            description: self.description.clone(),
            added_at: self.added_at,
        }
    }
}

/// Read-model of a delegation as shown in the dashboard list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationView {
    pub contract_addr: Address,
    pub expires_at: i64,
    pub expires_in: String,
    pub status: DelegationStatus,
    pub description: String,
    pub added_at: i64,
}

/// Result of an add: the grant always lands locally; the on-chain write is
/// best-effort and its outcome is reported, not thrown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDelegationOutcome {
    pub delegation: DelegationView,
    pub remote_write_ok: bool,
    pub note: String,
    /// Present when the risk engine flagged the grantee contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeOutcome {
    pub user: Address,
    pub contract_addr: Address,
    /// Whether a local record existed and was removed.
    pub removed_locally: bool,
    pub contract_revoke_success: bool,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupOutcome {
    pub user: Address,
    pub expired_found: usize,
    pub remote_cleanup_ok: bool,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatCheck {
    pub contract_address: Address,
    pub is_threat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A contract flagged as malicious. Upserted per contract address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatReport {
    pub contract_address: Address,
    pub reason: String,
    pub severity: String,
    pub reported_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportThreatOutcome {
    pub report: ThreatReport,
    /// False when an identical report already existed and nothing was forwarded.
    pub newly_recorded: bool,
    pub remote_write_ok: bool,
    pub note: String,
}

/// A delegation record as returned by the on-chain store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDelegationRecord {
    pub contract_addr: Address,
    pub expires_at: i64,
    pub added_at: i64,
    pub description: String,
    pub is_active: bool,
}

impl RemoteDelegationRecord {
    /// The contract pads its return array with zero-address placeholder slots;
    /// those never reach callers.
    pub fn is_sentinel(&self) -> bool {
        self.contract_addr == Address::ZERO
    }

    pub fn into_delegation(self, user: Address) -> Delegation {
        Delegation {
            user,
            contract_addr: self.contract_addr,
            description: if self.description.is_empty() {
                DEFAULT_DESCRIPTION.to_string()
            } else {
                self.description
            },
            added_at: self.added_at,
            expires_at: self.expires_at,
            is_active: self.is_active,
        }
    }
}
