use alloy::primitives::Address;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::chain::DelegationStore;
use crate::config::DelegationSettings;
use crate::error::AppError;
use crate::models::{
    AddDelegationOutcome, CleanupOutcome, Delegation, DelegationKey, DelegationStatus,
    DelegationView, ReportThreatOutcome, RevokeOutcome, ThreatCheck, ThreatReport,
};
use crate::services::local_store::LocalDelegationStore;
use crate::services::risk_engine::RiskEngine;
use crate::utils::time::unix_now;

const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);
const REMOTE_READ_RETRIES: u32 = 3;

/// Lifecycle owner for delegation grants: add, list, revoke, cleanup, threat
/// checks. Reconciles the authoritative on-chain store with the in-process
/// fallback using one policy for every operation:
///
/// - reads go remote-first (bounded retries + timeout) and fall back to the
///   local store on failure;
/// - writes land locally first, then attempt the chain once, and report the
///   remote outcome as data rather than failing the call.
pub struct DelegationManager {
    remote: Arc<dyn DelegationStore>,
    local: LocalDelegationStore,
    settings: DelegationSettings,
    remote_timeout: Duration,
    /// Optional: lets add_delegation attach a risk note for the grantee.
    risk_engine: Option<Arc<RiskEngine>>,
    threats: tokio::sync::RwLock<std::collections::HashMap<Address, ThreatReport>>,
}

impl DelegationManager {
    pub fn new(remote: Arc<dyn DelegationStore>, settings: DelegationSettings) -> Self {
        Self {
            remote,
            local: LocalDelegationStore::new(),
            settings,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            risk_engine: None,
            threats: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    pub fn with_risk_engine(mut self, risk_engine: Arc<RiskEngine>) -> Self {
        self.risk_engine = Some(risk_engine);
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Bound a remote call. A timeout is indistinguishable from any other
    /// remote failure for callers.
    async fn remote_call<T, Fut>(&self, op: &'static str, fut: Fut) -> Result<T, AppError>
    where
        Fut: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.remote_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} exceeded {:?}",
                op, self.remote_timeout
            ))),
        }
    }

    /// Remote reads get a few bounded retries with linear backoff before the
    /// caller falls back. Writes never come through here: retrying a write
    /// risks duplicate on-chain submissions.
    async fn remote_read_with_retry<T, F, Fut>(
        &self,
        op: &'static str,
        call_fn: F,
    ) -> Result<T, AppError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut last_err = AppError::NetworkError(format!("{}: no attempts made", op));
        for attempt in 1..=REMOTE_READ_RETRIES {
            match self.remote_call(op, call_fn()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(op, attempt, error = %e, "Remote read failed");
                    last_err = e;
                    if attempt < REMOTE_READ_RETRIES {
                        tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                    }
                }
            }
        }
        Err(last_err)
    }

    /// Create a delegation. Validation errors are accumulated so one response
    /// reports every violated constraint. The local write always happens
    /// before the remote attempt and is never rolled back.
    pub async fn add_delegation(
        &self,
        user: Address,
        contract_addr: Address,
        duration_seconds: u64,
        description: Option<String>,
    ) -> Result<AddDelegationOutcome, AppError> {
        let mut violations = Vec::new();
        if duration_seconds == 0 {
            violations.push("duration must be greater than zero".to_string());
        }
        if duration_seconds < self.settings.min_duration_seconds {
            violations.push(format!(
                "duration must be at least {} seconds",
                self.settings.min_duration_seconds
            ));
        }
        if duration_seconds > self.settings.max_duration_seconds {
            violations.push(format!(
                "duration must be at most {} seconds",
                self.settings.max_duration_seconds
            ));
        }
        if !violations.is_empty() {
            return Err(AppError::ValidationError(violations));
        }

        let now = unix_now();
        let delegation = Delegation::new(user, contract_addr, duration_seconds, description, now);

        // Local first: the grant must be visible to list_delegations even if
        // the chain write below never lands.
        self.local.set(delegation.clone()).await;

        let (remote_write_ok, note) = match self
            .remote_call(
                "addDelegation",
                self.remote.add_delegation(
                    user,
                    contract_addr,
                    duration_seconds,
                    &delegation.description,
                ),
            )
            .await
        {
            Ok(tx_hash) => {
                info!(%user, %contract_addr, %tx_hash, "Delegation added on-chain");
                (true, format!("recorded on-chain in tx {}", tx_hash))
            }
            Err(e) => {
                warn!(%user, %contract_addr, error = %e, "On-chain delegation write failed, local record kept");
                (
                    false,
                    format!("recorded locally; on-chain write failed: {}", e),
                )
            }
        };

        let risk_warning = self.grantee_risk_warning(contract_addr).await;

        Ok(AddDelegationOutcome {
            delegation: delegation.view_at(now),
            remote_write_ok,
            note,
            risk_warning,
        })
    }

    async fn grantee_risk_warning(&self, contract_addr: Address) -> Option<String> {
        let engine = self.risk_engine.as_ref()?;
        match engine.score_contract(contract_addr).await {
            Ok(assessment) if assessment.score >= 70 => Some(format!(
                "grantee contract scored {} ({:?} risk)",
                assessment.score, assessment.level
            )),
            Ok(_) => None,
            Err(e) => {
                warn!(%contract_addr, error = %e, "Grantee risk check skipped");
                None
            }
        }
    }

    /// List a user's delegations. A successful remote read is used
    /// exclusively, even when empty, so stale local entries the chain already
    /// pruned never resurface. Source order is preserved.
    pub async fn list_delegations(&self, user: Address) -> Result<Vec<DelegationView>, AppError> {
        let now = unix_now();

        match self
            .remote_read_with_retry("getActiveDelegations", || {
                self.remote.get_active_delegations(user)
            })
            .await
        {
            Ok(records) => Ok(records
                .into_iter()
                .filter(|rec| !rec.is_sentinel())
                .map(|rec| rec.into_delegation(user).view_at(now))
                .collect()),
            Err(e) => {
                warn!(%user, error = %e, "Remote delegation read failed, serving local fallback");
                Ok(self
                    .local
                    .scan_user(user)
                    .await
                    .iter()
                    .map(|d| d.view_at(now))
                    .collect())
            }
        }
    }

    /// Revoke a delegation. Idempotent: a missing local record is not an
    /// error, and remote failure is reported in the outcome rather than
    /// thrown, because the local intent already took effect.
    pub async fn revoke_delegation(
        &self,
        user: Address,
        contract_addr: Address,
    ) -> Result<RevokeOutcome, AppError> {
        let key = DelegationKey { user, contract_addr };
        let removed_locally = self.local.remove(&key).await;

        let (contract_revoke_success, note) = match self
            .remote_call(
                "removeDelegation",
                self.remote.remove_delegation(user, contract_addr),
            )
            .await
        {
            Ok(tx_hash) => {
                info!(%user, %contract_addr, %tx_hash, "Delegation revoked on-chain");
                (true, format!("revoked on-chain in tx {}", tx_hash))
            }
            Err(e) => {
                warn!(%user, %contract_addr, error = %e, "On-chain revoke failed, local revoke kept");
                (
                    false,
                    format!("revoked locally; on-chain revoke failed: {}", e),
                )
            }
        };

        Ok(RevokeOutcome {
            user,
            contract_addr,
            removed_locally,
            contract_revoke_success,
            note,
        })
    }

    /// Remove every delegation for `user` whose derived status is Expired.
    /// The on-chain cleanup call is best-effort; local expired entries are
    /// purged regardless.
    pub async fn cleanup_expired(&self, user: Address) -> CleanupOutcome {
        let now = unix_now();

        let expired_found = match self
            .remote_read_with_retry("getActiveDelegations", || {
                self.remote.get_active_delegations(user)
            })
            .await
        {
            Ok(records) => records
                .into_iter()
                .filter(|rec| !rec.is_sentinel())
                .map(|rec| rec.into_delegation(user))
                .filter(|d| d.status_at(now) == DelegationStatus::Expired)
                .count(),
            Err(e) => {
                warn!(%user, error = %e, "Remote read failed during cleanup, counting local entries");
                self.local
                    .scan_user(user)
                    .await
                    .iter()
                    .filter(|d| d.status_at(now) == DelegationStatus::Expired)
                    .count()
            }
        };

        let (remote_cleanup_ok, note) = if expired_found == 0 {
            (true, "nothing to clean up".to_string())
        } else {
            match self
                .remote_call("cleanupExpired", self.remote.cleanup_expired(user))
                .await
            {
                Ok(tx_hash) => (true, format!("cleaned up on-chain in tx {}", tx_hash)),
                Err(e) => {
                    warn!(%user, error = %e, "On-chain cleanup failed");
                    (false, format!("on-chain cleanup failed: {}", e))
                }
            }
        };

        let purged = self.local.purge_expired(user, now).await;
        if purged > 0 {
            info!(%user, purged, "Purged expired local delegation entries");
        }

        CleanupOutcome {
            user,
            expired_found,
            remote_cleanup_ok,
            note,
        }
    }

    /// Batch cleanup over several users. One user's failure is recorded in
    /// that user's outcome; the batch always runs to completion.
    pub async fn cleanup_expired_batch(&self, users: &[Address]) -> Vec<CleanupOutcome> {
        let mut outcomes = Vec::with_capacity(users.len());
        for &user in users {
            outcomes.push(self.cleanup_expired(user).await);
        }
        outcomes
    }

    /// Check the on-chain threat registry. Fail-open: an unreachable registry
    /// degrades to "not a known threat" with a note, never to blocking the
    /// caller.
    pub async fn check_threat(&self, contract_address: Address) -> ThreatCheck {
        match self
            .remote_read_with_retry("knownThreats", || self.remote.known_threat(contract_address))
            .await
        {
            Ok(true) => {
                let reason = self
                    .remote_call("threatReasons", self.remote.threat_reason(contract_address))
                    .await
                    .ok()
                    .filter(|r| !r.is_empty());
                ThreatCheck {
                    contract_address,
                    is_threat: true,
                    reason,
                    note: None,
                }
            }
            Ok(false) => ThreatCheck {
                contract_address,
                is_threat: false,
                reason: None,
                note: None,
            },
            Err(e) => {
                warn!(%contract_address, error = %e, "Threat registry unreachable, defaulting to not-a-threat");
                ThreatCheck {
                    contract_address,
                    is_threat: false,
                    reason: None,
                    note: Some(format!(
                        "threat registry unreachable ({}); defaulting to not-a-threat",
                        e
                    )),
                }
            }
        }
    }

    /// File a threat report. Upserted per contract address: repeating an
    /// identical report is a no-op and is not forwarded to the chain again.
    pub async fn report_threat(
        &self,
        contract_address: Address,
        reason: String,
        severity: String,
    ) -> ReportThreatOutcome {
        let report = ThreatReport {
            contract_address,
            reason: reason.clone(),
            severity,
            reported_at: unix_now(),
        };

        let newly_recorded = {
            let mut threats = self.threats.write().await;
            match threats.get(&contract_address) {
                Some(existing) if existing.reason == reason => false,
                _ => {
                    threats.insert(contract_address, report.clone());
                    true
                }
            }
        };

        if !newly_recorded {
            return ReportThreatOutcome {
                report,
                newly_recorded: false,
                remote_write_ok: false,
                note: "identical report already on file; not forwarded".to_string(),
            };
        }

        let (remote_write_ok, note) = match self
            .remote_call(
                "reportThreat",
                self.remote.report_threat(contract_address, &reason),
            )
            .await
        {
            Ok(tx_hash) => (true, format!("reported on-chain in tx {}", tx_hash)),
            Err(e) => {
                warn!(%contract_address, error = %e, "On-chain threat report failed, kept locally");
                (
                    false,
                    format!("recorded locally; on-chain report failed: {}", e),
                )
            }
        };

        ReportThreatOutcome {
            report,
            newly_recorded: true,
            remote_write_ok,
            note,
        }
    }

    /// Test and diagnostics access to the fallback store.
    pub fn local_store(&self) -> &LocalDelegationStore {
        &self.local
    }
}
