use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Wallet,
    Contract,
    Transaction,
}

/// Severity bucket for a risk score.
///
/// `Unknown` is reserved for contract scoring of an address with no deployed
/// code; it is never produced by the score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    /// Boundary-exact: 70 is High, 30 is Medium, 29 is Low.
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            RiskLevel::High
        } else if score >= 30 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Heuristic assessment of a wallet or contract address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub subject: Address,
    pub subject_kind: SubjectKind,
    /// Always clamped to [0, 100].
    pub score: u8,
    pub level: RiskLevel,
    /// One entry per heuristic that fired, in evaluation order.
    pub factors: Vec<String>,
    pub recommendations: Vec<String>,
    /// Subset of factors deemed urgent.
    pub warnings: Vec<String>,
}

/// A pending transaction submitted for pre-flight analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    /// Transfer value in wei.
    pub value: U256,
    /// Hex-encoded calldata, e.g. "0x095ea7b3...". Empty or "0x" means a
    /// plain value transfer.
    #[serde(default)]
    pub data: Option<String>,
}

/// Result of pre-flight transaction analysis. Unlike address scoring this
/// starts from a clean floor of 0 and only adds risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCheck {
    pub from: Address,
    pub to: Address,
    pub score: u8,
    pub level: RiskLevel,
    pub should_proceed: bool,
    pub factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}
