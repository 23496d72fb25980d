use alloy::primitives::{Address, Bytes, U256};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::chain::{ChainReader, IndexerReader};
use crate::error::AppError;
use crate::models::{
    RiskAssessment, RiskLevel, SubjectKind, TransactionCheck, TransferRecord, TxRequest,
    WalletFacts,
};

/// 1 native unit (ether) in wei.
const ONE_NATIVE_WEI: u64 = 1_000_000_000_000_000_000;
/// 0.1 native unit in wei.
const TENTH_NATIVE_WEI: u64 = 100_000_000_000_000_000;
/// 10 native units in wei. Fits in u64.
const TEN_NATIVE_WEI: u64 = 10_000_000_000_000_000_000;

/// DELEGATECALL opcode. Its presence in deployed code means the contract can
/// run foreign logic in its own storage context.
const OP_DELEGATECALL: u8 = 0xf4;
/// SELFDESTRUCT opcode.
const OP_SELFDESTRUCT: u8 = 0xff;

const LARGE_BYTECODE_LEN: usize = 10_000;
const COMPLEX_CALLDATA_LEN: usize = 100;

/// Addresses the engine treats as confirmed malicious. Any match forces a
/// score of 100 regardless of other facts.
const KNOWN_MALICIOUS: &[&str] = &[
    "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
    "0x72a5843cc08275c8171e582972aa4fda8c397b2a",
    "0x7f367cc41522ce07553e823bf3be79a889debe1b",
];

/// Static reputation floor for addresses with a known track record. The
/// computed score can only be raised to the floor, never lowered by it.
struct ReputationEntry {
    address: &'static str,
    risk_floor: u8,
    category: &'static str,
}

const REPUTATION_TABLE: &[ReputationEntry] = &[
    ReputationEntry {
        address: "0xd90e2f925da726b50c4ed8d0fb90ad053324f31b",
        risk_floor: 85,
        category: "Flagged mixer frontend",
    },
    ReputationEntry {
        address: "0x8576acc5c05d6ce88f4e49bf65bdf0c62f91353c",
        risk_floor: 75,
        category: "Sanctioned entity",
    },
    ReputationEntry {
        address: "0x7a250d5630b4cf539739df2c5dacb4c659f2488d",
        risk_floor: 20,
        category: "Well-known DEX router",
    },
];

/// Heuristic risk scoring over read-only chain facts. Stateless; every call
/// fetches fresh facts through the injected collaborators.
pub struct RiskEngine {
    chain: Arc<dyn ChainReader>,
    indexer: Arc<dyn IndexerReader>,
}

impl RiskEngine {
    pub fn new(chain: Arc<dyn ChainReader>, indexer: Arc<dyn IndexerReader>) -> Self {
        Self { chain, indexer }
    }

    /// Score a wallet address. Base 50, heuristics applied in a fixed order,
    /// result clamped to [0, 100].
    pub async fn score_wallet(&self, address: Address) -> Result<RiskAssessment, AppError> {
        let facts = self.fetch_wallet_facts(address).await?;
        debug!(%address, tx_count = facts.transaction_count, "Scoring wallet");

        let mut score: i32 = 50;
        let mut factors = Vec::new();
        let mut warnings = Vec::new();

        if facts.native_balance == U256::ZERO {
            score += 10;
            factors.push("Zero balance".to_string());
        }
        if facts.native_balance > U256::from(TEN_NATIVE_WEI) {
            score += 15;
            factors.push("High balance".to_string());
        }

        if facts.transaction_count == 0 {
            score += 20;
            factors.push("No transaction history".to_string());
            warnings.push("No transaction history".to_string());
        } else if facts.transaction_count < 3 {
            score += 10;
            factors.push("Low transaction count".to_string());
        }

        if facts.is_contract {
            score -= 10;
            factors.push("Contract address".to_string());
            score += code_risk(&facts.bytecode, &mut factors);
        }

        // Best-effort: an indexer outage means "no risky interactions found",
        // never a failed assessment.
        let risky_interactions = self.count_risky_interactions(address).await;
        if risky_interactions > 0 {
            score += 15 * risky_interactions as i32;
            factors.push(format!(
                "Interacted with {} known risky contract(s)",
                risky_interactions
            ));
            warnings.push("Address has interacted with known risky contracts".to_string());
        }

        let score = clamp_score(score);
        let level = RiskLevel::from_score(score);
        let recommendations = wallet_recommendations(level, &factors);

        Ok(RiskAssessment {
            subject: address,
            subject_kind: SubjectKind::Wallet,
            score,
            level,
            factors,
            recommendations,
            warnings,
        })
    }

    /// Score a contract address from its deployed bytecode plus the static
    /// malicious/reputation tables.
    pub async fn score_contract(&self, address: Address) -> Result<RiskAssessment, AppError> {
        let bytecode = self.chain.get_code(address).await?;
        Ok(self.assess_contract_code(address, &bytecode))
    }

    /// Pure contract assessment over already-fetched bytecode. Shared by
    /// score_contract and the transaction analyzer, which already holds the
    /// recipient's code and must not fetch it twice.
    fn assess_contract_code(&self, address: Address, bytecode: &Bytes) -> RiskAssessment {
        if bytecode.is_empty() {
            return RiskAssessment {
                subject: address,
                subject_kind: SubjectKind::Contract,
                score: 0,
                level: RiskLevel::Unknown,
                factors: vec!["Not a contract or no code".to_string()],
                recommendations: Vec::new(),
                warnings: Vec::new(),
            };
        }

        let mut factors = Vec::new();
        let mut warnings = Vec::new();
        let mut score: i32 = 50;
        score += code_risk(bytecode, &mut factors);
        let mut score = clamp_score(score);

        if is_known_malicious(address) {
            score = 100;
            factors.push("Address is on the known-malicious list".to_string());
            warnings.push("Known malicious contract".to_string());
        } else if let Some(entry) = reputation_entry(address) {
            if entry.risk_floor > score {
                score = entry.risk_floor;
            }
            factors.push(entry.category.to_string());
        }

        let level = RiskLevel::from_score(score);
        let recommendations = wallet_recommendations(level, &factors);

        RiskAssessment {
            subject: address,
            subject_kind: SubjectKind::Contract,
            score,
            level,
            factors,
            recommendations,
            warnings,
        }
    }

    /// Pre-flight analysis of a pending transaction. Starts from a clean
    /// floor of 0 (not 50) and only adds risk.
    pub async fn analyze_transaction(&self, tx: TxRequest) -> Result<TransactionCheck, AppError> {
        let mut score: i32 = 0;
        let mut factors = Vec::new();
        let mut warnings = Vec::new();

        if tx.value > U256::from(ONE_NATIVE_WEI) {
            score += 20;
            factors.push("High value transaction".to_string());
            warnings.push("High value transaction".to_string());
        } else if tx.value > U256::from(TENTH_NATIVE_WEI) {
            score += 10;
            factors.push("Moderate value transaction".to_string());
        }

        let to_code = self.chain.get_code(tx.to).await?;
        if !to_code.is_empty() {
            score += 15;
            factors.push("Recipient is a contract".to_string());

            // Only the excess above the neutral midpoint transfers over. The
            // assessment reuses the bytecode fetched above; it is pure and
            // cannot abort the analysis.
            let contract_assessment = self.assess_contract_code(tx.to, &to_code);
            let excess = contract_assessment.score as i32 - 50;
            if excess > 0 {
                score += excess;
            }
            if contract_assessment.score > 70 {
                warnings.push("Recipient contract scored as high risk".to_string());
            }
        }

        if let Some(data) = tx.data.as_deref() {
            if !data.is_empty() && data != "0x" {
                score += 10;
                factors.push("Transaction carries calldata".to_string());
                if data.len() > COMPLEX_CALLDATA_LEN {
                    score += 5;
                    warnings.push("Complex contract call detected".to_string());
                }
            }
        }

        let score = clamp_score(score);
        let level = RiskLevel::from_score(score);
        let should_proceed = score < 70;

        let recommendations = if score >= 70 {
            vec![
                "Do not proceed without verifying the recipient contract".to_string(),
                "Simulate the transaction before signing".to_string(),
                "Consider using a fresh wallet with limited funds".to_string(),
            ]
        } else {
            vec![
                "Transaction appears low risk".to_string(),
                "Verify the recipient address before signing".to_string(),
            ]
        };

        Ok(TransactionCheck {
            from: tx.from,
            to: tx.to,
            score,
            level,
            should_proceed,
            factors,
            recommendations,
            warnings,
        })
    }

    async fn fetch_wallet_facts(&self, address: Address) -> Result<WalletFacts, AppError> {
        let balance = self.chain.get_balance(address).await?;
        let tx_count = self.chain.get_transaction_count(address).await?;
        let bytecode = self.chain.get_code(address).await?;
        Ok(WalletFacts::new(address, balance, tx_count, bytecode))
    }

    /// How many transfers in recent history touched a known risky
    /// counterparty. Indexer failures count as zero.
    async fn count_risky_interactions(&self, address: Address) -> usize {
        let history = match self
            .indexer
            .get_transfer_history(address, &["external", "erc20"], 100)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(%address, error = %e, "Transfer history unavailable, skipping interaction heuristic");
                return 0;
            }
        };

        history.iter().filter(|t| is_risky_counterparty(t)).count()
    }
}

fn is_risky_counterparty(transfer: &TransferRecord) -> bool {
    let Some(to) = transfer.to else {
        return false;
    };
    is_known_malicious(to)
        || reputation_entry(to).map_or(false, |entry| entry.risk_floor >= 70)
}

fn is_known_malicious(address: Address) -> bool {
    KNOWN_MALICIOUS
        .iter()
        .any(|raw| Address::from_str(raw).map_or(false, |a| a == address))
}

fn reputation_entry(address: Address) -> Option<&'static ReputationEntry> {
    REPUTATION_TABLE
        .iter()
        .find(|entry| Address::from_str(entry.address).map_or(false, |a| a == address))
}

/// Shared contract-code sub-score. All three checks are independent and may
/// fire together.
fn code_risk(bytecode: &Bytes, factors: &mut Vec<String>) -> i32 {
    let mut score = 0;

    if bytecode.len() > LARGE_BYTECODE_LEN {
        score += 10;
        factors.push("Unusually large bytecode".to_string());
    }
    if bytecode.contains(&OP_DELEGATECALL) {
        score += 20;
        factors.push("Bytecode contains DELEGATECALL".to_string());
    }
    if bytecode.contains(&OP_SELFDESTRUCT) {
        score += 25;
        factors.push("Bytecode contains SELFDESTRUCT".to_string());
    }

    score
}

fn clamp_score(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

fn wallet_recommendations(level: RiskLevel, factors: &[String]) -> Vec<String> {
    let mut recommendations = match level {
        RiskLevel::High => vec![
            "Consider moving funds to a hardware wallet".to_string(),
            "Review and revoke unnecessary token approvals".to_string(),
            "Enable transaction monitoring and alerts".to_string(),
        ],
        RiskLevel::Medium => vec![
            "Review token approvals periodically".to_string(),
            "Consider a multisig for larger holdings".to_string(),
        ],
        RiskLevel::Low => vec!["Keep wallet software and extensions up to date".to_string()],
        RiskLevel::Unknown => Vec::new(),
    };

    if factors.iter().any(|f| f == "No transaction history") {
        recommendations
            .push("New addresses have no track record; fund them gradually".to_string());
    }
    if factors.iter().any(|f| f == "High balance") {
        recommendations
            .push("Large balances attract attackers; split funds across wallets".to_string());
    }

    recommendations
}
