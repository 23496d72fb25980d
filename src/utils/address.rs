use alloy::primitives::Address;
use std::str::FromStr;

use crate::error::AppError;

/// Parse and normalize a user-supplied address at the ingress boundary.
///
/// Everything downstream works with the canonical `Address` type, so mixed
/// checksummed/lowercased inputs can never produce distinct map keys.
pub fn parse_address(raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw.trim())
        .map_err(|e| AppError::InvalidInput(format!("invalid address '{}': {}", raw, e)))
}
