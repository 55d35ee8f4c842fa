use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Stroops per unit of the native asset (7 decimal places)
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// Text memos are capped at 28 bytes by the protocol
pub const MAX_MEMO_TEXT_BYTES: usize = 28;

/// Asset held by an account balance entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "asset_type", rename_all = "snake_case")]
pub enum AssetKind {
    Native,
    Issued { code: String, issuer: String },
    LiquidityPoolShares { pool_id: String },
}

impl AssetKind {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetKind::Native)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Native => write!(f, "XLM"),
            AssetKind::Issued { code, issuer } => write!(f, "{}:{}", code, issuer),
            AssetKind::LiquidityPoolShares { pool_id } => write!(f, "pool:{}", pool_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: AssetKind,
    /// Decimal amount exactly as reported by the network
    pub amount: String,
}

#[cfg(test)]
impl Balance {
    pub fn native(amount: &str) -> Self {
        Self {
            asset: AssetKind::Native,
            amount: amount.to_string(),
        }
    }

    pub fn issued(code: &str, issuer: &str, amount: &str) -> Self {
        Self {
            asset: AssetKind::Issued {
                code: code.to_string(),
                issuer: issuer.to_string(),
            },
            amount: amount.to_string(),
        }
    }
}

/// Snapshot of an account as last read from the network.
///
/// The sequence number is only valid until the next transaction from this
/// account lands, so a handle is consumed when a transaction is built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountHandle {
    pub account_id: String,
    pub sequence: i64,
    pub balances: Vec<Balance>,
}

impl AccountHandle {
    pub fn native_balance(&self) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| b.asset.is_native())
            .map(|b| b.amount.as_str())
    }

    /// Every non-native balance entry is backed by a trustline
    pub fn trustline_count(&self) -> usize {
        self.balances.iter().filter(|b| !b.asset.is_native()).count()
    }

    /// Sequence number the next transaction from this account must carry
    pub fn next_sequence(&self) -> Option<i64> {
        self.sequence.checked_add(1)
    }
}

/// One validated payment of the native asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInstruction {
    destination: String,
    destination_key: [u8; 32],
    memo: String,
    amount: Decimal,
    stroops: i64,
}

impl PaymentInstruction {
    pub fn new(destination: &str, amount: Decimal, memo: &str) -> Result<Self, ValidationError> {
        let destination_key = decode_public_key(destination)
            .ok_or_else(|| ValidationError::InvalidDestination(destination.to_string()))?;
        validate_memo(memo)?;
        let stroops = amount_to_stroops(amount)?;

        Ok(Self {
            destination: destination.to_string(),
            destination_key,
            memo: memo.to_string(),
            amount,
            stroops,
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn destination_key(&self) -> &[u8; 32] {
        &self.destination_key
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn stroops(&self) -> i64 {
        self.stroops
    }
}

/// Raw ed25519 key behind a `G...` strkey, or None if the string is not one
pub fn decode_public_key(id: &str) -> Option<[u8; 32]> {
    stellar_strkey::ed25519::PublicKey::from_string(id)
        .ok()
        .map(|key| key.0)
}

pub fn encode_public_key(key: &[u8; 32]) -> String {
    stellar_strkey::ed25519::PublicKey(*key).to_string()
}

pub fn validate_memo(memo: &str) -> Result<(), ValidationError> {
    if memo.len() > MAX_MEMO_TEXT_BYTES {
        return Err(ValidationError::MemoTooLong {
            len: memo.len(),
            max: MAX_MEMO_TEXT_BYTES,
        });
    }
    Ok(())
}

pub fn amount_to_stroops(amount: Decimal) -> Result<i64, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount.to_string()));
    }

    if amount.normalize().scale() > 7 {
        return Err(ValidationError::AmountPrecision(amount.to_string()));
    }

    amount
        .checked_mul(Decimal::from(STROOPS_PER_UNIT))
        .and_then(|stroops| stroops.to_i64())
        .ok_or_else(|| ValidationError::AmountOverflow(amount.to_string()))
}

pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str(raw.trim()).map_err(|_| ValidationError::InvalidAmount(raw.to_string()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::encode_public_key;

    /// Deterministic, well-formed public id for tests
    pub fn account_id(seed: u8) -> String {
        encode_public_key(&[seed; 32])
    }
}
