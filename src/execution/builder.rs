use chrono::{DateTime, Utc};
use std::time::Duration;
use stellar_xdr::curr::{
    Asset, Memo, MuxedAccount, Operation, OperationBody, PaymentOp, Preconditions,
    SequenceNumber, TimeBounds, TimePoint, Transaction, TransactionExt, Uint256,
};

use crate::error::{AppError, AppResult, ValidationError};
use crate::ledger::models::{decode_public_key, AccountHandle, PaymentInstruction};

/// Base network fee per operation, in stroops
pub const BASE_FEE: u32 = 100;

/// How long a built transaction stays acceptable to the network
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(30);

/// Unsigned single-payment transaction
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEnvelope {
    pub tx: Transaction,
    pub source: String,
    pub destination: String,
    pub valid_until: DateTime<Utc>,
}

impl PaymentEnvelope {
    pub fn sequence(&self) -> i64 {
        self.tx.seq_num.0
    }
}

/// Builds native-asset payment transactions. No network I/O.
#[derive(Debug, Clone)]
pub struct PaymentBuilder {
    base_fee: u32,
    validity: Duration,
}

impl Default for PaymentBuilder {
    fn default() -> Self {
        Self::new(BASE_FEE, DEFAULT_VALIDITY)
    }
}

impl PaymentBuilder {
    pub fn new(base_fee: u32, validity: Duration) -> Self {
        Self { base_fee, validity }
    }

    /// Build the transaction for one payment.
    ///
    /// The handle is consumed: its sequence number is spent by this
    /// transaction, so the next payment needs a freshly loaded one.
    pub fn build(
        &self,
        source: AccountHandle,
        instruction: &PaymentInstruction,
        now: DateTime<Utc>,
    ) -> AppResult<PaymentEnvelope> {
        let source_key = decode_public_key(&source.account_id).ok_or_else(|| {
            AppError::Encoding(format!("Invalid source public key: {}", source.account_id))
        })?;

        let seq_num = source.next_sequence().ok_or_else(|| {
            AppError::Encoding(format!("Sequence number overflow for {}", source.account_id))
        })?;

        let build_time = u64::try_from(now.timestamp())
            .map_err(|_| AppError::Encoding(format!("Build time before epoch: {}", now)))?;
        let window_overflow =
            || AppError::Encoding(format!("Validity window too large: {:?}", self.validity));
        let valid_until = chrono::Duration::from_std(self.validity)
            .ok()
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(window_overflow)?;
        let max_time = build_time
            .checked_add(self.validity.as_secs())
            .ok_or_else(window_overflow)?;

        let op = Operation {
            source_account: None,
            body: OperationBody::Payment(PaymentOp {
                destination: MuxedAccount::Ed25519(Uint256(*instruction.destination_key())),
                asset: Asset::Native,
                amount: instruction.stroops(),
            }),
        };

        let memo = if instruction.memo().is_empty() {
            Memo::None
        } else {
            Memo::Text(instruction.memo().as_bytes().to_vec().try_into().map_err(|_| {
                ValidationError::MemoTooLong {
                    len: instruction.memo().len(),
                    max: crate::ledger::models::MAX_MEMO_TEXT_BYTES,
                }
            })?)
        };

        let tx = Transaction {
            source_account: MuxedAccount::Ed25519(Uint256(source_key)),
            fee: self.base_fee,
            seq_num: SequenceNumber(seq_num),
            cond: Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(max_time),
            }),
            memo,
            operations: vec![op].try_into()?,
            ext: TransactionExt::V0,
        };

        Ok(PaymentEnvelope {
            tx,
            source: source.account_id,
            destination: instruction.destination().to_string(),
            valid_until,
        })
    }
}
