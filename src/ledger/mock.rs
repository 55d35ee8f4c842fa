//! In-memory ledger for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use stellar_xdr::curr::{MuxedAccount, OperationBody, TransactionEnvelope};

use crate::error::{LedgerError, SubmitError};
use crate::execution::signature::{network_id, transaction_hash};
use crate::ledger::client::{Confirmation, LedgerClient};
use crate::ledger::models::{encode_public_key, AccountHandle, Balance};

pub const TEST_PASSPHRASE: &str = "Test SDF Network ; September 2015";

#[derive(Default)]
struct MockState {
    accounts: HashMap<String, AccountHandle>,
    load_failures: HashMap<String, String>,
    rejections: HashMap<String, String>,
    transport_failure: Option<String>,
    load_calls: usize,
    submit_calls: usize,
    submitted: Vec<String>,
    ledger: u32,
}

/// Applies accepted payments by bumping the source sequence, and rejects
/// stale sequence numbers with `tx_bad_seq` like the real network.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

fn muxed_id(account: &MuxedAccount) -> String {
    match account {
        MuxedAccount::Ed25519(key) => encode_public_key(&key.0),
        MuxedAccount::MuxedEd25519(muxed) => encode_public_key(&muxed.ed25519.0),
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, handle: AccountHandle) -> Self {
        self.state
            .lock()
            .accounts
            .insert(handle.account_id.clone(), handle);
        self
    }

    pub fn with_funded(self, account_id: &str, native: &str, sequence: i64) -> Self {
        self.with_account(AccountHandle {
            account_id: account_id.to_string(),
            sequence,
            balances: vec![Balance::native(native)],
        })
    }

    pub fn fail_loads_for(self, account_id: &str, message: &str) -> Self {
        self.state
            .lock()
            .load_failures
            .insert(account_id.to_string(), message.to_string());
        self
    }

    pub fn reject_payments_to(self, destination: &str, message: &str) -> Self {
        self.state
            .lock()
            .rejections
            .insert(destination.to_string(), message.to_string());
        self
    }

    pub fn fail_transport(self, message: &str) -> Self {
        self.state.lock().transport_failure = Some(message.to_string());
        self
    }

    pub fn load_calls(&self) -> usize {
        self.state.lock().load_calls
    }

    pub fn submit_calls(&self) -> usize {
        self.state.lock().submit_calls
    }

    /// Destinations of accepted payments, in order
    pub fn submitted(&self) -> Vec<String> {
        self.state.lock().submitted.clone()
    }

    pub fn sequence_of(&self, account_id: &str) -> Option<i64> {
        self.state
            .lock()
            .accounts
            .get(account_id)
            .map(|account| account.sequence)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn load_account(&self, account_id: &str) -> Result<AccountHandle, LedgerError> {
        let mut state = self.state.lock();
        state.load_calls += 1;

        if let Some(message) = state.load_failures.get(account_id) {
            return Err(LedgerError::Network(message.clone()));
        }

        state
            .accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(account_id.to_string()))
    }

    async fn submit_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<Confirmation, SubmitError> {
        let mut state = self.state.lock();
        state.submit_calls += 1;

        if let Some(message) = &state.transport_failure {
            return Err(SubmitError::Transport(message.clone()));
        }

        let TransactionEnvelope::Tx(v1) = envelope else {
            return Err(SubmitError::Rejected("tx_malformed".to_string()));
        };
        if v1.signatures.is_empty() {
            return Err(SubmitError::Rejected("tx_bad_auth".to_string()));
        }

        let destination = match v1.tx.operations.first().map(|op| &op.body) {
            Some(OperationBody::Payment(payment)) => muxed_id(&payment.destination),
            _ => return Err(SubmitError::Rejected("op_malformed".to_string())),
        };
        if let Some(message) = state.rejections.get(&destination) {
            return Err(SubmitError::Rejected(message.clone()));
        }

        let source = muxed_id(&v1.tx.source_account);
        let account = state
            .accounts
            .get_mut(&source)
            .ok_or_else(|| SubmitError::Rejected("tx_no_source_account".to_string()))?;
        if v1.tx.seq_num.0 != account.sequence + 1 {
            return Err(SubmitError::Rejected("tx_bad_seq".to_string()));
        }
        account.sequence += 1;

        let hash = transaction_hash(&v1.tx, &network_id(TEST_PASSPHRASE))
            .map_err(|e| SubmitError::Rejected(e.to_string()))?;

        state.ledger += 1;
        state.submitted.push(destination);

        Ok(Confirmation {
            hash: hex::encode(hash),
            ledger: Some(state.ledger),
        })
    }
}
