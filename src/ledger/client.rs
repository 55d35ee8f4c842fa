use async_trait::async_trait;
use stellar_xdr::curr::TransactionEnvelope;

use crate::error::{LedgerError, SubmitError};
use crate::ledger::models::AccountHandle;

/// Network acknowledgement of an accepted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub hash: String,
    pub ledger: Option<u32>,
}

/// Boundary to the ledger's HTTP API.
///
/// One request per call, no retries: retry policy belongs to the caller.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Load the current on-chain state of an account
    async fn load_account(&self, account_id: &str) -> Result<AccountHandle, LedgerError>;

    /// Submit a signed envelope and wait for the network's verdict
    async fn submit_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<Confirmation, SubmitError>;
}
