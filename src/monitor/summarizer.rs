use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::ledger::client::LedgerClient;
use crate::ledger::models::decode_public_key;

pub const NOT_FOUND_MESSAGE: &str = "account not found or not funded";

/// Compact view of one account. Either the figures or the error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    pub account_id: String,
    #[serde(flatten)]
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AccountStatus {
    Found {
        native_balance: Option<String>,
        trustline_count: usize,
        sequence: i64,
    },
    Unavailable {
        error: String,
    },
}

impl AccountReport {
    pub fn native_balance(&self) -> Option<&str> {
        match &self.status {
            AccountStatus::Found { native_balance, .. } => native_balance.as_deref(),
            AccountStatus::Unavailable { .. } => None,
        }
    }

    pub fn trustline_count(&self) -> Option<usize> {
        match &self.status {
            AccountStatus::Found { trustline_count, .. } => Some(*trustline_count),
            AccountStatus::Unavailable { .. } => None,
        }
    }

    pub fn sequence(&self) -> Option<i64> {
        match &self.status {
            AccountStatus::Found { sequence, .. } => Some(*sequence),
            AccountStatus::Unavailable { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            AccountStatus::Found { .. } => None,
            AccountStatus::Unavailable { error } => Some(error),
        }
    }
}

/// Reads an account and reduces it to an [`AccountReport`]
pub struct AccountSummarizer {
    client: Arc<dyn LedgerClient>,
}

impl AccountSummarizer {
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self { client }
    }

    pub async fn summarize(&self, account_id: &str) -> AccountReport {
        // Reject malformed ids here so they never reach the network
        let loaded = if decode_public_key(account_id).is_some() {
            self.client.load_account(account_id).await
        } else {
            Err(LedgerError::InvalidAccountId(account_id.to_string()))
        };

        let status = match loaded {
            Ok(account) => {
                debug!("Summarizing {} ({} balances)", account_id, account.balances.len());
                AccountStatus::Found {
                    native_balance: account.native_balance().map(str::to_string),
                    trustline_count: account.trustline_count(),
                    sequence: account.sequence,
                }
            }
            Err(LedgerError::NotFound(_)) => {
                warn!("Account {} not found", account_id);
                AccountStatus::Unavailable {
                    error: NOT_FOUND_MESSAGE.to_string(),
                }
            }
            Err(LedgerError::Network(message)) => {
                warn!("Failed to load {}: {}", account_id, message);
                AccountStatus::Unavailable { error: message }
            }
            Err(e @ LedgerError::InvalidAccountId(_)) => {
                warn!("Skipping {:?}: {}", account_id, e);
                AccountStatus::Unavailable {
                    error: e.to_string(),
                }
            }
        };

        AccountReport {
            account_id: account_id.to_string(),
            status,
        }
    }
}
