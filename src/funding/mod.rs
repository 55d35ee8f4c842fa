// Account creation: fresh keypairs, optionally funded by a faucet

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::execution::signature::Keypair;
use crate::ledger::friendbot::FriendbotClient;

/// Anything that can create and fund an account on a test network
#[async_trait]
pub trait Faucet: Send + Sync {
    async fn fund(&self, account_id: &str) -> Result<String, LedgerError>;
}

#[async_trait]
impl Faucet for FriendbotClient {
    async fn fund(&self, account_id: &str) -> Result<String, LedgerError> {
        FriendbotClient::fund(self, account_id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FundingOutcome {
    Funded { hash: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub public_key: String,
    pub secret_seed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding: Option<FundingOutcome>,
}

/// Generate `count` keypairs, funding each through `faucet` when given.
/// A funding failure is recorded and the remaining accounts still proceed.
pub async fn create_accounts(count: usize, faucet: Option<&dyn Faucet>) -> Vec<NewAccount> {
    let mut accounts = Vec::with_capacity(count);

    for n in 1..=count {
        let keypair = Keypair::random();
        info!("🔐 Generated account {}/{}: {}", n, count, keypair.public_key());

        let funding = match faucet {
            Some(faucet) => Some(match faucet.fund(keypair.public_key()).await {
                Ok(hash) => FundingOutcome::Funded { hash },
                Err(e) => {
                    warn!("Funding {} failed: {}", keypair.public_key(), e);
                    FundingOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            }),
            None => None,
        };

        accounts.push(NewAccount {
            public_key: keypair.public_key().to_string(),
            secret_seed: keypair.secret_seed(),
            funding,
        });
    }

    accounts
}
