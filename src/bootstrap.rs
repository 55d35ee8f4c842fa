use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    batch::BatchOrchestrator,
    config::Config,
    error::{AppError, AppResult},
    execution::{Keypair, PaymentBuilder, TransactionSubmitter},
    ledger::{friendbot::FriendbotClient, HorizonClient, LedgerClient},
    monitor::{AccountMonitor, AccountSummarizer},
};

/// Shared network client, reused by every component of a run
pub fn initialize_ledger_client(config: &Config) -> AppResult<Arc<dyn LedgerClient>> {
    let client = HorizonClient::new(&config.horizon_url, config.request_timeout())?;
    info!("✅ Horizon client initialized for {}", client.base_url());
    Ok(Arc::new(client))
}

pub fn initialize_monitor(client: Arc<dyn LedgerClient>) -> AccountMonitor {
    AccountMonitor::new(AccountSummarizer::new(client))
}

pub fn initialize_signer(config: &Config) -> AppResult<Arc<Keypair>> {
    let secret = config
        .secret_key
        .as_deref()
        .ok_or_else(|| AppError::Config("SECRET_KEY must be set to send payments".to_string()))?;
    let keypair = Keypair::from_secret(secret)?;

    if let Some(public_key) = config.public_key.as_deref() {
        if public_key != keypair.public_key() {
            warn!(
                "PUBLIC_KEY {} does not match the signing key {}; paying from the signing key",
                public_key,
                keypair.public_key()
            );
        }
    }

    Ok(Arc::new(keypair))
}

pub fn initialize_orchestrator(
    config: &Config,
    client: Arc<dyn LedgerClient>,
) -> AppResult<BatchOrchestrator> {
    let keypair = initialize_signer(config)?;
    info!("⚙️  Payment source account: {}", keypair.public_key());

    Ok(BatchOrchestrator::new(
        client.clone(),
        PaymentBuilder::new(config.base_fee, config.tx_validity()),
        TransactionSubmitter::new(client, &config.network_passphrase),
        keypair,
        config.payment_pause(),
    ))
}

pub fn initialize_faucet(config: &Config) -> AppResult<FriendbotClient> {
    FriendbotClient::new(&config.friendbot_url, config.request_timeout())
}
