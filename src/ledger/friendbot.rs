use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult, LedgerError};

#[derive(Debug, Default, Deserialize)]
struct FriendbotResponse {
    hash: Option<String>,
    detail: Option<String>,
}

/// Funding transaction hash from a Friendbot response
fn funding_hash(status: StatusCode, body: &str) -> Result<String, LedgerError> {
    let body: FriendbotResponse = serde_json::from_str(body).unwrap_or_default();

    if !status.is_success() {
        return Err(LedgerError::Network(
            body.detail.unwrap_or_else(|| format!("Friendbot returned {}", status)),
        ));
    }

    body.hash.filter(|hash| !hash.is_empty()).ok_or_else(|| {
        LedgerError::Network(format!("Friendbot returned {} without a hash", status))
    })
}

/// Testnet faucet that funds brand-new accounts
pub struct FriendbotClient {
    url: String,
    http: reqwest::Client,
}

impl FriendbotClient {
    pub fn new(url: &str, request_timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    /// Ask the faucet to create and fund `account_id`, returning the funding hash
    #[instrument(skip(self))]
    pub async fn fund(&self, account_id: &str) -> Result<String, LedgerError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("addr", account_id)])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let hash = funding_hash(status, &text)?;

        info!("💰 Funded {} (tx {})", account_id, hash);
        Ok(hash)
    }
}
