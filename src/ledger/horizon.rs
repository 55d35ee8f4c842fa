use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use stellar_xdr::curr::{Limits, TransactionEnvelope, WriteXdr};
use tracing::{debug, instrument, warn};

use crate::error::{AppError, AppResult, LedgerError, SubmitError};
use crate::ledger::client::{Confirmation, LedgerClient};
use crate::ledger::models::{decode_public_key, AccountHandle, AssetKind, Balance};

/// Horizon account resource, only the fields we read
#[derive(Debug, Deserialize)]
struct HorizonAccount {
    account_id: String,
    sequence: String,
    #[serde(default)]
    balances: Vec<HorizonBalance>,
}

#[derive(Debug, Deserialize)]
struct HorizonBalance {
    balance: String,
    asset_type: String,
    asset_code: Option<String>,
    asset_issuer: Option<String>,
    liquidity_pool_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HorizonSubmitResponse {
    hash: String,
    ledger: Option<u32>,
}

/// RFC 7807 problem document returned by Horizon on errors
#[derive(Debug, Default, Deserialize)]
struct HorizonProblem {
    title: Option<String>,
    detail: Option<String>,
    extras: Option<ProblemExtras>,
}

#[derive(Debug, Default, Deserialize)]
struct ProblemExtras {
    result_codes: Option<ResultCodes>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultCodes {
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

impl TryFrom<HorizonAccount> for AccountHandle {
    type Error = LedgerError;

    fn try_from(account: HorizonAccount) -> Result<Self, Self::Error> {
        let sequence = account.sequence.parse::<i64>().map_err(|_| {
            LedgerError::Network(format!(
                "Invalid sequence number format in account record: {}",
                account.sequence
            ))
        })?;

        let balances = account
            .balances
            .into_iter()
            .map(|b| {
                let asset = match b.asset_type.as_str() {
                    "native" => AssetKind::Native,
                    "liquidity_pool_shares" => AssetKind::LiquidityPoolShares {
                        pool_id: b.liquidity_pool_id.unwrap_or_default(),
                    },
                    _ => AssetKind::Issued {
                        code: b.asset_code.unwrap_or_default(),
                        issuer: b.asset_issuer.unwrap_or_default(),
                    },
                };
                Balance {
                    asset,
                    amount: b.balance,
                }
            })
            .collect();

        Ok(AccountHandle {
            account_id: account.account_id,
            sequence,
            balances,
        })
    }
}

/// Best human-readable diagnostic from a Horizon error body.
///
/// Result codes win (`tx_failed: op_underfunded`), then `detail`, then `title`.
fn problem_message(status: StatusCode, body: &str) -> String {
    let problem: HorizonProblem = serde_json::from_str(body).unwrap_or_default();

    if let Some(codes) = problem.extras.and_then(|e| e.result_codes) {
        if let Some(tx_code) = codes.transaction {
            if codes.operations.is_empty() {
                return tx_code;
            }
            return format!("{}: {}", tx_code, codes.operations.join(", "));
        }
    }

    problem
        .detail
        .or(problem.title)
        .unwrap_or_else(|| format!("Horizon returned {}", status))
}

/// Map a non-success `GET /accounts/{id}` response
fn load_failure(account_id: &str, status: StatusCode, body: &str) -> LedgerError {
    if status == StatusCode::NOT_FOUND {
        return LedgerError::NotFound(account_id.to_string());
    }
    LedgerError::Network(problem_message(status, body))
}

/// Map a non-success `POST /transactions` response.
///
/// A 4xx means the network looked at the transaction and refused it; rate
/// limiting and server-side failures say nothing about the transaction.
fn submit_failure(status: StatusCode, body: &str) -> SubmitError {
    let message = problem_message(status, body);
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        SubmitError::Rejected(message)
    } else {
        SubmitError::Transport(message)
    }
}

/// Only well-formed `G...` ids ever reach the URL path
fn account_url(base_url: &str, account_id: &str) -> Result<String, LedgerError> {
    if decode_public_key(account_id).is_none() {
        return Err(LedgerError::InvalidAccountId(account_id.to_string()));
    }
    Ok(format!("{}/accounts/{}", base_url, account_id))
}

/// Horizon REST client
pub struct HorizonClient {
    base_url: String,
    http: reqwest::Client,
}

impl HorizonClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    #[instrument(skip(self))]
    async fn load_account(&self, account_id: &str) -> Result<AccountHandle, LedgerError> {
        let url = account_url(&self.base_url, account_id)?;
        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(load_failure(account_id, status, &body));
        }

        let account: HorizonAccount = response
            .json()
            .await
            .map_err(|e| LedgerError::Network(format!("Failed to parse account: {}", e)))?;

        debug!("Loaded account {} at sequence {}", account.account_id, account.sequence);

        AccountHandle::try_from(account)
    }

    #[instrument(skip(self, envelope))]
    async fn submit_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<Confirmation, SubmitError> {
        // Encode through `to_xdr` + base64 rather than the xdr crate's base64 feature
        let xdr_bytes = envelope.to_xdr(Limits::none()).map_err(|e| {
            SubmitError::Rejected(format!("Failed to encode envelope to xdr: {:?}", e))
        })?;
        let envelope_xdr = base64::engine::general_purpose::STANDARD.encode(&xdr_bytes);

        let submit_url = format!("{}/transactions", self.base_url);
        let response = self
            .http
            .post(&submit_url)
            .form(&[("tx", envelope_xdr)])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let failure = submit_failure(status, &body);
            warn!("Horizon refused transaction ({}): {}", status, failure);
            return Err(failure);
        }

        let accepted: HorizonSubmitResponse = response.json().await.map_err(|e| {
            SubmitError::Transport(format!("Failed to parse submit response: {}", e))
        })?;

        Ok(Confirmation {
            hash: accepted.hash,
            ledger: accepted.ledger,
        })
    }
}
