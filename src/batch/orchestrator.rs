use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::batch::state::{transition, BatchEvent, BatchState};
use crate::error::ValidationError;
use crate::execution::builder::{PaymentBuilder, PaymentEnvelope};
use crate::execution::signature::Keypair;
use crate::execution::submitter::{SubmissionResult, TransactionSubmitter};
use crate::ledger::client::LedgerClient;
use crate::ledger::models::{AccountHandle, PaymentInstruction};

/// Courtesy delay between two successful payments
pub const DEFAULT_PAYMENT_PAUSE: Duration = Duration::from_secs(3);

/// Result of one attempted payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentOutcome {
    pub index: usize,
    pub destination: String,
    pub memo: String,
    pub amount: Decimal,
    #[serde(flatten)]
    pub result: SubmissionResult,
}

impl PaymentOutcome {
    fn new(index: usize, instruction: &PaymentInstruction, result: SubmissionResult) -> Self {
        Self {
            index,
            destination: instruction.destination().to_string(),
            memo: instruction.memo().to_string(),
            amount: instruction.amount(),
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    Interrupted {
        index: usize,
        destination: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub source: String,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<PaymentOutcome>,
    pub result: BatchStatus,
}

impl BatchReport {
    pub fn is_completed(&self) -> bool {
        self.result == BatchStatus::Completed
    }
}

/// Sends a list of payments from one account, strictly in order.
///
/// The source account is reloaded before every payment because each
/// accepted transaction advances its sequence number. The first failure
/// ends the batch; nothing is retried.
pub struct BatchOrchestrator {
    client: Arc<dyn LedgerClient>,
    builder: PaymentBuilder,
    submitter: TransactionSubmitter,
    keypair: Arc<Keypair>,
    pause: Duration,
}

impl BatchOrchestrator {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        builder: PaymentBuilder,
        submitter: TransactionSubmitter,
        keypair: Arc<Keypair>,
        pause: Duration,
    ) -> Self {
        Self {
            client,
            builder,
            submitter,
            keypair,
            pause,
        }
    }

    /// Validate every `(destination, memo)` pair for `amount` up front,
    /// so a malformed entry never costs a network call.
    pub fn plan(
        amount: Decimal,
        entries: &[(String, String)],
    ) -> Result<Vec<PaymentInstruction>, ValidationError> {
        entries
            .iter()
            .map(|(destination, memo)| PaymentInstruction::new(destination, amount, memo))
            .collect()
    }

    #[instrument(
        skip(self, instructions),
        fields(source = %self.keypair.public_key(), total = instructions.len())
    )]
    pub async fn run(&self, instructions: &[PaymentInstruction]) -> BatchReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = instructions.len();

        info!("🔄 Starting payment batch {} ({} payments)", run_id, total);

        let mut outcomes: Vec<PaymentOutcome> = Vec::with_capacity(total);
        let mut result = BatchStatus::Completed;
        let mut source: Option<AccountHandle> = None;
        let mut envelope: Option<PaymentEnvelope> = None;
        let mut state = BatchState::Idle;

        while !state.is_terminal() {
            let event = match state {
                BatchState::Idle => BatchEvent::Start,
                BatchState::Loading(i) => {
                    info!(
                        "🚀 Payment {}/{} to {} with memo {:?}",
                        i + 1,
                        total,
                        instructions[i].destination(),
                        instructions[i].memo()
                    );
                    match self.client.load_account(self.keypair.public_key()).await {
                        Ok(handle) => {
                            debug!(
                                "Source balance: {} XLM, sequence {}",
                                handle.native_balance().unwrap_or("0"),
                                handle.sequence
                            );
                            source = Some(handle);
                            BatchEvent::Loaded
                        }
                        Err(e) => {
                            let error = format!("failed to load source account: {}", e);
                            outcomes.push(Self::failed(i, &instructions[i], error));
                            BatchEvent::Errored
                        }
                    }
                }
                BatchState::Building(i) => {
                    let built = source
                        .take()
                        .ok_or_else(|| "no freshly loaded source account".to_string())
                        .and_then(|handle| {
                            self.builder
                                .build(handle, &instructions[i], Utc::now())
                                .map_err(|e| e.to_string())
                        });
                    match built {
                        Ok(payment) => {
                            envelope = Some(payment);
                            BatchEvent::Built
                        }
                        Err(error) => {
                            outcomes.push(Self::failed(i, &instructions[i], error));
                            BatchEvent::Errored
                        }
                    }
                }
                BatchState::Submitting(i) => {
                    let submission = match envelope.take() {
                        Some(payment) => self.submitter.submit(payment, &self.keypair).await,
                        None => SubmissionResult::Failed {
                            error: "no built transaction to submit".to_string(),
                        },
                    };
                    let accepted = submission.is_success();
                    outcomes.push(PaymentOutcome::new(i, &instructions[i], submission));
                    if accepted {
                        BatchEvent::Accepted
                    } else {
                        BatchEvent::Errored
                    }
                }
                BatchState::Succeeded(i) => {
                    if let Some(hash) = outcomes.last().and_then(|o| o.result.hash()) {
                        let sent = &instructions[i];
                        info!(
                            "🎉 Sent {} XLM to {} ({})",
                            sent.amount(),
                            sent.destination(),
                            hash
                        );
                    }
                    if i + 1 < total {
                        tokio::time::sleep(self.pause).await;
                    }
                    BatchEvent::Advance
                }
                BatchState::Failed(i) => {
                    let reason = outcomes
                        .last()
                        .and_then(|o| o.result.error())
                        .unwrap_or_default()
                        .to_string();
                    error!(
                        "❌ Payment to {} failed, interrupting batch: {}",
                        instructions[i].destination(),
                        reason
                    );
                    result = BatchStatus::Interrupted {
                        index: i,
                        destination: instructions[i].destination().to_string(),
                        reason,
                    };
                    BatchEvent::Advance
                }
                BatchState::Done => break,
            };

            state = transition(state, event, total);
        }

        match &result {
            BatchStatus::Completed => info!("✓ All {} payments processed", total),
            BatchStatus::Interrupted { index, .. } => warn!(
                "⚠️ Batch interrupted at payment {}/{}, {} skipped",
                index + 1,
                total,
                total - outcomes.len()
            ),
        }

        BatchReport {
            run_id,
            source: self.keypair.public_key().to_string(),
            total,
            started_at,
            finished_at: Utc::now(),
            outcomes,
            result,
        }
    }

    fn failed(index: usize, instruction: &PaymentInstruction, error: String) -> PaymentOutcome {
        PaymentOutcome::new(index, instruction, SubmissionResult::Failed { error })
    }
}
