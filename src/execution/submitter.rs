use serde::Serialize;
use std::sync::Arc;
use stellar_xdr::curr::{Hash, TransactionEnvelope, TransactionV1Envelope};
use tracing::{info, instrument, warn};

use crate::error::{AppResult, SubmitError};
use crate::execution::builder::PaymentEnvelope;
use crate::execution::signature::{network_id, transaction_hash, Keypair};
use crate::ledger::client::LedgerClient;

/// Outcome of one submission, as data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionResult {
    Accepted { hash: String },
    Failed { error: String },
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Accepted { .. })
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            SubmissionResult::Accepted { hash } => Some(hash),
            SubmissionResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SubmissionResult::Accepted { .. } => None,
            SubmissionResult::Failed { error } => Some(error),
        }
    }
}

/// Envelope carrying exactly one signature
#[derive(Debug, Clone)]
pub struct SignedPayment {
    pub envelope: TransactionEnvelope,
    pub hash: String,
}

/// Signs payment envelopes and hands them to the network
pub struct TransactionSubmitter {
    client: Arc<dyn LedgerClient>,
    network_id: Hash,
}

impl TransactionSubmitter {
    pub fn new(client: Arc<dyn LedgerClient>, network_passphrase: &str) -> Self {
        Self {
            client,
            network_id: network_id(network_passphrase),
        }
    }

    pub fn sign(&self, payment: PaymentEnvelope, keypair: &Keypair) -> AppResult<SignedPayment> {
        let hash = transaction_hash(&payment.tx, &self.network_id)?;
        let signature = keypair.sign_hash(&hash)?;

        let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: payment.tx,
            signatures: vec![signature].try_into()?,
        });

        Ok(SignedPayment {
            envelope,
            hash: hex::encode(hash),
        })
    }

    /// Sign and submit. Never retries; every failure comes back as data.
    #[instrument(
        skip(self, payment, keypair),
        fields(destination = %payment.destination, seq = payment.sequence())
    )]
    pub async fn submit(&self, payment: PaymentEnvelope, keypair: &Keypair) -> SubmissionResult {
        let signed = match self.sign(payment, keypair) {
            Ok(signed) => signed,
            Err(e) => {
                warn!("Failed to sign transaction: {}", e);
                return SubmissionResult::Failed {
                    error: e.to_string(),
                };
            }
        };

        match self.client.submit_transaction(&signed.envelope).await {
            Ok(confirmation) => {
                if confirmation.hash != signed.hash {
                    warn!(
                        "Network hash {} differs from local hash {}",
                        confirmation.hash, signed.hash
                    );
                }
                info!("Stellar transaction submitted: {}", confirmation.hash);
                SubmissionResult::Accepted {
                    hash: confirmation.hash,
                }
            }
            Err(SubmitError::Rejected(message)) => {
                warn!("Transaction rejected: {}", message);
                SubmissionResult::Failed { error: message }
            }
            Err(SubmitError::Transport(message)) => {
                warn!("Transport failure while submitting: {}", message);
                SubmissionResult::Failed { error: message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::builder::PaymentBuilder;
    use crate::ledger::mock::MockLedger;
    use crate::ledger::models::{fixtures::account_id, PaymentInstruction};
    use chrono::Utc;
    use ed25519_dalek::{Verifier, VerifyingKey};
    use rust_decimal_macros::dec;

    const PASSPHRASE: &str = "Test SDF Network ; September 2015";

    async fn envelope_for(ledger: &MockLedger, keypair: &Keypair, dest: u8) -> PaymentEnvelope {
        let handle = ledger.load_account(keypair.public_key()).await.unwrap();
        let instruction = PaymentInstruction::new(&account_id(dest), dec!(2), "m1").unwrap();
        PaymentBuilder::default()
            .build(handle, &instruction, Utc::now())
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_accepted() {
        let keypair = Keypair::from_seed([5u8; 32]);
        let ledger = Arc::new(MockLedger::new().with_funded(keypair.public_key(), "100.0", 10));
        let submitter = TransactionSubmitter::new(ledger.clone(), PASSPHRASE);

        let envelope = envelope_for(&ledger, &keypair, 2).await;
        let result = submitter.submit(envelope, &keypair).await;

        assert!(result.is_success());
        assert!(!result.hash().unwrap().is_empty());
        assert_eq!(ledger.sequence_of(keypair.public_key()), Some(11));
    }

    #[tokio::test]
    async fn test_submit_rejection_is_verbatim() {
        let keypair = Keypair::from_seed([5u8; 32]);
        let ledger = Arc::new(
            MockLedger::new()
                .with_funded(keypair.public_key(), "100.0", 10)
                .reject_payments_to(&account_id(2), "insufficient balance"),
        );
        let submitter = TransactionSubmitter::new(ledger.clone(), PASSPHRASE);

        let envelope = envelope_for(&ledger, &keypair, 2).await;
        let result = submitter.submit(envelope, &keypair).await;

        assert_eq!(
            result,
            SubmissionResult::Failed {
                error: "insufficient balance".to_string()
            }
        );
        assert_eq!(ledger.sequence_of(keypair.public_key()), Some(10));
    }

    #[tokio::test]
    async fn test_submit_transport_failure() {
        let keypair = Keypair::from_seed([5u8; 32]);
        let ledger = Arc::new(
            MockLedger::new()
                .with_funded(keypair.public_key(), "100.0", 10)
                .fail_transport("connection reset"),
        );
        let submitter = TransactionSubmitter::new(ledger.clone(), PASSPHRASE);

        let envelope = envelope_for(&ledger, &keypair, 2).await;
        let result = submitter.submit(envelope, &keypair).await;

        assert_eq!(result.error(), Some("connection reset"));
        assert_eq!(result.hash(), None);
    }

    #[test]
    fn test_signature_covers_network_payload() {
        let keypair = Keypair::from_seed([5u8; 32]);
        let instruction = PaymentInstruction::new(&account_id(2), dec!(2), "m1").unwrap();
        let handle = crate::ledger::models::AccountHandle {
            account_id: keypair.public_key().to_string(),
            sequence: 1,
            balances: vec![],
        };
        let payment = PaymentBuilder::default()
            .build(handle, &instruction, Utc::now())
            .unwrap();
        let expected = transaction_hash(&payment.tx, &network_id(PASSPHRASE)).unwrap();

        let submitter = TransactionSubmitter::new(Arc::new(MockLedger::new()), PASSPHRASE);
        let signed = submitter.sign(payment, &keypair).unwrap();
        assert_eq!(signed.hash, hex::encode(expected));

        let TransactionEnvelope::Tx(v1) = &signed.envelope else {
            panic!("expected a v1 envelope");
        };
        assert_eq!(v1.signatures.len(), 1);

        let raw: [u8; 64] = v1.signatures[0].signature.0.to_vec().try_into().unwrap();
        let verifying = VerifyingKey::from_bytes(&keypair.public_key_bytes()).unwrap();
        assert!(verifying
            .verify(&expected, &ed25519_dalek::Signature::from_bytes(&raw))
            .is_ok());
    }
}
